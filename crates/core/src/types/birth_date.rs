//! Birth date type with age validation.

use core::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Minimum age, in whole years, to hold an account.
pub const MINIMUM_AGE_YEARS: i32 = 16;

/// Errors that can occur when parsing a [`BirthDate`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum BirthDateError {
    /// The input string is empty.
    #[error("birth date cannot be empty")]
    Empty,
    /// The input is not a valid `YYYY-MM-DD` date.
    #[error("birth date must be a valid YYYY-MM-DD date")]
    InvalidFormat,
}

/// A date of birth.
///
/// Age is computed as the calendar-year difference, decremented by one if
/// the birthday has not yet occurred in the current year.
///
/// ## Examples
///
/// ```
/// use chrono::NaiveDate;
/// use lockerbay_core::BirthDate;
///
/// let birth = BirthDate::parse("2008-03-15").unwrap();
/// let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// assert_eq!(birth.age_on(today), 16);
/// assert!(birth.is_adult_on(today));
///
/// let day_before = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
/// assert_eq!(birth.age_on(day_before), 15);
/// assert!(!birth.is_adult_on(day_before));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    /// Create a `BirthDate` from a date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a `BirthDate` from a `YYYY-MM-DD` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or not a valid date.
    pub fn parse(s: &str) -> Result<Self, BirthDateError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(BirthDateError::Empty);
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| BirthDateError::InvalidFormat)
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// Age in whole years as of `today`.
    ///
    /// Computed as `today.year - birth.year`, minus one if today's month
    /// precedes the birth month, or it is the birth month but the day has
    /// not been reached yet.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        let mut age = today.year() - self.0.year();
        if today.month() < self.0.month()
            || (today.month() == self.0.month() && today.day() < self.0.day())
        {
            age -= 1;
        }
        age
    }

    /// Whether the person is at least [`MINIMUM_AGE_YEARS`] as of `today`.
    #[must_use]
    pub fn is_adult_on(&self, today: NaiveDate) -> bool {
        self.age_on(today) >= MINIMUM_AGE_YEARS
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for BirthDate {
    type Err = BirthDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
