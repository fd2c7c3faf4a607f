//! National identity document number (DNI).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`NationalId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum NationalIdError {
    /// The input string is empty.
    #[error("national ID cannot be empty")]
    Empty,
    /// The input is shorter than allowed.
    #[error("national ID must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
    /// The input is longer than allowed.
    #[error("national ID must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A national identity document number.
///
/// Length must be between 7 and 10 characters after trimming.
///
/// ## Examples
///
/// ```
/// use lockerbay_core::NationalId;
///
/// assert!(NationalId::parse("30123456").is_ok());
/// assert!(NationalId::parse("123456").is_err());      // too short
/// assert!(NationalId::parse("12345678901").is_err()); // too long
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct NationalId(String);

impl NationalId {
    /// Minimum length of a national ID.
    pub const MIN_LENGTH: usize = 7;

    /// Maximum length of a national ID.
    pub const MAX_LENGTH: usize = 10;

    /// Parse a `NationalId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, shorter than
    /// [`NationalId::MIN_LENGTH`], or longer than [`NationalId::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, NationalIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(NationalIdError::Empty);
        }

        let len = trimmed.chars().count();
        if len < Self::MIN_LENGTH {
            return Err(NationalIdError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if len > Self::MAX_LENGTH {
            return Err(NationalIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the national ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `NationalId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NationalId {
    type Err = NationalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
