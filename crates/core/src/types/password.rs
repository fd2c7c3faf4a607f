//! Password strength scoring.
//!
//! Four independent checks each contribute a quarter of a 0-100 score:
//! minimum length, mixed case, a digit, and a special character. Only a
//! weak password (score of 25 or below) blocks sign-up.

use serde::{Deserialize, Serialize};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Points contributed by each passing check.
const POINTS_PER_CHECK: u8 = 25;

/// Password strength bands derived from the 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    /// Score 0-25. Blocks submission.
    Weak,
    /// Score 26-75.
    Medium,
    /// Score 76-100.
    Strong,
}

impl PasswordStrength {
    /// Evaluate a password's strength.
    ///
    /// ```
    /// use lockerbay_core::PasswordStrength;
    ///
    /// assert_eq!(PasswordStrength::evaluate("abc"), PasswordStrength::Weak);
    /// assert_eq!(PasswordStrength::evaluate("Abcdef12"), PasswordStrength::Medium);
    /// assert_eq!(PasswordStrength::evaluate("Abcdef12!"), PasswordStrength::Strong);
    /// ```
    #[must_use]
    pub fn evaluate(password: &str) -> Self {
        Self::from_score(password_score(password))
    }

    /// Map a 0-100 score to a strength band.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score <= 25 {
            Self::Weak
        } else if score <= 75 {
            Self::Medium
        } else {
            Self::Strong
        }
    }

    /// Whether a password of this strength may be submitted.
    #[must_use]
    pub const fn allows_submission(&self) -> bool {
        !matches!(self, Self::Weak)
    }
}

/// Compute the 0-100 password score.
///
/// Each of the four checks is worth 25 points:
/// - at least [`MIN_PASSWORD_LENGTH`] characters
/// - both uppercase and lowercase letters
/// - at least one ASCII digit
/// - at least one special (non-alphanumeric) character
#[must_use]
pub fn password_score(password: &str) -> u8 {
    let checks = [
        password.chars().count() >= MIN_PASSWORD_LENGTH,
        password.chars().any(char::is_uppercase) && password.chars().any(char::is_lowercase),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ];

    checks.into_iter().map(u8::from).sum::<u8>() * POINTS_PER_CHECK
}
