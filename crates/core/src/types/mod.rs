//! Core types for LockerBay.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod birth_date;
pub mod email;
pub mod id;
pub mod national_id;
pub mod password;
pub mod phone;
pub mod price;
pub mod status;

pub use birth_date::{BirthDate, BirthDateError, MINIMUM_AGE_YEARS};
pub use email::{Email, EmailError};
pub use id::*;
pub use national_id::{NationalId, NationalIdError};
pub use password::{MIN_PASSWORD_LENGTH, PasswordStrength, password_score};
pub use phone::{Phone, PhoneError};
pub use price::{CurrencyCode, Price, PriceError};
pub use status::CategoryStatus;
