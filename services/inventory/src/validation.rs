//! Input validation utilities

use chrono::NaiveDate;
use thiserror::Error;

/// Date format accepted by every form
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a submitted date was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("date is not in YYYY-MM-DD format")]
    Malformed,
    #[error("date is in the future")]
    InFuture,
}

/// Column widths, in characters
pub const MAX_PERSON_NAME_LENGTH: usize = 50;
pub const MAX_PHONE_LENGTH: usize = 15;
pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MAX_ITEM_NAME_LENGTH: usize = 100;
pub const MAX_ITEM_CODE_LENGTH: usize = 50;
pub const MAX_WARRANTY_LENGTH: usize = 50;

/// A value longer than its storage column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} must be at most {max} characters long")]
pub struct TooLong {
    pub field: &'static str,
    pub max: usize,
}

/// Check `value` against a column width
pub fn within(field: &'static str, value: &str, max: usize) -> Result<(), TooLong> {
    if value.chars().count() > max {
        return Err(TooLong { field, max });
    }
    Ok(())
}

/// Return the field value if it is present and non-empty
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Phone numbers added by an administrator are exactly ten ASCII digits
pub fn is_ten_digit_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| DateError::Malformed)
}

/// Parse a `YYYY-MM-DD` date that must not be after `today`
pub fn parse_past_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let date = parse_date(raw)?;
    if date > today {
        return Err(DateError::InFuture);
    }
    Ok(date)
}
