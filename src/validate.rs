use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Rejects anything that doesn't look like an email. The address is kept exactly as sent, since
/// it has to match the email a session was issued for.
pub(crate) fn checked_email(raw: &str) -> Result<String, ApiError> {
    if !is_valid_email(raw) {
        return Err(ApiError::validation(format!("Invalid email: {raw:?}")));
    }
    Ok(raw.to_string())
}
