//! Field validation helpers for request payloads.
//!
//! Returns `AppError::InvalidArgument` with a field-level reason that is
//! shown to the caller unchanged.

use crate::{AppError, AppResult};

/// Maximum display name length.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum password length accepted before hashing.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Unwrap required fields, failing with `message` if any is absent.
///
/// # Errors
/// Returns `AppError::InvalidArgument` carrying `message`.
pub fn required<'a, const N: usize>(
    fields: [Option<&'a str>; N],
    message: &str,
) -> AppResult<[&'a str; N]> {
    if fields.iter().any(Option::is_none) {
        return Err(AppError::InvalidArgument(message.to_string()));
    }
    Ok(fields.map(Option::unwrap_or_default))
}

/// Validate and trim a display name.
///
/// # Errors
/// Returns `AppError::InvalidArgument` if the name is blank or too long.
pub fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::InvalidArgument("Name cannot be empty".to_string()));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::InvalidArgument(format!(
            "Name must not exceed {MAX_NAME_LENGTH} characters"
        )));
    }

    Ok(name)
}

/// Reject passwords long enough to make hashing a denial-of-service vector.
///
/// # Errors
/// Returns `AppError::InvalidArgument` if the password is too long.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::InvalidArgument(format!(
            "Password must not exceed {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}
