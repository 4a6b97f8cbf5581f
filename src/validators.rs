/// Input validators for account fields
/// Features:
/// 1. Required-field checks (blank after trimming is missing)
/// 2. Identity key normalization (trimmed, lowercase)
/// 3. Length limits (DoS protection)

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_USERNAME_LENGTH: usize = 64;
const MAX_FULL_NAME_LENGTH: usize = 256;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt input limit

/// Returns the trimmed value, or `EmptyField` when absent or blank
pub fn required(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ValidationError::EmptyField(field.to_string())),
    }
}

fn identity_key(field: &str, value: Option<&str>, max: usize) -> Result<String, ValidationError> {
    let key = required(field, value)?.to_lowercase();

    if key.len() > max {
        return Err(ValidationError::TooLong(field.to_string(), max));
    }

    Ok(key)
}

/// Username as stored: trimmed and lowercased, any characters
pub fn parse_username(value: Option<&str>) -> Result<String, ValidationError> {
    identity_key("username", value, MAX_USERNAME_LENGTH)
}

/// Email as stored: trimmed and lowercased; the format is not checked
pub fn parse_email(value: Option<&str>) -> Result<String, ValidationError> {
    identity_key("email", value, MAX_EMAIL_LENGTH)
}

/// Display name: trimmed, no control characters
pub fn parse_full_name(value: Option<&str>) -> Result<String, ValidationError> {
    let full_name = required("fullName", value)?;

    if full_name.len() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::TooLong("fullName".to_string(), MAX_FULL_NAME_LENGTH));
    }

    if full_name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("fullName".to_string()));
    }

    Ok(full_name)
}

/// Passwords are never trimmed; blank means missing
pub fn parse_password(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value {
        Some(password) if !password.trim().is_empty() => {
            if password.len() > MAX_PASSWORD_LENGTH {
                return Err(ValidationError::TooLong(field.to_string(), MAX_PASSWORD_LENGTH));
            }
            Ok(password.to_string())
        }
        _ => Err(ValidationError::EmptyField(field.to_string())),
    }
}
