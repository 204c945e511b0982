//! Input validation for values that end up in file system paths.

use crate::{MfaSecureError, Result};

/// Characters that would let a profile name escape the session directory.
const PATH_SEPARATORS: &[char] = &['/', '\\'];

/// Maximum allowed length for a profile name.
const MAX_NAME_LENGTH: usize = 255;

/// Validates a profile name before it is used as a cache file name.
///
/// Rejects:
/// - Empty names
/// - Excessive length (>255 characters)
/// - Null bytes and control characters
/// - Path separators and the `.`/`..` directory entries
///
/// # Errors
///
/// Returns [`MfaSecureError::InvalidProfileName`] if validation fails.
///
/// # Example
///
/// ```
/// use aws_mfa_secure::validation::validate_profile_name;
///
/// assert!(validate_profile_name("default").is_ok());
/// assert!(validate_profile_name("prod-admin").is_ok());
/// assert!(validate_profile_name("team.sandbox").is_ok());
///
/// assert!(validate_profile_name("").is_err());
/// assert!(validate_profile_name("../credentials").is_err());
/// ```
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MfaSecureError::InvalidProfileName(
            "name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(MfaSecureError::InvalidProfileName(format!(
            "name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }

    if name.contains('\0') {
        return Err(MfaSecureError::InvalidProfileName(
            "name contains null byte".to_string(),
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(MfaSecureError::InvalidProfileName(
            "name contains control characters".to_string(),
        ));
    }

    if name.contains(PATH_SEPARATORS) || name == "." || name == ".." {
        return Err(MfaSecureError::InvalidProfileName(format!(
            "{} is not a valid file name",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_profile_name("default").is_ok());
        assert!(validate_profile_name("PROD_admin_1").is_ok());
        assert!(validate_profile_name("user@example.com").is_ok());
        assert!(validate_profile_name("..hidden").is_ok());
    }

    #[test]
    fn test_empty_name() {
        let result = validate_profile_name("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_too_long() {
        let long_name = "a".repeat(256);
        let result = validate_profile_name(&long_name);
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    #[test]
    fn test_null_byte() {
        let result = validate_profile_name("name\0with\0nulls");
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_control_characters() {
        let result = validate_profile_name("name\nwith\tcontrol");
        assert!(result.unwrap_err().to_string().contains("control"));
    }

    #[test]
    fn test_path_traversal_attempts() {
        for name in ["..", ".", "../../etc/passwd", "a/b", "a\\b"] {
            let result = validate_profile_name(name);
            assert!(result.is_err(), "Expected '{}' to fail validation", name);
            assert!(result
                .unwrap_err()
                .to_string()
                .contains("not a valid file name"));
        }
    }
}
