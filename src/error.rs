//! Error types for MFA session operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MfaSecureError`].
pub type Result<T> = std::result::Result<T, MfaSecureError>;

/// Errors that can occur while reading profiles, caching sessions or
/// exchanging MFA codes.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum MfaSecureError {
    /// The token service rejected the one-time code.
    #[error("InvalidMfaCode: {0}")]
    InvalidMfaCode(String),

    /// The token service denied the request outright.
    #[error("AccessDenied: {0}")]
    AccessDenied(String),

    /// `aws sts get-session-token` produced output without credentials.
    #[error("UnrecognizedExchangeOutput: {0}")]
    UnrecognizedExchangeOutput(String),

    /// The cached session file exists but cannot be parsed.
    #[error("cached session at {} is corrupt: {reason}", path.display())]
    CacheCorrupt {
        /// Cache file location
        path: PathBuf,
        /// What failed to parse
        reason: String,
    },

    /// No MFA device is configured for the profile.
    #[error("no mfa_serial configured for profile {0}")]
    MfaSerialNotConfigured(String),

    /// The home directory could not be determined.
    #[error("could not determine home directory (set AWS_MFA_SECURE_HOME)")]
    HomeDirNotFound,

    /// Profile name cannot be used as a cache file name.
    #[error("invalid profile name: {0}")]
    InvalidProfileName(String),

    /// Required CLI tool is not installed.
    #[error("CLI not installed: {0}")]
    CliNotInstalled(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    CommandFailed(String),

    /// Any other failure reported by the token service.
    #[error("STS error: {0}")]
    Sts(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MfaSecureError {
    /// Returns true for the failures an MFA prompt retries on.
    ///
    /// ```
    /// use aws_mfa_secure::MfaSecureError;
    ///
    /// assert!(MfaSecureError::InvalidMfaCode("bad".into()).is_retryable());
    /// assert!(!MfaSecureError::HomeDirNotFound.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidMfaCode(_) | Self::AccessDenied(_) | Self::UnrecognizedExchangeOutput(_)
        )
    }

    /// Creates a [`MfaSecureError::CacheCorrupt`] for `path`.
    pub fn cache_corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CacheCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = MfaSecureError::InvalidMfaCode("code is wrong".to_string());
        assert_eq!(err.to_string(), "InvalidMfaCode: code is wrong");
    }

    #[test]
    fn test_cache_corrupt_display() {
        let err = MfaSecureError::cache_corrupt("/tmp/sessions/default", "expected value");
        let msg = err.to_string();
        assert!(msg.contains("/tmp/sessions/default"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(MfaSecureError::AccessDenied("no".into()).is_retryable());
        assert!(MfaSecureError::UnrecognizedExchangeOutput("junk".into()).is_retryable());
        assert!(!MfaSecureError::Sts("throttled".into()).is_retryable());
        assert!(!MfaSecureError::cache_corrupt("x", "y").is_retryable());
    }

    #[test]
    fn test_error_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = MfaSecureError::Other(anyhow::Error::new(io).context("writing session"));

        assert!(err.source().is_some());
    }
}
