//! Token exchanger trait and its request/response types.
//!
//! A [`TokenExchanger`] turns an MFA device serial plus one-time code into
//! temporary credentials. The retry loop in
//! [`MfaSecure::acquire_session`](crate::MfaSecure::acquire_session) only sees
//! this trait, so the SDK and `aws` CLI paths are interchangeable.

use crate::session::CachedSession;
use crate::Result;
use serde::Deserialize;

/// Parameters of a `GetSessionToken` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokenRequest {
    /// MFA device identifier
    pub serial_number: String,
    /// One-time code
    pub token_code: String,
    /// Requested session lifetime in seconds, passed through verbatim
    pub duration_seconds: Option<String>,
}

impl SessionTokenRequest {
    /// Creates a request without a duration override.
    pub fn new(serial_number: impl Into<String>, token_code: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            token_code: token_code.into(),
            duration_seconds: None,
        }
    }

    /// Sets the requested duration.
    pub fn with_duration_seconds(mut self, seconds: Option<String>) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Renders the request as `--key value` arguments for the AWS CLI.
    ///
    /// ```
    /// use aws_mfa_secure::exchanger::SessionTokenRequest;
    ///
    /// let args = SessionTokenRequest::new("arn:aws:iam::1:mfa/alice", "123456").to_cli_args();
    /// assert_eq!(
    ///     args,
    ///     ["--serial-number", "arn:aws:iam::1:mfa/alice", "--token-code", "123456"]
    /// );
    /// ```
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "--serial-number".to_string(),
            self.serial_number.clone(),
            "--token-code".to_string(),
            self.token_code.clone(),
        ];
        if let Some(ref seconds) = self.duration_seconds {
            args.push("--duration-seconds".to_string());
            args.push(seconds.clone());
        }
        args
    }
}

/// The `GetSessionToken` response shape both exchangers produce.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionTokenResponse {
    pub credentials: CachedSession,
}

/// Exchanges an MFA code for temporary credentials.
///
/// Implementations must report a rejected code as
/// [`MfaSecureError::InvalidMfaCode`](crate::MfaSecureError::InvalidMfaCode)
/// and an outright denial as
/// [`MfaSecureError::AccessDenied`](crate::MfaSecureError::AccessDenied) so the
/// caller can retry them.
pub trait TokenExchanger {
    /// Returns the exchanger name ("sdk", "shell", "mock").
    fn name(&self) -> &str;

    /// Performs one `GetSessionToken` call. Blocks until it completes.
    fn get_session_token(&mut self, request: &SessionTokenRequest) -> Result<SessionTokenResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_with_duration() {
        let request = SessionTokenRequest::new("arn:aws:iam::1:mfa/alice", "654321")
            .with_duration_seconds(Some("900".to_string()));

        assert_eq!(
            request.to_cli_args(),
            [
                "--serial-number",
                "arn:aws:iam::1:mfa/alice",
                "--token-code",
                "654321",
                "--duration-seconds",
                "900"
            ]
        );
    }

    #[test]
    fn test_response_ignores_extra_fields() {
        let json = serde_json::json!({
            "credentials": {
                "access_key_id": "ASIA",
                "secret_access_key": "s",
                "session_token": "t",
                "expiration": "2026-10-17T20:15:00+00:00"
            },
            "response_metadata": {"request_id": "abc"}
        });

        let response: SessionTokenResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.credentials.access_key_id, "ASIA");
    }
}
