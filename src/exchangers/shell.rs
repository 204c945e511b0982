//! Token exchange through `aws sts get-session-token`.

use crate::cli::AwsCli;
use crate::exchanger::{SessionTokenRequest, SessionTokenResponse, TokenExchanger};
use crate::keys::snake_case_keys;
use crate::{MfaSecureError, Result};
use tracing::debug;

/// Marker the CLI prints only when the exchange succeeded.
const SUCCESS_MARKER: &str = "\"Credentials\"";

/// Exchanger that shells out to the AWS CLI.
///
/// Output is captured with stderr folded in. Anything without a
/// `"Credentials"` key is reported as
/// [`MfaSecureError::UnrecognizedExchangeOutput`] carrying the raw text.
pub struct ShellExchanger {
    profile: String,
    cli: Box<dyn AwsCli>,
}

impl ShellExchanger {
    pub fn new(profile: impl Into<String>, cli: Box<dyn AwsCli>) -> Self {
        Self {
            profile: profile.into(),
            cli,
        }
    }
}

impl TokenExchanger for ShellExchanger {
    fn name(&self) -> &str {
        "shell"
    }

    fn get_session_token(&mut self, request: &SessionTokenRequest) -> Result<SessionTokenResponse> {
        let out = self
            .cli
            .get_session_token(&self.profile, &request.to_cli_args())?;

        parse_output(&out)
    }
}

/// Interprets `aws sts get-session-token` output.
pub(crate) fn parse_output(out: &str) -> Result<SessionTokenResponse> {
    if !out.contains(SUCCESS_MARKER) {
        return Err(MfaSecureError::UnrecognizedExchangeOutput(
            out.trim().to_string(),
        ));
    }

    let data: serde_json::Value = serde_json::from_str(out)?;
    let response = serde_json::from_value(snake_case_keys(data))?;
    debug!("parsed get-session-token output");
    Ok(response)
}
