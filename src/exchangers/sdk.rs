//! Token exchange through the AWS SDK.

use crate::exchanger::{SessionTokenRequest, SessionTokenResponse, TokenExchanger};
use crate::session::CachedSession;
use crate::{MfaSecureError, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_sts::primitives::DateTimeFormat;
use aws_sdk_sts::Client as StsClient;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// Region used when the profile and environment configure none.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Exchanger that calls STS `GetSessionToken` with the official SDK.
///
/// The client (and the single-threaded runtime that drives it) is built on
/// the first exchange and reused for retries.
pub struct SdkExchanger {
    profile: String,
    connection: Option<(Runtime, StsClient)>,
}

impl SdkExchanger {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            connection: None,
        }
    }

    fn connect(&mut self) -> Result<&mut (Runtime, StsClient)> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let runtime = Builder::new_current_thread().enable_all().build()?;
                let config = runtime.block_on(load_sdk_config(&self.profile));
                (runtime, StsClient::new(&config))
            }
        };
        Ok(self.connection.insert(connection))
    }
}

// Priority: ENV vars -> Config file -> DEFAULT_AWS_REGION
async fn load_sdk_config(profile: &str) -> SdkConfig {
    let loaded = aws_config::defaults(BehaviorVersion::latest())
        .profile_name(profile)
        .load()
        .await;

    match loaded.region() {
        Some(region) => {
            debug!("Using region: {}", region);
            loaded
        }
        None => {
            info!(
                "No region configured, using default {} for STS",
                DEFAULT_AWS_REGION
            );
            aws_config::defaults(BehaviorVersion::latest())
                .profile_name(profile)
                .region(Region::new(DEFAULT_AWS_REGION))
                .load()
                .await
        }
    }
}

impl TokenExchanger for SdkExchanger {
    fn name(&self) -> &str {
        "sdk"
    }

    fn get_session_token(&mut self, request: &SessionTokenRequest) -> Result<SessionTokenResponse> {
        let duration = request
            .duration_seconds
            .as_deref()
            .map(parse_duration)
            .transpose()?;

        let (runtime, client) = self.connect()?;

        let mut call = client
            .get_session_token()
            .serial_number(&request.serial_number)
            .token_code(&request.token_code);
        if let Some(seconds) = duration {
            call = call.duration_seconds(seconds);
        }

        info!("Calling AWS STS GetSessionToken");
        let output = runtime.block_on(call.send()).map_err(|err| {
            match err.as_service_error() {
                Some(service) => classify(service.code(), service.message()),
                None => MfaSecureError::Sts(DisplayErrorContext(&err).to_string()),
            }
        })?;

        let creds = output
            .credentials()
            .ok_or_else(|| MfaSecureError::Sts("AWS STS returned no credentials".to_string()))?;

        let expiration = creds
            .expiration()
            .fmt(DateTimeFormat::DateTime)
            .map_err(|e| MfaSecureError::Other(e.into()))?;

        Ok(SessionTokenResponse {
            credentials: CachedSession {
                access_key_id: creds.access_key_id().to_string(),
                secret_access_key: creds.secret_access_key().to_string(),
                session_token: creds.session_token().to_string(),
                expiration,
            },
        })
    }
}

fn parse_duration(raw: &str) -> Result<i32> {
    raw.trim().parse().map_err(|e| {
        MfaSecureError::Other(anyhow::anyhow!("invalid session duration {:?}: {}", raw, e))
    })
}

/// Maps an STS error code onto the crate's error kinds.
fn classify(code: Option<&str>, message: Option<&str>) -> MfaSecureError {
    let message = message.unwrap_or_default().to_string();
    match code {
        Some("ValidationError") => MfaSecureError::InvalidMfaCode(message),
        Some("AccessDenied") if message.contains("invalid MFA") => {
            MfaSecureError::InvalidMfaCode(message)
        }
        Some("AccessDenied") => MfaSecureError::AccessDenied(message),
        Some(other) => MfaSecureError::Sts(format!("{}: {}", other, message)),
        None => MfaSecureError::Sts(message),
    }
}
