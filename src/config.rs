//! Configuration for a session manager run.

use std::env;
use std::path::PathBuf;

/// Profile used when `AWS_PROFILE` is unset.
pub const DEFAULT_PROFILE: &str = "default";

/// Environment variables read by [`Config::from_env`].
pub mod vars {
    /// Selects the AWS profile.
    pub const PROFILE: &str = "AWS_PROFILE";
    /// Overrides the profile's configured `mfa_serial`.
    pub const MFA_SERIAL: &str = "AWS_MFA_SERIAL";
    /// One-time MFA code, used for the first prompt only.
    pub const MFA_TOKEN: &str = "AWS_MFA_TOKEN";
    /// Session duration in seconds passed to `GetSessionToken`.
    pub const MFA_TTL: &str = "AWS_MFA_TTL";
    /// Any non-empty value selects the `aws` CLI exchanger.
    pub const SHELL: &str = "AWS_MFA_SECURE_SHELL";
    /// Base directory holding `.aws/aws-mfa-secure-sessions`.
    pub const HOME: &str = "AWS_MFA_SECURE_HOME";
}

/// How MFA codes are exchanged for session credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExchangeMode {
    /// Call STS through the AWS SDK.
    #[default]
    Sdk,
    /// Shell out to `aws sts get-session-token`.
    Shell,
}

impl std::fmt::Display for ExchangeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sdk => write!(f, "sdk"),
            Self::Shell => write!(f, "shell"),
        }
    }
}

/// Settings for one invocation.
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use aws_mfa_secure::{Config, ExchangeMode};
///
/// let config = Config::new("dev")
///     .with_mfa_serial("arn:aws:iam::123456789012:mfa/alice")
///     .with_duration_seconds("3600")
///     .with_exchange(ExchangeMode::Shell);
///
/// assert_eq!(config.profile, "dev");
/// assert_eq!(config.exchange, ExchangeMode::Shell);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// AWS profile name
    pub profile: String,

    /// MFA device override; takes precedence over the profile's `mfa_serial`
    pub mfa_serial: Option<String>,

    /// Pre-supplied one-time code, consumed by the first prompt
    pub mfa_token: Option<String>,

    /// Session duration in seconds, passed through verbatim
    pub duration_seconds: Option<String>,

    /// Base directory for the session cache (default: home directory)
    pub base_dir: Option<PathBuf>,

    /// Token exchange implementation
    pub exchange: ExchangeMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            mfa_serial: None,
            mfa_token: None,
            duration_seconds: None,
            base_dir: None,
            exchange: ExchangeMode::default(),
        }
    }
}

impl Config {
    /// Creates a configuration for the given profile.
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Default::default()
        }
    }

    /// Snapshots the process environment.
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            profile: get(vars::PROFILE).unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            mfa_serial: get(vars::MFA_SERIAL),
            mfa_token: get(vars::MFA_TOKEN),
            duration_seconds: get(vars::MFA_TTL),
            base_dir: get(vars::HOME).map(PathBuf::from),
            exchange: if get(vars::SHELL).is_some() {
                ExchangeMode::Shell
            } else {
                ExchangeMode::Sdk
            },
        }
    }

    /// Sets the profile name.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Overrides the MFA device identifier.
    pub fn with_mfa_serial(mut self, serial: impl Into<String>) -> Self {
        self.mfa_serial = Some(serial.into());
        self
    }

    /// Supplies a one-time code for the first prompt.
    pub fn with_mfa_token(mut self, token: impl Into<String>) -> Self {
        self.mfa_token = Some(token.into());
        self
    }

    /// Sets the requested session duration in seconds.
    pub fn with_duration_seconds(mut self, seconds: impl Into<String>) -> Self {
        self.duration_seconds = Some(seconds.into());
        self
    }

    /// Sets the base directory the cache lives under.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Selects the token exchange implementation.
    pub fn with_exchange(mut self, mode: ExchangeMode) -> Self {
        self.exchange = mode;
        self
    }
}
