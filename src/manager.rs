//! The session credential manager.
//!
//! [`MfaSecure`] ties one profile's configuration, its cached session and a
//! [`TokenExchanger`] together for a single invocation. Every memoized value
//! (profile properties, the loaded session, the STS client) lives in this
//! struct and is dropped with it.

use crate::cli::{AwsCli, SystemAwsCli};
use crate::exchanger::{SessionTokenRequest, TokenExchanger};
use crate::factory::new_exchanger;
use crate::profile::ProfileConfig;
use crate::session::{CachedSession, SessionStore};
use crate::{Config, MfaSecureError, Result};
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

/// Exchanges attempted before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Result of [`MfaSecure::acquire_session`].
#[derive(Debug)]
pub enum AcquireOutcome {
    /// New credentials, not yet persisted.
    Success(CachedSession),
    /// Every attempt failed with a retryable error.
    Exhausted {
        attempts: u32,
        last_error: MfaSecureError,
    },
}

/// Result of [`MfaSecure::ensure_session`].
#[derive(Debug)]
pub enum Resolution {
    /// The profile is not MFA-gated; nothing was read or written.
    NotRequired,
    /// The cached session is still valid.
    Cached(CachedSession),
    /// A new session was acquired and saved.
    Refreshed(CachedSession),
    /// The user failed the MFA challenge [`MAX_ATTEMPTS`] times.
    GaveUp {
        attempts: u32,
        last_error: MfaSecureError,
    },
}

impl Resolution {
    /// Credentials to export, if any.
    pub fn credentials(&self) -> Option<&CachedSession> {
        match self {
            Self::Cached(creds) | Self::Refreshed(creds) => Some(creds),
            Self::NotRequired | Self::GaveUp { .. } => None,
        }
    }
}

/// Session credential manager for one profile.
///
/// # Example
///
/// ```no_run
/// use aws_mfa_secure::{Config, MfaSecure, Resolution};
///
/// fn main() -> aws_mfa_secure::Result<()> {
///     let mut manager = MfaSecure::new(Config::from_env())?;
///
///     match manager.ensure_session()? {
///         Resolution::Cached(creds) | Resolution::Refreshed(creds) => {
///             println!("using {}", creds.access_key_id);
///         }
///         Resolution::NotRequired => println!("profile is not MFA-gated"),
///         Resolution::GaveUp { .. } => std::process::exit(1),
///     }
///     Ok(())
/// }
/// ```
pub struct MfaSecure {
    mfa_serial: Option<String>,
    mfa_token: Option<String>,
    duration_seconds: Option<String>,
    profile: ProfileConfig,
    store: SessionStore,
    exchanger: Box<dyn TokenExchanger>,
    input: Box<dyn BufRead>,
}

impl MfaSecure {
    /// Creates a manager using the installed `aws` CLI, the configured
    /// exchanger and standard input.
    ///
    /// # Errors
    ///
    /// - [`MfaSecureError::InvalidProfileName`] for unusable profile names
    /// - [`MfaSecureError::HomeDirNotFound`] if no base dir is configured and
    ///   the home directory is unknown
    pub fn new(config: Config) -> Result<Self> {
        let exchanger = new_exchanger(&config)?;
        Self::with_parts(
            config,
            Box::new(SystemAwsCli),
            exchanger,
            Box::new(io::stdin().lock()),
        )
    }

    /// Creates a manager from explicit collaborators.
    pub fn with_parts(
        config: Config,
        cli: Box<dyn AwsCli>,
        exchanger: Box<dyn TokenExchanger>,
        input: Box<dyn BufRead>,
    ) -> Result<Self> {
        let base_dir = match config.base_dir {
            Some(dir) => dir,
            None => SessionStore::default_base_dir()?,
        };
        let store = SessionStore::for_profile(&base_dir, &config.profile)?;

        debug!(
            profile = %config.profile,
            exchanger = exchanger.name(),
            cache = %store.path().display(),
            "session manager ready"
        );

        Ok(Self {
            mfa_serial: config.mfa_serial,
            mfa_token: config.mfa_token,
            duration_seconds: config.duration_seconds,
            profile: ProfileConfig::new(config.profile, cli),
            store,
            exchanger,
            input,
        })
    }

    pub fn profile_name(&self) -> &str {
        self.profile.name()
    }

    pub fn profile(&self) -> &ProfileConfig {
        &self.profile
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The MFA device: the override if set, else the profile's `mfa_serial`.
    pub fn mfa_serial(&self) -> Result<Option<String>> {
        match self.mfa_serial {
            Some(ref serial) => Ok(Some(serial.clone())),
            None => self.profile.mfa_serial(),
        }
    }

    /// Returns true if this tool should inject MFA session credentials.
    ///
    /// Requires an MFA device and static access keys. Profiles that assume
    /// a role (`role_arn`) or chain through `source_profile` are left alone:
    /// the AWS CLI already prompts for MFA on role assumption, and session
    /// credentials in the environment would override that flow.
    pub fn is_mfa_required(&self) -> Result<bool> {
        if self.mfa_serial()?.is_none() {
            return Ok(false);
        }

        let static_keys = self.profile.access_key_id()?.is_some()
            && self.profile.secret_access_key()?.is_some();

        Ok(static_keys
            && self.profile.role_arn()?.is_none()
            && self.profile.source_profile()?.is_none())
    }

    /// See [`SessionStore::has_valid_cache`].
    pub fn has_valid_cache(&self) -> Result<bool> {
        self.store.has_valid_cache()
    }

    /// See [`SessionStore::needs_refresh`].
    pub fn needs_refresh(&self) -> Result<bool> {
        self.store.needs_refresh()
    }

    /// See [`SessionStore::save`].
    pub fn save(&self, session: &CachedSession) -> Result<()> {
        self.store.save(session)
    }

    /// See [`SessionStore::load`].
    pub fn load(&self) -> Result<CachedSession> {
        self.store.load()
    }

    /// Obtains one MFA code.
    ///
    /// A pre-supplied code is handed out once and then forgotten, so a retry
    /// never resubmits it.
    fn read_token_code(&mut self) -> Result<String> {
        if let Some(token) = self.mfa_token.take() {
            debug!("using pre-supplied MFA code");
            return Ok(token);
        }

        let mut stderr = io::stderr();
        write!(stderr, "Please provide your MFA code: ")?;
        stderr.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MfaSecureError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no MFA code on standard input",
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Prompts for an MFA code and exchanges it for new credentials.
    ///
    /// Invalid codes, access denials and unrecognized exchange output are
    /// reported on stderr and retried, up to [`MAX_ATTEMPTS`] exchanges in
    /// total. The credentials are not saved.
    ///
    /// # Errors
    ///
    /// - [`MfaSecureError::MfaSerialNotConfigured`] if there is no MFA device
    /// - Any non-retryable exchange or input failure, immediately
    pub fn acquire_session(&mut self) -> Result<AcquireOutcome> {
        let serial = self
            .mfa_serial()?
            .ok_or_else(|| MfaSecureError::MfaSerialNotConfigured(self.profile_name().to_string()))?;

        let mut attempts = 0;
        loop {
            let code = self.read_token_code()?;
            let request = SessionTokenRequest::new(serial.clone(), code)
                .with_duration_seconds(self.duration_seconds.clone());

            match self.exchanger.get_session_token(&request) {
                Ok(response) => {
                    info!(
                        profile = %self.profile_name(),
                        expiration = %response.credentials.expiration,
                        "obtained MFA session credentials"
                    );
                    return Ok(AcquireOutcome::Success(response.credentials));
                }
                Err(err) if err.is_retryable() => {
                    attempts += 1;
                    debug!(attempt = attempts, error = %err, "MFA exchange failed");
                    eprintln!("{}", err);
                    eprintln!("Incorrect MFA code.  Please try again.");

                    if attempts >= MAX_ATTEMPTS {
                        eprintln!("Giving up after {} retries.", attempts);
                        return Ok(AcquireOutcome::Exhausted {
                            attempts,
                            last_error: err,
                        });
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Makes sure fresh credentials are cached when the profile needs them.
    ///
    /// A corrupt cache file is treated as expired and overwritten.
    pub fn ensure_session(&mut self) -> Result<Resolution> {
        if !self.is_mfa_required()? {
            debug!(profile = %self.profile_name(), "profile is not MFA-gated");
            return Ok(Resolution::NotRequired);
        }

        let fresh = match self.store.has_valid_cache() {
            Ok(fresh) => fresh,
            Err(err @ MfaSecureError::CacheCorrupt { .. }) => {
                warn!(error = %err, "ignoring unreadable cached session");
                false
            }
            Err(err) => return Err(err),
        };

        if fresh {
            debug!(profile = %self.profile_name(), "cached session still valid");
            return Ok(Resolution::Cached(self.store.load()?));
        }

        match self.acquire_session()? {
            AcquireOutcome::Success(creds) => {
                self.store.save(&creds)?;
                Ok(Resolution::Refreshed(creds))
            }
            AcquireOutcome::Exhausted {
                attempts,
                last_error,
            } => Ok(Resolution::GaveUp {
                attempts,
                last_error,
            }),
        }
    }
}
