//! Cached MFA session credentials.
//!
//! This module provides the [`CachedSession`] record and the [`SessionStore`]
//! that persists it per profile under
//! `<base>/.aws/aws-mfa-secure-sessions/<profile>` and decides whether it is
//! still fresh.

use crate::validation::validate_profile_name;
use crate::{MfaSecureError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the base dir that holds one file per profile.
pub const SESSIONS_DIR: &str = ".aws/aws-mfa-secure-sessions";

/// Temporary credentials returned by `GetSessionToken`.
///
/// `expiration` is kept exactly as received so a save/load round trip is
/// byte-for-byte stable; use [`CachedSession::expires_at`] to interpret it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSession {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// ISO-8601 timestamp
    pub expiration: String,
}

impl std::fmt::Debug for CachedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSession")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl CachedSession {
    /// Parses the expiration timestamp.
    ///
    /// Accepts RFC 3339 (what STS and the AWS CLI emit) as well as the
    /// `2026-10-17 20:15:00 UTC` form written by older tooling.
    pub fn expires_at(&self) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
        parse_expiration(&self.expiration)
    }

    /// Returns true if `now` is strictly before the expiration.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> std::result::Result<bool, chrono::ParseError> {
        Ok(now < self.expires_at()?)
    }

    /// Environment variables that make the AWS CLI and SDKs use this session.
    pub fn env_vars(&self) -> [(&'static str, &str); 3] {
        [
            ("AWS_ACCESS_KEY_ID", self.access_key_id.as_str()),
            ("AWS_SECRET_ACCESS_KEY", self.secret_access_key.as_str()),
            ("AWS_SESSION_TOKEN", self.session_token.as_str()),
        ]
    }
}

fn parse_expiration(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z").map(|dt| dt.with_timezone(&Utc))
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S UTC").map(|dt| dt.and_utc())
        })
}

/// Per-profile session file with a memoized read.
///
/// # Security
///
/// - The sessions directory is created with mode 0700 on Unix
/// - Session files are written with mode 0600 on Unix
/// - Expired sessions are never deleted, only bypassed and later overwritten
///
/// # Example
///
/// ```no_run
/// use aws_mfa_secure::session::{CachedSession, SessionStore};
///
/// fn main() -> aws_mfa_secure::Result<()> {
///     let store = SessionStore::for_profile("/home/alice", "default")?;
///
///     if store.needs_refresh()? {
///         store.save(&CachedSession {
///             access_key_id: "ASIA...".into(),
///             secret_access_key: "...".into(),
///             session_token: "...".into(),
///             expiration: "2030-01-01T00:00:00Z".into(),
///         })?;
///     }
///
///     println!("{}", store.load()?.access_key_id);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    loaded: RefCell<Option<CachedSession>>,
}

impl SessionStore {
    /// Creates a store backed by an explicit file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            loaded: RefCell::new(None),
        }
    }

    /// Creates the store for `profile` under `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MfaSecureError::InvalidProfileName`] if the profile name
    /// cannot be used as a file name.
    pub fn for_profile(base_dir: impl AsRef<Path>, profile: &str) -> Result<Self> {
        validate_profile_name(profile)?;
        Ok(Self::new(base_dir.as_ref().join(SESSIONS_DIR).join(profile)))
    }

    /// The user's home directory, the default base for the sessions dir.
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir().ok_or(MfaSecureError::HomeDirNotFound)
    }

    /// Returns the cache file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a cache file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the cached session.
    ///
    /// The file is read once; later calls return the memoized record until
    /// [`save`](Self::save) replaces it.
    ///
    /// # Errors
    ///
    /// - [`MfaSecureError::Io`] if the file cannot be read (including when
    ///   it does not exist)
    /// - [`MfaSecureError::CacheCorrupt`] if it is not a valid session record
    pub fn load(&self) -> Result<CachedSession> {
        if let Some(session) = self.loaded.borrow().as_ref() {
            return Ok(session.clone());
        }

        let data = fs::read(&self.path)?;
        let session: CachedSession = serde_json::from_slice(&data)
            .map_err(|e| MfaSecureError::cache_corrupt(&self.path, e))?;

        debug!(path = %self.path.display(), expiration = %session.expiration, "loaded cached session");

        *self.loaded.borrow_mut() = Some(session.clone());
        Ok(session)
    }

    /// Writes `session` as pretty-printed JSON, replacing any previous file.
    ///
    /// Parent directories are created as needed. The memoized copy is
    /// dropped so the next [`load`](Self::load) observes the new record.
    pub fn save(&self, session: &CachedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(parent)?.permissions();
                perms.set_mode(0o700);
                fs::set_permissions(parent, perms)?;
            }
        }

        let json = serde_json::to_vec_pretty(session)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata()?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        file.write_all(&json)?;
        file.flush()?;

        self.loaded.borrow_mut().take();
        debug!(path = %self.path.display(), "saved session");
        Ok(())
    }

    /// Returns true if a cached session exists and has not expired.
    ///
    /// # Errors
    ///
    /// Returns [`MfaSecureError::CacheCorrupt`] if the file exists but holds
    /// invalid JSON or an unparseable expiration.
    pub fn has_valid_cache(&self) -> Result<bool> {
        self.has_valid_cache_at(Utc::now())
    }

    /// [`has_valid_cache`](Self::has_valid_cache) against an explicit clock.
    pub fn has_valid_cache_at(&self, now: DateTime<Utc>) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }

        let session = self.load()?;
        session
            .is_valid_at(now)
            .map_err(|e| MfaSecureError::cache_corrupt(&self.path, format!("expiration: {}", e)))
    }

    /// Inverse of [`has_valid_cache`](Self::has_valid_cache).
    pub fn needs_refresh(&self) -> Result<bool> {
        Ok(!self.has_valid_cache()?)
    }
}
