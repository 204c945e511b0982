//! aws-mfa-secure - MFA-gated AWS session credentials, cached per profile.
//!
//! Profiles that authenticate with static access keys and declare an
//! `mfa_serial` need a one-time code for every `GetSessionToken` call. This
//! crate caches the resulting temporary credentials on disk so the user is
//! only prompted again once the cached session has expired.
//!
//! # Features
//!
//! - **Freshness check**: the cached expiration decides whether to prompt
//! - **Bounded retry**: three attempts per MFA challenge, then give up
//! - **Two exchangers**: AWS SDK or `aws sts get-session-token`, same result
//! - **Lazy profile reads**: each `aws configure get` runs at most once
//! - **Error Context**: typed errors for invalid codes, denials and corrupt caches
//!
//! # Quick Start
//!
//! ```no_run
//! use aws_mfa_secure::{Config, MfaSecure, Resolution};
//!
//! fn main() -> aws_mfa_secure::Result<()> {
//!     let config = Config::from_env().with_profile("dev");
//!     let mut manager = MfaSecure::new(config)?;
//!
//!     if let Some(creds) = manager.ensure_session()?.credentials() {
//!         println!("session valid until {}", creds.expiration);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cache layout
//!
//! | Path | Contents |
//! |------|----------|
//! | `~/.aws/aws-mfa-secure-sessions/<profile>` | `{access_key_id, secret_access_key, session_token, expiration}` |
//!
//! # Feature Flags
//!
//! | Feature | Default | Provides |
//! |---------|---------|----------|
//! | `sdk` | yes | [`exchangers::sdk::SdkExchanger`] (aws-sdk-sts) |
//! | `mock` | yes | [`exchangers::mock::MockExchanger`] for tests |

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exchanger;
pub mod exchangers;
pub mod factory;
pub mod keys;
pub mod manager;
pub mod profile;
pub mod session;
pub mod validation;

pub use config::{Config, ExchangeMode};
pub use error::{MfaSecureError, Result};
pub use exchanger::{SessionTokenRequest, SessionTokenResponse, TokenExchanger};
pub use manager::{AcquireOutcome, MfaSecure, Resolution, MAX_ATTEMPTS};
pub use session::{CachedSession, SessionStore};
