//! Profile properties read through `aws configure get`.

use crate::cli::AwsCli;
use crate::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;

/// Profile property names as understood by `aws configure get`.
pub mod props {
    pub const ACCESS_KEY_ID: &str = "aws_access_key_id";
    pub const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
    pub const ROLE_ARN: &str = "role_arn";
    pub const SOURCE_PROFILE: &str = "source_profile";
    pub const MFA_SERIAL: &str = "mfa_serial";
}

/// Lazily fetched, memoized view of one profile's configuration.
///
/// Every `aws configure get` call costs a few hundred milliseconds, so each
/// property is fetched at most once for the lifetime of this value. Absent
/// properties are memoized too.
pub struct ProfileConfig {
    name: String,
    cli: Box<dyn AwsCli>,
    cache: RefCell<HashMap<String, Option<String>>>,
}

impl ProfileConfig {
    /// Creates a reader for `name`; nothing is fetched until first access.
    pub fn new(name: impl Into<String>, cli: Box<dyn AwsCli>) -> Self {
        Self {
            name: name.into(),
            cli,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a property value, or `None` if the profile does not set it.
    ///
    /// Output is trimmed; empty output means absent.
    ///
    /// # Errors
    ///
    /// Propagates failures to run the CLI itself (for example
    /// [`MfaSecureError::CliNotInstalled`](crate::MfaSecureError::CliNotInstalled)).
    /// Failed lookups are not memoized.
    pub fn get(&self, property: &str) -> Result<Option<String>> {
        if let Some(value) = self.cache.borrow().get(property) {
            return Ok(value.clone());
        }

        let raw = self.cli.configure_get(&self.name, property)?;
        let trimmed = raw.trim();
        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());

        debug!(
            profile = %self.name,
            property,
            present = value.is_some(),
            "read profile property"
        );

        self.cache
            .borrow_mut()
            .insert(property.to_string(), value.clone());
        Ok(value)
    }

    pub fn access_key_id(&self) -> Result<Option<String>> {
        self.get(props::ACCESS_KEY_ID)
    }

    pub fn secret_access_key(&self) -> Result<Option<String>> {
        self.get(props::SECRET_ACCESS_KEY)
    }

    pub fn role_arn(&self) -> Result<Option<String>> {
        self.get(props::ROLE_ARN)
    }

    pub fn source_profile(&self) -> Result<Option<String>> {
        self.get(props::SOURCE_PROFILE)
    }

    pub fn mfa_serial(&self) -> Result<Option<String>> {
        self.get(props::MFA_SERIAL)
    }
}
