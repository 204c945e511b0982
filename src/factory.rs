//! Construction of the configured token exchanger.

use crate::cli::SystemAwsCli;
use crate::exchanger::TokenExchanger;
use crate::exchangers::shell::ShellExchanger;
use crate::{Config, ExchangeMode, Result};

/// Creates the exchanger selected by `config.exchange`.
///
/// Construction is cheap: the SDK client is only built on first use.
///
/// # Errors
///
/// Returns an error if [`ExchangeMode::Sdk`] is requested but the crate was
/// built without the `sdk` feature.
///
/// # Example
///
/// ```
/// use aws_mfa_secure::{factory, Config, ExchangeMode};
///
/// let config = Config::new("default").with_exchange(ExchangeMode::Shell);
/// let exchanger = factory::new_exchanger(&config).unwrap();
/// assert_eq!(exchanger.name(), "shell");
/// ```
pub fn new_exchanger(config: &Config) -> Result<Box<dyn TokenExchanger>> {
    match config.exchange {
        ExchangeMode::Shell => Ok(Box::new(ShellExchanger::new(
            config.profile.clone(),
            Box::new(SystemAwsCli),
        ))),
        #[cfg(feature = "sdk")]
        ExchangeMode::Sdk => Ok(Box::new(crate::exchangers::sdk::SdkExchanger::new(
            config.profile.clone(),
        ))),
        #[cfg(not(feature = "sdk"))]
        ExchangeMode::Sdk => Err(crate::MfaSecureError::Other(anyhow::anyhow!(
            "sdk exchange is unavailable (did you enable the 'sdk' feature flag?)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_mode() {
        let config = Config::new("dev").with_exchange(ExchangeMode::Shell);
        assert_eq!(new_exchanger(&config).unwrap().name(), "shell");
    }

    #[test]
    #[cfg(feature = "sdk")]
    fn test_sdk_mode() {
        let config = Config::new("dev");
        assert_eq!(new_exchanger(&config).unwrap().name(), "sdk");
    }

    #[test]
    #[cfg(not(feature = "sdk"))]
    fn test_sdk_mode_without_feature() {
        let Err(err) = new_exchanger(&Config::new("dev")) else {
            panic!("expected an error without the sdk feature");
        };
        assert!(err.to_string().contains("feature flag"));
    }
}
