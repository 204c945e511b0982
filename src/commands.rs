//! Command-line interface.

use crate::cli::{check_command_exists, AWS_PROGRAM};
use crate::manager::{MfaSecure, Resolution};
use crate::session::CachedSession;
use crate::{Config, ExchangeMode};
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::process::{Command, ExitCode};
use tracing::{debug, info};

/// Exit status when the MFA challenge is failed too many times.
pub const EXIT_GAVE_UP: u8 = 1;

#[derive(Debug, Clone, Parser)]
#[command(name = "aws-mfa-secure", version, about = "Cache MFA session credentials for the AWS CLI", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    #[arg(
        short = 'p',
        long,
        global = true,
        help = "AWS profile name (default: $AWS_PROFILE or \"default\")"
    )]
    pub profile: Option<String>,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[arg(long, global = true, help = "Exchange the code with `aws sts get-session-token` instead of the SDK")]
    pub shell: bool,

    #[arg(long, global = true, help = "One-time MFA code to use instead of prompting (default: $AWS_MFA_TOKEN)")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Session duration in seconds (default: $AWS_MFA_TTL)")]
    pub duration: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Run an aws command with MFA session credentials")]
    Session(SessionCommand),
    #[command(about = "Print export statements for the MFA session credentials")]
    Exports,
    #[command(about = "Print unset statements for the session environment variables")]
    Unsets,
    #[command(about = "Print the session in credential_process JSON format")]
    Credentials,
    #[command(about = "Show whether MFA is required and the cached session is fresh")]
    Status,
}

#[derive(Debug, Clone, Args)]
pub struct SessionCommand {
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Arguments passed to the aws CLI"
    )]
    pub args: Vec<String>,
}

impl Cli {
    /// Applies command-line overrides on top of the environment.
    pub fn config(&self, base: Config) -> Config {
        let mut config = base;
        if let Some(ref profile) = self.profile {
            config = config.with_profile(profile);
        }
        if let Some(ref token) = self.token {
            config = config.with_mfa_token(token);
        }
        if let Some(ref duration) = self.duration {
            config = config.with_duration_seconds(duration);
        }
        if self.shell {
            config = config.with_exchange(ExchangeMode::Shell);
        }
        config
    }

    pub fn execute(self) -> Result<ExitCode> {
        match self.command {
            Commands::Unsets => Ok(print_unsets()),
            _ => {
                let mut manager = MfaSecure::new(self.config(Config::from_env()))?;
                self.run(&mut manager)
            }
        }
    }

    /// Runs the subcommand against an existing manager.
    pub fn run(self, manager: &mut MfaSecure) -> Result<ExitCode> {
        match self.command {
            Commands::Session(cmd) => {
                let resolution = manager.ensure_session()?;
                if let Resolution::GaveUp { .. } = resolution {
                    return Ok(ExitCode::from(EXIT_GAVE_UP));
                }
                cmd.execute(resolution.credentials())
            }
            Commands::Exports => {
                let resolution = manager.ensure_session()?;
                if let Resolution::GaveUp { .. } = resolution {
                    return Ok(ExitCode::from(EXIT_GAVE_UP));
                }
                if let Some(creds) = resolution.credentials() {
                    print!("{}", render_exports(creds));
                }
                Ok(ExitCode::SUCCESS)
            }
            Commands::Unsets => Ok(print_unsets()),
            Commands::Credentials => {
                let resolution = manager.ensure_session()?;
                match resolution {
                    Resolution::GaveUp { .. } => Ok(ExitCode::from(EXIT_GAVE_UP)),
                    Resolution::NotRequired => anyhow::bail!(
                        "profile {} does not use MFA with static keys; nothing to print",
                        manager.profile_name()
                    ),
                    Resolution::Cached(creds) | Resolution::Refreshed(creds) => {
                        println!("{}", serde_json::to_string_pretty(&credential_process(&creds))?);
                        Ok(ExitCode::SUCCESS)
                    }
                }
            }
            Commands::Status => {
                print!("{}", status_report(manager)?);
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn print_unsets() -> ExitCode {
    print!("{}", render_unsets());
    ExitCode::SUCCESS
}

impl SessionCommand {
    /// Runs `aws <args>`, injecting `creds` into its environment if present.
    pub fn execute(self, creds: Option<&CachedSession>) -> Result<ExitCode> {
        let mut cmd = Command::new(AWS_PROGRAM);
        cmd.args(&self.args);

        if let Some(creds) = creds {
            debug!("injecting MFA session credentials");
            cmd.envs(creds.env_vars());
        }

        info!(args = ?self.args, "running aws");
        let status = cmd
            .status()
            .with_context(|| format!("Failed to run {}", AWS_PROGRAM))?;

        let code = status.code().unwrap_or(1);
        Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
    }
}

/// Shell statements exporting the session.
pub fn render_exports(creds: &CachedSession) -> String {
    creds
        .env_vars()
        .iter()
        .map(|(key, value)| format!("export {}={}\n", key, value))
        .collect()
}

/// Shell statements removing the session variables.
pub fn render_unsets() -> String {
    ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"]
        .iter()
        .map(|key| format!("unset {}\n", key))
        .collect()
}

/// The session in the shape `credential_process` expects.
pub fn credential_process(creds: &CachedSession) -> serde_json::Value {
    serde_json::json!({
        "Version": 1,
        "AccessKeyId": creds.access_key_id,
        "SecretAccessKey": creds.secret_access_key,
        "SessionToken": creds.session_token,
        "Expiration": creds.expiration,
    })
}

fn status_report(manager: &MfaSecure) -> crate::Result<String> {
    let mut report = format!("profile: {}\n", manager.profile_name());

    if !check_command_exists(AWS_PROGRAM)? {
        report.push_str("aws cli: not found on PATH\n");
        return Ok(report);
    }

    let required = manager.is_mfa_required()?;
    report.push_str(&format!("mfa required: {}\n", required));
    report.push_str(&format!("cache: {}\n", manager.store().path().display()));

    let state = match manager.has_valid_cache() {
        Ok(true) => format!("valid until {}", manager.load()?.expiration),
        Ok(false) if manager.store().exists() => "expired".to_string(),
        Ok(false) => "missing".to_string(),
        Err(err) => format!("unreadable ({})", err),
    };
    report.push_str(&format!("session: {}\n", state));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    fn creds() -> CachedSession {
        CachedSession {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "abc/def+ghi=".to_string(),
            session_token: "FwoGZXIvYXdzE".to_string(),
            expiration: "2026-10-17T20:15:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_command_structure_validation() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command_shows_help() {
        let result = Cli::try_parse_from(["aws-mfa-secure"]);
        assert_eq!(
            result.unwrap_err().kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn test_session_passes_through_hyphenated_args() {
        let cli = Cli::try_parse_from([
            "aws-mfa-secure",
            "session",
            "s3",
            "ls",
            "--region",
            "eu-west-1",
        ])
        .unwrap();

        match cli.command {
            Commands::Session(cmd) => assert_eq!(cmd.args, ["s3", "ls", "--region", "eu-west-1"]),
            _ => panic!("Expected Session command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "aws-mfa-secure",
            "-p",
            "prod",
            "--shell",
            "--token",
            "123456",
            "--duration",
            "900",
            "-vv",
            "exports",
        ])
        .unwrap();

        assert_eq!(cli.profile.as_deref(), Some("prod"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Exports));

        let config = cli.config(Config::default());
        assert_eq!(config.profile, "prod");
        assert_eq!(config.mfa_token.as_deref(), Some("123456"));
        assert_eq!(config.duration_seconds.as_deref(), Some("900"));
        assert_eq!(config.exchange, ExchangeMode::Shell);
    }

    #[test]
    fn test_flags_do_not_clear_environment_values() {
        let cli = Cli::try_parse_from(["aws-mfa-secure", "status"]).unwrap();
        let config = cli.config(Config::new("from-env").with_mfa_token("999999"));

        assert_eq!(config.profile, "from-env");
        assert_eq!(config.mfa_token.as_deref(), Some("999999"));
        assert_eq!(config.exchange, ExchangeMode::Sdk);
    }

    #[cfg(feature = "mock")]
    mod run {
        use super::*;
        use crate::exchangers::mock::MockExchanger;
        use crate::profile::fake::FakeAwsCli;
        use crate::MfaSecureError;
        use std::io::Cursor;
        use tempfile::{tempdir, TempDir};

        fn mfa_manager(dir: &TempDir, exchanger: &MockExchanger) -> MfaSecure {
            let cli = FakeAwsCli::with(&[
                ("mfa_serial", "arn:aws:iam::123456789012:mfa/alice"),
                ("aws_access_key_id", "AKIAEXAMPLE"),
                ("aws_secret_access_key", "static-secret"),
            ]);
            MfaSecure::with_parts(
                Config::new("default").with_base_dir(dir.path()),
                Box::new(cli),
                Box::new(exchanger.clone()),
                Box::new(Cursor::new(b"111111\n222222\n333333\n".to_vec())),
            )
            .unwrap()
        }

        fn exit_after_three_bad_codes(args: &[&str]) -> ExitCode {
            let dir = tempdir().unwrap();
            let exchanger = MockExchanger::new();
            for _ in 0..3 {
                exchanger.push_error(MfaSecureError::InvalidMfaCode("bad code".into()));
            }
            let mut manager = mfa_manager(&dir, &exchanger);

            let cli = Cli::try_parse_from(args).unwrap();
            let code = cli.run(&mut manager).unwrap();

            assert_eq!(exchanger.requests().len(), 3);
            assert!(!manager.store().exists());
            code
        }

        #[test]
        fn test_exports_exits_one_after_giving_up() {
            let code = exit_after_three_bad_codes(&["aws-mfa-secure", "exports"]);
            assert_eq!(code, ExitCode::from(EXIT_GAVE_UP));
        }

        #[test]
        fn test_session_exits_one_without_running_aws() {
            let code = exit_after_three_bad_codes(&["aws-mfa-secure", "session", "s3", "ls"]);
            assert_eq!(code, ExitCode::from(1));
        }

        #[test]
        fn test_credentials_exits_one_after_giving_up() {
            let code = exit_after_three_bad_codes(&["aws-mfa-secure", "credentials"]);
            assert_eq!(code, ExitCode::from(1));
        }

        #[test]
        fn test_exports_succeeds_and_saves_session() {
            let dir = tempdir().unwrap();
            let exchanger = MockExchanger::new();
            exchanger.push_success(creds());
            let mut manager = mfa_manager(&dir, &exchanger);

            let cli = Cli::try_parse_from(["aws-mfa-secure", "exports"]).unwrap();
            assert_eq!(cli.run(&mut manager).unwrap(), ExitCode::SUCCESS);
            assert_eq!(manager.load().unwrap(), creds());
        }

        #[test]
        fn test_unsets_never_touches_the_exchanger() {
            let dir = tempdir().unwrap();
            let exchanger = MockExchanger::new();
            let mut manager = mfa_manager(&dir, &exchanger);

            let cli = Cli::try_parse_from(["aws-mfa-secure", "unsets"]).unwrap();
            assert_eq!(cli.run(&mut manager).unwrap(), ExitCode::SUCCESS);
            assert!(exchanger.requests().is_empty());
        }
    }

    #[test]
    fn test_render_exports() {
        assert_eq!(
            render_exports(&creds()),
            "export AWS_ACCESS_KEY_ID=ASIAEXAMPLE\n\
             export AWS_SECRET_ACCESS_KEY=abc/def+ghi=\n\
             export AWS_SESSION_TOKEN=FwoGZXIvYXdzE\n"
        );
    }

    #[test]
    fn test_render_unsets() {
        let out = render_unsets();
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("unset AWS_SESSION_TOKEN\n"));
    }

    #[test]
    fn test_credential_process_shape() {
        let value = credential_process(&creds());
        assert_eq!(value["Version"], 1);
        assert_eq!(value["AccessKeyId"], "ASIAEXAMPLE");
        assert_eq!(value["Expiration"], "2026-10-17T20:15:00+00:00");
    }
}
