//! Command execution and the `aws` CLI seam.
//!
//! Profile lookups and the shell token exchange both go through [`AwsCli`],
//! so tests can substitute a scripted implementation for the real binary.

use crate::{MfaSecureError, Result};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Program name of the AWS CLI.
pub const AWS_PROGRAM: &str = "aws";

fn spawn_output(program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    for (key, value) in env {
        cmd.env(key, value);
    }

    debug!(program, ?args, "running command");

    cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MfaSecureError::CliNotInstalled(format!("{} command not found", program))
        } else {
            MfaSecureError::Io(e)
        }
    })
}

/// Executes a command and returns stdout as a string.
///
/// # Errors
///
/// - [`MfaSecureError::CliNotInstalled`] if the program is not on `PATH`
/// - [`MfaSecureError::CommandFailed`] if the exit code is non-zero
/// - [`MfaSecureError::Other`] if stdout is not valid UTF-8
pub fn run_command(program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<String> {
    let output = spawn_output(program, args, env)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MfaSecureError::CommandFailed(format!(
            "{} failed with exit code {}: {}",
            program,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout).map_err(|e| {
        MfaSecureError::Other(anyhow::anyhow!("Invalid UTF-8 in command output: {}", e))
    })
}

/// Executes a command and returns stdout followed by stderr.
///
/// The exit status is ignored; callers inspect the text instead. This is
/// the `2>&1` capture the shell token exchange relies on.
pub fn run_command_combined(program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<String> {
    let output = spawn_output(program, args, env)?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(combined)
}

/// Checks if a command-line tool is available in PATH.
pub fn check_command_exists(program: &str) -> Result<bool> {
    let status = Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(MfaSecureError::Io)?;

    Ok(status.success())
}

/// The two AWS CLI operations the session manager depends on.
pub trait AwsCli {
    /// Runs `aws configure get <property> --profile <profile>` and returns the
    /// raw stdout. An unset property yields an empty string.
    fn configure_get(&self, profile: &str, property: &str) -> Result<String>;

    /// Runs `aws sts get-session-token <args>` and returns combined
    /// stdout/stderr regardless of exit status.
    fn get_session_token(&self, profile: &str, args: &[String]) -> Result<String>;
}

/// [`AwsCli`] backed by the installed `aws` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAwsCli;

impl AwsCli for SystemAwsCli {
    fn configure_get(&self, profile: &str, property: &str) -> Result<String> {
        let args = ["configure", "get", property, "--profile", profile];
        match run_command(AWS_PROGRAM, &args, &[]) {
            Ok(out) => Ok(out),
            // `aws configure get` exits 1 when the property is not set
            Err(MfaSecureError::CommandFailed(_)) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    fn get_session_token(&self, profile: &str, args: &[String]) -> Result<String> {
        let mut full: Vec<&str> = vec!["sts", "get-session-token"];
        full.extend(args.iter().map(String::as_str));
        full.extend(["--profile", profile, "--output", "json"]);
        run_command_combined(AWS_PROGRAM, &full, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_success() {
        let output = run_command("echo", &["hello"], &[]).unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[test]
    fn test_run_command_not_found() {
        let result = run_command("nonexistent-command-12345", &[], &[]);
        assert!(matches!(result, Err(MfaSecureError::CliNotInstalled(_))));
    }

    #[test]
    fn test_run_command_nonzero_exit() {
        let result = run_command("sh", &["-c", "echo oops >&2; exit 3"], &[]);
        match result {
            Err(MfaSecureError::CommandFailed(msg)) => {
                assert!(msg.contains("exit code 3"));
                assert!(msg.contains("oops"));
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_run_command_with_env() {
        let output = run_command("printenv", &["TEST_VAR"], &[("TEST_VAR", "test-value")]).unwrap();
        assert_eq!(output.trim(), "test-value");
    }

    #[test]
    fn test_run_command_combined_captures_both_streams() {
        let output =
            run_command_combined("sh", &["-c", "echo out; echo err >&2; exit 1"], &[]).unwrap();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[test]
    fn test_check_command_exists() {
        assert!(check_command_exists("echo").unwrap());
        assert!(!check_command_exists("nonexistent-command-12345").unwrap());
    }
}
