use crate::error::{LocalExecutorError, Result};
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

/// A program plus the leading arguments configured for it, e.g.
/// `"mysqldump --single-transaction"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| LocalExecutorError::InvalidCommand("empty command".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Run `spec` followed by `extra_args` to completion and capture its output.
///
/// A launch failure or a non-zero exit status is an error. The child is
/// killed if the returned future is dropped before it finishes.
pub async fn run_command<I, S>(spec: &CommandSpec, extra_args: I) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .args(extra_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running command: {:?}", command.as_std());

    let output = command
        .output()
        .await
        .map_err(|source| LocalExecutorError::Launch {
            program: spec.program.clone(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        error!(
            "{} failed with exit code {:?}: {}",
            spec.program,
            output.status.code(),
            stderr
        );
        return Err(LocalExecutorError::CommandFailed {
            program: spec.program.clone(),
            code: output.status.code(),
            stderr,
        });
    }

    Ok(CommandOutput {
        stdout: output.stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_spec() {
        let spec = CommandSpec::parse("mysqldump  --single-transaction").unwrap();
        assert_eq!(spec.program, "mysqldump");
        assert_eq!(spec.args, vec!["--single-transaction".to_string()]);
    }

    #[test]
    fn test_parse_empty_command() {
        assert!(matches!(
            CommandSpec::parse("   "),
            Err(LocalExecutorError::InvalidCommand(_))
        ));
    }

    #[tokio::test]
    async fn test_run_command_captures_stdout() {
        let spec = CommandSpec::parse("echo hello").unwrap();
        let output = run_command(&spec, ["world"]).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello world\n");
    }

    #[tokio::test]
    async fn test_run_command_non_zero_exit() {
        let spec = CommandSpec::parse("sh -c").unwrap();
        let err = run_command(&spec, ["echo oops >&2; exit 3"]).await.unwrap_err();

        match err {
            LocalExecutorError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_command_launch_failure() {
        let spec = CommandSpec::parse("autobackup-no-such-binary").unwrap();
        let err = run_command(&spec, Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(err, LocalExecutorError::Launch { .. }));
    }
}
