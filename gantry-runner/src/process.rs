//! External process execution
//!
//! Every collaborator talks to the outside world through [`ProcessRunner`],
//! which keeps command construction testable without spawning anything.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::debug;

use crate::error::ToolError;

/// A fully described command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the runner's
    pub cwd: Option<PathBuf>,
    /// Variables added to the inherited environment
    pub env: BTreeMap<String, String>,
    /// Positions in `args` masked in [`CommandSpec::display`]
    pub secret_args: BTreeSet<usize>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Runs `command` through `sh -c`
    pub fn shell(command: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(command)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds an argument that never shows up in log output
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.insert(self.args.len());
        self.arg(arg)
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Command line for log output, with secret arguments masked
    pub fn display(&self) -> String {
        let args = self.args.iter().enumerate().map(|(i, arg)| {
            if self.secret_args.contains(&i) {
                "****"
            } else {
                arg.as_str()
            }
        });

        std::iter::once(self.program.as_str())
            .chain(args)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turns a non-zero exit into [`ToolError::NonZeroExit`]
    pub fn check(self, program: &str) -> Result<Self, ToolError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ToolError::NonZeroExit {
                program: program.to_string(),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Executes commands and captures their output
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs the command to completion
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit is reported through [`CommandOutput::exit_code`].
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError>;
}

/// [`ProcessRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ToolError> {
        debug!("Running: {}", spec.display());

        let mut command = tokio::process::Command::new(&spec.program);
        command.args(&spec.args).envs(&spec.env);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let output = command.output().await.map_err(|source| ToolError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        debug!(
            "'{}' finished: exit_code={}, stdout_len={}, stderr_len={}",
            spec.program,
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let mut env = BTreeMap::new();
        env.insert("TAG".to_string(), "abc123".to_string());

        let spec = CommandSpec::new("docker")
            .arg("push")
            .args(["repo:abc123"])
            .cwd("/tmp")
            .envs(&env);

        assert_eq!(spec.display(), "docker push repo:abc123");
        assert_eq!(spec.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(spec.env.get("TAG"), Some(&"abc123".to_string()));
    }

    #[test]
    fn test_secret_arg_is_masked_in_display() {
        let spec = CommandSpec::new("scan")
            .arg("-k")
            .secret_arg("hunter2")
            .arg("repo:abc123");

        assert_eq!(spec.display(), "scan -k **** repo:abc123");
        assert_eq!(spec.args[1], "hunter2");
    }

    #[test]
    fn test_shell_spec() {
        let spec = CommandSpec::shell("echo hi");
        assert_eq!(spec.program, "sh");
        assert_eq!(spec.args, vec!["-c".to_string(), "echo hi".to_string()]);
    }

    #[test]
    fn test_check_non_zero() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: "denied\n".to_string(),
            exit_code: 1,
        };
        match output.check("docker") {
            Err(ToolError::NonZeroExit { program, code, stderr }) => {
                assert_eq!(program, "docker");
                assert_eq!(code, 1);
                assert_eq!(stderr, "denied");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_output() {
        let mut env = BTreeMap::new();
        env.insert("GANTRY_TEST_VALUE".to_string(), "propagated".to_string());
        let spec = CommandSpec::shell("echo $GANTRY_TEST_VALUE; exit 3").envs(&env);

        let output = SystemProcessRunner.run(&spec).await.unwrap();
        assert_eq!(output.stdout.trim(), "propagated");
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure() {
        let spec = CommandSpec::new("gantry-definitely-not-a-real-binary");
        assert!(matches!(
            SystemProcessRunner.run(&spec).await,
            Err(ToolError::Spawn { .. })
        ));
    }
}
