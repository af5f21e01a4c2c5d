//! External command execution
//!
//! Change strategies never spawn processes directly; they go through a
//! [`CommandRunner`] so tests can substitute a fake.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name
    pub name: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub dir: PathBuf,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a command with no extra environment
    pub fn new(name: impl Into<String>, args: &[&str], dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(ToString::to_string).collect(),
            dir: dir.into(),
            env: Vec::new(),
        }
    }

    /// The command line, for logs and errors
    pub fn cli(&self) -> String {
        if self.args.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.args.join(" "))
        }
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status zero
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// Convert a non-zero exit into [`Error::Command`], keeping the output verbatim
    pub fn check(self, spec: &CommandSpec) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        let output = if self.stderr.trim().is_empty() {
            self.stdout.trim_end().to_string()
        } else {
            self.stderr.trim_end().to_string()
        };
        Err(Error::Command {
            command: spec.cli(),
            output,
        })
    }
}

/// Runs external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and capture its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`], not as
    /// an error; only failing to spawn is an error.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %spec.cli(), dir = %spec.dir.display(), "running command");
        let output = Command::new(&spec.name)
            .args(&spec.args)
            .current_dir(&spec.dir)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .await
            .map_err(|e| Error::Command {
                command: spec.cli(),
                output: e.to_string(),
            })?;

        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %spec.cli(), success = result.success, "command finished");
        Ok(result)
    }
}
