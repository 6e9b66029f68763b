//! Operator-side provisioning: the database container and the local `.env` file.

pub mod container;
pub mod env_file;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::AppError;

pub use container::{ContainerState, DatabaseContainer};
pub use env_file::write_env_file;

/// Captured result of an external program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turns a failed run into a provisioning error carrying stderr.
    pub fn check(self, what: &str) -> Result<Self, AppError> {
        if self.success {
            Ok(self)
        } else {
            Err(AppError::ProvisionError(format!("{what} failed: {}", self.stderr.trim())))
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, AppError>;
}

/// Runs programs as child processes of this one.
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, AppError> {
        debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::ProvisionError(format!("could not start {program}: {e}")))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
