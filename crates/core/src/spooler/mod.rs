//! Print-spooler integration.
//!
//! The [`Spooler`] trait is the seam between print/queue logic and the OS
//! tooling. [`CupsSpooler`] drives the CUPS `lp` and `lpstat` commands via
//! [`command::run_command`], which never goes through a shell.

pub mod command;
pub mod cups;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

pub use command::{CommandOutput, SpoolerCommand};
pub use cups::CupsSpooler;

/// Errors from a single spooler command invocation.
#[derive(Debug, thiserror::Error)]
pub enum SpoolerError {
    /// The command could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("{program} exited with {}", describe_exit(.exit_code, .stderr))]
    Exited {
        program: String,
        /// `None` when terminated by a signal.
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The command exited with status 0 but wrote to stderr.
    #[error("{program} reported an error: {stderr}")]
    Stderr { program: String, stderr: String },

    /// The command did not finish in time and was killed.
    #[error("{program} timed out after {}s", .timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },

    /// The wait was abandoned because the service is shutting down.
    #[error("{program} was cancelled")]
    Cancelled { program: String },

    /// An I/O error while waiting on the child.
    #[error("I/O error waiting for {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl SpoolerError {
    /// Text to show the client: the command's own stderr when it produced
    /// any, otherwise the error description.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Exited { stderr, .. } | Self::Stderr { stderr, .. } if !stderr.is_empty() => {
                stderr.clone()
            }
            other => other.to_string(),
        }
    }
}

fn describe_exit(exit_code: &Option<i32>, stderr: &str) -> String {
    let status = match exit_code {
        Some(code) => format!("code {code}"),
        None => "signal".to_string(),
    };
    if stderr.is_empty() {
        status
    } else {
        format!("{status}: {stderr}")
    }
}

/// Access to the OS print spooler.
#[async_trait]
pub trait Spooler: Send + Sync {
    /// Submit `path` to `printer`. Returns the spooler's informational
    /// output, which usually names the new job.
    async fn submit(&self, printer: &str, path: &Path) -> Result<String, SpoolerError>;

    /// Raw job listing as printed by the status command.
    async fn list_jobs(&self) -> Result<String, SpoolerError>;
}
