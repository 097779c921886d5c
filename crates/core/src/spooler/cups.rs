//! CUPS command-line spooler (`lp` / `lpstat`).

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::command::{run_command, SpoolerCommand};
use super::{Spooler, SpoolerError};

/// [`Spooler`] backed by the CUPS client commands.
///
/// Submission runs `<submit> -d <printer> <file>`; the queue listing runs
/// `<status> -o`. Every invocation is bounded by `timeout` and aborted when
/// `cancel` fires.
#[derive(Debug, Clone)]
pub struct CupsSpooler {
    submit: SpoolerCommand,
    status: SpoolerCommand,
    timeout: Duration,
    cancel: CancellationToken,
}

impl CupsSpooler {
    pub fn new(
        submit: SpoolerCommand,
        status: SpoolerCommand,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            submit,
            status,
            timeout,
            cancel,
        }
    }
}

#[async_trait]
impl Spooler for CupsSpooler {
    async fn submit(&self, printer: &str, path: &Path) -> Result<String, SpoolerError> {
        let args = [OsStr::new("-d"), OsStr::new(printer), path.as_os_str()];
        let output = run_command(&self.submit, args, self.timeout, &self.cancel).await?;
        output.into_stdout(&self.submit.program)
    }

    async fn list_jobs(&self) -> Result<String, SpoolerError> {
        let output = run_command(&self.status, ["-o"], self.timeout, &self.cancel).await?;
        output.into_stdout(&self.status.program)
    }
}
