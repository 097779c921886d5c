//! Child-process execution for spooler commands.
//!
//! [`run_command`] spawns the program with an explicit argument vector,
//! captures stdout/stderr, and enforces both a timeout and a cancellation
//! token. The child is killed if the wait is abandoned.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::SpoolerError;

/// Maximum stdout or stderr size captured per stream (1 MiB).
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// A program plus any fixed leading arguments.
///
/// Per-call arguments are appended after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl SpoolerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Treat a nonzero exit or any stderr text as failure; otherwise return
    /// stdout.
    pub fn into_stdout(self, program: &str) -> Result<String, SpoolerError> {
        let stderr = self.stderr.trim().to_string();

        if self.exit_code != Some(0) {
            return Err(SpoolerError::Exited {
                program: program.to_string(),
                exit_code: self.exit_code,
                stderr,
            });
        }

        if !stderr.is_empty() {
            return Err(SpoolerError::Stderr {
                program: program.to_string(),
                stderr,
            });
        }

        Ok(self.stdout)
    }
}

/// Run `command` with `extra_args` appended.
///
/// Stdin is closed. The call returns once the child exits, the timeout
/// elapses, or `cancel` fires, whichever comes first.
pub async fn run_command<I, A>(
    command: &SpoolerCommand,
    extra_args: I,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<CommandOutput, SpoolerError>
where
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let program = command.program.clone();

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .args(extra_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Kill the child when it is dropped (timeout or cancellation).
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| SpoolerError::Spawn {
        program: program.clone(),
        source,
    })?;

    // Read the pipes in separate tasks so `child.wait()` can borrow `child`
    // and a chatty process cannot block on a full pipe.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let status = tokio::select! {
        result = tokio::time::timeout(timeout, child.wait()) => match result {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => return Err(SpoolerError::Io { program, source }),
            Err(_elapsed) => {
                tracing::warn!(%program, timeout_secs = timeout.as_secs_f64(), "Spooler command timed out");
                return Err(SpoolerError::TimedOut { program, timeout });
            }
        },
        () = cancel.cancelled() => {
            tracing::warn!(%program, "Spooler command cancelled");
            return Err(SpoolerError::Cancelled { program });
        }
    };

    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();

    let output = CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        exit_code: status.code(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    tracing::debug!(
        %program,
        exit_code = ?output.exit_code,
        duration_ms = output.duration_ms,
        "Spooler command finished"
    );

    Ok(output)
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
