//! Print submission and queue inspection.

use serde::Serialize;

use crate::error::CoreError;
use crate::registry::{find_file, FileRegistry};
use crate::spooler::Spooler;
use crate::types::FileId;

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintReceipt {
    /// Spooler output, e.g. `request id is Office-12 (1 file(s))`. Not parsed.
    pub message: String,
}

/// Send a registered file to `printer`.
///
/// An unknown id fails before the spooler is touched. Each call is a
/// separate spooler job; nothing is retried or deduplicated.
pub async fn submit_print_job(
    registry: &dyn FileRegistry,
    spooler: &dyn Spooler,
    printer: &str,
    id: &FileId,
) -> Result<PrintReceipt, CoreError> {
    let record = find_file(registry, id)?;

    tracing::info!(
        file_id = %record.id,
        printer,
        path = %record.storage_path.display(),
        "Submitting print job"
    );

    match spooler.submit(printer, &record.storage_path).await {
        Ok(stdout) => {
            let message = stdout.trim().to_string();
            tracing::info!(file_id = %record.id, printer, %message, "Print job submitted");
            Ok(PrintReceipt { message })
        }
        Err(err) => {
            tracing::error!(file_id = %record.id, printer, error = %err, "Print submission failed");
            Err(CoreError::external("Print failed", &err))
        }
    }
}

/// Current spooler jobs, one verbatim line per entry.
pub async fn list_queue(spooler: &dyn Spooler) -> Result<Vec<String>, CoreError> {
    match spooler.list_jobs().await {
        Ok(stdout) => Ok(queue_lines(&stdout)),
        Err(err) => {
            tracing::error!(error = %err, "Print queue query failed");
            Err(CoreError::external("Failed to query print queue", &err))
        }
    }
}

/// Split status output into its non-empty lines.
pub fn queue_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
