//! Handlers for print submission and the spooler queue.

use axum::extract::{Path, State};
use axum::Json;
use printbroker_core::printing;
use serde::Serialize;

use super::parse_file_id;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub success: bool,
    /// Spooler output, typically naming the created job.
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub jobs: Vec<String>,
}

/// POST /api/print/{id}
///
/// Submit a registered file to the configured printer. Every call creates a
/// new spooler job.
pub async fn print_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PrintResponse>> {
    let id = parse_file_id(&id)?;

    let receipt = printing::submit_print_job(
        state.registry.as_ref(),
        state.spooler.as_ref(),
        &state.config.printer_name,
        &id,
    )
    .await?;

    Ok(Json(PrintResponse {
        success: true,
        message: receipt.message,
    }))
}

/// GET /api/queue
///
/// Spooler job lines, verbatim.
pub async fn get_queue(State(state): State<AppState>) -> AppResult<Json<QueueResponse>> {
    let jobs = printing::list_queue(state.spooler.as_ref()).await?;
    Ok(Json(QueueResponse { jobs }))
}
