//! Handlers for uploading, listing and previewing documents.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use printbroker_core::error::CoreError;
use printbroker_core::preview::resolve_preview;
use printbroker_core::registry::FileSummary;
use printbroker_core::types::FileId;
use printbroker_core::uploads::IncomingUpload;
use serde::Serialize;
use tokio_util::io::ReaderStream;

use super::parse_file_id;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field that carries the document.
pub const FILE_FIELD: &str = "file";

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: FileId,
    pub name: String,
}

/// POST /api/upload
///
/// Accept one document in the `file` multipart field. Other fields are
/// ignored.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::Validation(format!("Failed to parse multipart data: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();

        let record = state
            .uploads
            .accept(
                state.registry.as_ref(),
                IncomingUpload {
                    file_name: &file_name,
                    mime_type: &mime_type,
                },
                field,
            )
            .await?;

        return Ok(Json(UploadResponse {
            id: record.id,
            name: record.display_name,
        }));
    }

    Err(CoreError::Validation(format!("Missing required field: '{FILE_FIELD}'")).into())
}

/// GET /api/files
pub async fn list_files(State(state): State<AppState>) -> Json<Vec<FileSummary>> {
    Json(state.registry.list())
}

/// GET /api/preview/{id}
///
/// Stream the stored bytes unmodified, labelled with the stored media type.
pub async fn preview_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_file_id(&id)?;
    let source = resolve_preview(state.registry.as_ref(), &id)?;

    let file = tokio::fs::File::open(&source.path).await.map_err(|e| {
        CoreError::Storage(format!("Failed to open {}: {e}", source.path.display()))
    })?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| CoreError::Storage(format!("Failed to stat {}: {e}", source.path.display())))?
        .len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, source.content_type)
        .header(header::CONTENT_LENGTH, file_size)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(format!("Failed to build preview response: {e}")))
}
