pub mod files;
pub mod health;
pub mod printing;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /upload                 upload a document (POST, multipart)
/// /files                  list uploaded documents
/// /preview/{id}           raw bytes of a pdf or image
///
/// /print/{id}             submit to the configured printer (POST)
/// /queue                  spooler job lines
/// ```
pub fn api_routes(upload_body_limit: usize) -> Router<AppState> {
    Router::new()
        .merge(files::router(upload_body_limit))
        .merge(printing::router())
}
