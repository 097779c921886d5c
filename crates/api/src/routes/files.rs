//! Route definitions for document upload, listing and preview.
//!
//! ```text
//! POST /upload           upload_file
//! GET  /files            list_files
//! GET  /preview/{id}     preview_file
//! ```

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// `upload_body_limit` bounds the whole multipart body, so it must leave
/// room above the file size limit for part headers and boundaries.
pub fn router(upload_body_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/files", get(files::list_files))
        .route("/preview/{id}", get(files::preview_file))
}
