use std::sync::Arc;

use printbroker_core::registry::FileRegistry;
use printbroker_core::spooler::Spooler;
use printbroker_core::uploads::UploadStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Resolved server configuration.
    pub config: Arc<ServerConfig>,
    /// Uploaded file records. Only the upload handler writes.
    pub registry: Arc<dyn FileRegistry>,
    /// OS print spooler used for printing and queue listing.
    pub spooler: Arc<dyn Spooler>,
    /// Upload directory and size limit.
    pub uploads: Arc<UploadStore>,
}
