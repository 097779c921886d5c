//! Preview source resolution.
//!
//! Previews are the uploaded bytes as-is. Types that would need conversion
//! are refused rather than transformed.

use std::path::PathBuf;

use crate::error::CoreError;
use crate::media;
use crate::registry::{find_file, FileRegistry};
use crate::types::FileId;

/// Where to read a preview from and how to label it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSource {
    pub content_type: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Resolve the stored bytes for a preview of `id`.
pub fn resolve_preview(
    registry: &dyn FileRegistry,
    id: &FileId,
) -> Result<PreviewSource, CoreError> {
    let record = find_file(registry, id)?;

    if !media::is_previewable(&record.mime_type) {
        tracing::warn!(file_id = %record.id, mime_type = %record.mime_type, "Preview refused");
        return Err(CoreError::UnsupportedPreview(record.mime_type));
    }

    Ok(PreviewSource {
        content_type: record.mime_type,
        path: record.storage_path,
        size_bytes: record.size_bytes,
    })
}
