//! Upload persistence.
//!
//! [`UploadStore::accept`] validates the declared media type, streams the
//! body to `<upload_dir>/<id><ext>` under the size limit, and registers the
//! resulting [`FileRecord`]. A failed upload never leaves a registry entry
//! or a file behind.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::error::CoreError;
use crate::filename::{repair_display_name, storage_extension};
use crate::media;
use crate::registry::{FileRecord, FileRegistry};
use crate::types::FileId;

/// Bytes per megabyte for the configured upload limit.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Client-declared metadata accompanying an upload body.
#[derive(Debug, Clone, Copy)]
pub struct IncomingUpload<'a> {
    /// Filename as received in the multipart header.
    pub file_name: &'a str,
    /// Media type declared by the client for the file part.
    pub mime_type: &'a str,
}

/// Writes uploaded documents into a single directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    upload_dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), CoreError> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| {
                CoreError::Storage(format!(
                    "Failed to create upload dir {}: {e}",
                    self.upload_dir.display()
                ))
            })
    }

    /// Persist one uploaded document and register it.
    pub async fn accept<S, E>(
        &self,
        registry: &dyn FileRegistry,
        upload: IncomingUpload<'_>,
        chunks: S,
    ) -> Result<FileRecord, CoreError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        if !media::is_allowed_upload(upload.mime_type) {
            tracing::warn!(
                file_name = upload.file_name,
                mime_type = upload.mime_type,
                "Rejected upload with unsupported media type"
            );
            return Err(CoreError::UnsupportedMediaType(upload.mime_type.to_string()));
        }

        let id = FileId::new();
        let display_name = repair_display_name(upload.file_name);
        let storage_path = self
            .upload_dir
            .join(format!("{id}{}", storage_extension(&display_name)));

        let size_bytes = match self.write_stream(&storage_path, chunks).await {
            Ok(size) => size,
            Err(err) => {
                discard_partial(&storage_path).await;
                return Err(err);
            }
        };

        let record = FileRecord {
            id,
            display_name,
            storage_path,
            mime_type: media::essence(upload.mime_type).to_ascii_lowercase(),
            size_bytes,
            uploaded_at: Utc::now(),
        };

        if let Err(err) = registry.insert(record.clone()) {
            discard_partial(&record.storage_path).await;
            return Err(err);
        }

        tracing::info!(
            file_id = %record.id,
            name = %record.display_name,
            mime_type = %record.mime_type,
            size_bytes,
            "Stored upload"
        );

        Ok(record)
    }

    /// Stream `chunks` into a new file at `path`, enforcing the size limit
    /// as bytes arrive. Returns the number of bytes written.
    async fn write_stream<S, E>(&self, path: &Path, chunks: S) -> Result<u64, CoreError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: fmt::Display,
    {
        let mut chunks = std::pin::pin!(chunks);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| CoreError::Storage(format!("Failed to create {}: {e}", path.display())))?;

        let mut written: u64 = 0;
        while let Some(chunk) = chunks.next().await {
            let chunk =
                chunk.map_err(|e| CoreError::Validation(format!("Failed to read upload: {e}")))?;

            written += chunk.len() as u64;
            if written > self.max_bytes {
                tracing::warn!(
                    path = %path.display(),
                    limit_bytes = self.max_bytes,
                    "Upload exceeded size limit, aborting"
                );
                return Err(CoreError::PayloadTooLarge {
                    limit_bytes: self.max_bytes,
                });
            }

            file.write_all(&chunk)
                .await
                .map_err(|e| CoreError::Storage(format!("Failed to write {}: {e}", path.display())))?;
        }

        file.flush()
            .await
            .map_err(|e| CoreError::Storage(format!("Failed to flush {}: {e}", path.display())))?;

        Ok(written)
    }
}

/// Remove a partially written upload. A file that was never created is fine.
async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
        }
    }
}
