//! In-process file registry.
//!
//! Maps [`FileId`] to the [`FileRecord`] created at upload time. Records are
//! immutable, never removed, and vanish with the process.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::FileId;

/// Metadata describing one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: FileId,
    /// Original filename after encoding repair.
    pub display_name: String,
    /// Where the uploaded bytes live on disk.
    pub storage_path: PathBuf,
    pub mime_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Listing view of a [`FileRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    pub mimetype: String,
}

impl From<&FileRecord> for FileSummary {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.display_name.clone(),
            mimetype: record.mime_type.clone(),
        }
    }
}

/// Storage for file records.
///
/// The upload path is the only writer; every other caller reads.
pub trait FileRegistry: Send + Sync {
    /// Add a new record. Fails if the id is already registered.
    fn insert(&self, record: FileRecord) -> Result<(), CoreError>;

    fn get(&self, id: &FileId) -> Option<FileRecord>;

    /// Summaries of all records. Insertion order, though callers must not
    /// depend on it.
    fn list(&self) -> Vec<FileSummary>;
}

/// Look up a record, mapping absence to [`CoreError::NotFound`].
pub fn find_file(registry: &dyn FileRegistry, id: &FileId) -> Result<FileRecord, CoreError> {
    registry.get(id).ok_or_else(|| CoreError::NotFound {
        entity: "File",
        id: id.to_string(),
    })
}

/// Default [`FileRegistry`] backed by an insertion-ordered map.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: RwLock<IndexMap<FileId, FileRecord>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileRegistry for InMemoryRegistry {
    fn insert(&self, record: FileRecord) -> Result<(), CoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if records.contains_key(&record.id) {
            return Err(CoreError::Internal(format!(
                "file id {} is already registered",
                record.id
            )));
        }

        records.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: &FileId) -> Option<FileRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn list(&self) -> Vec<FileSummary> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(FileSummary::from)
            .collect()
    }
}
