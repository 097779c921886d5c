pub mod files;
pub mod printing;

use printbroker_core::error::CoreError;
use printbroker_core::types::FileId;

use crate::error::AppError;

/// Parse a path id. Text that is not a valid id cannot name a registered
/// file, so it is reported as not found.
pub(crate) fn parse_file_id(raw: &str) -> Result<FileId, AppError> {
    raw.parse().map_err(|_| {
        AppError::Core(CoreError::NotFound {
            entity: "File",
            id: raw.to_string(),
        })
    })
}
