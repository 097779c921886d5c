use crate::spooler::SpoolerError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedMediaType(String),

    #[error("File exceeds the maximum upload size of {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: u64 },

    #[error("Preview not supported for file type: {0}")]
    UnsupportedPreview(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A spooler command failed; `details` carries the captured diagnostic.
    #[error("{message}: {details}")]
    ExternalCommand { message: String, details: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a spooler failure with a caller-facing summary.
    pub fn external(message: impl Into<String>, err: &SpoolerError) -> Self {
        CoreError::ExternalCommand {
            message: message.into(),
            details: err.diagnostic(),
        }
    }
}
