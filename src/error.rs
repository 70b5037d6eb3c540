use crate::storage::StorageError;
use hyper::StatusCode;
use thiserror::Error as ThisError;

/// Why an upload request did not store its files
#[derive(ThisError, Debug)]
pub enum UploadError {
    /// The body held no file part under the upload field
    #[error("No files were uploaded")]
    NoFiles,

    /// Content-Type is not `multipart/form-data` with a boundary
    #[error("Expected a multipart/form-data body: {0}")]
    NotMultipart(multer::Error),

    /// A file arrived under a field other than the configured one
    #[error("Unexpected file field '{field}'")]
    UnexpectedField { field: String },

    /// Body ended early or could not be parsed
    #[error("Malformed multipart body: {0}")]
    Multipart(multer::Error),

    #[error("Request body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NoFiles
            | Self::NotMultipart(_)
            | Self::UnexpectedField { .. }
            | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client; filesystem details stay in the log
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) => "Failed to store uploaded files".to_string(),
            other => other.to_string(),
        }
    }

    /// Size-limit violations surface from multer as parse errors
    pub fn from_multer(err: multer::Error) -> Self {
        match err {
            multer::Error::StreamSizeExceeded { limit }
            | multer::Error::FieldSizeExceeded { limit, .. } => Self::TooLarge { limit },
            other => Self::Multipart(other),
        }
    }
}
