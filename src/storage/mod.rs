//! Storage module
//!
//! Everything that touches the upload root on disk:
//! - lazy creation of destination directories
//! - collision-free stored file names
//! - staged, all-or-nothing persistence of one request's files

mod batch;
mod dir;
mod naming;

pub use batch::{StagedWriter, StoredFile, UploadBatch};
pub use dir::ensure_dir;
pub use naming::{original_extension, stored_name, MAX_NAME_ATTEMPTS};

use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Filesystem failure while persisting uploads
#[derive(ThisError, Debug)]
pub enum StorageError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to publish {}: {source}", .path.display())]
    Publish { path: PathBuf, source: io::Error },

    #[error(
        "no free name for {stem}{extension} in {} after {attempts} attempts",
        .dir.display(),
        attempts = MAX_NAME_ATTEMPTS
    )]
    NamesExhausted {
        dir: PathBuf,
        stem: i64,
        extension: String,
    },
}
