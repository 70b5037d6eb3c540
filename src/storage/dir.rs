//! Destination directory management

use super::StorageError;
use std::path::Path;
use tokio::fs;

/// Make sure `path` and every missing ancestor exist.
///
/// Safe to call concurrently on the same path; an existing directory is not
/// an error. A non-directory in the way (or missing permissions) is.
pub async fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path)
        .await
        .map_err(|source| StorageError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}
