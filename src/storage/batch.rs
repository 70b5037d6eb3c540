//! Staged persistence of one request's files
//!
//! Parts are streamed into hidden `.<uuid>.part` files inside the destination.
//! Only when the whole request has been received are they published under
//! their final names; on any failure every staged and already published file
//! of the batch is removed again.

use super::naming::{original_extension, stored_name, MAX_NAME_ATTEMPTS};
use super::{ensure_dir, StorageError};
use crate::logger;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use uuid::Uuid;

/// A file that made it to its final name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated name, e.g. `1718000000000.png`
    pub name: String,
    pub path: PathBuf,
    /// Filename as sent by the client
    pub original_name: String,
    pub size: u64,
}

#[derive(Debug)]
struct Staged {
    temp_path: PathBuf,
    original_name: String,
    extension: String,
    received_at_ms: i64,
    size: u64,
}

/// Files of one upload request, all stored or none
#[derive(Debug)]
pub struct UploadBatch {
    dir: PathBuf,
    dir_ready: bool,
    staged: VecDeque<Staged>,
    published: Vec<PathBuf>,
}

impl UploadBatch {
    /// Nothing touches the disk until the first `stage()`
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            dir_ready: false,
            staged: VecDeque::new(),
            published: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Open a staging file for the next part.
    ///
    /// The destination directory is created on the first call. The staging
    /// file belongs to the batch as soon as it exists, so a writer dropped
    /// halfway is cleaned up by `rollback()` (or by dropping the batch).
    pub async fn stage(
        &mut self,
        original_name: &str,
        received_at_ms: i64,
    ) -> Result<StagedWriter<'_>, StorageError> {
        if !self.dir_ready {
            ensure_dir(&self.dir).await?;
            self.dir_ready = true;
        }

        let temp_path = self.dir.join(format!(".{}.part", Uuid::new_v4()));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(|source| StorageError::Write {
                path: temp_path.clone(),
                source,
            })?;

        self.staged.push_back(Staged {
            temp_path,
            original_name: original_name.to_string(),
            extension: original_extension(original_name).to_string(),
            received_at_ms,
            size: 0,
        });
        let last = self.staged.len() - 1;

        Ok(StagedWriter {
            file: BufWriter::new(file),
            entry: &mut self.staged[last],
        })
    }

    /// Move every staged file to its final name, in arrival order.
    ///
    /// Names are reserved with create-new semantics, so a name already on
    /// disk (another request in the same millisecond) is never overwritten;
    /// the next `-<n>` candidate is used instead.
    pub async fn commit(mut self) -> Result<Vec<StoredFile>, StorageError> {
        let mut stored = Vec::with_capacity(self.staged.len());

        while let Some(entry) = self.staged.front() {
            let (name, path) = match self.publish(entry).await {
                Ok(published) => published,
                Err(e) => {
                    self.discard().await;
                    return Err(e);
                }
            };
            self.published.push(path.clone());
            if let Some(entry) = self.staged.pop_front() {
                stored.push(StoredFile {
                    name,
                    path,
                    original_name: entry.original_name,
                    size: entry.size,
                });
            }
        }

        self.published.clear();
        Ok(stored)
    }

    /// Remove everything this batch wrote
    pub async fn rollback(mut self) {
        self.discard().await;
    }

    async fn publish(&self, entry: &Staged) -> Result<(String, PathBuf), StorageError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = stored_name(entry.received_at_ms, &entry.extension, attempt);
            let path = self.dir.join(&name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(reservation) => {
                    drop(reservation);
                    if let Err(source) = fs::rename(&entry.temp_path, &path).await {
                        remove_quietly(&path).await;
                        return Err(StorageError::Publish { path, source });
                    }
                    return Ok((name, path));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    logger::log_debug(&format!("Name {name} taken, trying next candidate"));
                }
                Err(source) => return Err(StorageError::Publish { path, source }),
            }
        }

        Err(StorageError::NamesExhausted {
            dir: self.dir.clone(),
            stem: entry.received_at_ms,
            extension: entry.extension.clone(),
        })
    }

    async fn discard(&mut self) {
        for path in self.published.drain(..) {
            remove_quietly(&path).await;
        }
        for entry in self.staged.drain(..) {
            remove_quietly(&entry.temp_path).await;
        }
    }
}

impl Drop for UploadBatch {
    // Reached with leftovers only when the request future was cancelled
    fn drop(&mut self) {
        let leftovers = self
            .published
            .iter()
            .chain(self.staged.iter().map(|s| &s.temp_path));
        // Blocking removal: no async context is guaranteed inside drop
        for path in leftovers {
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            logger::log_warning(&format!(
                "Failed to remove {} during rollback: {e}",
                path.display()
            ));
        }
    }
}

/// Writes the bytes of one part into its staging file
pub struct StagedWriter<'a> {
    file: BufWriter<File>,
    entry: &'a mut Staged,
}

impl StagedWriter<'_> {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|source| StorageError::Write {
                path: self.entry.temp_path.clone(),
                source,
            })?;
        self.entry.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush the part to disk, returning its size
    pub async fn finish(mut self) -> Result<u64, StorageError> {
        self.file
            .flush()
            .await
            .map_err(|source| StorageError::Write {
                path: self.entry.temp_path.clone(),
                source,
            })?;
        Ok(self.entry.size)
    }
}
