// Application state module
// Immutable configuration shared by every connection

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    pub public_root: PathBuf,
    pub upload_root: PathBuf,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let public_root = PathBuf::from(&config.storage.public_dir);
        let upload_root = PathBuf::from(&config.storage.upload_dir);

        Self {
            config,
            public_root,
            upload_root,
            active_connections: AtomicUsize::new(0),
        }
    }

    /// Static roots in lookup order
    pub fn static_roots(&self) -> [&Path; 2] {
        [self.public_root.as_path(), self.upload_root.as_path()]
    }
}
