// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::Path;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig,
    UploadConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Layers, lowest priority first: compiled defaults, the optional file,
    /// then `RELAY_<SECTION>__<KEY>` environment variables.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Point both static roots somewhere else (used by tests and tooling)
    #[must_use]
    pub fn with_roots(mut self, public_dir: &Path, upload_dir: &Path) -> Self {
        self.storage.public_dir = public_dir.to_string_lossy().into_owned();
        self.storage.upload_dir = upload_dir.to_string_lossy().into_owned();
        self
    }
}
