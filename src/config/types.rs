// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads (CPU cores when unset)
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            workers: None,
        }
    }
}

/// Filesystem roots served and written by the relay
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Front-end assets, looked up first
    pub public_dir: String,
    /// Upload root; `FormA`/`FormB` live below it
    pub upload_dir: String,
    pub index_files: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            upload_dir: "uploads".to_string(),
            index_files: vec!["index.html".to_string()],
        }
    }
}

/// Multipart ingestion settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    /// Form field carrying the file parts
    pub field_name: String,
    /// Request header carrying the classification tag
    pub classification_header: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            field_name: "files".to_string(),
            classification_header: "formtype".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds before a connection (and its in-flight request) is dropped
    pub connection_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
    /// Seconds to wait for active connections on shutdown
    pub shutdown_grace_period: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            connection_timeout: 120,
            max_connections: None,
            shutdown_grace_period: 10,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
    /// `max-age` for static responses, in seconds
    pub cache_max_age: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: "upload-relay".to_string(),
            enable_cors: true,
            max_body_size: 52_428_800, // 50MB
            cache_max_age: 0,
        }
    }
}
