//! Logger module
//!
//! Provides logging utilities for the relay including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Upload outcome logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        &config.logging.level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write through the global writer, or straight to the console before `init()`
fn write(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if level <= Level::Warn => eprintln!("{message}"),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write(Level::Info, "======================================");
    write(Level::Info, "Upload relay started successfully");
    write(Level::Info, &format!("Listening on: http://{addr}"));
    write(Level::Info, &format!("Public root: {}", config.storage.public_dir));
    write(Level::Info, &format!("Upload root: {}", config.storage.upload_dir));
    write(
        Level::Info,
        &format!(
            "Upload endpoint: POST /upload (field '{}', header '{}')",
            config.upload.field_name, config.upload.classification_header
        ),
    );
    write(Level::Info, &format!("Max body size: {} bytes", config.http.max_body_size));
    match config.server.workers {
        Some(workers) => write(Level::Info, &format!("Worker threads: {workers}")),
        None => write(Level::Info, "Worker threads: CPU cores"),
    }
    if let Some(ref path) = config.logging.access_log_file {
        write(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write(Level::Info, &format!("Error log: {path}"));
    }
    write(Level::Info, "======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(Level::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(Level::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_info(message: &str) {
    write(Level::Info, &format!("[INFO] {message}"));
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    write(Level::Debug, &format!("[DEBUG] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

pub fn log_upload_stored(count: usize, folder: &str) {
    write(Level::Info, &format!("[Upload] Stored {count} file(s) in {folder}"));
}

pub fn log_upload_rejected(reason: &str) {
    write(Level::Warn, &format!("[Upload] Rejected: {reason}"));
}

pub fn log_upload_failed(cause: &dyn std::error::Error) {
    write(Level::Error, &format!("[Upload] Failed: {cause}"));
}

pub fn log_shutdown_started(active: usize) {
    write(
        Level::Info,
        &format!("[Shutdown] Stopped accepting connections, {active} still active"),
    );
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        write(Level::Info, "[Shutdown] All connections closed");
    } else {
        write(
            Level::Warn,
            &format!("[Shutdown] Grace period elapsed with {remaining} connection(s) open"),
        );
    }
}
