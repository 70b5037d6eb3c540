//! Request handler module
//!
//! Routing dispatch, the upload endpoint, and static file serving.

pub mod router;
pub mod static_files;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
