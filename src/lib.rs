//! Upload relay
//!
//! HTTP server that accepts multipart file uploads, sorts them into a folder
//! chosen by a classification header, and serves the front-end and the stored
//! files back as static content.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod storage;

#[cfg(test)]
mod test_utils;
