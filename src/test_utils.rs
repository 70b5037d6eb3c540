//! Shared fixtures for handler tests: a temp-dir backed app and request builders

use crate::config::{AppState, Config};
use crate::handler::handle_request;
use crate::http::HttpResponse;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "----relay-test-boundary";

/// Public and upload roots inside a fresh temp dir
pub struct TestApp {
    dir: TempDir,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub const INDEX_HTML: &'static str = "<!DOCTYPE html><title>relay</title>";

    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// The upload root is not created; handlers create it on demand
    pub fn with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir(&public).unwrap();
        std::fs::write(public.join("index.html"), Self::INDEX_HTML).unwrap();

        let mut config = Config::default().with_roots(&public, &dir.path().join("uploads"));
        config.logging.access_log = false;
        configure(&mut config);

        Self {
            dir,
            state: Arc::new(AppState::new(config)),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn public_dir(&self) -> &Path {
        &self.state.public_root
    }

    pub fn upload_dir(&self) -> &Path {
        &self.state.upload_root
    }

    /// Place a file below the upload root, creating parents
    pub fn put_upload(&self, relative: &str, data: &[u8]) {
        let path = self.upload_dir().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, data).unwrap();
    }

    pub async fn send(&self, req: Request<Full<Bytes>>) -> HttpResponse {
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        handle_request(req, Arc::clone(&self.state), peer).await.unwrap()
    }
}

/// One multipart part; `file_name: None` makes it a plain text field
pub struct Part<'a> {
    pub field: &'a str,
    pub file_name: Option<&'a str>,
    pub data: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        part.field
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.field
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn request(method: Method, uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// `POST /upload` with the multipart content type and an optional `formtype` header
pub fn upload_request(form_type: Option<&str>, body: Vec<u8>) -> Request<Full<Bytes>> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(tag) = form_type {
        builder = builder.header("formtype", tag);
    }
    builder.body(Full::new(Bytes::from(body))).unwrap()
}

pub async fn body_bytes(resp: HttpResponse) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(resp: HttpResponse) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

/// Regular files directly inside `dir`, sorted; empty when `dir` is missing
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}
