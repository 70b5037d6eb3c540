//! HTTP response building module
//!
//! Builders for the status codes the relay answers with. Builder failures are
//! logged and degrade to an empty response instead of panicking.

use super::cache;
use crate::config::HttpConfig;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::ops::RangeInclusive;

pub type HttpResponse = Response<Full<Bytes>>;

/// Methods the relay answers on any path
pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, OPTIONS";

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                r#"{"error":"Internal server error"}"#,
            );
        }
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, json.len())
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| fallback(status, &e))
}

/// JSON `{"error": message}` body
pub fn json_error(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// 304 Not Modified
pub fn build_304_response(etag: &str, max_age: u32) -> HttpResponse {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, cache::cache_control(max_age))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| fallback(StatusCode::NOT_MODIFIED, &e))
}

/// 404 Not Found
pub fn build_404_response() -> HttpResponse {
    plain(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", "404 Not Found")
}

/// 405 Method Not Allowed
pub fn build_405_response() -> HttpResponse {
    let mut resp = plain(
        StatusCode::METHOD_NOT_ALLOWED,
        "text/plain; charset=utf-8",
        "405 Method Not Allowed",
    );
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    resp
}

/// 204 answer to OPTIONS, including the CORS preflight headers when enabled
pub fn build_options_response(enable_cors: bool, requested_headers: Option<&str>) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ALLOW, ALLOWED_METHODS);

    if enable_cors {
        builder = builder
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
            .header(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                requested_headers.unwrap_or("Content-Type, Range, FormType"),
            )
            .header(header::ACCESS_CONTROL_MAX_AGE, "86400");
    }

    builder
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| fallback(StatusCode::NO_CONTENT, &e))
}

/// 416 Range Not Satisfiable
pub fn build_416_response(file_size: usize) -> HttpResponse {
    let mut resp = plain(
        StatusCode::RANGE_NOT_SATISFIABLE,
        "text/plain; charset=utf-8",
        "Range Not Satisfiable",
    );
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{file_size}")) {
        resp.headers_mut().insert(header::CONTENT_RANGE, value);
    }
    resp
}

/// Validators shared by 200 and 206 file responses
pub struct FileMeta<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub max_age: u32,
}

/// 200 with the whole file
pub fn build_file_response(data: Bytes, meta: &FileMeta<'_>) -> HttpResponse {
    let content_length = data.len();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, meta.content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, meta.etag)
        .header(header::CACHE_CONTROL, cache::cache_control(meta.max_age))
        .body(Full::new(data))
        .unwrap_or_else(|e| fallback(StatusCode::OK, &e))
}

/// 206 with the requested slice of `data`
pub fn build_partial_response(
    data: &Bytes,
    range: RangeInclusive<usize>,
    meta: &FileMeta<'_>,
) -> HttpResponse {
    let (start, end) = (*range.start(), *range.end());
    let content_length = end - start + 1;
    let body = data.slice(range);

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, meta.content_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(
            header::CONTENT_RANGE,
            format!("bytes {start}-{end}/{}", data.len()),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, meta.etag)
        .header(header::CACHE_CONTROL, cache::cache_control(meta.max_age))
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback(StatusCode::PARTIAL_CONTENT, &e))
}

/// Headers every response carries: `Server`, and the CORS origin when enabled
pub fn apply_common_headers(resp: &mut HttpResponse, http: &HttpConfig) {
    let headers = resp.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&http.server_name) {
        headers.insert(header::SERVER, value);
    }
    if http.enable_cors {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }
}

/// Drop the body of a response to a HEAD request, keeping its headers
pub fn strip_body(resp: HttpResponse) -> HttpResponse {
    let (parts, _) = resp.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

fn plain(status: StatusCode, content_type: &'static str, text: &'static str) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, text.len())
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Log response build error
fn fallback(status: StatusCode, error: &hyper::http::Error) -> HttpResponse {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}
