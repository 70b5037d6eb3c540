//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, dispatch to the
//! upload endpoint or static serving, common headers, and the access log.

use crate::config::AppState;
use crate::handler::{static_files, upload};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, ACCESS_CONTROL_REQUEST_HEADERS, IF_NONE_MATCH, RANGE};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating what static serving needs from the request
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            path: req.uri().path(),
            if_none_match: header(IF_NONE_MATCH),
            range_header: header(RANGE),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_entry = state
        .config
        .logging
        .access_log
        .then(|| AccessLogEntry::from_request(&req, peer));
    let is_head = *req.method() == Method::HEAD;

    let mut response = route_request(req, &state).await;
    http::apply_common_headers(&mut response, &state.config.http);
    if is_head {
        response = http::strip_body(response);
    }

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Dispatch on method, then path
async fn route_request<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    match method {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext::from_request(&req);
            static_files::serve(&ctx, state).await
        }
        Method::POST if req.uri().path() == upload::UPLOAD_PATH => {
            upload::handle_upload(req, state).await
        }
        Method::POST => http::build_404_response(),
        Method::OPTIONS => http::build_options_response(
            state.config.http.enable_cors,
            req.headers()
                .get(ACCESS_CONTROL_REQUEST_HEADERS)
                .and_then(|v| v.to_str().ok()),
        ),
        method => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    }
}
