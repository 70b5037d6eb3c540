//! Static file serving module
//!
//! Serves the front-end from the public root and stored uploads from the
//! upload root, with index files, `ETag` revalidation, and single byte ranges.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::response::{build_file_response, build_partial_response, FileMeta};
use crate::http::{self, cache, mime, HttpResponse, RangeOutcome};
use crate::logger;
use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a GET or HEAD request from the static roots, first match wins
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> HttpResponse {
    let Some(relative) = relative_path(ctx.path) else {
        logger::log_debug(&format!("Rejected static path: {}", ctx.path));
        return http::build_404_response();
    };

    for root in state.static_roots() {
        if let Some((content, file_path)) =
            load_from_root(root, &relative, &state.config.storage.index_files).await
        {
            return build_static_file_response(
                content,
                &file_path,
                ctx,
                state.config.http.cache_max_age,
            );
        }
    }

    http::build_404_response()
}

/// Decode the URL path into a relative filesystem path.
///
/// Returns `None` for paths that are not valid UTF-8 once decoded, or that
/// contain a segment starting with `.` (dotfiles, staging files, `..`).
pub fn relative_path(url_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('.') || segment.contains(['\\', '\0']) {
            return None;
        }
        relative.push(segment);
    }
    Some(relative)
}

/// Load a file below `root`, trying index files for directories
async fn load_from_root(
    root: &Path,
    relative: &Path,
    index_files: &[String],
) -> Option<(Bytes, PathBuf)> {
    // The upload root only exists after the first upload
    let Ok(root_canonical) = fs::canonicalize(root).await else {
        return None;
    };

    let mut file_path = root.join(relative);
    let metadata = fs::metadata(&file_path).await.ok()?;
    if metadata.is_dir() {
        file_path = find_index(&file_path, index_files).await?;
    }

    // Symlinks must not lead outside the root
    let file_canonical = fs::canonicalize(&file_path).await.ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            relative.display(),
            file_canonical.display()
        ));
        return None;
    }

    match fs::read(&file_path).await {
        Ok(content) => Some((Bytes::from(content), file_path)),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            None
        }
    }
}

async fn find_index(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    for index_file in index_files {
        let candidate = dir.join(index_file);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}

/// Build static file response with `ETag` and Range support
fn build_static_file_response(
    data: Bytes,
    file_path: &Path,
    ctx: &RequestContext<'_>,
    max_age: u32,
) -> HttpResponse {
    let etag = cache::etag_for(&data);

    // Check if client has cached version
    if cache::is_not_modified(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag, max_age);
    }

    let meta = FileMeta {
        content_type: mime::content_type_for(file_path),
        etag: &etag,
        max_age,
    };

    match http::resolve_range(ctx.range_header.as_deref(), data.len()) {
        RangeOutcome::Full => build_file_response(data, &meta),
        RangeOutcome::Partial(range) => build_partial_response(&data, range, &meta),
        RangeOutcome::Unsatisfiable => http::build_416_response(data.len()),
    }
}
