//! HTTP cache validation module
//!
//! Weak `ETag`s (`W/"<size>-<hash>"`) and `If-None-Match` evaluation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Weak `ETag` for a file body
pub fn etag_for(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("W/\"{:x}-{:x}\"", content.len(), hasher.finish())
}

/// Whether the client's cached copy is still current (304 instead of 200)
///
/// Uses weak comparison: `W/` prefixes are ignored on both sides, lists are
/// comma separated, and `*` matches anything.
pub fn is_not_modified(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = opaque(etag);
    if_none_match.is_some_and(|header| {
        header
            .split(',')
            .map(str::trim)
            .any(|tag| tag == "*" || opaque(tag) == ours)
    })
}

fn opaque(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// `Cache-Control` value for static responses
pub fn cache_control(max_age: u32) -> String {
    format!("public, max-age={max_age}")
}
