//! HTTP Range request parsing module
//!
//! Single `bytes=` ranges only (RFC 7233); multi-range requests are answered
//! with the full body.

use std::ops::RangeInclusive;

/// How a GET with an optional `Range` header should be answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable range: send everything with 200
    Full,
    /// Send these bytes (inclusive) with 206
    Partial(RangeInclusive<usize>),
    /// Range starts beyond the end: 416
    Unsatisfiable,
}

/// Resolve `range_header` against a body of `len` bytes
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
///
/// # Examples
/// ```
/// use upload_relay::http::range::{resolve_range, RangeOutcome};
///
/// assert_eq!(resolve_range(Some("bytes=0-99"), 1000), RangeOutcome::Partial(0..=99));
/// assert_eq!(resolve_range(Some("bytes=-10"), 1000), RangeOutcome::Partial(990..=999));
/// assert_eq!(resolve_range(None, 1000), RangeOutcome::Full);
/// ```
pub fn resolve_range(range_header: Option<&str>, len: usize) -> RangeOutcome {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };

    match (first.trim(), last.trim()) {
        // suffix: the final N bytes
        ("", suffix) => match suffix.parse::<usize>() {
            Ok(0) | Err(_) => RangeOutcome::Full,
            Ok(_) if len == 0 => RangeOutcome::Unsatisfiable,
            Ok(n) => RangeOutcome::Partial(len.saturating_sub(n)..=len - 1),
        },
        (start, end) => {
            let Ok(start) = start.parse::<usize>() else {
                return RangeOutcome::Full;
            };
            if start >= len {
                return RangeOutcome::Unsatisfiable;
            }
            let end = if end.is_empty() {
                len - 1
            } else {
                match end.parse::<usize>() {
                    Ok(end) if end >= start => end.min(len - 1),
                    _ => return RangeOutcome::Full,
                }
            };
            RangeOutcome::Partial(start..=end)
        }
    }
}
