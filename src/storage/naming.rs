//! Stored file naming
//!
//! A stored file is named after the millisecond its part arrived plus the
//! extension of the client's filename: `1718000000000.png`. When that name is
//! taken the next candidates are `1718000000000-1.png`, `1718000000000-2.png`, ...

/// Candidates tried before giving up on a destination
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Extension of a client filename, leading dot included.
///
/// Only the last path segment counts (either separator). Leading dots do not
/// start an extension, so `.bashrc` has none while `name.` yields `"."`.
pub fn original_extension(file_name: &str) -> &str {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem_start = base.len() - base.trim_start_matches('.').len();

    match base.rfind('.') {
        Some(dot) if dot >= stem_start => &base[dot..],
        _ => "",
    }
}

/// Name for the given arrival instant, extension and collision attempt
pub fn stored_name(received_at_ms: i64, extension: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{received_at_ms}{extension}")
    } else {
        format!("{received_at_ms}-{attempt}{extension}")
    }
}
