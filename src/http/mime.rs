//! MIME type detection module
//!
//! Returns the Content-Type for a served file. Uploaded files keep the
//! client's extension verbatim (`.JPG`, `.Png`), so matching ignores case.

use std::path::Path;

const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type for a file path
///
/// # Examples
/// ```
/// use std::path::Path;
/// use upload_relay::http::mime::content_type_for;
/// assert_eq!(content_type_for(Path::new("public/index.html")), "text/html; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("uploads/FormA/1718000000000.JPG")), "image/jpeg");
/// assert_eq!(content_type_for(Path::new("uploads/1718000000000")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(OCTET_STREAM, |ext| by_extension(&ext.to_ascii_lowercase()))
}

fn by_extension(ext: &str) -> &'static str {
    match ext {
        // Front-end
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" | "md" | "log" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "application/xml",
        "wasm" => "application/wasm",

        // Scans and photos
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "avif" => "image/avif",

        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "odt" => "application/vnd.oasis.opendocument.text",
        "rtf" => "application/rtf",

        // Archives
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",

        // Media
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        _ => OCTET_STREAM,
    }
}
