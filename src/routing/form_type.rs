//! Classification tag matching
//!
//! Maps the classification header of an upload to its destination folder.

use hyper::HeaderMap;
use std::path::{Path, PathBuf};

/// Label reported for uploads that land in the upload root itself.
///
/// Clients only know the two form labels, so root uploads report `FormB`.
pub const DEFAULT_LABEL: &str = "FormB";

/// Destination of an upload, selected by the classification header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormType {
    /// `"A"` → `FormA/`
    A,
    /// `"B"` → `FormB/`
    B,
    /// Absent, empty, or unrecognized tag → upload root
    Default,
}

impl FormType {
    /// Match a raw tag; comparison is exact and case-sensitive
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("A") => Self::A,
            Some("B") => Self::B,
            _ => Self::Default,
        }
    }

    /// Read the tag from `header`; a value that is not visible ASCII counts as unrecognized
    pub fn from_headers(headers: &HeaderMap, header: &str) -> Self {
        Self::from_tag(headers.get(header).and_then(|v| v.to_str().ok()))
    }

    /// Subfolder below the upload root, `None` for the root itself
    pub const fn folder(self) -> Option<&'static str> {
        match self {
            Self::A => Some("FormA"),
            Self::B => Some("FormB"),
            Self::Default => None,
        }
    }

    /// Folder label returned to the client
    pub const fn label(self) -> &'static str {
        match self.folder() {
            Some(folder) => folder,
            None => DEFAULT_LABEL,
        }
    }

    /// Directory that receives the files
    pub fn destination(self, upload_root: &Path) -> PathBuf {
        match self.folder() {
            Some(folder) => upload_root.join(folder),
            None => upload_root.to_path_buf(),
        }
    }
}
