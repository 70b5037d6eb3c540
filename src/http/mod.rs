//! HTTP protocol layer module
//!
//! Protocol helpers shared by static serving and the upload endpoint,
//! independent of what is being served.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{resolve_range, RangeOutcome};
pub use response::{
    apply_common_headers, build_304_response, build_404_response, build_405_response,
    build_416_response, build_options_response, json_error, json_response, strip_body,
    HttpResponse,
};
