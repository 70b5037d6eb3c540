//! Routing module
//!
//! Header-based upload routing: decides which folder under the upload root
//! receives the files of a request.

mod form_type;

pub use form_type::FormType;
