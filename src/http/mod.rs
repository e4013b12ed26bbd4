//! HTTP protocol layer module
//!
//! Cache validators, ranges, content types and response builders shared by
//! the file server and the directory listing.

pub mod cache;
pub mod headers;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_416_response, build_error_response, build_html_response,
    build_redirect_response,
};
