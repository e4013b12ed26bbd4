//! Request handler module
//!
//! The request pipeline: static files, then directory listings, then the
//! default error handler.

pub mod fallback;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
