//! Default error handler, the last step of the pipeline

use crate::handler::router::RequestContext;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Terminal response for a request nothing else answered.
///
/// `None` means plain fallthrough and yields `Cannot <METHOD> <path>` with 404;
/// an explicit status gets its reason phrase.
pub fn finish(ctx: &RequestContext<'_>, status: Option<StatusCode>) -> Response<Full<Bytes>> {
    let (status, message) = match status {
        None => (
            StatusCode::NOT_FOUND,
            format!("Cannot {} {}", ctx.method, ctx.path),
        ),
        Some(status) => (
            status,
            status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
        ),
    };
    if status.is_server_error() {
        logger::log_error(&format!("{} {} -> {}", ctx.method, ctx.path, status));
    }
    http::build_error_response(status, &message, ctx.is_head)
}
