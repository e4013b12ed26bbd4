//! Request pipeline
//!
//! Static file server first; on fallthrough the directory listing (when
//! enabled); whatever is left goes to the default error handler.

use crate::config::AppState;
use crate::handler::{fallback, static_files};
use crate::http::cache::RequestValidators;
use crate::listing::{self, ListingOutcome};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Uri};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Borrowed view of the parts of a request the handlers look at
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub method: &'a Method,
    /// Path plus query, exactly as received
    pub target: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub validators: RequestValidators<'a>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self::build(&parts.method, &parts.uri, &parts.headers)
    }

    #[cfg(test)]
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self::build(req.method(), req.uri(), req.headers())
    }

    fn build(method: &'a Method, uri: &'a Uri, headers: &'a HeaderMap) -> Self {
        let text = move |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            method,
            target: uri.path_and_query().map_or("/", |pq| pq.as_str()),
            path: uri.path(),
            query: uri.query(),
            is_head: method == Method::HEAD,
            validators: RequestValidators {
                if_none_match: text(header::IF_NONE_MATCH),
                if_modified_since: text(header::IF_MODIFIED_SINCE),
            },
            range_header: text(header::RANGE),
        }
    }

    /// `GET` or `HEAD`
    pub fn is_read(&self) -> bool {
        matches!(*self.method, Method::GET | Method::HEAD)
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // The body is never read; only the head takes part in the pipeline
    let (parts, _) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);

    let mut response = dispatch(&ctx, &state).await;

    if let Ok(value) = HeaderValue::from_str(&state.server_name) {
        response.headers_mut().insert(header::SERVER, value);
    }

    if state.access_log() {
        let entry = access_entry(&parts, &ctx, &response, peer, started);
        logger::log_access(&entry, &state.access_format);
    }

    Ok(response)
}

async fn dispatch(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match static_files::serve(ctx, state).await {
        static_files::FileOutcome::Served(response) => response,
        static_files::FileOutcome::Failed(status) => fallback::finish(ctx, Some(status)),
        static_files::FileOutcome::Fallthrough if state.config.serve.listing => {
            match listing::serve_listing(ctx, state).await {
                ListingOutcome::Respond(response) => response,
                ListingOutcome::Fallthrough => fallback::finish(ctx, None),
            }
        }
        static_files::FileOutcome::Fallthrough => fallback::finish(ctx, None),
    }
}

fn access_entry(
    parts: &Parts,
    ctx: &RequestContext<'_>,
    response: &Response<Full<Bytes>>,
    peer: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let header_text = |name: header::HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    let body_bytes = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .filter(|_| !ctx.is_head)
        .unwrap_or(0);

    let mut entry = AccessLogEntry::new(
        peer.ip().to_string(),
        ctx.method.to_string(),
        ctx.path.to_string(),
    );
    entry.query = ctx.query.map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = body_bytes;
    entry.referer = header_text(header::REFERER);
    entry.user_agent = header_text(header::USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
