//! Directory listing module
//!
//! Runs when the file server falls through: normalizes the path, applies the
//! dotfile policy, stats the target and, for directories, answers with either
//! 304 or a rendered listing. Every other outcome falls through to the
//! default error handler.

pub mod dotfiles;
pub mod path;
pub mod probe;
pub mod render;
pub mod template;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache};
use crate::logger;
use probe::Probe;

/// Result of the listing step
#[derive(Debug)]
pub enum ListingOutcome {
    Respond(Response<Full<Bytes>>),
    /// Not a listable directory; the next handler decides
    Fallthrough,
}

/// Serve a directory listing for the request, or fall through
pub async fn serve_listing(ctx: &RequestContext<'_>, state: &AppState) -> ListingOutcome {
    if !ctx.is_read() {
        return ListingOutcome::Fallthrough;
    }
    let policy = &state.policy;

    let Some(target) = path::normalize(ctx.target, &state.config.serve.root) else {
        logger::log_debug(&format!("[Listing] Unresolvable path: {}", ctx.target));
        return ListingOutcome::Fallthrough;
    };
    if !dotfiles::path_visible(policy.hide_dotfiles, &target.logical) {
        logger::log_debug(&format!("[Listing] Hidden path: {}", target.logical));
        return ListingOutcome::Fallthrough;
    }

    let Probe::Directory(meta) = probe::probe(&target.fs_path).await else {
        return ListingOutcome::Fallthrough;
    };

    let validators = cache::Validators::from_metadata(&meta, policy);
    let mut headers = cache::cache_headers(&validators, policy);
    if let Some(hook) = &state.header_hook {
        hook.set_headers(&mut headers, &target.fs_path, &meta);
    }

    if cache::is_fresh(&ctx.validators, &validators) {
        logger::log_debug(&format!("[Listing] Not modified: {}", target.logical));
        return ListingOutcome::Respond(http::build_304_response(headers));
    }

    // The directory may vanish between stat and read; that is a plain fallthrough
    let Some(entries) =
        render::read_entries(&target.fs_path, &target.logical, policy.hide_dotfiles).await
    else {
        logger::log_debug(&format!("[Listing] Read failed: {}", target.fs_path.display()));
        return ListingOutcome::Fallthrough;
    };

    let body = render::render_listing(&state.template, &target.logical, &entries);
    logger::log_debug(&format!(
        "[Listing] {} ({} entries, {} bytes)",
        target.logical,
        entries.len(),
        body.len()
    ));
    ListingOutcome::Respond(http::build_html_response(body, headers, ctx.is_head))
}
