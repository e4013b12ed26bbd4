//! Static file serving module
//!
//! Resolves the request under the root, applies the dotfile, index,
//! redirect and extension options, then answers with the file (whole, ranged
//! or 304). Anything it cannot serve is reported back to the pipeline.

use crate::config::{AppState, DotfilesMode, FileOptions};
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::listing::dotfiles::has_dot_segment;
use crate::listing::path::{self, ResolvedPath};
use crate::listing::probe::{self, Probe};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Result of the file server step
#[derive(Debug)]
pub enum FileOutcome {
    Served(Response<Full<Bytes>>),
    /// Nothing here; let the listing or the error handler decide
    Fallthrough,
    /// Hand this status to the error handler
    Failed(StatusCode),
}

/// Client errors become a plain fallthrough when `fallthrough` is on; server errors never do
fn fail(opts: &FileOptions, status: StatusCode) -> FileOutcome {
    if opts.fallthrough && status.is_client_error() {
        FileOutcome::Fallthrough
    } else {
        FileOutcome::Failed(status)
    }
}

/// Serve a file for the request
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> FileOutcome {
    let opts = &state.files;

    if !ctx.is_read() {
        return fail(opts, StatusCode::METHOD_NOT_ALLOWED);
    }

    let Some(target) = path::normalize(ctx.target, &state.config.serve.root) else {
        logger::log_debug(&format!("[Static] Rejected path: {}", ctx.target));
        return fail(opts, StatusCode::FORBIDDEN);
    };

    if has_dot_segment(&target.logical) {
        match opts.dotfiles {
            DotfilesMode::Allow => {}
            DotfilesMode::Deny => return fail(opts, StatusCode::FORBIDDEN),
            DotfilesMode::Ignore => return fail(opts, StatusCode::NOT_FOUND),
        }
    }

    if target.has_trailing_slash() {
        return match find_index(&target.fs_path, &opts.index).await {
            Some((file, meta)) => send_file(ctx, state, &file, &meta).await,
            None => fail(opts, StatusCode::NOT_FOUND),
        };
    }

    match probe::probe(&target.fs_path).await {
        Probe::File(meta) => send_file(ctx, state, &target.fs_path, &meta).await,
        Probe::Directory(_) if opts.redirect => {
            FileOutcome::Served(http::build_redirect_response(&slash_location(ctx), ctx.is_head))
        }
        Probe::Directory(_) => fail(opts, StatusCode::NOT_FOUND),
        Probe::Absent => match try_extensions(&target, &opts.extensions).await {
            Some((file, meta)) => send_file(ctx, state, &file, &meta).await,
            None => fail(opts, StatusCode::NOT_FOUND),
        },
    }
}

/// Request path with a `/` appended, query preserved
fn slash_location(ctx: &RequestContext<'_>) -> String {
    match ctx.query {
        Some(query) => format!("{}/?{query}", ctx.path),
        None => format!("{}/", ctx.path),
    }
}

/// First configured index file that exists as a regular file in `dir`
async fn find_index(dir: &Path, index: &[String]) -> Option<(PathBuf, Metadata)> {
    for name in index {
        let candidate = dir.join(name);
        if let Probe::File(meta) = probe::probe(&candidate).await {
            return Some((candidate, meta));
        }
    }
    None
}

/// `path.<ext>` for each configured extension, only for extensionless paths
async fn try_extensions(target: &ResolvedPath, extensions: &[String]) -> Option<(PathBuf, Metadata)> {
    if target.fs_path.extension().is_some() {
        return None;
    }
    for ext in extensions {
        let mut candidate = target.fs_path.clone().into_os_string();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if let Probe::File(meta) = probe::probe(&candidate).await {
            return Some((candidate, meta));
        }
    }
    None
}

async fn send_file(
    ctx: &RequestContext<'_>,
    state: &AppState,
    file: &Path,
    meta: &Metadata,
) -> FileOutcome {
    let policy = &state.policy;
    let validators = cache::Validators::from_metadata(meta, policy);
    let mut headers = cache::cache_headers(&validators, policy);
    if state.files.accept_ranges {
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }
    if let Some(hook) = &state.header_hook {
        hook.set_headers(&mut headers, file, meta);
    }

    if cache::is_fresh(&ctx.validators, &validators) {
        return FileOutcome::Served(http::build_304_response(headers));
    }

    let data = match fs::read(file).await {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", file.display()));
            return fail(&state.files, StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let content_type = mime::content_type_for(file);
    let total_size = data.len() as u64;

    let range = if state.files.accept_ranges {
        http::parse_range_header(ctx.range_header, total_size)
    } else {
        RangeParseResult::None
    };

    let response = match range {
        RangeParseResult::Valid(range) => {
            let (start, end) = (range.start, range.end);
            logger::log_debug(&format!(
                "[Static] Range {start}-{end} ({} bytes) of {}",
                range.size(),
                file.display()
            ));
            #[allow(clippy::cast_possible_truncation)]
            let slice = data.slice(start as usize..=end as usize);
            http::response::build_partial_response(
                slice,
                content_type,
                headers,
                start,
                end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => {
            http::response::build_file_response(data, content_type, headers, ctx.is_head)
        }
    };
    FileOutcome::Served(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_state;
    use http_body_util::BodyExt;
    use hyper::{Method, Request};

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
        std::fs::write(dir.path().join("about.html"), "<h1>about</h1>").unwrap();
        std::fs::write(dir.path().join(".secret"), "shh").unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog/index.htm"), "posts").unwrap();
        dir
    }

    async fn run(state: &AppState, req: Request<()>) -> FileOutcome {
        let ctx = RequestContext::from_request(&req);
        serve(&ctx, state).await
    }

    fn get(target: &str) -> Request<()> {
        Request::builder().uri(target).body(()).unwrap()
    }

    async fn served(outcome: FileOutcome) -> (StatusCode, hyper::HeaderMap, Bytes) {
        match outcome {
            FileOutcome::Served(resp) => {
                let status = resp.status();
                let headers = resp.headers().clone();
                let body = resp.into_body().collect().await.unwrap().to_bytes();
                (status, headers, body)
            }
            other => panic!("expected a response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_serves_file_with_validators() {
        let dir = fixture();
        let state = test_state(dir.path(), "");
        let (status, headers, body) = served(run(&state, get("/hello.txt")).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello world");
        assert_eq!(headers[header::CONTENT_LENGTH], "11");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert!(headers[header::ETAG].to_str().unwrap().starts_with("W/\"b-"));
        assert!(headers.contains_key(header::LAST_MODIFIED));
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=0");
    }

    #[tokio::test]
    async fn test_conditional_get() {
        let dir = fixture();
        let state = test_state(dir.path(), "");
        let (_, headers, _) = served(run(&state, get("/hello.txt")).await).await;
        let req = Request::builder()
            .uri("/hello.txt")
            .header(header::IF_NONE_MATCH, headers[header::ETAG].clone())
            .body(())
            .unwrap();
        let (status, _, body) = served(run(&state, req).await).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert!(body.is_empty());

        let req = Request::builder()
            .uri("/hello.txt")
            .header(header::IF_NONE_MATCH, headers[header::ETAG].clone())
            .header(header::CACHE_CONTROL, "no-cache")
            .body(())
            .unwrap();
        let (status, _, _) = served(run(&state, req).await).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_ranges() {
        let dir = fixture();
        let state = test_state(dir.path(), "");
        let req = Request::builder()
            .uri("/hello.txt")
            .header(header::RANGE, "bytes=0-4")
            .body(())
            .unwrap();
        let (status, headers, body) = served(run(&state, req).await).await;
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(body, "hello");
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 0-4/11");

        let req = Request::builder()
            .uri("/hello.txt")
            .header(header::RANGE, "bytes=50-60")
            .body(())
            .unwrap();
        let (status, _, _) = served(run(&state, req).await).await;
        assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);

        let state = test_state(dir.path(), "acceptRanges=false");
        let req = Request::builder()
            .uri("/hello.txt")
            .header(header::RANGE, "bytes=0-4")
            .body(())
            .unwrap();
        let (status, headers, body) = served(run(&state, req).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello world");
        assert!(headers.get(header::ACCEPT_RANGES).is_none());
    }

    #[tokio::test]
    async fn test_dotfile_modes() {
        let dir = fixture();
        let allow = test_state(dir.path(), "dotfiles=allow");
        let (_, _, body) = served(run(&allow, get("/.secret")).await).await;
        assert_eq!(body, "shh");

        let deny = test_state(dir.path(), "dotfiles=deny, fallthrough=false");
        assert!(matches!(
            run(&deny, get("/.secret")).await,
            FileOutcome::Failed(StatusCode::FORBIDDEN)
        ));
        let ignore = test_state(dir.path(), "dotfiles=ignore, fallthrough=false");
        assert!(matches!(
            run(&ignore, get("/.secret")).await,
            FileOutcome::Failed(StatusCode::NOT_FOUND)
        ));
        let ignore = test_state(dir.path(), "dotfiles=ignore");
        assert!(matches!(run(&ignore, get("/.secret")).await, FileOutcome::Fallthrough));
    }

    #[tokio::test]
    async fn test_index_and_redirect() {
        let dir = fixture();
        let state = test_state(dir.path(), "index=['index.html', 'index.htm']");
        let (_, headers, body) = served(run(&state, get("/blog/")).await).await;
        assert_eq!(body, "posts");
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");

        let (status, headers, _) = served(run(&state, get("/blog")).await).await;
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(headers[header::LOCATION], "/blog/");

        let state = test_state(dir.path(), "redirect=false");
        assert!(matches!(run(&state, get("/blog")).await, FileOutcome::Fallthrough));
        // default index list has no index.htm
        assert!(matches!(run(&state, get("/blog/")).await, FileOutcome::Fallthrough));
    }

    #[tokio::test]
    async fn test_extensions_fallback() {
        let dir = fixture();
        let state = test_state(dir.path(), "extensions=['html']");
        let (_, _, body) = served(run(&state, get("/about")).await).await;
        assert_eq!(body, "<h1>about</h1>");

        let state = test_state(dir.path(), "");
        assert!(matches!(run(&state, get("/about")).await, FileOutcome::Fallthrough));
    }

    #[tokio::test]
    async fn test_method_and_fallthrough() {
        let dir = fixture();
        let post = Request::builder()
            .method(Method::POST)
            .uri("/hello.txt")
            .body(())
            .unwrap();
        let state = test_state(dir.path(), "");
        assert!(matches!(run(&state, post).await, FileOutcome::Fallthrough));

        let post = Request::builder()
            .method(Method::DELETE)
            .uri("/hello.txt")
            .body(())
            .unwrap();
        let strict = test_state(dir.path(), "fallthrough=false");
        assert!(matches!(
            run(&strict, post).await,
            FileOutcome::Failed(StatusCode::METHOD_NOT_ALLOWED)
        ));
        assert!(matches!(
            run(&strict, get("/missing.txt")).await,
            FileOutcome::Failed(StatusCode::NOT_FOUND)
        ));
    }

    #[tokio::test]
    async fn test_head_keeps_length() {
        let dir = fixture();
        let state = test_state(dir.path(), "");
        let head = Request::builder()
            .method(Method::HEAD)
            .uri("/hello.txt")
            .body(())
            .unwrap();
        let (status, headers, body) = served(run(&state, head).await).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_eq!(headers[header::CONTENT_LENGTH], "11");
    }

    #[test]
    fn test_fail_mapping() {
        let mut opts = FileOptions::from_serve(&Default::default());
        assert!(matches!(fail(&opts, StatusCode::NOT_FOUND), FileOutcome::Fallthrough));
        assert!(matches!(
            fail(&opts, StatusCode::INTERNAL_SERVER_ERROR),
            FileOutcome::Failed(StatusCode::INTERNAL_SERVER_ERROR)
        ));
        opts.fallthrough = false;
        assert!(matches!(
            fail(&opts, StatusCode::NOT_FOUND),
            FileOutcome::Failed(StatusCode::NOT_FOUND)
        ));
    }
}
