//! Outbound fetches for `curl` and `wget`.
//!
//! Fetches are the one builtin with real network access, so they are the
//! most tightly policed: the URL must pass the session allowlist, the body
//! is capped at [`FETCH_MAX_BYTES`], and the whole transfer is capped at
//! [`FETCH_TIMEOUT_SECS`] by dropping the request mid-flight. Progress is
//! reported out-of-band so the display can render a transfer bar without
//! spending output budget.

use std::sync::LazyLock;
use std::time::Duration;

use futures::StreamExt;

use crate::context::CommandContext;
use sandbar_protocol::FetchPhase;
use sandbar_protocol::FsOp;
use sandbar_protocol::exit;

/// Hard ceiling on a downloaded body.
pub const FETCH_MAX_BYTES: i64 = 20 * 1024 * 1024;
/// Hard ceiling on transfer wall time, separate from the command timeout.
pub const FETCH_TIMEOUT_SECS: i64 = 15;

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

struct FetchRequest {
    url: String,
    /// Overlay path to write the body to instead of streaming it.
    dest: Option<String>,
}

pub async fn fetch(ctx: &CommandContext, name: &str, args: &[String]) -> i32 {
    let Some(request) = parse(ctx, name, args).await else {
        return exit::USAGE;
    };
    if !permitted(&ctx.session.setup().allowlist, &request.url) {
        ctx.sink
            .stderr_line(&format!(
                "{name}: {}: not permitted by fetch policy",
                request.url
            ))
            .await;
        return exit::USAGE;
    }

    ctx.sink.progress(FetchPhase::Connecting, 0, None).await;
    let deadline = Duration::from_secs(FETCH_TIMEOUT_SECS as u64);
    match tokio::time::timeout(deadline, download(ctx, name, &request)).await {
        Ok(code) => code,
        Err(_) => {
            // Dropping the download future tears the connection down.
            ctx.sink
                .stderr_line(&format!(
                    "{name}: (28) transfer timed out after {FETCH_TIMEOUT_SECS}s"
                ))
                .await;
            exit::FETCH_TIMEOUT
        }
    }
}

async fn download(ctx: &CommandContext, name: &str, request: &FetchRequest) -> i32 {
    let url = &request.url;
    let response = match HTTP_CLIENT.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            ctx.sink.stderr_line(&format!("{name}: {url}: {e}")).await;
            return if e.is_timeout() {
                exit::FETCH_TIMEOUT
            } else {
                exit::FAILURE
            };
        }
    };

    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        ctx.sink
            .stderr_line(&format!(
                "{name}: (22) the requested URL returned error: {status}"
            ))
            .await;
        return exit::HTTP_ERROR;
    }

    let total = response.content_length();
    if let Some(announced) = total
        && announced as i64 > FETCH_MAX_BYTES
    {
        return oversized(ctx, name).await;
    }

    let mut body: Vec<u8> = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                ctx.sink.stderr_line(&format!("{name}: {url}: {e}")).await;
                return if e.is_timeout() {
                    exit::FETCH_TIMEOUT
                } else {
                    exit::FAILURE
                };
            }
        };
        body.extend_from_slice(&chunk);
        if body.len() as i64 > FETCH_MAX_BYTES {
            return oversized(ctx, name).await;
        }
        ctx.sink
            .progress(FetchPhase::Downloading, body.len() as u64, total)
            .await;
    }
    ctx.sink
        .progress(FetchPhase::Complete, body.len() as u64, total)
        .await;

    match &request.dest {
        Some(path) => {
            let op = FsOp::WriteFile {
                path: path.clone(),
                contents: body,
            };
            match ctx.bridge.call_fs(op).await {
                Ok(_) => exit::SUCCESS,
                Err(text) => {
                    ctx.sink
                        .stderr_line(&format!("{name}: {path}: {text}"))
                        .await;
                    exit::FAILURE
                }
            }
        }
        None => {
            ctx.sink
                .stdout_chunk(&String::from_utf8_lossy(&body))
                .await;
            exit::SUCCESS
        }
    }
}

async fn oversized(ctx: &CommandContext, name: &str) -> i32 {
    ctx.sink
        .stderr_line(&format!(
            "{name}: (27) download exceeds the {} MiB size limit",
            FETCH_MAX_BYTES / (1024 * 1024)
        ))
        .await;
    exit::SIZE_LIMIT
}

/// Parse `[-o file] <url>` in either order. `-O` is the wget spelling of
/// the same flag.
async fn parse(ctx: &CommandContext, name: &str, args: &[String]) -> Option<FetchRequest> {
    let mut url = None;
    let mut dest = None;
    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-o" | "-O" => match rest.next() {
                Some(path) => dest = Some(ctx.resolve(path)),
                None => return usage(ctx, name).await,
            },
            flag if flag.starts_with('-') => return usage(ctx, name).await,
            candidate => {
                if url.replace(candidate.to_string()).is_some() {
                    return usage(ctx, name).await;
                }
            }
        }
    }
    match url {
        Some(url) => Some(FetchRequest { url, dest }),
        None => usage(ctx, name).await,
    }
}

async fn usage(ctx: &CommandContext, name: &str) -> Option<FetchRequest> {
    ctx.sink
        .stderr_line(&format!("usage: {name} [-o file] <url>"))
        .await;
    None
}

/// Policy gate for outbound URLs. Without an allowlist only secure
/// transport is permitted; with one, the URL must extend an entry.
pub fn permitted(allowlist: &[String], url: &str) -> bool {
    if allowlist.is_empty() {
        return url.starts_with("https://");
    }
    allowlist.iter().any(|prefix| url.starts_with(prefix))
}

#[cfg(test)]
#[path = "fetch.test.rs"]
mod tests;
