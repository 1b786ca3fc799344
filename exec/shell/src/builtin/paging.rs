//! `head` and `tail`: windowed views over one file.

use crate::context::CommandContext;
use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::exit;

const DEFAULT_WINDOW: i64 = 10;

pub async fn head(ctx: &CommandContext, args: &[String]) -> i32 {
    let Some((count, path)) = parse(ctx, "head", args).await else {
        return exit::USAGE;
    };
    let Some(text) = read(ctx, "head", &path).await else {
        return exit::FAILURE;
    };
    for line in text.lines().take(count) {
        if !ctx.sink.stdout_line(line).await {
            break;
        }
    }
    exit::SUCCESS
}

pub async fn tail(ctx: &CommandContext, args: &[String]) -> i32 {
    let Some((count, path)) = parse(ctx, "tail", args).await else {
        return exit::USAGE;
    };
    let Some(text) = read(ctx, "tail", &path).await else {
        return exit::FAILURE;
    };
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(count);
    for line in &lines[skip..] {
        if !ctx.sink.stdout_line(line).await {
            break;
        }
    }
    exit::SUCCESS
}

/// Parse `[-n N] <file>` into a window size and a resolved path.
async fn parse(ctx: &CommandContext, name: &str, args: &[String]) -> Option<(usize, String)> {
    let (count, rest) = match args {
        [flag, n, rest @ ..] if flag == "-n" => match n.parse::<i64>() {
            Ok(n) if n > 0 => (n as usize, rest),
            _ => {
                usage(ctx, name).await;
                return None;
            }
        },
        rest => (DEFAULT_WINDOW as usize, rest),
    };
    match rest {
        [file] => Some((count, ctx.resolve(file))),
        _ => {
            usage(ctx, name).await;
            None
        }
    }
}

async fn usage(ctx: &CommandContext, name: &str) {
    ctx.sink
        .stderr_line(&format!("usage: {name} [-n N] <file>"))
        .await;
}

async fn read(ctx: &CommandContext, name: &str, path: &str) -> Option<String> {
    let op = FsOp::ReadFile {
        path: path.to_string(),
    };
    match ctx.bridge.call_fs(op).await {
        Ok(FsReply::File { contents }) => Some(String::from_utf8_lossy(&contents).into_owned()),
        Ok(_) => {
            ctx.sink
                .stderr_line(&format!("{name}: unexpected host reply"))
                .await;
            None
        }
        Err(text) => {
            ctx.sink
                .stderr_line(&format!("{name}: {path}: {text}"))
                .await;
            None
        }
    }
}
