//! Builtins backed by host filesystem round trips.
//!
//! Each of these maps straight onto one [`FsOp`] per operand. Host-side
//! refusals come back as error text and are reported in the usual
//! `name: path: reason` form; the builtin keeps going over remaining
//! operands and reports the worst exit code.

use crate::context::CommandContext;
use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::NodeKind;
use sandbar_protocol::exit;

pub async fn ls(ctx: &CommandContext, args: &[String]) -> i32 {
    let path = match args {
        [] => ctx.cwd.clone(),
        [path] => ctx.resolve(path),
        _ => {
            ctx.sink.stderr_line("usage: ls [path]").await;
            return exit::USAGE;
        }
    };
    let op = FsOp::ReadDir { path: path.clone() };
    match ctx.bridge.call_fs(op).await {
        Ok(FsReply::Entries { entries }) => {
            for entry in entries {
                let line = match entry.kind {
                    NodeKind::Dir => format!("{}/", entry.name),
                    NodeKind::File => entry.name,
                };
                if !ctx.sink.stdout_line(&line).await {
                    break;
                }
            }
            exit::SUCCESS
        }
        Ok(_) => unexpected(ctx, "ls").await,
        Err(text) => fail(ctx, "ls", &path, &text).await,
    }
}

pub async fn cat(ctx: &CommandContext, args: &[String]) -> i32 {
    if args.is_empty() {
        ctx.sink.stderr_line("usage: cat <file>...").await;
        return exit::USAGE;
    }
    let mut worst = exit::SUCCESS;
    for arg in args {
        let path = ctx.resolve(arg);
        let op = FsOp::ReadFile { path: path.clone() };
        match ctx.bridge.call_fs(op).await {
            Ok(FsReply::File { contents }) => {
                ctx.sink
                    .stdout_chunk(&String::from_utf8_lossy(&contents))
                    .await;
            }
            Ok(_) => {
                worst = unexpected(ctx, "cat").await;
            }
            Err(text) => {
                worst = fail(ctx, "cat", &path, &text).await;
            }
        }
    }
    worst
}

pub async fn mkdir(ctx: &CommandContext, args: &[String]) -> i32 {
    if args.is_empty() {
        ctx.sink.stderr_line("usage: mkdir <dir>...").await;
        return exit::USAGE;
    }
    let mut worst = exit::SUCCESS;
    for arg in args {
        let path = ctx.resolve(arg);
        let op = FsOp::Mkdir { path: path.clone() };
        match ctx.bridge.call_fs(op).await {
            Ok(FsReply::Unit) => {}
            Ok(_) => {
                worst = unexpected(ctx, "mkdir").await;
            }
            Err(text) => {
                worst = fail(ctx, "mkdir", &path, &text).await;
            }
        }
    }
    worst
}

pub async fn rm(ctx: &CommandContext, args: &[String]) -> i32 {
    let mut recursive = false;
    let mut paths = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-r" => recursive = true,
            flag if flag.starts_with('-') => {
                ctx.sink.stderr_line("usage: rm [-r] <path>...").await;
                return exit::USAGE;
            }
            path => paths.push(path),
        }
    }
    if paths.is_empty() {
        ctx.sink.stderr_line("usage: rm [-r] <path>...").await;
        return exit::USAGE;
    }
    let mut worst = exit::SUCCESS;
    for arg in paths {
        let path = ctx.resolve(arg);
        let op = FsOp::Remove {
            path: path.clone(),
            recursive,
        };
        match ctx.bridge.call_fs(op).await {
            Ok(FsReply::Unit) => {}
            Ok(_) => {
                worst = unexpected(ctx, "rm").await;
            }
            Err(text) => {
                worst = fail(ctx, "rm", &path, &text).await;
            }
        }
    }
    worst
}

pub async fn mv(ctx: &CommandContext, args: &[String]) -> i32 {
    let [from, to] = args else {
        ctx.sink.stderr_line("usage: mv <from> <to>").await;
        return exit::USAGE;
    };
    let from = ctx.resolve(from);
    let to = ctx.resolve(to);
    let op = FsOp::Rename {
        from: from.clone(),
        to: to.clone(),
    };
    match ctx.bridge.call_fs(op).await {
        Ok(FsReply::Unit) => exit::SUCCESS,
        Ok(_) => unexpected(ctx, "mv").await,
        Err(text) => {
            ctx.sink
                .stderr_line(&format!("mv: cannot move '{from}' to '{to}': {text}"))
                .await;
            exit::FAILURE
        }
    }
}

pub async fn cp(ctx: &CommandContext, args: &[String]) -> i32 {
    let [from, to] = args else {
        ctx.sink.stderr_line("usage: cp <from> <to>").await;
        return exit::USAGE;
    };
    let from = ctx.resolve(from);
    let to = ctx.resolve(to);
    let op = FsOp::Copy {
        from: from.clone(),
        to: to.clone(),
    };
    match ctx.bridge.call_fs(op).await {
        Ok(FsReply::Unit) => exit::SUCCESS,
        Ok(_) => unexpected(ctx, "cp").await,
        Err(text) => {
            ctx.sink
                .stderr_line(&format!("cp: cannot copy '{from}' to '{to}': {text}"))
                .await;
            exit::FAILURE
        }
    }
}

pub async fn touch(ctx: &CommandContext, args: &[String]) -> i32 {
    if args.is_empty() {
        ctx.sink.stderr_line("usage: touch <file>...").await;
        return exit::USAGE;
    }
    let mut worst = exit::SUCCESS;
    for arg in args {
        let path = ctx.resolve(arg);
        let op = FsOp::Touch { path: path.clone() };
        match ctx.bridge.call_fs(op).await {
            Ok(FsReply::Unit) => {}
            Ok(_) => {
                worst = unexpected(ctx, "touch").await;
            }
            Err(text) => {
                worst = fail(ctx, "touch", &path, &text).await;
            }
        }
    }
    worst
}

async fn fail(ctx: &CommandContext, name: &str, path: &str, text: &str) -> i32 {
    ctx.sink
        .stderr_line(&format!("{name}: {path}: {text}"))
        .await;
    exit::FAILURE
}

async fn unexpected(ctx: &CommandContext, name: &str) -> i32 {
    ctx.sink
        .stderr_line(&format!("{name}: unexpected host reply"))
        .await;
    exit::FAILURE
}
