//! Builtins that touch no host state except the working directory.

use crate::context::CommandContext;
use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::NodeKind;
use sandbar_protocol::exit;

pub async fn pwd(ctx: &CommandContext) -> i32 {
    ctx.sink.stdout_line(&ctx.cwd).await;
    exit::SUCCESS
}

pub async fn echo(ctx: &CommandContext, args: &[String]) -> i32 {
    ctx.sink.stdout_line(&args.join(" ")).await;
    exit::SUCCESS
}

/// Change the session working directory. The target must exist on the host
/// and be a directory; on success the new directory is broadcast so the
/// display can update its prompt.
pub async fn cd(ctx: &CommandContext, args: &[String]) -> i32 {
    let target = match args {
        [] => "/".to_string(),
        [dir] => ctx.resolve(dir),
        _ => {
            ctx.sink.stderr_line("usage: cd [dir]").await;
            return exit::USAGE;
        }
    };
    let op = FsOp::Stat {
        path: target.clone(),
    };
    match ctx.bridge.call_fs(op).await {
        Ok(FsReply::Stat { info }) if info.kind == NodeKind::Dir => {
            ctx.session.set_cwd(target.clone());
            ctx.sink.working_dir(&target).await;
            exit::SUCCESS
        }
        Ok(_) => {
            ctx.sink
                .stderr_line(&format!("cd: {target}: not a directory"))
                .await;
            exit::FAILURE
        }
        Err(text) => {
            ctx.sink
                .stderr_line(&format!("cd: {target}: {text}"))
                .await;
            exit::FAILURE
        }
    }
}
