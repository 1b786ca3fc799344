//! The builtin command set.
//!
//! Every command the shell understands is implemented here against the
//! [`CommandContext`]: no process spawning, no ambient filesystem. Each
//! builtin returns a conventional exit code; the supervisor turns that into
//! the run's terminal `exited` frame.

pub mod fetch;
pub mod fsops;
pub mod paging;
pub mod simple;

use crate::context::CommandContext;
use crate::tokenizer::tokenize;
use sandbar_protocol::exit;

/// Tokenize one command line and run the named builtin.
pub async fn dispatch(ctx: &CommandContext, line: &str) -> i32 {
    let words = match tokenize(line) {
        Ok(words) => words,
        Err(e) => {
            ctx.sink.stderr_line(&format!("sandbar: {e}")).await;
            return exit::USAGE;
        }
    };
    let Some((name, args)) = words.split_first() else {
        return exit::SUCCESS;
    };
    match name.as_str() {
        "pwd" => simple::pwd(ctx).await,
        "echo" => simple::echo(ctx, args).await,
        "cd" => simple::cd(ctx, args).await,
        "ls" => fsops::ls(ctx, args).await,
        "cat" => fsops::cat(ctx, args).await,
        "mkdir" => fsops::mkdir(ctx, args).await,
        "rm" => fsops::rm(ctx, args).await,
        "mv" => fsops::mv(ctx, args).await,
        "cp" => fsops::cp(ctx, args).await,
        "touch" => fsops::touch(ctx, args).await,
        "head" => paging::head(ctx, args).await,
        "tail" => paging::tail(ctx, args).await,
        "git" => git(ctx, args).await,
        "curl" | "wget" => fetch::fetch(ctx, name, args).await,
        _ => {
            ctx.sink
                .stderr_line(&format!("{name}: command not found"))
                .await;
            exit::NOT_FOUND
        }
    }
}

/// Forward a git invocation to the host and relay its reply verbatim.
async fn git(ctx: &CommandContext, args: &[String]) -> i32 {
    match ctx.bridge.call_git(args.to_vec()).await {
        Ok(reply) => {
            for line in &reply.stdout {
                if !ctx.sink.stdout_line(line).await {
                    break;
                }
            }
            for line in &reply.stderr {
                if !ctx.sink.stderr_line(line).await {
                    break;
                }
            }
            reply.code
        }
        Err(text) => {
            ctx.sink.stderr_line(&format!("git: {text}")).await;
            exit::FAILURE
        }
    }
}
