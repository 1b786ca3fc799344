//! The interactive line loop.
//!
//! One command at a time: read a line, mint a [`CommandId`], send the
//! `run` envelope, then relay session events until that id's terminal
//! `exited` arrives. Ctrl-C while a command is in flight becomes an
//! `abort` for it; Ctrl-C (or EOF) at the prompt ends the session.

use std::io::Write;

use anyhow::Result;
use anyhow::bail;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::debug;

use sandbar_host::SessionHandles;
use sandbar_protocol::CommandId;
use sandbar_protocol::HostMessage;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::ShellMessage;
use sandbar_protocol::exit;

pub async fn run(mut handles: SessionHandles, setup: SessionSetup) -> Result<()> {
    handles
        .commands
        .send(HostMessage::Configure {
            setup: setup.clone(),
        })
        .await?;

    println!(
        "sandbar shell — {} @ {} ({})",
        setup.repo.name, setup.repo.branch, setup.repo.remote_url
    );
    println!("type a command, `exit` to quit");

    let mut cwd = "/".to_string();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    loop {
        write!(stdout, "{}:{cwd}$ ", setup.repo.name)?;
        stdout.flush()?;

        let line = tokio::select! {
            line = input.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let id = CommandId::new();
        handles
            .commands
            .send(HostMessage::Run {
                id: id.clone(),
                cwd: cwd.clone(),
                line: line.to_string(),
            })
            .await?;
        relay_until_exit(&mut handles, &id, &mut cwd).await?;
    }
    Ok(())
}

/// Print session events until `id` exits. Only this command is in flight,
/// so frames for other ids can only be stragglers from an aborted run.
async fn relay_until_exit(
    handles: &mut SessionHandles,
    id: &CommandId,
    cwd: &mut String,
) -> Result<i32> {
    loop {
        tokio::select! {
            event = handles.events.recv() => {
                let Some(event) = event else {
                    bail!("session stopped unexpectedly");
                };
                match event {
                    ShellMessage::Stdout { id: owner, text } if owner == *id => {
                        print!("{text}");
                    }
                    ShellMessage::Stderr { id: owner, text } if owner == *id => {
                        eprint!("{text}");
                    }
                    ShellMessage::Exited { id: owner, code } if owner == *id => {
                        if code != exit::SUCCESS {
                            eprintln!("[exit {code}]");
                        }
                        return Ok(code);
                    }
                    ShellMessage::Progress { phase, loaded, total, .. } => match total {
                        Some(total) => eprintln!("[{phase:?}] {loaded}/{total} bytes"),
                        None => eprintln!("[{phase:?}] {loaded} bytes"),
                    },
                    ShellMessage::WorkingDir { cwd: next } => {
                        cwd.clear();
                        cwd.push_str(&next);
                    }
                    ShellMessage::Notice { severity, message } => {
                        eprintln!("[{severity}] {message}");
                    }
                    other => debug!(?other, "frame for a finished command dropped"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handles.commands.send(HostMessage::Abort { id: id.clone() }).await?;
            }
        }
    }
}
