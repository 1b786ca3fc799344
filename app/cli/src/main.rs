//! Demo REPL for the sandboxed shell.
//!
//! Wires a host service and a shell worker around an in-memory repository
//! engine and feeds the session lines from stdin. Real deployments embed
//! the host service behind their own display collaborator; this binary
//! exists so the whole pipeline can be exercised from a terminal.
//!
//! The engine is seeded with a small repository, so `ls`, `cat`, and
//! `git log` do something out of the box. Two credentials are stored for
//! the demo remote, with only the second one valid, so a `git push`
//! also exercises the retry path.

mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use sandbar_config::LimitsConfig;
use sandbar_config::RepoConfig;
use sandbar_config::SessionConfig;
use sandbar_git::Credential;
use sandbar_git::MemoryEngine;
use sandbar_git::StaticCredentials;
use sandbar_host::spawn_session;

const DEFAULT_REMOTE: &str = "https://git.example.com/team/demo.git";

#[derive(Parser)]
#[command(name = "sandbar")]
#[command(about = "Sandboxed command shell over a host-brokered channel")]
struct Cli {
    /// Path to a session config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Remote URL of the demo repository
    #[arg(long)]
    remote_url: Option<String>,

    /// Branch the session's read-only projection is pinned to
    #[arg(long)]
    branch: Option<String>,

    /// Allowlisted URL prefix for curl/wget (repeatable)
    #[arg(long = "allow", value_name = "PREFIX")]
    allowlist: Vec<String>,

    /// Override the per-command output byte budget
    #[arg(long)]
    max_output_bytes: Option<i64>,

    /// Override the per-command output line budget
    #[arg(long)]
    max_output_lines: Option<i64>,

    /// Override the per-command timeout in seconds (0 removes the ceiling)
    #[arg(long)]
    timeout_secs: Option<i64>,

    /// The token the demo remote accepts
    #[arg(long, default_value = "demo-token")]
    token: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let setup = config.resolve();

    let host = host_of(&setup.repo.remote_url);
    let engine = Arc::new(demo_engine(&setup.repo.remote_url, &cli.token));
    let credentials = Arc::new(StaticCredentials::new(vec![
        Credential {
            host: host.clone(),
            token: "expired-token".to_string(),
        },
        Credential {
            host,
            token: cli.token.clone(),
        },
    ]));

    let handles = spawn_session(engine, credentials);
    repl::run(handles, setup).await
}

/// Load the config file when given, otherwise start from the demo
/// defaults, then apply flag overrides and re-validate.
fn build_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig {
            repo: RepoConfig {
                name: None,
                remote_url: DEFAULT_REMOTE.to_string(),
                branch: "main".to_string(),
            },
            allowlist: Vec::new(),
            limits: LimitsConfig::default(),
        },
    };
    if let Some(url) = &cli.remote_url {
        config.repo.remote_url = url.clone();
    }
    if let Some(branch) = &cli.branch {
        config.repo.branch = branch.clone();
    }
    if !cli.allowlist.is_empty() {
        config.allowlist = cli.allowlist.clone();
    }
    if cli.max_output_bytes.is_some() {
        config.limits.max_output_bytes = cli.max_output_bytes;
    }
    if cli.max_output_lines.is_some() {
        config.limits.max_output_lines = cli.max_output_lines;
    }
    if cli.timeout_secs.is_some() {
        config.limits.timeout_secs = cli.timeout_secs;
    }
    config.validate().context("invalid session configuration")?;
    Ok(config)
}

/// Seed the in-memory engine with a small two-branch history.
fn demo_engine(remote_url: &str, token: &str) -> MemoryEngine {
    let engine = MemoryEngine::new(remote_url);
    engine.seed_commit(
        "main",
        "Ada Example <ada@example.com>",
        "3 days ago",
        "Initial import",
        &[
            (
                "/README.md",
                "# demo\n\nSeeded repository for the sandbar shell.\n",
            ),
            ("/src/main.rs", "fn main() {\n    println!(\"hello\");\n}\n"),
        ],
    );
    engine.seed_commit(
        "main",
        "Ada Example <ada@example.com>",
        "2 days ago",
        "Add library module",
        &[("/src/lib.rs", "pub fn answer() -> i32 {\n    42\n}\n")],
    );
    engine.seed_commit(
        "feature/docs",
        "Ben Example <ben@example.com>",
        "yesterday",
        "Start the guide",
        &[("/docs/guide.md", "# guide\n")],
    );
    engine.set_valid_token(token);
    // One unpushed commit, so `git push` has work to do.
    engine.set_ahead(1);
    engine
}

/// Host component of the remote URL, for the demo credential entries.
fn host_of(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?']).next().unwrap_or(rest);
    let authority = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = authority.split_once(':').map_or(authority, |(host, _)| host);
    host.to_string()
}
