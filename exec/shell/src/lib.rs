//! The sandboxed shell: command execution in an isolated context.
//!
//! This crate is the isolated half of the system. It owns no real I/O:
//! every filesystem touch and every git operation becomes an RPC request
//! across the host channel, and only the answers come back. What it does
//! own:
//!
//! - a minimal tokenizer (whitespace words, quote grouping, nothing else)
//! - the builtin set (`pwd`, `echo`, `cd`, `ls`, `cat`, `mkdir`, `rm`,
//!   `mv`, `cp`, `head`, `tail`, `touch`), plus routed `git` and the gated
//!   `curl`/`wget` fetch
//! - output metering: byte and line budgets per command, with a single
//!   truncation marker per stream
//! - run supervision: per-command deadlines, cooperative abort, and the
//!   guarantee of exactly one `exited` envelope per run id
//!
//! [`ShellWorker::run`] is the entry point; everything else supports it.

pub mod bridge;
pub mod budget;
pub mod builtin;
pub mod context;
pub mod output;
pub mod runs;
pub mod tokenizer;
pub mod worker;

pub use bridge::HostBridge;
pub use context::CommandContext;
pub use context::SessionHandle;
pub use output::OutputSink;
pub use runs::RunTable;
pub use tokenizer::TokenizeError;
pub use tokenizer::tokenize;
pub use worker::ShellWorker;
