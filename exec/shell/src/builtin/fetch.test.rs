use std::sync::Arc;

use tokio::sync::mpsc;

use super::parse;
use super::permitted;
use crate::bridge::HostBridge;
use crate::context::CommandContext;
use crate::context::SessionHandle;
use crate::output::OutputSink;
use sandbar_protocol::CommandId;
use sandbar_protocol::OutputLimits;
use sandbar_protocol::RepoRef;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::ShellMessage;

fn allowlist(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

fn ctx() -> (CommandContext, mpsc::Receiver<ShellMessage>) {
    let (tx, rx) = mpsc::channel(8);
    let setup = SessionSetup {
        repo: RepoRef {
            name: "demo".to_string(),
            remote_url: "https://git.example.com/demo.git".to_string(),
            branch: "main".to_string(),
        },
        allowlist: Vec::new(),
        limits: OutputLimits::default(),
    };
    let ctx = CommandContext {
        sink: OutputSink::new(CommandId::from("f1"), tx.clone(), &setup.limits),
        bridge: Arc::new(HostBridge::new(tx)),
        session: SessionHandle::new(setup),
        cwd: "/downloads".to_string(),
    };
    (ctx, rx)
}

fn args(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn without_allowlist_only_https_passes() {
    assert!(permitted(&[], "https://example.com/data.json"));
    assert!(!permitted(&[], "http://example.com/data.json"));
    assert!(!permitted(&[], "ftp://example.com/data.json"));
}

#[test]
fn allowlist_entries_are_prefixes() {
    let allow = allowlist(&["https://files.example.com/", "http://mirror.local/"]);
    assert!(permitted(&allow, "https://files.example.com/a/b.tar.gz"));
    assert!(permitted(&allow, "http://mirror.local/pkg"));
    assert!(!permitted(&allow, "https://other.example.com/a"));
}

#[test]
fn allowlist_replaces_the_https_default() {
    // A configured allowlist is the whole policy; https URLs outside it
    // are refused.
    let allow = allowlist(&["http://mirror.local/"]);
    assert!(!permitted(&allow, "https://example.com/"));
}

#[test]
fn prefix_match_is_literal() {
    let allow = allowlist(&["https://files.example.com"]);
    // Host-extension tricks do not pass a literal prefix check here; the
    // entry must cover the boundary it intends.
    assert!(permitted(&allow, "https://files.example.com.evil.io/x"));
}

#[tokio::test]
async fn dest_flag_resolves_against_the_working_directory() {
    let (ctx, _rx) = ctx();
    let request = parse(&ctx, "curl", &args(&["-o", "out.bin", "https://x/y"]))
        .await
        .expect("parsed");
    assert_eq!(request.url, "https://x/y");
    assert_eq!(request.dest.as_deref(), Some("/downloads/out.bin"));
}

#[tokio::test]
async fn wget_spells_the_dest_flag_with_a_capital_o() {
    let (ctx, _rx) = ctx();
    let request = parse(&ctx, "wget", &args(&["https://x/y", "-O", "/tmp/out"]))
        .await
        .expect("parsed");
    assert_eq!(request.dest.as_deref(), Some("/tmp/out"));
}

#[tokio::test]
async fn a_second_url_is_a_usage_error() {
    let (ctx, mut rx) = ctx();
    assert!(
        parse(&ctx, "curl", &args(&["https://a/", "https://b/"]))
            .await
            .is_none()
    );
    match rx.recv().await.expect("frame") {
        ShellMessage::Stderr { text, .. } => assert!(text.starts_with("usage: curl")),
        other => panic!("expected stderr, got {other:?}"),
    }
}
