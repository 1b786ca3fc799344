use pretty_assertions::assert_eq;
use pretty_assertions::assert_ne;
use tokio::sync::mpsc;

use super::HostBridge;
use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::GitReply;
use sandbar_protocol::RequestId;
use sandbar_protocol::ShellMessage;

#[tokio::test]
async fn fs_call_resolves_with_the_matching_result() {
    let (tx, mut rx) = mpsc::channel(8);
    let bridge = std::sync::Arc::new(HostBridge::new(tx));

    let caller = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .call_fs(FsOp::Stat {
                    path: "/a".to_string(),
                })
                .await
        })
    };

    let id = match rx.recv().await.expect("request frame") {
        ShellMessage::FsRequest { id, op } => {
            assert_eq!(op.name(), "stat");
            id
        }
        other => panic!("expected fs request, got {other:?}"),
    };
    bridge.resolve_fs(id, Ok(FsReply::Unit));

    let reply = caller.await.expect("join").expect("fs outcome");
    assert_eq!(reply, FsReply::Unit);
}

#[tokio::test]
async fn error_text_reaches_the_caller() {
    let (tx, mut rx) = mpsc::channel(8);
    let bridge = std::sync::Arc::new(HostBridge::new(tx));

    let caller = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .call_fs(FsOp::ReadFile {
                    path: "/missing".to_string(),
                })
                .await
        })
    };

    let id = match rx.recv().await.expect("request frame") {
        ShellMessage::FsRequest { id, .. } => id,
        other => panic!("expected fs request, got {other:?}"),
    };
    bridge.resolve_fs(id, Err("not found".to_string()));

    let outcome = caller.await.expect("join");
    assert_eq!(outcome, Err("not found".to_string()));
}

#[tokio::test]
async fn concurrent_calls_each_get_their_own_answer() {
    let (tx, mut rx) = mpsc::channel(8);
    let bridge = std::sync::Arc::new(HostBridge::new(tx));

    let first = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.call_git(vec!["status".to_string()]).await })
    };
    let first_id = match rx.recv().await.expect("request frame") {
        ShellMessage::GitRequest { id, .. } => id,
        other => panic!("expected git request, got {other:?}"),
    };

    let second = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.call_git(vec!["branch".to_string()]).await })
    };
    let second_id = match rx.recv().await.expect("request frame") {
        ShellMessage::GitRequest { id, .. } => id,
        other => panic!("expected git request, got {other:?}"),
    };
    assert_ne!(first_id, second_id);

    // Answer out of order; each waiter still gets its own reply.
    bridge.resolve_git(second_id, Ok(GitReply::ok(vec!["* main".to_string()])));
    bridge.resolve_git(first_id, Ok(GitReply::ok(vec!["clean".to_string()])));

    let first = first.await.expect("join").expect("git outcome");
    let second = second.await.expect("join").expect("git outcome");
    assert_eq!(first.stdout, vec!["clean".to_string()]);
    assert_eq!(second.stdout, vec!["* main".to_string()]);
}

#[tokio::test]
async fn unknown_result_id_is_dropped() {
    let (tx, _rx) = mpsc::channel(8);
    let bridge = HostBridge::new(tx);
    // No waiter registered; must not panic.
    bridge.resolve_fs(RequestId(999), Ok(FsReply::Unit));
    bridge.resolve_git(RequestId(999), Err("stray".to_string()));
}

#[tokio::test]
async fn closed_transport_fails_the_call() {
    let (tx, rx) = mpsc::channel(8);
    drop(rx);
    let bridge = HostBridge::new(tx);
    let outcome = bridge
        .call_fs(FsOp::Stat {
            path: "/".to_string(),
        })
        .await;
    assert_eq!(outcome, Err("host unavailable".to_string()));
}

#[tokio::test]
async fn a_result_is_delivered_at_most_once() {
    let (tx, mut rx) = mpsc::channel(8);
    let bridge = std::sync::Arc::new(HostBridge::new(tx));

    let caller = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.call_git(vec!["status".to_string()]).await })
    };
    let id = match rx.recv().await.expect("request frame") {
        ShellMessage::GitRequest { id, .. } => id,
        other => panic!("expected git request, got {other:?}"),
    };
    bridge.resolve_git(id, Ok(GitReply::ok(vec![])));
    let _ = caller.await.expect("join");
    // Second resolution finds no waiter and is ignored.
    bridge.resolve_git(id, Ok(GitReply::ok(vec!["again".to_string()])));
}
