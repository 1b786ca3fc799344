use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use super::OutputSink;
use sandbar_protocol::CommandId;
use sandbar_protocol::OutputLimits;
use sandbar_protocol::ShellMessage;
use sandbar_protocol::TRUNCATION_MARKER;

fn sink(lines: i64) -> (OutputSink, mpsc::Receiver<ShellMessage>) {
    let (tx, rx) = mpsc::channel(64);
    let limits = OutputLimits {
        max_output_bytes: 10_000,
        max_output_lines: lines,
        timeout_secs: None,
    };
    (OutputSink::new(CommandId::from("cmd-1"), tx, &limits), rx)
}

fn stdout_text(message: ShellMessage) -> String {
    match message {
        ShellMessage::Stdout { text, .. } => text,
        other => panic!("expected stdout, got {other:?}"),
    }
}

#[tokio::test]
async fn lines_carry_their_terminator() {
    let (sink, mut rx) = sink(10);
    assert!(sink.stdout_line("hello").await);
    assert_eq!(stdout_text(rx.recv().await.expect("frame")), "hello\n");
}

#[tokio::test]
async fn marker_follows_the_last_admitted_line() {
    let (sink, mut rx) = sink(2);
    assert!(sink.stdout_line("one").await);
    assert!(sink.stdout_line("two").await);
    assert!(!sink.stdout_line("three").await);
    assert!(!sink.stdout_line("four").await);

    assert_eq!(stdout_text(rx.recv().await.expect("frame")), "one\n");
    assert_eq!(stdout_text(rx.recv().await.expect("frame")), "two\n");
    let marker = stdout_text(rx.recv().await.expect("frame"));
    assert_eq!(marker, format!("{TRUNCATION_MARKER}\n"));
    // The fourth line produced no frame at all.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn chunk_splits_on_newlines_and_stops_at_the_marker() {
    let (sink, mut rx) = sink(2);
    sink.stdout_chunk("a\nb\nc\nd\n").await;

    assert_eq!(stdout_text(rx.recv().await.expect("frame")), "a\n");
    assert_eq!(stdout_text(rx.recv().await.expect("frame")), "b\n");
    let marker = stdout_text(rx.recv().await.expect("frame"));
    assert_eq!(marker, format!("{TRUNCATION_MARKER}\n"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn stderr_is_attributed_to_the_command() {
    let (sink, mut rx) = sink(10);
    assert!(sink.stderr_line("oops").await);
    match rx.recv().await.expect("frame") {
        ShellMessage::Stderr { id, text } => {
            assert_eq!(id.as_str(), "cmd-1");
            assert_eq!(text, "oops\n");
        }
        other => panic!("expected stderr, got {other:?}"),
    }
}

#[tokio::test]
async fn sealed_sink_emits_nothing_not_even_a_marker() {
    let (sink, mut rx) = sink(10);
    sink.seal();
    assert!(!sink.stdout_line("late").await);
    assert!(!sink.stderr_line("late").await);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn control_lines_bypass_an_exhausted_budget() {
    let (sink, mut rx) = sink(1);
    assert!(sink.stdout_line("one").await);
    assert!(!sink.stdout_line("two").await);

    sink.control_line("^C").await;

    assert_eq!(stdout_text(rx.recv().await.expect("frame")), "one\n");
    let marker = stdout_text(rx.recv().await.expect("frame"));
    assert_eq!(marker, format!("{TRUNCATION_MARKER}\n"));
    match rx.recv().await.expect("frame") {
        ShellMessage::Stderr { text, .. } => assert_eq!(text, "^C\n"),
        other => panic!("expected stderr, got {other:?}"),
    }
}

#[tokio::test]
async fn exit_frames_bypass_the_budget() {
    let (sink, mut rx) = sink(0);
    assert!(!sink.stdout_line("gone").await);
    sink.seal();
    sink.exited(0).await;

    // Only the marker and the exit frame came through.
    let marker = stdout_text(rx.recv().await.expect("frame"));
    assert_eq!(marker, format!("{TRUNCATION_MARKER}\n"));
    match rx.recv().await.expect("frame") {
        ShellMessage::Exited { code, .. } => assert_eq!(code, 0),
        other => panic!("expected exited, got {other:?}"),
    }
}
