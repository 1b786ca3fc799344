use std::sync::Arc;

use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use super::HostService;
use sandbar_git::Credential;
use sandbar_git::MemoryEngine;
use sandbar_git::StaticCredentials;
use sandbar_protocol::CommandId;
use sandbar_protocol::FsOp;
use sandbar_protocol::FsReply;
use sandbar_protocol::HostMessage;
use sandbar_protocol::OutputLimits;
use sandbar_protocol::RepoRef;
use sandbar_protocol::RequestId;
use sandbar_protocol::SessionSetup;
use sandbar_protocol::ShellMessage;

const REMOTE: &str = "https://git.example.com/team/demo.git";

/// The display side of the service plus an impersonated shell worker.
struct Harness {
    commands: mpsc::Sender<HostMessage>,
    /// What the service forwards toward the shell.
    to_shell: mpsc::Receiver<HostMessage>,
    /// Frames "the shell" sends to the service.
    from_shell: mpsc::Sender<ShellMessage>,
    display: mpsc::Receiver<ShellMessage>,
}

impl Harness {
    fn start(engine: Arc<MemoryEngine>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (to_shell_tx, to_shell_rx) = mpsc::channel(16);
        let (from_shell_tx, from_shell_rx) = mpsc::channel(16);
        let (display_tx, display_rx) = mpsc::channel(16);
        let credentials = Arc::new(StaticCredentials::new(vec![Credential {
            host: "git.example.com".to_string(),
            token: "good".to_string(),
        }]));
        let service = HostService::new(
            engine,
            credentials,
            command_rx,
            to_shell_tx,
            from_shell_rx,
            display_tx,
        );
        tokio::spawn(service.run());
        Self {
            commands: command_tx,
            to_shell: to_shell_rx,
            from_shell: from_shell_tx,
            display: display_rx,
        }
    }

    async fn configure(&mut self) {
        self.commands
            .send(HostMessage::Configure { setup: setup() })
            .await
            .expect("send configure");
        // The service forwards the envelope to the shell after building
        // its own state.
        match self.to_shell.recv().await.expect("forwarded configure") {
            HostMessage::Configure { .. } => {}
            other => panic!("expected configure, got {other:?}"),
        }
    }

    async fn fs(&mut self, id: u64, op: FsOp) -> Result<FsReply, String> {
        self.from_shell
            .send(ShellMessage::FsRequest {
                id: RequestId(id),
                op,
            })
            .await
            .expect("send fs request");
        match self.to_shell.recv().await.expect("fs result") {
            HostMessage::FsResult { id: echoed, outcome } => {
                assert_eq!(echoed, RequestId(id));
                outcome
            }
            other => panic!("expected fs result, got {other:?}"),
        }
    }
}

fn setup() -> SessionSetup {
    SessionSetup {
        repo: RepoRef {
            name: "demo".to_string(),
            remote_url: REMOTE.to_string(),
            branch: "main".to_string(),
        },
        allowlist: Vec::new(),
        limits: OutputLimits::default(),
    }
}

fn engine() -> Arc<MemoryEngine> {
    let engine = Arc::new(MemoryEngine::new(REMOTE));
    engine.seed_commit(
        "main",
        "Ada Lovelace <ada@example.com>",
        "Mon Jul 21 10:12:00 2025 +0000",
        "initial import",
        &[("/README.md", "# demo\n")],
    );
    engine
}

#[tokio::test]
async fn requests_before_configure_fail_without_state() {
    let mut h = Harness::start(engine());
    let outcome = h
        .fs(
            1,
            FsOp::Stat {
                path: "/".to_string(),
            },
        )
        .await;
    assert_eq!(outcome, Err("session not configured".to_string()));
}

#[tokio::test]
async fn fs_requests_read_through_to_repository_content() {
    let mut h = Harness::start(engine());
    h.configure().await;
    let outcome = h
        .fs(
            1,
            FsOp::ReadFile {
                path: "/README.md".to_string(),
            },
        )
        .await;
    assert_eq!(
        outcome,
        Ok(FsReply::File {
            contents: b"# demo\n".to_vec(),
        })
    );
}

#[tokio::test]
async fn fs_state_persists_across_requests() {
    let mut h = Harness::start(engine());
    h.configure().await;
    assert_eq!(
        h.fs(
            1,
            FsOp::Mkdir {
                path: "/notes".to_string(),
            },
        )
        .await,
        Ok(FsReply::Unit)
    );
    assert_eq!(
        h.fs(
            2,
            FsOp::WriteFile {
                path: "/notes/todo.txt".to_string(),
                contents: b"ship\n".to_vec(),
            },
        )
        .await,
        Ok(FsReply::Unit)
    );
    assert_eq!(
        h.fs(
            3,
            FsOp::ReadFile {
                path: "/notes/todo.txt".to_string(),
            },
        )
        .await,
        Ok(FsReply::File {
            contents: b"ship\n".to_vec(),
        })
    );
}

#[tokio::test]
async fn git_requests_are_serviced_with_the_session_branch() {
    let mut h = Harness::start(engine());
    h.configure().await;
    h.from_shell
        .send(ShellMessage::GitRequest {
            id: RequestId(7),
            args: vec!["status".to_string()],
        })
        .await
        .expect("send git request");
    match h.to_shell.recv().await.expect("git result") {
        HostMessage::GitResult { id, outcome } => {
            assert_eq!(id, RequestId(7));
            let reply = outcome.expect("serviced");
            assert_eq!(reply.code, 0);
            assert_eq!(reply.stdout[0], "On branch main");
        }
        other => panic!("expected git result, got {other:?}"),
    }
}

#[tokio::test]
async fn run_and_abort_pass_through_to_the_shell() {
    let mut h = Harness::start(engine());
    h.configure().await;
    h.commands
        .send(HostMessage::Run {
            id: CommandId::from("c1"),
            cwd: "/".to_string(),
            line: "pwd".to_string(),
        })
        .await
        .expect("send run");
    match h.to_shell.recv().await.expect("forwarded run") {
        HostMessage::Run { id, line, .. } => {
            assert_eq!(id, CommandId::from("c1"));
            assert_eq!(line, "pwd");
        }
        other => panic!("expected run, got {other:?}"),
    }

    h.commands
        .send(HostMessage::Abort {
            id: CommandId::from("c1"),
        })
        .await
        .expect("send abort");
    match h.to_shell.recv().await.expect("forwarded abort") {
        HostMessage::Abort { id } => assert_eq!(id, CommandId::from("c1")),
        other => panic!("expected abort, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_frames_are_relayed_to_the_display_untouched() {
    let mut h = Harness::start(engine());
    h.configure().await;
    h.from_shell
        .send(ShellMessage::Stdout {
            id: CommandId::from("c1"),
            text: "hello\n".to_string(),
        })
        .await
        .expect("send stdout");
    h.from_shell
        .send(ShellMessage::Exited {
            id: CommandId::from("c1"),
            code: 0,
        })
        .await
        .expect("send exited");

    match h.display.recv().await.expect("relayed stdout") {
        ShellMessage::Stdout { id, text } => {
            assert_eq!(id, CommandId::from("c1"));
            assert_eq!(text, "hello\n");
        }
        other => panic!("expected stdout, got {other:?}"),
    }
    match h.display.recv().await.expect("relayed exit") {
        ShellMessage::Exited { code, .. } => assert_eq!(code, 0),
        other => panic!("expected exited, got {other:?}"),
    }
}

#[tokio::test]
async fn a_second_configure_keeps_the_first_session_state() {
    let mut h = Harness::start(engine());
    h.configure().await;
    assert_eq!(
        h.fs(
            1,
            FsOp::Mkdir {
                path: "/keep".to_string(),
            },
        )
        .await,
        Ok(FsReply::Unit)
    );

    // Reconfiguring must not reset the overlay.
    h.configure().await;
    let outcome = h
        .fs(
            2,
            FsOp::Stat {
                path: "/keep".to_string(),
            },
        )
        .await;
    assert!(outcome.is_ok(), "outcome: {outcome:?}");
}
