use pretty_assertions::assert_eq;

use super::*;

fn setup() -> SessionSetup {
    SessionSetup {
        repo: RepoRef {
            name: "demo".to_string(),
            remote_url: "https://git.example.com/demo.git".to_string(),
            branch: "main".to_string(),
        },
        allowlist: vec!["https://crates.io/".to_string()],
        limits: OutputLimits::default(),
    }
}

#[test]
fn test_run_envelope_uses_snake_case_kind() {
    let msg = HostMessage::Run {
        id: CommandId::from("c1"),
        cwd: "/".to_string(),
        line: "echo hi".to_string(),
    };
    let json = serde_json::to_value(&msg).expect("serialize");
    assert_eq!(json["kind"], "run");
    assert_eq!(json["line"], "echo hi");
}

#[test]
fn test_configure_round_trips_setup() {
    let msg = HostMessage::Configure { setup: setup() };
    let text = serde_json::to_string(&msg).expect("serialize");
    let back: HostMessage = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back, msg);
}

#[test]
fn test_unknown_kind_fails_deserialization() {
    let json = r#"{"kind":"shutdown"}"#;
    let host: Result<HostMessage, _> = serde_json::from_str(json);
    let shell: Result<ShellMessage, _> = serde_json::from_str(json);
    assert!(host.is_err());
    assert!(shell.is_err());
}

#[test]
fn test_fs_result_carries_error_text() {
    let msg = HostMessage::FsResult {
        id: RequestId(9),
        outcome: Err("not found".to_string()),
    };
    let json = serde_json::to_value(&msg).expect("serialize");
    assert_eq!(json["kind"], "fs_result");
    assert_eq!(json["outcome"]["Err"], "not found");
}

#[test]
fn test_command_id_attribution() {
    let id = CommandId::from("c2");
    let exited = ShellMessage::Exited {
        id: id.clone(),
        code: 0,
    };
    let notice = ShellMessage::Notice {
        severity: NoticeSeverity::Info,
        message: "hello".to_string(),
    };
    assert_eq!(exited.command_id(), Some(&id));
    assert_eq!(notice.command_id(), None);
}

#[test]
fn test_git_reply_helpers_set_codes() {
    let ok = GitReply::ok(vec!["On branch main".to_string()]);
    assert_eq!(ok.code, crate::exit::SUCCESS);
    assert!(ok.stderr.is_empty());

    let err = GitReply::err(vec!["refusing".to_string()], crate::exit::USAGE);
    assert_eq!(err.code, crate::exit::USAGE);
    assert!(err.stdout.is_empty());
}
