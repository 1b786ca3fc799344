use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_fs_op_serializes_with_op_tag() {
    let op = FsOp::Remove {
        path: "/a/b".to_string(),
        recursive: true,
    };
    let json = serde_json::to_value(&op).expect("serialize");
    assert_eq!(json["op"], "remove");
    assert_eq!(json["path"], "/a/b");
    assert_eq!(json["recursive"], true);
}

#[test]
fn test_unknown_op_tag_is_rejected() {
    let json = r#"{"op":"chmod","path":"/a"}"#;
    let parsed: Result<FsOp, _> = serde_json::from_str(json);
    assert!(parsed.is_err());
}

#[test]
fn test_op_name_matches_wire_tag() {
    let op = FsOp::ReadDir {
        path: "/".to_string(),
    };
    let json = serde_json::to_value(&op).expect("serialize");
    assert_eq!(json["op"], op.name());
}

#[test]
fn test_entries_reply_preserves_order() {
    let reply = FsReply::Entries {
        entries: vec![
            DirEntry {
                name: "a.txt".to_string(),
                kind: NodeKind::File,
            },
            DirEntry {
                name: "sub".to_string(),
                kind: NodeKind::Dir,
            },
        ],
    };
    let json = serde_json::to_value(&reply).expect("serialize");
    assert_eq!(json["entries"][0]["name"], "a.txt");
    assert_eq!(json["entries"][1]["kind"], "dir");
}
