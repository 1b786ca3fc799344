use std::sync::Arc;

use pretty_assertions::assert_eq;
use sandbar_protocol::NodeKind;

use super::*;
use crate::MemorySnapshot;

fn overlay() -> Overlay {
    let mut snapshot = MemorySnapshot::new();
    snapshot.insert("main", "/README.md", "hello\n");
    snapshot.insert("main", "/src/main.rs", "fn main() {}\n");
    snapshot.insert("dev", "/dev-only.txt", "d");
    Overlay::new(Arc::new(snapshot), "main")
}

#[tokio::test]
async fn test_last_write_wins_on_same_path() {
    let mut fs = overlay();
    fs.write_file("/note.txt", b"first".to_vec())
        .await
        .expect("write");
    fs.write_file("/note.txt", b"second".to_vec())
        .await
        .expect("write");
    assert_eq!(fs.read_file("/note.txt").await.expect("read"), b"second");
}

#[tokio::test]
async fn test_local_file_shadows_projection() {
    let mut fs = overlay();
    assert_eq!(fs.read_file("/README.md").await.expect("read"), b"hello\n");
    fs.write_file("/README.md", b"patched\n".to_vec())
        .await
        .expect("write");
    assert_eq!(fs.read_file("/README.md").await.expect("read"), b"patched\n");
}

#[tokio::test]
async fn test_write_under_missing_parent_fails() {
    let mut fs = overlay();
    let err = fs
        .write_file("/nope/file.txt", b"x".to_vec())
        .await
        .expect_err("must fail");
    assert_eq!(err, OverlayError::ParentMissing);
}

#[tokio::test]
async fn test_projection_dir_is_not_a_writable_parent() {
    let mut fs = overlay();
    // /src exists only in the projection.
    let err = fs
        .write_file("/src/new.rs", b"x".to_vec())
        .await
        .expect_err("must fail");
    assert_eq!(err, OverlayError::ParentMissing);

    // mkdir materializes it, after which the write lands.
    fs.mkdir("/src").await.expect("mkdir");
    fs.write_file("/src/new.rs", b"x".to_vec())
        .await
        .expect("write");
    assert_eq!(fs.read_file("/src/new.rs").await.expect("read"), b"x");
}

#[tokio::test]
async fn test_mkdir_over_existing_local_fails() {
    let mut fs = overlay();
    fs.mkdir("/a").await.expect("mkdir");
    let err = fs.mkdir("/a").await.expect_err("must fail");
    assert_eq!(err, OverlayError::AlreadyExists);
}

#[tokio::test]
async fn test_mkdir_over_projection_file_fails() {
    let mut fs = overlay();
    let err = fs.mkdir("/README.md").await.expect_err("must fail");
    assert_eq!(err, OverlayError::AlreadyExists);
}

#[tokio::test]
async fn test_remove_non_empty_dir_needs_recursive() {
    let mut fs = overlay();
    fs.mkdir("/a").await.expect("mkdir");
    fs.touch("/a/b.txt").await.expect("touch");

    let err = fs.remove("/a", false).await.expect_err("must fail");
    assert_eq!(err, OverlayError::NotEmpty);

    fs.remove("/a", true).await.expect("recursive remove");
    let err = fs.read_dir("/a").await.expect_err("listing must fail");
    assert_eq!(err, OverlayError::NotFound);
}

#[tokio::test]
async fn test_remove_projection_content_is_read_only() {
    let mut fs = overlay();
    let err = fs.remove("/README.md", false).await.expect_err("must fail");
    assert_eq!(err, OverlayError::ReadOnly);
    let err = fs.remove("/src", true).await.expect_err("must fail");
    assert_eq!(err, OverlayError::ReadOnly);
}

#[tokio::test]
async fn test_remove_root_is_refused() {
    let mut fs = overlay();
    let err = fs.remove("/", true).await.expect_err("must fail");
    assert_eq!(err, OverlayError::NotPermitted);
}

#[tokio::test]
async fn test_read_dir_merges_both_layers_local_wins() {
    let mut fs = overlay();
    fs.mkdir("/src").await.expect("mkdir");
    fs.write_file("/src/local.rs", b"l".to_vec())
        .await
        .expect("write");

    let entries = fs.read_dir("/src").await.expect("read_dir");
    let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["local.rs".to_string(), "main.rs".to_string()]);
}

#[tokio::test]
async fn test_read_dir_on_file_is_not_a_directory() {
    let fs = overlay();
    let err = fs.read_dir("/README.md").await.expect_err("must fail");
    assert_eq!(err, OverlayError::NotADirectory);
}

#[tokio::test]
async fn test_rename_moves_local_subtree() {
    let mut fs = overlay();
    fs.mkdir("/a").await.expect("mkdir");
    fs.write_file("/a/x.txt", b"x".to_vec()).await.expect("write");

    fs.rename("/a", "/b").await.expect("rename");
    assert_eq!(fs.read_file("/b/x.txt").await.expect("read"), b"x");
    let err = fs.stat("/a").await.expect_err("gone");
    assert_eq!(err, OverlayError::NotFound);
}

#[tokio::test]
async fn test_rename_into_existing_dir_retargets() {
    let mut fs = overlay();
    fs.mkdir("/a").await.expect("mkdir");
    fs.mkdir("/b").await.expect("mkdir");
    fs.write_file("/a/x.txt", b"x".to_vec()).await.expect("write");

    fs.rename("/a/x.txt", "/b").await.expect("rename");
    assert_eq!(fs.read_file("/b/x.txt").await.expect("read"), b"x");
}

#[tokio::test]
async fn test_rename_projection_source_is_read_only() {
    let mut fs = overlay();
    let err = fs
        .rename("/README.md", "/copy.md")
        .await
        .expect_err("must fail");
    assert_eq!(err, OverlayError::ReadOnly);
}

#[tokio::test]
async fn test_rename_into_itself_is_refused() {
    let mut fs = overlay();
    fs.mkdir("/a").await.expect("mkdir");
    let err = fs.rename("/a", "/a/b").await.expect_err("must fail");
    assert_eq!(err, OverlayError::NotPermitted);
}

#[tokio::test]
async fn test_rename_dir_onto_file_is_refused() {
    let mut fs = overlay();
    fs.write_file("/f", b"keep me".to_vec()).await.expect("write");
    fs.mkdir("/d").await.expect("mkdir");
    let err = fs.rename("/d", "/f").await.expect_err("must fail");
    assert_eq!(err, OverlayError::NotADirectory);

    // The path is still just the file: removing it recursively leaves
    // nothing readable behind.
    assert_eq!(
        fs.stat("/f").await.expect("stat").kind,
        NodeKind::File
    );
    fs.remove("/f", true).await.expect("remove");
    let err = fs.read_file("/f").await.expect_err("gone");
    assert_eq!(err, OverlayError::NotFound);
}

#[tokio::test]
async fn test_rename_dir_onto_projection_file_is_refused() {
    let mut fs = overlay();
    fs.mkdir("/d").await.expect("mkdir");
    let err = fs.rename("/d", "/README.md").await.expect_err("must fail");
    assert_eq!(err, OverlayError::NotADirectory);
}

#[tokio::test]
async fn test_rename_file_onto_file_replaces_it() {
    let mut fs = overlay();
    fs.write_file("/old.txt", b"old".to_vec()).await.expect("write");
    fs.write_file("/new.txt", b"new".to_vec()).await.expect("write");
    fs.rename("/new.txt", "/old.txt").await.expect("rename");
    assert_eq!(fs.read_file("/old.txt").await.expect("read"), b"new");
    let err = fs.read_file("/new.txt").await.expect_err("moved away");
    assert_eq!(err, OverlayError::NotFound);
}

#[tokio::test]
async fn test_copy_reads_projection_writes_local() {
    let mut fs = overlay();
    fs.copy("/README.md", "/copy.md").await.expect("copy");
    assert_eq!(fs.read_file("/copy.md").await.expect("read"), b"hello\n");
    // The original is still projection content.
    let err = fs.remove("/README.md", false).await.expect_err("read-only");
    assert_eq!(err, OverlayError::ReadOnly);
}

#[tokio::test]
async fn test_copy_of_directory_is_refused() {
    let mut fs = overlay();
    let err = fs.copy("/src", "/elsewhere").await.expect_err("must fail");
    assert_eq!(err, OverlayError::IsADirectory);
}

#[tokio::test]
async fn test_touch_is_a_no_op_on_visible_paths() {
    let mut fs = overlay();
    fs.touch("/README.md").await.expect("touch projection file");
    fs.touch("/src").await.expect("touch projection dir");
    // Still projection content, not materialized.
    let err = fs.remove("/README.md", false).await.expect_err("read-only");
    assert_eq!(err, OverlayError::ReadOnly);
}

#[tokio::test]
async fn test_touch_creates_empty_local_file() {
    let mut fs = overlay();
    fs.touch("/empty.txt").await.expect("touch");
    assert_eq!(fs.read_file("/empty.txt").await.expect("read"), b"");
}

#[tokio::test]
async fn test_branch_switch_repins_projection() {
    let mut fs = overlay();
    let err = fs.read_file("/dev-only.txt").await.expect_err("not on main");
    assert_eq!(err, OverlayError::NotFound);

    fs.set_branch("dev");
    assert_eq!(fs.read_file("/dev-only.txt").await.expect("read"), b"d");

    // Local writes survive the switch.
    fs.write_file("/note.txt", b"n".to_vec()).await.expect("write");
    fs.set_branch("main");
    assert_eq!(fs.read_file("/note.txt").await.expect("read"), b"n");
}

#[tokio::test]
async fn test_stat_reports_kind_and_size() {
    let mut fs = overlay();
    fs.mkdir("/a").await.expect("mkdir");
    fs.write_file("/a/x.txt", b"abc".to_vec()).await.expect("write");

    let dir = fs.stat("/a").await.expect("stat");
    assert_eq!(dir.kind, NodeKind::Dir);
    let file = fs.stat("/a/x.txt").await.expect("stat");
    assert_eq!(file.kind, NodeKind::File);
    assert_eq!(file.size, 3);
    let projected = fs.stat("/README.md").await.expect("stat");
    assert_eq!(projected.size, 6);
}

#[tokio::test]
async fn test_apply_dispatches_wire_ops() {
    use sandbar_protocol::{FsOp, FsReply};

    let mut fs = overlay();
    let reply = fs
        .apply(FsOp::Mkdir {
            path: "/w".to_string(),
        })
        .await
        .expect("mkdir");
    assert_eq!(reply, FsReply::Unit);

    let reply = fs
        .apply(FsOp::WriteFile {
            path: "/w/f.txt".to_string(),
            contents: b"data".to_vec(),
        })
        .await
        .expect("write");
    assert_eq!(reply, FsReply::Unit);

    match fs
        .apply(FsOp::ReadFile {
            path: "/w/f.txt".to_string(),
        })
        .await
        .expect("read")
    {
        FsReply::File { contents } => assert_eq!(contents, b"data"),
        other => panic!("unexpected reply: {other:?}"),
    }
}
