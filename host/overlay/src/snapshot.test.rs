use pretty_assertions::assert_eq;
use sandbar_protocol::NodeKind;

use super::*;

fn projection() -> MemorySnapshot {
    let mut snapshot = MemorySnapshot::new();
    snapshot.insert("main", "/README.md", "hello\n");
    snapshot.insert("main", "/src/main.rs", "fn main() {}\n");
    snapshot.insert("main", "/src/lib.rs", "");
    snapshot.insert("dev", "/only-on-dev.txt", "x");
    snapshot
}

#[tokio::test]
async fn test_read_file_is_branch_scoped() {
    let snapshot = projection();
    let on_main = snapshot
        .read_file("main", "/README.md")
        .await
        .expect("read");
    let on_dev = snapshot.read_file("dev", "/README.md").await.expect("read");
    assert_eq!(on_main, Some(b"hello\n".to_vec()));
    assert_eq!(on_dev, None);
}

#[tokio::test]
async fn test_read_dir_derives_directories_from_files() {
    let snapshot = projection();
    let root = snapshot
        .read_dir("main", "/")
        .await
        .expect("read")
        .expect("is a dir");
    let names: Vec<(String, NodeKind)> = root.into_iter().map(|e| (e.name, e.kind)).collect();
    assert_eq!(
        names,
        vec![
            ("README.md".to_string(), NodeKind::File),
            ("src".to_string(), NodeKind::Dir),
        ]
    );
}

#[tokio::test]
async fn test_read_dir_on_file_is_none() {
    let snapshot = projection();
    let result = snapshot.read_dir("main", "/README.md").await.expect("read");
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_read_dir_on_missing_path_is_none() {
    let snapshot = projection();
    let result = snapshot.read_dir("main", "/nope").await.expect("read");
    assert_eq!(result, None);
}
