use pretty_assertions::assert_eq;
use sandbar_protocol::NodeKind;

use super::*;

fn seeded() -> LocalStore {
    let mut store = LocalStore::new();
    store.put_dir("/a".to_string());
    store.put_dir("/a/sub".to_string());
    store.put_file("/a/x.txt".to_string(), b"x".to_vec());
    store.put_file("/a/sub/y.txt".to_string(), b"y".to_vec());
    store
}

#[test]
fn test_root_always_exists() {
    let store = LocalStore::new();
    assert_eq!(store.kind("/"), Some(NodeKind::Dir));
    assert!(!store.has_children("/"));
}

#[test]
fn test_path_is_file_or_dir_never_both() {
    let store = seeded();
    assert_eq!(store.kind("/a"), Some(NodeKind::Dir));
    assert_eq!(store.kind("/a/x.txt"), Some(NodeKind::File));
    assert_eq!(store.kind("/missing"), None);
}

#[test]
fn test_children_are_one_level_and_sorted() {
    let store = seeded();
    let names: Vec<String> = store
        .children("/a")
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["sub".to_string(), "x.txt".to_string()]);
}

#[test]
fn test_remove_tree_takes_markers_and_files() {
    let mut store = seeded();
    store.remove_tree("/a");
    assert_eq!(store.kind("/a"), None);
    assert_eq!(store.kind("/a/sub"), None);
    assert_eq!(store.kind("/a/sub/y.txt"), None);
    assert_eq!(store.kind("/"), Some(NodeKind::Dir));
}

#[test]
fn test_remove_tree_leaves_siblings() {
    let mut store = seeded();
    store.put_file("/keep.txt".to_string(), b"k".to_vec());
    store.remove_tree("/a");
    assert_eq!(store.kind("/keep.txt"), Some(NodeKind::File));
}

#[test]
fn test_rebase_moves_whole_subtree() {
    let mut store = seeded();
    store.rebase("/a", "/b");
    assert_eq!(store.kind("/a"), None);
    assert_eq!(store.kind("/b"), Some(NodeKind::Dir));
    assert_eq!(store.kind("/b/sub"), Some(NodeKind::Dir));
    assert_eq!(store.file("/b/sub/y.txt"), Some(&b"y".to_vec()));
}

#[test]
fn test_rebase_moves_single_file() {
    let mut store = seeded();
    store.rebase("/a/x.txt", "/a/z.txt");
    assert_eq!(store.kind("/a/x.txt"), None);
    assert_eq!(store.file("/a/z.txt"), Some(&b"x".to_vec()));
}
