use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_normalize_collapses_dot_segments() {
    assert_eq!(normalize("/a/./b//c"), "/a/b/c");
    assert_eq!(normalize("/a/b/../c"), "/a/c");
    assert_eq!(normalize("/./."), "/");
}

#[test]
fn test_normalize_never_climbs_above_root() {
    assert_eq!(normalize("/../../a"), "/a");
    assert_eq!(normalize("/.."), "/");
}

#[test]
fn test_normalize_strips_trailing_slash() {
    assert_eq!(normalize("/a/b/"), "/a/b");
    assert_eq!(normalize("/"), "/");
}

#[test]
fn test_resolve_relative_against_cwd() {
    assert_eq!(resolve("/work", "notes.txt"), "/work/notes.txt");
    assert_eq!(resolve("/work", "../etc/hosts"), "/etc/hosts");
    assert_eq!(resolve("/work", "/abs"), "/abs");
    assert_eq!(resolve("/", "a"), "/a");
}

#[test]
fn test_parent_and_file_name() {
    assert_eq!(parent("/"), None);
    assert_eq!(parent("/a"), Some("/"));
    assert_eq!(parent("/a/b"), Some("/a"));
    assert_eq!(file_name("/"), None);
    assert_eq!(file_name("/a/b.txt"), Some("b.txt"));
}

#[test]
fn test_join_handles_root() {
    assert_eq!(join("/", "a"), "/a");
    assert_eq!(join("/a", "b"), "/a/b");
}

#[test]
fn test_is_inside_is_strict() {
    assert!(is_inside("/", "/a"));
    assert!(is_inside("/a", "/a/b"));
    assert!(is_inside("/a", "/a/b/c"));
    assert!(!is_inside("/a", "/a"));
    assert!(!is_inside("/a", "/ab"));
    assert!(!is_inside("/", "/"));
}
