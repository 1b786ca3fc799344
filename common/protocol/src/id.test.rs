use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_command_ids_are_unique() {
    let a = CommandId::new();
    let b = CommandId::new();
    assert_ne!(a, b);
}

#[test]
fn test_command_id_display_matches_inner() {
    let id = CommandId::from("cmd-7");
    assert_eq!(id.to_string(), "cmd-7");
    assert_eq!(id.as_str(), "cmd-7");
}

#[test]
fn test_request_id_is_copy_and_hashable() {
    use std::collections::HashMap;

    let id = RequestId(42);
    let copy = id;
    let mut map = HashMap::new();
    map.insert(id, "pending");
    assert_eq!(map.get(&copy), Some(&"pending"));
}
