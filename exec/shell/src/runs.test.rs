use pretty_assertions::assert_eq;

use super::RunTable;
use sandbar_protocol::CommandId;

#[test]
fn register_then_settle() {
    let table = RunTable::new();
    let id = CommandId::from("run-1");
    let token = table.register(&id);
    assert!(token.is_some());
    assert!(table.is_live(&id));
    assert_eq!(table.len(), 1);

    let entry = table.settle(&id);
    assert!(entry.is_some());
    assert!(!table.is_live(&id));
    assert!(table.is_empty());
}

#[test]
fn duplicate_live_id_is_refused() {
    let table = RunTable::new();
    let id = CommandId::from("run-1");
    assert!(table.register(&id).is_some());
    assert!(table.register(&id).is_none());
    // Still exactly one live entry.
    assert_eq!(table.len(), 1);
}

#[test]
fn id_can_be_reused_after_settling() {
    let table = RunTable::new();
    let id = CommandId::from("run-1");
    assert!(table.register(&id).is_some());
    table.settle(&id);
    assert!(table.register(&id).is_some());
}

#[test]
fn abort_cancels_the_registered_token() {
    let table = RunTable::new();
    let id = CommandId::from("run-1");
    let token = table.register(&id).expect("fresh id");
    assert!(!token.is_cancelled());
    assert!(table.abort(&id));
    assert!(token.is_cancelled());
}

#[test]
fn abort_of_unknown_id_reports_false() {
    let table = RunTable::new();
    assert!(!table.abort(&CommandId::from("ghost")));
}

#[test]
fn abort_after_settle_reports_false() {
    let table = RunTable::new();
    let id = CommandId::from("run-1");
    table.register(&id);
    table.settle(&id);
    assert!(!table.abort(&id));
}
