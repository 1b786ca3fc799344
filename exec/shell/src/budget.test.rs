use pretty_assertions::assert_eq;

use super::Emit;
use super::OutputBudget;
use super::StreamKind;
use sandbar_protocol::OutputLimits;

fn limits(bytes: i64, lines: i64) -> OutputLimits {
    OutputLimits {
        max_output_bytes: bytes,
        max_output_lines: lines,
        timeout_secs: None,
    }
}

#[test]
fn lines_within_budget_pass() {
    let mut budget = OutputBudget::new(&limits(100, 10));
    assert_eq!(budget.admit(StreamKind::Stdout, 5), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stdout, 5), Emit::Line);
}

#[test]
fn line_ceiling_trips_the_marker_once() {
    let mut budget = OutputBudget::new(&limits(1_000, 2));
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Marker);
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Silent);
}

#[test]
fn byte_ceiling_trips_the_marker() {
    let mut budget = OutputBudget::new(&limits(10, 100));
    assert_eq!(budget.admit(StreamKind::Stdout, 8), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stdout, 8), Emit::Marker);
}

#[test]
fn single_line_larger_than_budget_is_never_split() {
    let mut budget = OutputBudget::new(&limits(10, 100));
    assert_eq!(budget.admit(StreamKind::Stdout, 50), Emit::Marker);
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Silent);
}

#[test]
fn budgets_are_shared_across_streams() {
    let mut budget = OutputBudget::new(&limits(1_000, 3));
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stderr, 1), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stderr, 1), Emit::Marker);
}

#[test]
fn latch_is_per_stream() {
    let mut budget = OutputBudget::new(&limits(4, 100));
    assert_eq!(budget.admit(StreamKind::Stdout, 4), Emit::Line);
    // Stdout exhausts the shared byte pool and latches shut.
    assert_eq!(budget.admit(StreamKind::Stdout, 4), Emit::Marker);
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Silent);
    // Stderr still gets its own marker before going quiet.
    assert_eq!(budget.admit(StreamKind::Stderr, 4), Emit::Marker);
    assert_eq!(budget.admit(StreamKind::Stderr, 1), Emit::Silent);
}

#[test]
fn empty_lines_still_consume_a_line_slot() {
    let mut budget = OutputBudget::new(&limits(100, 1));
    assert_eq!(budget.admit(StreamKind::Stdout, 0), Emit::Line);
    assert_eq!(budget.admit(StreamKind::Stdout, 0), Emit::Marker);
}

#[test]
fn seal_silences_without_a_marker() {
    let mut budget = OutputBudget::new(&limits(100, 10));
    budget.seal();
    assert_eq!(budget.admit(StreamKind::Stdout, 1), Emit::Silent);
    assert_eq!(budget.admit(StreamKind::Stderr, 1), Emit::Silent);
}
