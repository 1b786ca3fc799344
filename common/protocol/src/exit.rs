//! Exit codes reported in `exited` envelopes.
//!
//! The numbers follow the conventions a terminal user already knows:
//! 124 for timeouts, 127 for unknown commands, 130 for interrupts, and the
//! curl-style 22/27/28 family for fetch failures.

/// Successful completion.
pub const SUCCESS: i32 = 0;

/// Generic failure.
pub const FAILURE: i32 = 1;

/// Usage error, or an operation refused by policy.
pub const USAGE: i32 = 2;

/// An HTTP request completed with a failure status.
pub const HTTP_ERROR: i32 = 22;

/// A download exceeded the size ceiling.
pub const SIZE_LIMIT: i32 = 27;

/// A download exceeded the fetch time ceiling.
pub const FETCH_TIMEOUT: i32 = 28;

/// The command exceeded its wall-clock deadline.
pub const TIMED_OUT: i32 = 124;

/// No builtin or routable command with that name.
pub const NOT_FOUND: i32 = 127;

/// The command was aborted on user request.
pub const ABORTED: i32 = 130;
