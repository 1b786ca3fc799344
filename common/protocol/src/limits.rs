//! Output and time budgets applied to every command.

use serde::Deserialize;
use serde::Serialize;

/// Default combined output byte budget per command.
pub const DEFAULT_MAX_OUTPUT_BYTES: i64 = 200_000;

/// Default combined output line budget per command.
pub const DEFAULT_MAX_OUTPUT_LINES: i64 = 1_000;

/// Default wall-clock ceiling per command, in seconds.
pub const DEFAULT_TIMEOUT_SECS: i64 = 120;

/// Marker emitted exactly once on a stream when its command's budget runs
/// out. Nothing follows it on that stream.
pub const TRUNCATION_MARKER: &str = "[output truncated]";

/// Budgets applied to each command invocation.
///
/// Byte and line budgets are shared across the command's stdout and stderr;
/// the wall-clock ceiling covers the whole run. `timeout_secs: None` means
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLimits {
    /// Combined stdout+stderr byte budget.
    pub max_output_bytes: i64,
    /// Combined stdout+stderr line budget.
    pub max_output_lines: i64,
    /// Wall-clock ceiling in seconds, `None` for unbounded.
    pub timeout_secs: Option<i64>,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            max_output_lines: DEFAULT_MAX_OUTPUT_LINES,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }
}
