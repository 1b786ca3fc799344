//! Identifier types for the two correlation spaces.
//!
//! Commands and RPC round trips are correlated independently: a command id
//! lives for the whole run of one command line, while a request id lives
//! for exactly one fs/git round trip issued on that command's behalf.

use serde::Deserialize;
use serde::Serialize;

/// Identifier for one submitted command line.
///
/// Minted by the display side before the `run` envelope is sent; the shell
/// treats it as opaque and echoes it on every message the run produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    /// Create a new command ID with a random UUID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CommandId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommandId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier for one host round trip (fs or git).
///
/// Minted by the shell worker from a process-local counter; the host echoes
/// it unmodified so the answer finds its waiting caller. Never reused
/// within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "id.test.rs"]
mod tests;
