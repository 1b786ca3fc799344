//! Output budget metering.
//!
//! Each command invocation gets one budget: a byte ceiling and a line
//! ceiling shared across its stdout and stderr. The shut-off latch is per
//! stream, so each stream shows the truncation marker at most once and
//! goes quiet afterwards while the command keeps running.

use sandbar_protocol::OutputLimits;

/// Which stream a line targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// The primary stream.
    Stdout,
    /// The error stream.
    Stderr,
}

/// Verdict for one candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// Within budget: emit the line.
    Line,
    /// The budget just ran out on this stream: emit the marker, then
    /// nothing more.
    Marker,
    /// The stream is already shut.
    Silent,
}

/// Byte and line accounting for one command invocation.
#[derive(Debug)]
pub struct OutputBudget {
    bytes_left: i64,
    lines_left: i64,
    stdout_open: bool,
    stderr_open: bool,
}

impl OutputBudget {
    /// A fresh budget from the session limits.
    pub fn new(limits: &OutputLimits) -> Self {
        Self {
            bytes_left: limits.max_output_bytes,
            lines_left: limits.max_output_lines,
            stdout_open: true,
            stderr_open: true,
        }
    }

    /// Meter one line of `len` content bytes (terminator excluded).
    ///
    /// A line longer than the remaining byte budget is never partially
    /// emitted; it trips the marker instead.
    pub fn admit(&mut self, stream: StreamKind, len: i64) -> Emit {
        if !self.is_open(stream) {
            return Emit::Silent;
        }
        if self.lines_left < 1 || self.bytes_left < len {
            self.shut(stream);
            return Emit::Marker;
        }
        self.lines_left -= 1;
        self.bytes_left -= len;
        Emit::Line
    }

    /// Close both streams for good. Used when the command settles so late
    /// writers go quiet without a marker.
    pub fn seal(&mut self) {
        self.stdout_open = false;
        self.stderr_open = false;
    }

    fn is_open(&self, stream: StreamKind) -> bool {
        match stream {
            StreamKind::Stdout => self.stdout_open,
            StreamKind::Stderr => self.stderr_open,
        }
    }

    fn shut(&mut self, stream: StreamKind) {
        match stream {
            StreamKind::Stdout => self.stdout_open = false,
            StreamKind::Stderr => self.stderr_open = false,
        }
    }
}

#[cfg(test)]
#[path = "budget.test.rs"]
mod tests;
