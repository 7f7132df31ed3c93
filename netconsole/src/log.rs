//! Console status logging.
//!
//! The manager reports status through a [`LogSink`]. Two sinks ship here:
//!
//! - [`RingLog`] - fixed-size ring buffer the UI drains later. Overwrites
//!   the oldest entry when full, no heap. A `spin::Mutex<RingLog>` is a sink
//!   too, so a board can keep one in a `static`.
//! - [`FmtLog`] - writes each line to any `core::fmt::Write` (serial port).

use core::fmt::{self, Write};

/// Maximum message length in bytes
pub const LOG_MSG_LEN: usize = 96;

/// Number of entries in the ring buffer
pub const LOG_RING_SIZE: usize = 32;

/// Status message sink.
pub trait LogSink {
    /// Informational status line.
    fn info(&mut self, msg: &str);

    /// Warning status line.
    fn warn(&mut self, msg: &str);
}

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogLevel {
    Info = 0,
    Warn = 1,
}

/// Single log entry in the ring buffer
#[derive(Clone)]
pub struct LogEntry {
    /// Message content
    pub msg: [u8; LOG_MSG_LEN],
    /// Actual message length
    pub len: u8,
    /// Severity
    pub level: LogLevel,
}

impl LogEntry {
    const fn empty() -> Self {
        Self {
            msg: [0u8; LOG_MSG_LEN],
            len: 0,
            level: LogLevel::Info,
        }
    }

    fn new(level: LogLevel, msg: &str) -> Self {
        let mut entry = Self::empty();
        entry.level = level;

        // Truncate on a char boundary so message() stays valid UTF-8
        let mut copy_len = msg.len().min(LOG_MSG_LEN);
        while !msg.is_char_boundary(copy_len) {
            copy_len -= 1;
        }
        entry.msg[..copy_len].copy_from_slice(&msg.as_bytes()[..copy_len]);
        entry.len = copy_len as u8;
        entry
    }

    /// Get message as string slice
    pub fn message(&self) -> &str {
        let len = (self.len as usize).min(LOG_MSG_LEN);
        core::str::from_utf8(&self.msg[..len]).unwrap_or("<invalid utf8>")
    }

    /// Format entry for display: "[NET] message" or "[WARN NET] message".
    ///
    /// Returns the number of bytes written; output is cut at `buf.len()`.
    pub fn format(&self, buf: &mut [u8]) -> usize {
        let mut cursor = SliceCursor { buf, pos: 0 };
        let _ = write!(cursor, "{}", self);
        cursor.pos
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            LogLevel::Info => write!(f, "[NET] {}", self.message()),
            LogLevel::Warn => write!(f, "[WARN NET] {}", self.message()),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::empty()
    }
}

/// Ring buffer of status lines.
pub struct RingLog {
    entries: [LogEntry; LOG_RING_SIZE],
    /// Total entries ever written
    written: usize,
    /// Total entries ever consumed (or skipped after overflow)
    read: usize,
}

impl RingLog {
    pub const fn new() -> Self {
        const EMPTY: LogEntry = LogEntry::empty();
        Self {
            entries: [EMPTY; LOG_RING_SIZE],
            written: 0,
            read: 0,
        }
    }

    /// Append an entry, overwriting the oldest when full.
    pub fn push(&mut self, level: LogLevel, msg: &str) {
        self.entries[self.written % LOG_RING_SIZE] = LogEntry::new(level, msg);
        self.written += 1;
    }

    /// Pop the oldest unread entry.
    pub fn pop(&mut self) -> Option<LogEntry> {
        if self.read >= self.written {
            return None;
        }

        // Skip entries that were overwritten before being read
        let unread = self.written - self.read;
        if unread > LOG_RING_SIZE {
            self.read += unread - LOG_RING_SIZE;
        }

        let entry = self.entries[self.read % LOG_RING_SIZE].clone();
        self.read += 1;
        Some(entry)
    }

    /// Number of entries available to read
    pub fn available(&self) -> usize {
        (self.written - self.read).min(LOG_RING_SIZE)
    }

    /// Total number of entries ever written
    pub fn count(&self) -> usize {
        self.written
    }

    /// Mark everything written so far as read
    pub fn clear(&mut self) {
        self.read = self.written;
    }

    /// Iterate over unread entries, oldest first, without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        let start = self.written - self.available();
        (start..self.written).map(move |i| &self.entries[i % LOG_RING_SIZE])
    }
}

impl Default for RingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for RingLog {
    fn info(&mut self, msg: &str) {
        self.push(LogLevel::Info, msg);
    }

    fn warn(&mut self, msg: &str) {
        self.push(LogLevel::Warn, msg);
    }
}

impl LogSink for &spin::Mutex<RingLog> {
    fn info(&mut self, msg: &str) {
        self.lock().push(LogLevel::Info, msg);
    }

    fn warn(&mut self, msg: &str) {
        self.lock().push(LogLevel::Warn, msg);
    }
}

/// Sink writing one rendered line per message to a text writer.
pub struct FmtLog<W: Write> {
    out: W,
}

impl<W: Write> FmtLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LogSink for FmtLog<W> {
    fn info(&mut self, msg: &str) {
        let _ = writeln!(self.out, "[NET] {}", msg);
    }

    fn warn(&mut self, msg: &str) {
        let _ = writeln!(self.out, "[WARN NET] {}", msg);
    }
}

struct SliceCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Write for SliceCursor<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.pos;
        let n = s.len().min(room);
        self.buf[self.pos..self.pos + n].copy_from_slice(&s.as_bytes()[..n]);
        self.pos += n;
        if n < s.len() {
            return Err(fmt::Error);
        }
        Ok(())
    }
}
