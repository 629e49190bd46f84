//! Deferred logging for RustI2cSniffer.
//!
//! The edge handlers never log: their budget is a few hundred cycles and
//! even formatting is too slow there. Everything above them queues
//! entries into a lock-free ring and the main loop writes them to the
//! console when the bus is quiet.
//!
//! ```text
//! drain loop             LogStream            console UART
//! ──────────             ─────────            ────────────
//!
//! rt_info!() ──────────▶ [L0][L1][L2] ──────▶ UART TX
//! non-blocking            lock-free            blocking ok
//!                         ring buffer
//! ```
//!
//! Messages may be dropped if the ring is full; drops are counted.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 120;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds.
    pub timestamp_us: i64,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            timestamp_us: 0,
            level: LogLevel::Info,
            len: 0,
            msg: [0; MAX_MSG_LEN],
        }
    }
}

/// Lock-free log ring (multiple producers, single consumer).
///
/// - Producers push via atomic index reservation, never block
/// - Push drops the message (and counts it) when the ring is full
/// - Drain runs in the main loop at leisure
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: producers coordinate via an atomic index reservation that
// refuses to lap the reader; the single consumer reads only below the
// write index. No aliasing of a slot between a producer and the reader.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new(
                [LogEntry {
                    timestamp_us: 0,
                    level: LogLevel::Info,
                    len: 0,
                    msg: [0; MAX_MSG_LEN],
                }; N],
            ),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry. Never blocks.
    ///
    /// Returns `true` if the message was queued, `false` if dropped
    /// (ring full). Safe for multiple concurrent producers: the index
    /// reservation refuses to advance into unread entries.
    #[inline]
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let read = self.read_idx.load(Ordering::Acquire);
        let reserved = self
            .write_idx
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| {
                if w.wrapping_sub(read) >= N as u32 {
                    None
                } else {
                    Some(w.wrapping_add(1))
                }
            });

        let Ok(write) = reserved else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let idx = (write as usize) & Self::MASK;

        // SAFETY: the reservation handed out this index exclusively and
        // the consumer has not reached it yet.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        true
    }

    /// Drain the next log entry (console side).
    ///
    /// Returns `None` if no entries are available.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: single consumer, unique index
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Check if there are entries to drain.
    #[inline]
    pub fn has_entries(&self) -> bool {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        read != write
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Format a log entry for console output.
///
/// Format: `[timestamp_us] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\n",
            entry.timestamp_us,
            entry.level.as_str(),
            core::str::from_utf8(&entry.msg[..entry.len as usize]).unwrap_or("<invalid utf8>")
        ),
    )
}

/// Non-blocking log macro.
///
/// Use this instead of println! anywhere the console may not be ready.
///
/// # Example
///
/// ```ignore
/// rt_log!(LogLevel::Info, LOG_STREAM, timestamp, "drained {} symbols", n);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

/// Non-blocking info log.
#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// Non-blocking warning log.
#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// Non-blocking error log.
#[macro_export]
macro_rules! rt_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// Non-blocking debug log.
#[macro_export]
macro_rules! rt_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}
