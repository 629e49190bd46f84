//! Fault accounting for RustI2cSniffer.
//!
//! # Philosophy
//!
//! An observer that halts on transient noise is worse than one that loses
//! a few symbols. Faults detected inside interrupt context are therefore
//! counted, never raised: the handlers keep sniffing and the drain loop
//! reports the counters with every delivery.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Fault codes recorded by the decode path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault recorded yet.
    None = 0,

    /// Symbol buffer full: the newest symbol was discarded.
    /// One fault per rejected symbol.
    BufferOverflow = 1,

    /// SDA failed to stabilize within the read bound; the edge was
    /// classified as neither start nor stop.
    DebounceTimeout = 2,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::BufferOverflow,
            2 => FaultCode::DebounceTimeout,
            _ => FaultCode::None,
        }
    }
}

/// Thread-safe fault counters.
///
/// Recorded from interrupt context, read by the drain loop. One monotonic
/// counter per code plus the most recent code; counters survive every
/// drain and reset only at explicit re-initialization.
pub struct FaultState {
    /// Rejected symbol appends.
    overflow: AtomicU32,

    /// SDA stabilization failures.
    debounce: AtomicU32,

    /// Most recently recorded code.
    last: AtomicU8,
}

impl FaultState {
    /// Create new fault state (no faults).
    pub const fn new() -> Self {
        Self {
            overflow: AtomicU32::new(0),
            debounce: AtomicU32::new(0),
            last: AtomicU8::new(0),
        }
    }

    /// Record a fault. Lock-free, never blocks; safe from interrupt context.
    #[inline]
    pub fn record(&self, code: FaultCode) {
        match code {
            FaultCode::None => return,
            FaultCode::BufferOverflow => {
                self.overflow.fetch_add(1, Ordering::Relaxed);
            }
            FaultCode::DebounceTimeout => {
                self.debounce.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.last.store(code as u8, Ordering::Release);
    }

    /// Rejected symbol appends since re-initialization.
    #[inline]
    pub fn overflow_count(&self) -> u32 {
        self.overflow.load(Ordering::Relaxed)
    }

    /// SDA stabilization failures since re-initialization.
    #[inline]
    pub fn debounce_count(&self) -> u32 {
        self.debounce.load(Ordering::Relaxed)
    }

    /// Most recently recorded code.
    #[inline]
    pub fn last(&self) -> FaultCode {
        FaultCode::from_u8(self.last.load(Ordering::Acquire))
    }

    /// Total faults since re-initialization.
    #[inline]
    pub fn total(&self) -> u32 {
        self.overflow_count().saturating_add(self.debounce_count())
    }

    /// Reset all counters. Startup only.
    pub fn reset(&self) {
        self.overflow.store(0, Ordering::Relaxed);
        self.debounce.store(0, Ordering::Relaxed);
        self.last.store(FaultCode::None as u8, Ordering::Release);
    }

    /// Get a snapshot of the current counters.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            overflow: self.overflow_count(),
            debounce: self.debounce_count(),
            last: self.last(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault counters at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub overflow: u32,
    pub debounce: u32,
    pub last: FaultCode,
}
