//! Edge-triggered I2C decoding state machine.
//!
//! Pure logic, no hardware dependencies. Consumes line levels delivered
//! by the GPIO edge interrupts, produces symbols into the buffer. Fully
//! testable on host.
//!
//! # Contract
//!
//! Both entry points run in interrupt context and must finish well inside
//! one bus bit period (~600 CPU cycles at 240 MHz watching a 400 kHz bus,
//! or the interrupt watchdog restarts the chip): no blocking, no
//! allocation, no logging. The only loop is the bounded SDA stabilization
//! in [`BusDecoder::on_sda_change`].
//!
//! # Shared state
//!
//! Every field has exactly one writer side: the two edge handlers mutate
//! the decoder (the hardware does not nest them), the drain loop only
//! reads. This single-writer discipline is what makes the design safe
//! without locks; do not add a second writer to any field.

use core::sync::atomic::{AtomicU16, AtomicU32, AtomicU8, Ordering};

use crate::buffer::SymbolBuffer;
use crate::config::DEBOUNCE_MAX_READS;
use crate::fault::{FaultCode, FaultState};
use crate::symbol::{BitRole, LineLevel, Symbol};

/// Whether a start condition has been seen without a matching stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BusStatus {
    /// No transaction open. Clock edges here are spurious.
    Idle = 0,

    /// Between a start and the next stop.
    Transfer = 1,
}

impl BusStatus {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => BusStatus::Transfer,
            _ => BusStatus::Idle,
        }
    }
}

/// Read access to the two bus lines.
///
/// The handlers re-read line levels at classification time, so the
/// implementation must be callable from interrupt context.
pub trait BusLines {
    /// Sample the clock line.
    fn read_scl(&self) -> LineLevel;

    /// Sample the data line.
    fn read_sda(&self) -> LineLevel;
}

/// Monotonic edge diagnostics.
///
/// Each counter is incremented by exactly one handler; a drain never
/// resets them, only explicit re-initialization does.
pub struct DiagCounters {
    scl_rising: AtomicU32,
    sda_rising: AtomicU32,
    sda_falling: AtomicU32,
    spurious_clock: AtomicU32,
}

impl DiagCounters {
    const fn new() -> Self {
        Self {
            scl_rising: AtomicU32::new(0),
            sda_rising: AtomicU32::new(0),
            sda_falling: AtomicU32::new(0),
            spurious_clock: AtomicU32::new(0),
        }
    }

    /// Rising clock edges observed.
    #[inline]
    pub fn scl_rising(&self) -> u32 {
        self.scl_rising.load(Ordering::Relaxed)
    }

    /// Rising data edges observed.
    #[inline]
    pub fn sda_rising(&self) -> u32 {
        self.sda_rising.load(Ordering::Relaxed)
    }

    /// Falling data edges observed.
    #[inline]
    pub fn sda_falling(&self) -> u32 {
        self.sda_falling.load(Ordering::Relaxed)
    }

    /// Clock edges that arrived with no transaction open.
    #[inline]
    pub fn spurious_clock(&self) -> u32 {
        self.spurious_clock.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all four counters.
    #[inline]
    pub fn snapshot(&self) -> DiagSnapshot {
        DiagSnapshot {
            scl_rising: self.scl_rising(),
            sda_rising: self.sda_rising(),
            sda_falling: self.sda_falling(),
            spurious_clock: self.spurious_clock(),
        }
    }

    fn reset(&self) {
        self.scl_rising.store(0, Ordering::Relaxed);
        self.sda_rising.store(0, Ordering::Relaxed);
        self.sda_falling.store(0, Ordering::Relaxed);
        self.spurious_clock.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of the diagnostics counters at drain time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagSnapshot {
    pub scl_rising: u32,
    pub sda_rising: u32,
    pub sda_falling: u32,
    pub spurious_clock: u32,
}

/// The decoding state machine.
///
/// Framing is inferred from raw edges alone: there is no out-of-band
/// signal, so the decoder trusts its slot counter exclusively. A single
/// missed or duplicated edge desynchronizes byte boundaries until the
/// next start condition.
pub struct BusDecoder {
    /// Bus status. Written only by the edge handlers.
    status: AtomicU8,

    /// Bit position inside the current byte, 0..=8. 8 is the ack slot.
    bit_slot: AtomicU8,

    /// Completed bytes since the last start. Only ever tested against 0.
    byte_count: AtomicU16,

    diag: DiagCounters,
}

impl BusDecoder {
    /// Create a decoder in the idle state.
    pub const fn new() -> Self {
        Self {
            status: AtomicU8::new(BusStatus::Idle as u8),
            bit_slot: AtomicU8::new(0),
            byte_count: AtomicU16::new(0),
            diag: DiagCounters::new(),
        }
    }

    /// Current bus status.
    #[inline]
    pub fn status(&self) -> BusStatus {
        BusStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Edge diagnostics.
    #[inline]
    pub fn diag(&self) -> &DiagCounters {
        &self.diag
    }

    /// Reset all decode state. Startup only, before interrupts attach.
    pub fn reset(&self) {
        self.status.store(BusStatus::Idle as u8, Ordering::Release);
        self.bit_slot.store(0, Ordering::Relaxed);
        self.byte_count.store(0, Ordering::Relaxed);
        self.diag.reset();
    }

    /// Classify a clock-rising sample from the pre-increment slot position.
    #[inline]
    fn role_for(bit_slot: u8, byte_count: u16) -> BitRole {
        if bit_slot == 8 {
            BitRole::Acknowledge
        } else if bit_slot == 7 && byte_count == 0 {
            BitRole::Direction
        } else {
            BitRole::Data
        }
    }

    /// Rising SCL: sample SDA and record one bit.
    ///
    /// Invoked once per rising clock edge. A rising clock while idle is
    /// electrical noise or a transaction whose start we missed; it is
    /// counted and otherwise ignored, since a bit with no open
    /// transaction would only desynchronize the next real one.
    ///
    /// # Timing
    ///
    /// O(1): one line read, one buffer append. Never blocks.
    #[inline]
    pub fn on_scl_rising<L: BusLines, const N: usize>(
        &self,
        lines: &L,
        buffer: &SymbolBuffer<N>,
        faults: &FaultState,
    ) {
        self.diag.scl_rising.fetch_add(1, Ordering::Relaxed);

        if self.status() == BusStatus::Idle {
            self.diag.spurious_clock.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let sda = lines.read_sda();
        let slot = self.bit_slot.load(Ordering::Relaxed);
        let bytes = self.byte_count.load(Ordering::Relaxed);

        let symbol = match Self::role_for(slot, bytes) {
            BitRole::Data => {
                self.bit_slot.store(slot + 1, Ordering::Relaxed);
                Symbol::data_bit(sda)
            }
            BitRole::Direction => {
                self.bit_slot.store(slot + 1, Ordering::Relaxed);
                Symbol::direction_bit(sda)
            }
            BitRole::Acknowledge => {
                self.byte_count.store(bytes.wrapping_add(1), Ordering::Relaxed);
                self.bit_slot.store(0, Ordering::Relaxed);
                Symbol::ack_bit(sda)
            }
        };

        if !buffer.push(symbol) {
            faults.record(FaultCode::BufferOverflow);
        }
    }

    /// SDA changed level: debounce, then classify as start, stop or neither.
    ///
    /// A falling SDA while SCL is high opens a transaction; a rising SDA
    /// while SCL is high closes one. Any other SDA movement is a data bit
    /// settling while SCL is low and needs no action here.
    ///
    /// Near-simultaneous SCL and SDA edges can still misclassify: both
    /// tests read SCL's *current* level, and no timestamp fast enough to
    /// order the two interrupts exists at this timescale.
    pub fn on_sda_change<L: BusLines, const N: usize>(
        &self,
        lines: &L,
        buffer: &SymbolBuffer<N>,
        faults: &FaultState,
    ) {
        let Some(sda) = stabilized_sda(lines) else {
            faults.record(FaultCode::DebounceTimeout);
            return;
        };

        match sda {
            LineLevel::High => {
                self.diag.sda_rising.fetch_add(1, Ordering::Relaxed);

                // Stop only when a transfer is actually open
                if lines.read_scl().is_high() && self.status() == BusStatus::Transfer {
                    self.status.store(BusStatus::Idle as u8, Ordering::Release);
                    self.bit_slot.store(0, Ordering::Relaxed);
                    self.byte_count.store(0, Ordering::Relaxed);

                    // The stop's own clock rise already recorded a
                    // speculative data bit; take it back before framing.
                    buffer.rewind_one();
                    if !buffer.push(Symbol::STOP) {
                        faults.record(FaultCode::BufferOverflow);
                    }
                    if !buffer.push(Symbol::END_OF_TRANSFER) {
                        faults.record(FaultCode::BufferOverflow);
                    }
                }
            }
            LineLevel::Low => {
                self.diag.sda_falling.fetch_add(1, Ordering::Relaxed);

                if lines.read_scl().is_high() && self.status() == BusStatus::Idle {
                    self.status.store(BusStatus::Transfer as u8, Ordering::Release);
                    self.bit_slot.store(0, Ordering::Relaxed);
                    self.byte_count.store(0, Ordering::Relaxed);

                    if !buffer.push(Symbol::START) {
                        faults.record(FaultCode::BufferOverflow);
                    }
                }
            }
        }
    }
}

impl Default for BusDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded SDA stabilization.
///
/// Re-reads until two consecutive samples agree, at most
/// [`DEBOUNCE_MAX_READS`] retries. Returns `None` when the line keeps
/// bouncing; the caller treats the edge as unclassifiable.
#[inline]
fn stabilized_sda<L: BusLines>(lines: &L) -> Option<LineLevel> {
    let mut prev = lines.read_sda();
    for _ in 0..DEBOUNCE_MAX_READS {
        let current = lines.read_sda();
        if current == prev {
            return Some(current);
        }
        prev = current;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedLines {
        scl: Cell<bool>,
        sda: Cell<bool>,
    }

    impl FixedLines {
        fn new(scl: bool, sda: bool) -> Self {
            Self {
                scl: Cell::new(scl),
                sda: Cell::new(sda),
            }
        }
    }

    impl BusLines for FixedLines {
        fn read_scl(&self) -> LineLevel {
            LineLevel::from_bool(self.scl.get())
        }
        fn read_sda(&self) -> LineLevel {
            LineLevel::from_bool(self.sda.get())
        }
    }

    /// SDA that never settles: alternates on every read.
    struct BouncingLines {
        reads: Cell<u32>,
    }

    impl BusLines for BouncingLines {
        fn read_scl(&self) -> LineLevel {
            LineLevel::High
        }
        fn read_sda(&self) -> LineLevel {
            let n = self.reads.get();
            self.reads.set(n + 1);
            LineLevel::from_bool(n % 2 == 0)
        }
    }

    #[test]
    fn test_role_classification_is_positional() {
        // First byte: slots 0-6 data, 7 direction, 8 ack
        for slot in 0..7 {
            assert_eq!(BusDecoder::role_for(slot, 0), BitRole::Data);
        }
        assert_eq!(BusDecoder::role_for(7, 0), BitRole::Direction);
        assert_eq!(BusDecoder::role_for(8, 0), BitRole::Acknowledge);

        // Later bytes: slot 7 is plain data
        assert_eq!(BusDecoder::role_for(7, 1), BitRole::Data);
        assert_eq!(BusDecoder::role_for(8, 3), BitRole::Acknowledge);
    }

    #[test]
    fn test_bus_status_from_u8() {
        assert_eq!(BusStatus::from_u8(0), BusStatus::Idle);
        assert_eq!(BusStatus::from_u8(1), BusStatus::Transfer);
        assert_eq!(BusStatus::from_u8(200), BusStatus::Idle);
    }

    #[test]
    fn test_start_opens_transfer() {
        let decoder = BusDecoder::new();
        let buffer = SymbolBuffer::<16>::new();
        let faults = FaultState::new();

        // SDA fell while SCL high
        let lines = FixedLines::new(true, false);
        decoder.on_sda_change(&lines, &buffer, &faults);

        assert_eq!(decoder.status(), BusStatus::Transfer);
        assert_eq!(decoder.diag().sda_falling(), 1);
        let snapshot = buffer.snapshot_write();
        assert_eq!(buffer.pop(snapshot), Some(Symbol::START));
    }

    #[test]
    fn test_falling_sda_with_scl_low_is_not_a_start() {
        let decoder = BusDecoder::new();
        let buffer = SymbolBuffer::<16>::new();
        let faults = FaultState::new();

        let lines = FixedLines::new(false, false);
        decoder.on_sda_change(&lines, &buffer, &faults);

        assert_eq!(decoder.status(), BusStatus::Idle);
        assert_eq!(decoder.diag().sda_falling(), 1);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_rising_sda_while_idle_is_not_a_stop() {
        let decoder = BusDecoder::new();
        let buffer = SymbolBuffer::<16>::new();
        let faults = FaultState::new();

        let lines = FixedLines::new(true, true);
        decoder.on_sda_change(&lines, &buffer, &faults);

        assert_eq!(decoder.status(), BusStatus::Idle);
        assert_eq!(decoder.diag().sda_rising(), 1);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_spurious_clock_edge_appends_nothing() {
        let decoder = BusDecoder::new();
        let buffer = SymbolBuffer::<16>::new();
        let faults = FaultState::new();

        let lines = FixedLines::new(true, true);
        decoder.on_scl_rising(&lines, &buffer, &faults);

        assert_eq!(decoder.diag().scl_rising(), 1);
        assert_eq!(decoder.diag().spurious_clock(), 1);
        assert_eq!(buffer.pending(), 0);
        assert_eq!(faults.total(), 0);
    }

    #[test]
    fn test_debounce_timeout_leaves_state_untouched() {
        let decoder = BusDecoder::new();
        let buffer = SymbolBuffer::<16>::new();
        let faults = FaultState::new();

        let lines = BouncingLines { reads: Cell::new(0) };
        decoder.on_sda_change(&lines, &buffer, &faults);

        assert_eq!(faults.debounce_count(), 1);
        assert_eq!(decoder.status(), BusStatus::Idle);
        assert_eq!(buffer.pending(), 0);
        // Neither data counter moved: the edge was unclassifiable
        assert_eq!(decoder.diag().sda_rising(), 0);
        assert_eq!(decoder.diag().sda_falling(), 0);
    }

    #[test]
    fn test_decoder_reset() {
        let decoder = BusDecoder::new();
        let buffer = SymbolBuffer::<16>::new();
        let faults = FaultState::new();

        let lines = FixedLines::new(true, false);
        decoder.on_sda_change(&lines, &buffer, &faults);
        lines.scl.set(true);
        lines.sda.set(true);
        decoder.on_scl_rising(&lines, &buffer, &faults);

        decoder.reset();

        assert_eq!(decoder.status(), BusStatus::Idle);
        assert_eq!(decoder.diag().scl_rising(), 0);
        assert_eq!(decoder.diag().sda_falling(), 0);
    }
}
