//! Drain consumer integration tests
//!
//! End-to-end: decoded transactions delivered through the drain consumer
//! to an accumulating sink, including the report format and the buffer
//! reclamation rules.

use std::cell::Cell;

use rust_i2c_sniffer::buffer::SymbolBuffer;
use rust_i2c_sniffer::consumer::DrainConsumer;
use rust_i2c_sniffer::decoder::{BusDecoder, BusLines, BusStatus};
use rust_i2c_sniffer::fault::FaultState;
use rust_i2c_sniffer::sink::SliceSink;
use rust_i2c_sniffer::symbol::LineLevel;

struct SimBus {
    scl: Cell<bool>,
    sda: Cell<bool>,
}

impl BusLines for SimBus {
    fn read_scl(&self) -> LineLevel {
        LineLevel::from_bool(self.scl.get())
    }
    fn read_sda(&self) -> LineLevel {
        LineLevel::from_bool(self.sda.get())
    }
}

struct Rig {
    bus: SimBus,
    decoder: BusDecoder,
    buffer: SymbolBuffer<256>,
    faults: FaultState,
}

impl Rig {
    fn new() -> Self {
        Self {
            bus: SimBus {
                scl: Cell::new(true),
                sda: Cell::new(true),
            },
            decoder: BusDecoder::new(),
            buffer: SymbolBuffer::new(),
            faults: FaultState::new(),
        }
    }

    fn sda(&self, high: bool) {
        if self.bus.sda.get() != high {
            self.bus.sda.set(high);
            self.decoder
                .on_sda_change(&self.bus, &self.buffer, &self.faults);
        }
    }

    fn scl(&self, high: bool) {
        let was = self.bus.scl.get();
        self.bus.scl.set(high);
        if high && !was {
            self.decoder
                .on_scl_rising(&self.bus, &self.buffer, &self.faults);
        }
    }

    fn start(&self) {
        self.sda(false);
    }

    fn clock_bit(&self, high: bool) {
        self.scl(false);
        self.sda(high);
        self.scl(true);
    }

    fn clock_byte(&self, byte: u8, ack: bool) {
        for i in (0..8).rev() {
            self.clock_bit(byte & (1 << i) != 0);
        }
        self.clock_bit(!ack);
    }

    fn stop(&self) {
        self.scl(false);
        self.sda(false);
        self.scl(true);
        self.sda(true);
    }

    /// Finish a byte begun with one `clock_bit(true)`: six more data
    /// bits low, direction read, then ack.
    fn clock_byte_tail(&self) {
        for _ in 0..6 {
            self.clock_bit(false);
        }
        self.clock_bit(true); // direction slot
        self.clock_bit(false); // ack
    }

    fn drain_to_string(&self) -> (String, rust_i2c_sniffer::DrainStats) {
        let mut consumer = DrainConsumer::new(&self.buffer, &self.decoder, &self.faults);
        let mut buf = [0u8; 1024];
        let mut sink = SliceSink::new(&mut buf);
        let stats = consumer.drain(&mut sink);
        (sink.as_str().to_string(), stats)
    }
}

#[test]
fn test_report_format_for_one_transaction() {
    let rig = Rig::new();

    rig.start();
    rig.clock_byte(0xA0, true);
    rig.stop();

    let (report, stats) = rig.drain_to_string();

    // Header carries the four edge counters, then the raw symbols
    assert_eq!(
        report,
        "\nSCL up: 10 SDA up: 3 SDA down: 3 spurious: 0\nS1010000W+s\n"
    );
    assert_eq!(stats.symbols, 12);
    assert!(stats.reclaimed);
}

#[test]
fn test_drain_is_idempotent() {
    let rig = Rig::new();

    rig.start();
    rig.clock_byte(0xA0, true);
    rig.stop();

    let (first, _) = rig.drain_to_string();
    assert!(first.ends_with("S1010000W+s\n"));

    // No new edges: the second drain delivers nothing at all
    let (second, stats) = rig.drain_to_string();
    assert!(second.is_empty());
    assert_eq!(stats.symbols, 0);
}

#[test]
fn test_full_drain_reclaims_buffer() {
    let rig = Rig::new();

    rig.start();
    rig.clock_byte(0xA0, true);
    rig.stop();

    let (_, stats) = rig.drain_to_string();

    assert!(stats.reclaimed);
    assert_eq!(rig.buffer.snapshot_write(), 0);
    assert_eq!(rig.buffer.read_pos(), 0);
}

#[test]
fn test_no_reclaim_while_transfer_open() {
    let rig = Rig::new();

    rig.start();
    rig.clock_byte(0xA0, true);
    rig.stop();

    // A second transaction opens before the drain finishes its pass
    rig.start();
    rig.clock_bit(true);

    let (report, stats) = rig.drain_to_string();

    // Everything up to the snapshot was delivered, including the new
    // transaction's prefix, but the cursors stay put
    assert!(report.ends_with("S1010000W+s\nS1"));
    assert!(!stats.reclaimed);
    assert_ne!(rig.buffer.read_pos(), 0);

    // Finishing the transaction and draining again picks up the rest
    rig.clock_byte_tail();
    rig.stop();
    let (rest, stats) = rig.drain_to_string();
    assert!(rest.ends_with("000000R+s\n"));
    assert!(stats.reclaimed);
    assert_eq!(rig.decoder.status(), BusStatus::Idle);
}

#[test]
fn test_fault_line_reported_after_overflow() {
    let rig = Rig::new();

    rig.start();
    rig.clock_byte(0xA0, true);
    rig.stop();
    rig.faults
        .record(rust_i2c_sniffer::FaultCode::BufferOverflow);

    let (report, _) = rig.drain_to_string();
    assert!(report.contains("faults: overflow=1 debounce=0\n"));
}

#[test]
fn test_long_capture_survives_chunking() {
    let rig = Rig::new();

    // Ten transactions back to back, more than one delivery chunk
    for _ in 0..10 {
        rig.start();
        rig.clock_byte(0xA0, true);
        rig.stop();
    }

    let (report, stats) = rig.drain_to_string();
    assert_eq!(stats.symbols, 120);
    assert_eq!(report.matches("S1010000W+s\n").count(), 10);
}
