//! Drain consumer for RustI2cSniffer.
//!
//! Moves decoded symbols out of the buffer and delivers them, with a
//! diagnostics header, to a [`ReportSink`]. Runs in ordinary execution
//! context, never inside an interrupt.
//!
//! # Contract
//!
//! "I read up to a snapshot. The producer may run ahead of me, never
//! through me."
//!
//! The consumer is called only while the bus is idle, so producer and
//! consumer do not contend for the same region under load; the buffer
//! design would tolerate it regardless, because the consumer never reads
//! past the snapshot it took on entry.

use crate::buffer::SymbolBuffer;
use crate::decoder::{BusDecoder, BusStatus};
use crate::fault::FaultState;
use crate::logging::format_to_buffer;
use crate::sink::ReportSink;

/// Delivery chunk size: symbols are flushed to the sink in slices this big.
const CHUNK: usize = 64;

/// Result of one drain pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Symbols delivered to the sink.
    pub symbols: u32,

    /// Whether the buffer cursors were returned to zero afterwards.
    pub reclaimed: bool,
}

/// Drains the symbol buffer into a sink.
pub struct DrainConsumer<'a, const N: usize> {
    buffer: &'a SymbolBuffer<N>,
    decoder: &'a BusDecoder,
    faults: &'a FaultState,
}

impl<'a, const N: usize> DrainConsumer<'a, N> {
    /// Create a new drain consumer.
    pub fn new(
        buffer: &'a SymbolBuffer<N>,
        decoder: &'a BusDecoder,
        faults: &'a FaultState,
    ) -> Self {
        Self {
            buffer,
            decoder,
            faults,
        }
    }

    /// Drain everything available and deliver it as one report.
    ///
    /// Call only while [`BusDecoder::status`] reads idle. Reads up to a
    /// snapshot of the write head taken on entry; an interrupt landing
    /// mid-delivery is tolerated and simply defeats the final
    /// reclamation, leaving the cursors for the next pass.
    pub fn drain<S: ReportSink>(&mut self, sink: &mut S) -> DrainStats {
        let snapshot = self.buffer.snapshot_write();
        if self.buffer.read_pos() == snapshot {
            // Nothing to say
            return DrainStats::default();
        }

        self.write_header(sink);

        let mut chunk = [0u8; CHUNK];
        let mut used = 0;
        let mut delivered = 0u32;

        while let Some(symbol) = self.buffer.pop(snapshot) {
            chunk[used] = symbol.as_byte();
            used += 1;
            delivered += 1;

            if used == CHUNK {
                sink.write(&chunk);
                used = 0;
            }
        }
        if used > 0 {
            sink.write(&chunk[..used]);
        }

        // Reclaim only if no transaction opened during delivery; a failed
        // compare-exchange means new symbols exist and the next pass
        // continues from the current cursors.
        let reclaimed =
            self.decoder.status() == BusStatus::Idle && self.buffer.try_reclaim(snapshot);

        DrainStats {
            symbols: delivered,
            reclaimed,
        }
    }

    /// Header: the four edge counters, plus a fault line when any fault
    /// has been recorded.
    fn write_header<S: ReportSink>(&self, sink: &mut S) {
        let diag = self.decoder.diag().snapshot();
        let mut line = [0u8; 96];

        let len = format_to_buffer(
            &mut line,
            format_args!(
                "\nSCL up: {} SDA up: {} SDA down: {} spurious: {}\n",
                diag.scl_rising, diag.sda_rising, diag.sda_falling, diag.spurious_clock
            ),
        );
        sink.write(&line[..len]);

        let faults = self.faults.snapshot();
        if faults.overflow > 0 || faults.debounce > 0 {
            let len = format_to_buffer(
                &mut line,
                format_args!(
                    "faults: overflow={} debounce={}\n",
                    faults.overflow, faults.debounce
                ),
            );
            sink.write(&line[..len]);
        }
    }
}
