//! Module: symbol
//!
//! Purpose: decoded output alphabet of the sniffer. One `Symbol` is one
//! classified bus event, stored as the ASCII byte the drain report prints
//! verbatim, so a drained buffer is already human-readable.
//!
//! Architecture:
//! - `#[repr(transparent)]` over u8: the symbol buffer is a plain byte array
//! - Constructors encode the sampling conventions (SDA low at the ack slot
//!   means ACK, SDA high at the direction slot means read)
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// Sampled voltage level of one bus line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineLevel {
    Low,
    High,
}

impl LineLevel {
    /// Create from a raw GPIO read (true = high).
    #[inline]
    pub const fn from_bool(high: bool) -> Self {
        if high {
            LineLevel::High
        } else {
            LineLevel::Low
        }
    }

    /// Check if the line reads high.
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, LineLevel::High)
    }

    /// Check if the line reads low.
    #[inline]
    pub const fn is_low(self) -> bool {
        matches!(self, LineLevel::Low)
    }
}

/// Role of one clock-rising sample inside the 8-data-bit + 1-ack framing.
///
/// Classification is purely positional: there is no length field or
/// checksum on the wire, the decoder trusts its bit-slot counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitRole {
    /// Plain data bit.
    Data,
    /// 8th bit of the first byte after a start: read/write indicator.
    Direction,
    /// 9th bit slot of every byte: receiver acknowledgement.
    Acknowledge,
}

/// A single decoded bus event.
///
/// One transaction reads like:
///
/// ```text
/// S1010000W+00001111-s
/// ```
///
/// start, 7 address bits MSB-first, direction ('R'/'W'), ack ('+'/'-'),
/// then data bytes each followed by their ack, then stop. A `'\n'`
/// terminator follows every stop.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol(u8);

impl Symbol {
    /// Start condition observed.
    pub const START: Self = Self(b'S');

    /// Stop condition observed.
    pub const STOP: Self = Self(b's');

    /// Transaction terminator, appended after every stop.
    pub const END_OF_TRANSFER: Self = Self(b'\n');

    /// Acknowledgement (SDA pulled low at the ack slot).
    pub const ACK: Self = Self(b'+');

    /// No acknowledgement (SDA left high at the ack slot).
    pub const NACK: Self = Self(b'-');

    /// Direction bit high: master reads.
    pub const READ: Self = Self(b'R');

    /// Direction bit low: master writes.
    pub const WRITE: Self = Self(b'W');

    /// Data bit sampled low.
    pub const BIT_LOW: Self = Self(b'0');

    /// Data bit sampled high.
    pub const BIT_HIGH: Self = Self(b'1');

    /// Symbol for a data bit sampled on a rising clock edge.
    #[inline]
    pub const fn data_bit(sda: LineLevel) -> Self {
        match sda {
            LineLevel::Low => Self::BIT_LOW,
            LineLevel::High => Self::BIT_HIGH,
        }
    }

    /// Symbol for the acknowledgement slot. The receiver pulls SDA low to ack.
    #[inline]
    pub const fn ack_bit(sda: LineLevel) -> Self {
        match sda {
            LineLevel::Low => Self::ACK,
            LineLevel::High => Self::NACK,
        }
    }

    /// Symbol for the direction bit of the first byte. SDA high means read.
    #[inline]
    pub const fn direction_bit(sda: LineLevel) -> Self {
        match sda {
            LineLevel::Low => Self::WRITE,
            LineLevel::High => Self::READ,
        }
    }

    /// Raw byte as stored in the symbol buffer.
    #[inline]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Rebuild from a raw buffer byte.
    #[inline]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// True for symbols that mark framing rather than byte content.
    #[inline]
    pub const fn is_framing(self) -> bool {
        matches!(self.0, b'S' | b's' | b'\n')
    }
}
