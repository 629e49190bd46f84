//! Module: config
//!
//! Purpose: compile-time configuration for the sniffer.
//!
//! There is no config file and no console command surface. The only
//! tunables are pin assignment, buffer sizing and the drain cadence, all
//! fixed at build time.

/// GPIO number of the SDA (data) line probe.
pub const SDA_PIN: i32 = 12;

/// GPIO number of the SCL (clock) line probe.
pub const SCL_PIN: i32 = 13;

/// Symbol buffer capacity.
///
/// One transferred byte costs 9 symbols plus framing, so this holds on
/// the order of a thousand bytes of traffic between drains.
pub const SYMBOL_BUFFER_CAPACITY: usize = 9600;

/// Maximum SDA re-reads while waiting for the line to stabilize.
///
/// Real glitches settle within a read or two; a line still bouncing
/// after this many reads is reported as a debounce fault.
pub const DEBOUNCE_MAX_READS: u32 = 8;

/// Delay between drain passes while the bus is idle, in milliseconds.
///
/// Trade-off between report timeliness and not starving interrupt
/// handling; policy of the main loop, not of the core.
pub const DRAIN_DELAY_MS: u32 = 5000;

/// Console UART baud rate.
pub const CONSOLE_BAUD: u32 = 115_200;

/// Console UART TX pin.
pub const CONSOLE_TX_PIN: i32 = 6;
