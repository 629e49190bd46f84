//! Hardware Abstraction Layer for RustI2cSniffer.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Decode logic stays in core modules, HAL is just I/O.

pub mod gpio;

pub use gpio::BusPinConfig;
#[cfg(target_os = "espidf")]
pub use gpio::{attach_bus_interrupts, EspBusLines};
