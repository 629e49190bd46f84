//! Report sinks.
//!
//! Delivery is fire-and-forget: the core consults no backpressure
//! signal. A slow sink only delays the next drain pass; it never blocks
//! the interrupt side. One drain operation serves every sink through the
//! [`ReportSink`] capability, so exactly one place owns the read cursor.

/// Capability for delivering drained report bytes.
pub trait ReportSink {
    /// Deliver one chunk of report bytes.
    fn write(&mut self, bytes: &[u8]);
}

/// Accumulates a report into a caller-provided byte slice.
///
/// Used by tests and by anything that needs the report as one contiguous
/// datagram (a network forwarder would hand [`SliceSink::as_bytes`] to
/// its transport after the drain). Overlong reports are truncated and
/// flagged.
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    len: usize,
    truncated: bool,
}

impl<'a> SliceSink<'a> {
    /// Wrap a backing buffer.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            truncated: false,
        }
    }

    /// Bytes accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Report as text. The symbol alphabet is ASCII, so this only fails
    /// on a dirty backing buffer.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or("<invalid utf8>")
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether any delivered bytes did not fit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Forget accumulated content, keep the backing buffer.
    pub fn clear(&mut self) {
        self.len = 0;
        self.truncated = false;
    }
}

impl ReportSink for SliceSink<'_> {
    fn write(&mut self, bytes: &[u8]) {
        let remaining = self.buf.len() - self.len;
        let to_write = bytes.len().min(remaining);
        self.buf[self.len..self.len + to_write].copy_from_slice(&bytes[..to_write]);
        self.len += to_write;
        if to_write < bytes.len() {
            self.truncated = true;
        }
    }
}

#[cfg(target_os = "espidf")]
mod uart {
    use esp_idf_svc::hal::gpio;
    use esp_idf_svc::hal::peripheral::Peripheral;
    use esp_idf_svc::hal::uart::{self, UartTxDriver};

    use super::ReportSink;

    /// Initialize UART1 TX-only for console output.
    pub fn init_console_uart<'d>(
        uart: impl Peripheral<P = uart::UART1> + 'd,
        tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
        baud_rate: u32,
    ) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
        let config =
            uart::config::Config::default().baudrate(esp_idf_svc::hal::units::Hertz(baud_rate));

        UartTxDriver::new(
            uart,
            tx_pin,
            Option::<gpio::AnyIOPin>::None, // CTS
            Option::<gpio::AnyIOPin>::None, // RTS
            &config,
        )
    }

    /// Console sink over a UART TX driver.
    pub struct UartSink<'d, 'u> {
        uart: &'u mut UartTxDriver<'d>,
    }

    impl<'d, 'u> UartSink<'d, 'u> {
        pub fn new(uart: &'u mut UartTxDriver<'d>) -> Self {
            Self { uart }
        }
    }

    impl ReportSink for UartSink<'_, '_> {
        fn write(&mut self, bytes: &[u8]) {
            // A console that drops bytes must not stall the drain loop
            let _ = self.uart.write(bytes);
        }
    }
}

#[cfg(target_os = "espidf")]
pub use uart::{init_console_uart, UartSink};
