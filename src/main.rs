//! RustI2cSniffer - Main entry point
//!
//! Bring-up order:
//! 1. Reset decode state
//! 2. Configure probe pins and attach the edge interrupts
//! 3. Loop: while the bus is idle, drain symbols and logs to the console
//!
//! Everything here is wiring; the decode logic lives in the library and
//! is exercised by the host tests.

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
mod app {
    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::UartTxDriver;
    use esp_idf_svc::sys as esp_idf_sys;

    use rust_i2c_sniffer::buffer::SymbolBuffer;
    use rust_i2c_sniffer::config;
    use rust_i2c_sniffer::consumer::DrainConsumer;
    use rust_i2c_sniffer::decoder::{BusDecoder, BusStatus};
    use rust_i2c_sniffer::fault::FaultState;
    use rust_i2c_sniffer::hal::gpio::{attach_bus_interrupts, BusPinConfig, EspBusLines};
    use rust_i2c_sniffer::log_globals::LOG_STREAM;
    use rust_i2c_sniffer::logging::format_log_entry;
    use rust_i2c_sniffer::sink::{init_console_uart, UartSink};
    use rust_i2c_sniffer::{rt_info, rt_warn};

    // Static allocations: all decode state is process-wide and lives for
    // the whole run. Single writer per field (see decoder module docs).
    static SYMBOL_BUFFER: SymbolBuffer = SymbolBuffer::new();
    static DECODER: BusDecoder = BusDecoder::new();
    static FAULTS: FaultState = FaultState::new();
    static BUS_LINES: EspBusLines = EspBusLines::new(BusPinConfig {
        scl_pin: config::SCL_PIN,
        sda_pin: config::SDA_PIN,
    });

    /// Rising SCL: one bit transferred.
    unsafe extern "C" fn scl_rising_isr(_arg: *mut core::ffi::c_void) {
        DECODER.on_scl_rising(&BUS_LINES, &SYMBOL_BUFFER, &FAULTS);
    }

    /// SDA changed: possible start or stop.
    unsafe extern "C" fn sda_change_isr(_arg: *mut core::ffi::c_void) {
        DECODER.on_sda_change(&BUS_LINES, &SYMBOL_BUFFER, &FAULTS);
    }

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        SYMBOL_BUFFER.reset();
        DECODER.reset();
        FAULTS.reset();

        let peripherals = Peripherals::take().expect("peripherals already taken");

        // SAFETY: the TX pin number is a plain output-capable GPIO
        let tx_pin = unsafe { AnyIOPin::new(config::CONSOLE_TX_PIN) };
        let mut uart = init_console_uart(peripherals.uart1, tx_pin, config::CONSOLE_BAUD)
            .expect("console uart init failed");

        attach_bus_interrupts(BusPinConfig::default(), scl_rising_isr, sda_change_isr)
            .expect("bus interrupt attach failed");

        rt_info!(
            LOG_STREAM,
            now_us(),
            "{} watching SCL={} SDA={}",
            env!("VERSION_STRING"),
            config::SCL_PIN,
            config::SDA_PIN
        );

        let mut consumer = DrainConsumer::new(&SYMBOL_BUFFER, &DECODER, &FAULTS);
        let mut last_fault_total = 0u32;

        loop {
            // Drain only while no transaction is in flight, so the
            // consumer never contends with the producer side
            if DECODER.status() == BusStatus::Idle {
                let mut sink = UartSink::new(&mut uart);
                let _ = consumer.drain(&mut sink);

                let fault_total = FAULTS.total();
                if fault_total > last_fault_total {
                    rt_warn!(
                        LOG_STREAM,
                        now_us(),
                        "faults since start: overflow={} debounce={}",
                        FAULTS.overflow_count(),
                        FAULTS.debounce_count()
                    );
                    last_fault_total = fault_total;
                }

                drain_logs(&mut uart);
            }

            delay_ms(config::DRAIN_DELAY_MS);
        }
    }

    fn now_us() -> i64 {
        // SAFETY: esp_timer_get_time is always safe to call
        unsafe { esp_idf_sys::esp_timer_get_time() }
    }

    fn delay_ms(ms: u32) {
        // FreeRTOS runs at the default 100 Hz tick
        // SAFETY: delay from the main task, never from interrupt context
        unsafe {
            esp_idf_sys::vTaskDelay(ms / 10);
        }
    }

    /// Write queued log entries to the console.
    fn drain_logs(uart: &mut UartTxDriver<'_>) {
        let mut buf = [0u8; 256];
        while let Some(entry) = LOG_STREAM.drain() {
            let len = format_log_entry(&entry, &mut buf);
            let _ = uart.write(&buf[..len]);
        }
    }
}

// The sniffer only runs on the ESP32 target; host builds get a stub so
// `cargo test` can compile the binary.
#[cfg(not(target_os = "espidf"))]
fn main() {}
