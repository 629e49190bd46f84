//! GPIO HAL for the SCL/SDA probe pins.
//!
//! The probe pins are inputs with pull-ups, never driven: the sniffer is
//! not a master, not a slave, it puts no data on the lines. SCL gets a
//! rising-edge interrupt, SDA an any-edge interrupt; the handlers run in
//! interrupt context and must only touch the lock-free core state.

/// Probe pin configuration.
#[derive(Clone, Copy, Debug)]
pub struct BusPinConfig {
    pub scl_pin: i32,
    pub sda_pin: i32,
}

impl Default for BusPinConfig {
    fn default() -> Self {
        Self {
            scl_pin: crate::config::SCL_PIN,
            sda_pin: crate::config::SDA_PIN,
        }
    }
}

#[cfg(target_os = "espidf")]
mod espidf {
    use esp_idf_svc::sys::{self, esp, EspError};

    use super::BusPinConfig;
    use crate::decoder::BusLines;
    use crate::symbol::LineLevel;

    /// Raw edge handler as ESP-IDF's ISR service expects it.
    pub type EdgeHandler = unsafe extern "C" fn(arg: *mut core::ffi::c_void);

    /// Raw line reads for interrupt context.
    ///
    /// Goes through `gpio_get_level` directly: callable from an ISR and
    /// cheap enough for the handler budget.
    #[derive(Clone, Copy)]
    pub struct EspBusLines {
        scl: i32,
        sda: i32,
    }

    impl EspBusLines {
        pub const fn new(config: BusPinConfig) -> Self {
            Self {
                scl: config.scl_pin,
                sda: config.sda_pin,
            }
        }
    }

    impl BusLines for EspBusLines {
        #[inline]
        fn read_scl(&self) -> LineLevel {
            // SAFETY: reading a configured input pin's level
            LineLevel::from_bool(unsafe { sys::gpio_get_level(self.scl) } != 0)
        }

        #[inline]
        fn read_sda(&self) -> LineLevel {
            // SAFETY: reading a configured input pin's level
            LineLevel::from_bool(unsafe { sys::gpio_get_level(self.sda) } != 0)
        }
    }

    /// Configure the probe pins and subscribe the edge handlers.
    ///
    /// Pins become inputs with pull-ups; SCL triggers on rising edges,
    /// SDA on any edge. The handlers stay attached for the process
    /// lifetime.
    pub fn attach_bus_interrupts(
        config: BusPinConfig,
        on_scl_rising: EdgeHandler,
        on_sda_change: EdgeHandler,
    ) -> Result<(), EspError> {
        let io_conf = sys::gpio_config_t {
            pin_bit_mask: (1u64 << config.scl_pin) | (1u64 << config.sda_pin),
            mode: sys::gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: sys::gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: sys::gpio_int_type_t_GPIO_INTR_DISABLE,
        };

        // SAFETY: plain ESP-IDF GPIO configuration calls; the pin numbers
        // come from BusPinConfig and the handlers are 'static fns.
        unsafe {
            esp!(sys::gpio_config(&io_conf))?;
            esp!(sys::gpio_set_intr_type(
                config.scl_pin,
                sys::gpio_int_type_t_GPIO_INTR_POSEDGE,
            ))?;
            esp!(sys::gpio_set_intr_type(
                config.sda_pin,
                sys::gpio_int_type_t_GPIO_INTR_ANYEDGE,
            ))?;

            esp!(sys::gpio_install_isr_service(0))?;
            esp!(sys::gpio_isr_handler_add(
                config.scl_pin,
                Some(on_scl_rising),
                core::ptr::null_mut(),
            ))?;
            esp!(sys::gpio_isr_handler_add(
                config.sda_pin,
                Some(on_sda_change),
                core::ptr::null_mut(),
            ))?;
        }

        Ok(())
    }
}

#[cfg(target_os = "espidf")]
pub use espidf::{attach_bus_interrupts, EdgeHandler, EspBusLines};
