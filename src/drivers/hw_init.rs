//! One-shot button GPIO initialisation.
//!
//! Configures the button inputs (pull-up, any-edge interrupt), installs the
//! shared GPIO ISR service and registers one handler per button. Called
//! once from `main()` after the debounce timers exist and before the
//! application loop starts.

use esp_idf_sys::*;
use log::info;

use crate::drivers::hw_timer::restart_debounce;
use crate::error::GpioError;
use crate::pins::BUTTON_GPIOS;

/// GPIO ISR: bounce filtering happens in the debounce timer.
unsafe extern "C" fn button_gpio_isr(arg: *mut core::ffi::c_void) {
    restart_debounce(arg as usize);
}

pub fn init_buttons() -> Result<(), GpioError> {
    // SAFETY: Called once from main() before the event loop; single-threaded.
    // The registered ISR only restarts an esp_timer.
    unsafe {
        for &pin in &BUTTON_GPIOS {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
            };
            let ret = gpio_config(&cfg);
            if ret != ESP_OK {
                return Err(GpioError::ConfigFailed(ret));
            }
        }

        // ESP_ERR_INVALID_STATE means the service is already installed.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(GpioError::IsrInstallFailed(ret));
        }

        for (index, &pin) in BUTTON_GPIOS.iter().enumerate() {
            let ret = gpio_isr_handler_add(pin, Some(button_gpio_isr), index as *mut core::ffi::c_void);
            if ret != ESP_OK {
                return Err(GpioError::IsrAddFailed(ret));
            }
            gpio_intr_enable(pin);
        }
    }
    info!("hw_init: {} buttons configured (any-edge ISR)", BUTTON_GPIOS.len());
    Ok(())
}
