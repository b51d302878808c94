//! Lockkit firmware entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspDeviceTimer   LogTraitSink   NvsAdapter    SystemClock     │
//! │  (DeviceTimer)    (TraitSink)    (ConfigPort)  (Clock)         │
//! │  SharedConnectivity              ChannelAdmin                  │
//! │  (ConnectivityProvider)          (AdminPort)                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │                AppTask (pure logic)                    │    │
//! │  │  Buttons · DeviceController / OpenCloseSensor · LEDs   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GPIO ISR ─▶ debounce esp_timer ─▶ APP_EVENTS ◀─ device timer  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use embedded_hal::digital::OutputPin;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use log::{error, info, warn};

use lockkit::adapters::admin::{ChannelAdmin, ADMIN_REQUESTS};
use lockkit::adapters::connectivity::CONNECTIVITY;
use lockkit::adapters::log_sink::LogTraitSink;
use lockkit::adapters::nvs::NvsAdapter;
use lockkit::adapters::platform::PlatformServices;
use lockkit::adapters::time::SystemClock;
use lockkit::app::controller::DeviceController;
use lockkit::app::device::Device;
use lockkit::app::ocsensor::OpenCloseSensor;
use lockkit::app::ports::{Clock, ConfigPort};
use lockkit::app::task::AppTask;
use lockkit::config::{AppConfig, DeviceKind};
use lockkit::drivers::hw_timer::{create_debounce_timers, EspDeviceTimer};
use lockkit::drivers::led::Led;
use lockkit::drivers::hw_init;
use lockkit::events::APP_EVENTS;
use lockkit::error::Error;
use lockkit::pins::{
    CONNECTIVITY_LED, CONNECTIVITY_LED_GPIO, DEVICE_STATE_LED, DEVICE_STATE_LED_GPIO, LED_COUNT,
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Lockkit v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + persisted settings ─────────────────
    let mut config = AppConfig::default();
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {e}"))?;
    match nvs.load() {
        Ok(settings) => config.apply_settings(settings),
        Err(e) => warn!("Lock settings load failed ({}), using defaults", e),
    }
    config.validate()?;

    // ── 3. Timers and button ISRs (fatal on failure) ──────────
    create_debounce_timers(config.button_debounce_ms).map_err(Error::from)?;
    hw_init::init_buttons().map_err(Error::from)?;
    let device_timer = EspDeviceTimer::new().map_err(Error::from)?;

    // ── 4. LEDs ───────────────────────────────────────────────
    // SAFETY: the LED GPIOs are claimed only here, and no other driver
    // is built from `Peripherals`.
    let (connectivity_pin, state_pin) = unsafe {
        (
            AnyOutputPin::new(CONNECTIVITY_LED_GPIO),
            AnyOutputPin::new(DEVICE_STATE_LED_GPIO),
        )
    };
    let leds = [
        Led::new(CONNECTIVITY_LED as u8, PinDriver::output(connectivity_pin)?),
        Led::new(DEVICE_STATE_LED as u8, PinDriver::output(state_pin)?),
    ];

    // ── 5. Platform services ──────────────────────────────────
    let mut services = PlatformServices::new(&CONNECTIVITY, ChannelAdmin::new(&ADMIN_REQUESTS), nvs);
    let clock = SystemClock::new();

    // ── 6. Run the application task ───────────────────────────
    let result = match config.device_kind {
        DeviceKind::Lock => {
            let device = DeviceController::new(device_timer, LogTraitSink::new(), &config);
            run_app(config, device, leds, &clock, &mut services)
        }
        DeviceKind::OpenCloseSensor => {
            let device = OpenCloseSensor::new(LogTraitSink::new());
            run_app(config, device, leds, &clock, &mut services)
        }
    };

    // The loop only returns on a fatal error.
    if let Err(e) = result {
        error!("Fatal: {}, halting", e);
        return Err(e.into());
    }
    Ok(())
}

fn run_app<D: Device, P: OutputPin>(
    config: AppConfig,
    device: D,
    leds: [Led<P>; LED_COUNT],
    clock: &SystemClock,
    services: &mut PlatformServices<'_>,
) -> lockkit::error::Result<()> {
    let mut task = AppTask::new(config, device, leds, &APP_EVENTS)?;
    task.start(clock.now(), services);
    task.run(clock, &mut FreeRtos, services)
}
