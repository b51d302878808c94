//! One-shot timers feeding the application event queue.
//!
//! - **Device timer**: a single one-shot timer shared by the actuator
//!   simulation and auto-lock. On expiry it posts
//!   `AppTaskEvent::DeviceTimer(context)` with the context it was armed for.
//! - **Debounce timers** (ESP-IDF only): one per button, restarted by the
//!   GPIO ISR on every edge. On expiry the settled level is sampled and
//!   reported through the button's `EdgeFilter`.
//!
//! On ESP-IDF the callbacks run in the esp_timer task (not ISR), so they
//! only post to the queue. On host a sleeping thread stands in for the
//! timer service.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::app::ports::{DeviceTimer, TimerContext};
use crate::error::TimerError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

// ── Armed expiry ──────────────────────────────────────────────

const DISARMED: u64 = u64::MAX;

/// Deadline (µs) and context of the current arming, packed into one word.
///
/// An expiry callback claims the word instead of reading the context on
/// its own. A callback left over from an earlier arming fires before the
/// new deadline and claims nothing, and a second callback for the same
/// arming finds the word already disarmed.
pub struct ArmedExpiry(AtomicU64);

impl ArmedExpiry {
    pub const fn new() -> Self {
        Self(AtomicU64::new(DISARMED))
    }

    pub fn arm(&self, context: TimerContext, deadline_us: u64) {
        let tag = match context {
            TimerContext::AutoLock => 0,
            TimerContext::ActuatorMovement => 1,
        };
        self.0.store((deadline_us << 1) | tag, Ordering::Release);
    }

    pub fn disarm(&self) {
        self.0.store(DISARMED, Ordering::Release);
    }

    /// Take the armed context if its deadline has passed at `now_us`.
    pub fn claim(&self, now_us: u64) -> Option<TimerContext> {
        let armed = self.0.load(Ordering::Acquire);
        if armed == DISARMED || now_us < armed >> 1 {
            return None;
        }
        self.0
            .compare_exchange(armed, DISARMED, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(if armed & 1 == 0 {
            TimerContext::AutoLock
        } else {
            TimerContext::ActuatorMovement
        })
    }
}

impl Default for ArmedExpiry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Device timer (ESP-IDF) ────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use log::debug;

    use super::*;
    use crate::drivers::button::{report_settled_level, EDGE_FILTERS};
    use crate::events::{post_event, AppTaskEvent, APP_EVENTS};
    use crate::pins::{BUTTON_COUNT, BUTTON_GPIOS};

    static DEVICE_TIMER_ARMED: ArmedExpiry = ArmedExpiry::new();

    fn now_us() -> u64 {
        // SAFETY: esp_timer_get_time only reads the system timer.
        unsafe { esp_timer_get_time() as u64 }
    }

    unsafe extern "C" fn device_timer_cb(_arg: *mut core::ffi::c_void) {
        match DEVICE_TIMER_ARMED.claim(now_us()) {
            Some(context) => {
                post_event(AppTaskEvent::DeviceTimer(context));
            }
            None => debug!("hw_timer: superseded device timer expiry dropped"),
        }
    }

    pub struct EspDeviceTimer {
        handle: esp_timer_handle_t,
    }

    impl EspDeviceTimer {
        /// Create the one-shot timer. Failure is fatal at boot.
        pub fn new() -> Result<Self, TimerError> {
            let args = esp_timer_create_args_t {
                callback: Some(device_timer_cb),
                arg: core::ptr::null_mut(),
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: b"device\0".as_ptr() as *const _,
                skip_unhandled_events: false,
            };
            let mut handle: esp_timer_handle_t = core::ptr::null_mut();
            // SAFETY: `args` and `handle` outlive the call; the callback
            // only posts to the static event queue.
            let ret = unsafe { esp_timer_create(&args, &mut handle) };
            if ret != ESP_OK {
                return Err(TimerError::CreateFailed(ret));
            }
            info!("hw_timer: device timer created");
            Ok(Self { handle })
        }
    }

    impl DeviceTimer for EspDeviceTimer {
        fn start(&mut self, context: TimerContext, duration_ms: u32) -> Result<(), TimerError> {
            self.stop()?;
            let timeout_us = u64::from(duration_ms) * 1000;
            DEVICE_TIMER_ARMED.arm(context, now_us() + timeout_us);
            // SAFETY: handle was created in `new` and is never deleted.
            let ret = unsafe { esp_timer_start_once(self.handle, timeout_us) };
            if ret != ESP_OK {
                DEVICE_TIMER_ARMED.disarm();
                return Err(TimerError::StartFailed(ret));
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), TimerError> {
            DEVICE_TIMER_ARMED.disarm();
            // SAFETY: handle was created in `new` and is never deleted.
            let ret = unsafe { esp_timer_stop(self.handle) };
            // ESP_ERR_INVALID_STATE: timer was not running.
            if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
                return Err(TimerError::StopFailed(ret));
            }
            Ok(())
        }
    }

    // ── Button debounce timers ────────────────────────────────

    static mut DEBOUNCE_TIMERS: [esp_timer_handle_t; BUTTON_COUNT] =
        [core::ptr::null_mut(); BUTTON_COUNT];
    static DEBOUNCE_US: AtomicU64 = AtomicU64::new(50_000);

    /// SAFETY: DEBOUNCE_TIMERS is written once in `create_debounce_timers()`
    /// before the GPIO ISRs are registered; afterwards it is read-only.
    unsafe fn debounce_timer(index: usize) -> esp_timer_handle_t {
        unsafe { DEBOUNCE_TIMERS[index] }
    }

    unsafe extern "C" fn debounce_expired_cb(arg: *mut core::ffi::c_void) {
        let index = arg as usize;
        // SAFETY: gpio_get_level is a register read on a configured input.
        // Active-low: level 0 means pressed.
        let pressed = unsafe { gpio_get_level(BUTTON_GPIOS[index]) } == 0;
        report_settled_level(&APP_EVENTS, &EDGE_FILTERS[index], index as u8, pressed);
    }

    /// Create one debounce timer per button.
    pub fn create_debounce_timers(debounce_ms: u32) -> Result<(), TimerError> {
        DEBOUNCE_US.store(u64::from(debounce_ms) * 1000, Ordering::Relaxed);
        for index in 0..BUTTON_COUNT {
            let args = esp_timer_create_args_t {
                callback: Some(debounce_expired_cb),
                arg: index as *mut core::ffi::c_void,
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: b"debounce\0".as_ptr() as *const _,
                skip_unhandled_events: true,
            };
            // SAFETY: single-threaded boot path, before ISRs are installed.
            let ret = unsafe { esp_timer_create(&args, &raw mut DEBOUNCE_TIMERS[index]) };
            if ret != ESP_OK {
                return Err(TimerError::CreateFailed(ret));
            }
        }
        info!("hw_timer: {} debounce timers ({} ms)", BUTTON_COUNT, debounce_ms);
        Ok(())
    }

    /// Restart button `index`'s debounce window. Called from the GPIO ISR.
    pub fn restart_debounce(index: usize) {
        if index >= BUTTON_COUNT {
            return;
        }
        // SAFETY: debounce_timer() contract; esp_timer start/stop are
        // IRAM-safe and callable from ISR context.
        unsafe {
            let handle = debounce_timer(index);
            if handle.is_null() {
                return;
            }
            esp_timer_stop(handle);
            esp_timer_start_once(handle, DEBOUNCE_US.load(Ordering::Relaxed));
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{create_debounce_timers, restart_debounce, EspDeviceTimer};

// ── Device timer (host simulation) ────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::ThreadDeviceTimer;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use log::debug;

    use super::*;
    use crate::events::{AppTaskEvent, EventQueue};

    /// Each `start` spawns a sleeper thread. Sleepers share one
    /// [`ArmedExpiry`], so only the one for the current arming posts.
    pub struct ThreadDeviceTimer {
        queue: &'static EventQueue,
        armed: Arc<ArmedExpiry>,
        origin: Instant,
    }

    impl ThreadDeviceTimer {
        pub fn new(queue: &'static EventQueue) -> Self {
            Self {
                queue,
                armed: Arc::new(ArmedExpiry::new()),
                origin: Instant::now(),
            }
        }
    }

    fn micros_since(origin: Instant) -> u64 {
        origin.elapsed().as_micros() as u64
    }

    impl DeviceTimer for ThreadDeviceTimer {
        fn start(&mut self, context: TimerContext, duration_ms: u32) -> Result<(), TimerError> {
            let timeout = Duration::from_millis(u64::from(duration_ms));
            let origin = self.origin;
            self.armed.arm(context, micros_since(origin) + timeout.as_micros() as u64);
            let armed = Arc::clone(&self.armed);
            let queue = self.queue;
            std::thread::Builder::new()
                .name("device-timer".into())
                .spawn(move || {
                    std::thread::sleep(timeout);
                    match armed.claim(micros_since(origin)) {
                        Some(context) => {
                            queue.post(AppTaskEvent::DeviceTimer(context));
                        }
                        None => debug!("hw_timer(sim): {:?} expiry superseded", context),
                    }
                })
                .map_err(|_| TimerError::StartFailed(-1))?;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), TimerError> {
            self.armed.disarm();
            Ok(())
        }
    }
}
