//! Application task, the single consumer of [`EventQueue`].
//!
//! [`AppTask`] owns the buttons, the LEDs, the connectivity presenter and
//! the device personality. Every state change in the control core happens
//! on the thread that calls [`AppTask::run_once`]; interrupt handlers and
//! timer callbacks only post events.
//!
//! ```text
//!  EventQueue ──▶ ┌──────────────────────────────┐ ──▶ LEDs
//!                 │           AppTask            │
//!   Services ◀───▶│ Buttons · Device · Connectiv.│ ──▶ TraitSink (via Device)
//!                 └──────────────────────────────┘
//! ```
//!
//! One step: wait up to `event_wait_quantum_ms` for an event, dispatch
//! everything queued at that point, then run one cycle (button ticks,
//! long-press window UI, connectivity poll, LED animation).

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::app::commands::DeviceCommand;
use crate::app::connectivity::ConnectivityState;
use crate::app::device::Device;
use crate::app::ports::{Clock, Services};
use crate::config::AppConfig;
use crate::drivers::button::{Button, ButtonPressState};
use crate::drivers::led::Led;
use crate::error::Result;
use crate::events::{AppTaskEvent, EventQueue, PhysicalButtonAction};
use crate::pins::{
    ACTION_BUTTON, BUTTON_COUNT, CONNECTIVITY_LED, DEVICE_STATE_LED, FUNCTION_BUTTON, LED_COUNT,
};

/// Logical action bound to a button gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    CheckForUpdate,
    FactoryReset,
    /// Device-specific primary action (toggle lock / toggle open-close).
    DeviceAction,
    SendIdentifyRequest,
    EnableUserSelectedMode,
}

// ───────────────────────────────────────────────────────────────
// AppTask
// ───────────────────────────────────────────────────────────────

pub struct AppTask<'q, D, P> {
    queue: &'q EventQueue,
    config: AppConfig,
    buttons: [Button<ButtonAction>; BUTTON_COUNT],
    leds: [Led<P>; LED_COUNT],
    device: D,
    connectivity: ConnectivityState,
    long_press_window: bool,
    cycle_count: u32,
}

impl<'q, D: Device, P: OutputPin> AppTask<'q, D, P> {
    /// Bind the buttons and take ownership of the LEDs and device.
    ///
    /// Does **not** touch the LEDs; call [`start`](Self::start) next.
    pub fn new(config: AppConfig, device: D, leds: [Led<P>; LED_COUNT], queue: &'q EventQueue) -> Result<Self> {
        config.validate()?;

        let mut buttons: [Button<ButtonAction>; BUTTON_COUNT] = core::array::from_fn(|i| {
            Button::new(i as u8, config.long_press_start_ms, config.long_press_complete_ms)
        });
        buttons[FUNCTION_BUTTON].set_short_press_handler(ButtonAction::CheckForUpdate);
        buttons[FUNCTION_BUTTON].set_long_press_handler(ButtonAction::FactoryReset);
        buttons[ACTION_BUTTON].set_short_press_handler(ButtonAction::DeviceAction);
        buttons[ACTION_BUTTON].set_long_press_handler(D::LONG_PRESS_ACTION);

        Ok(Self {
            queue,
            config,
            buttons,
            leds,
            device,
            connectivity: ConnectivityState::new(),
            long_press_window: false,
            cycle_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Show the initial device state and connectivity.
    pub fn start(&mut self, now: Instant, svc: &mut impl Services) {
        let level = self.device.indicator_level();
        self.leds[DEVICE_STATE_LED].set(level, now);
        self.poll_connectivity(now, svc);
        info!("AppTask: started, device {:?}", self.device.state());
    }

    /// Loop forever. Returns only on a fatal error.
    pub fn run(&mut self, clock: &impl Clock, delay: &mut impl DelayNs, svc: &mut impl Services) -> Result<()> {
        loop {
            self.run_once(clock, delay, svc)?;
        }
    }

    /// One loop iteration: bounded wait, drain, cycle.
    pub fn run_once(&mut self, clock: &impl Clock, delay: &mut impl DelayNs, svc: &mut impl Services) -> Result<()> {
        self.queue.wait_for_event(self.config.event_wait_quantum_ms, clock, delay);

        let now = clock.now();
        let queue = self.queue;
        let mut outcome = Ok(());
        queue.drain_pending(|event| {
            if outcome.is_ok() {
                outcome = self.dispatch(event, now, svc);
            }
        });
        if let Err(e) = outcome {
            error!("AppTask: fatal error while dispatching: {}", e);
            return Err(e);
        }

        self.cycle(clock.now(), svc);
        Ok(())
    }

    // ── Dispatch ──────────────────────────────────────────────

    pub fn dispatch(&mut self, event: AppTaskEvent, now: Instant, svc: &mut impl Services) -> Result<()> {
        match event {
            AppTaskEvent::Button { index, action } => self.on_button_edge(index, action, now, svc),
            AppTaskEvent::DeviceTimer(context) => {
                self.device
                    .on_timer_expired(context, &mut self.leds[DEVICE_STATE_LED], now)
            }
            AppTaskEvent::Command(command) => self.on_command(command, now, svc),
        }
    }

    fn on_button_edge(
        &mut self,
        index: u8,
        action: PhysicalButtonAction,
        now: Instant,
        svc: &mut impl Services,
    ) -> Result<()> {
        let Some(button) = self.buttons.get_mut(usize::from(index)) else {
            error!("AppTask: no handler for button {}, event dropped", index);
            return Ok(());
        };
        match button.on_edge(action.is_press(), now) {
            Some(bound) => self.run_button_action(bound, now, svc),
            None => Ok(()),
        }
    }

    fn run_button_action(&mut self, action: ButtonAction, now: Instant, svc: &mut impl Services) -> Result<()> {
        info!("AppTask: {:?}", action);
        match action {
            ButtonAction::CheckForUpdate => svc.check_for_update_now(),
            ButtonAction::FactoryReset => svc.initiate_factory_reset(),
            ButtonAction::SendIdentifyRequest => svc.send_identify_request(),
            ButtonAction::EnableUserSelectedMode => svc.enable_user_selected_mode(),
            ButtonAction::DeviceAction => {
                return self
                    .device
                    .on_user_action(&mut self.leds[DEVICE_STATE_LED], now);
            }
        }
        Ok(())
    }

    fn on_command(&mut self, command: DeviceCommand, now: Instant, svc: &mut impl Services) -> Result<()> {
        self.device
            .on_command(command, &mut self.leds[DEVICE_STATE_LED], now)?;

        if let DeviceCommand::ConfigureAutoLock { .. } = command {
            if let Some(settings) = self.device.lock_settings() {
                if let Err(e) = svc.save(&settings) {
                    warn!("AppTask: failed to persist lock settings: {}", e);
                }
            }
        }
        Ok(())
    }

    // ── Per-cycle work ────────────────────────────────────────

    /// Advance buttons, manage the long-press window, poll connectivity
    /// and animate the LEDs.
    pub fn cycle(&mut self, now: Instant, svc: &mut impl Services) {
        let mut window_opened = false;
        let mut window_closed = false;
        let mut all_released = true;

        for button in &mut self.buttons {
            match button.tick(now) {
                ButtonPressState::Inactive => {}
                ButtonPressState::Short => all_released = false,
                ButtonPressState::LongStarted => {
                    all_released = false;
                    if !self.long_press_window {
                        self.long_press_window = true;
                        window_opened = true;
                    }
                }
                ButtonPressState::LongCompleted => {
                    all_released = false;
                    if self.long_press_window {
                        self.long_press_window = false;
                        window_closed = true;
                    }
                }
            }
        }
        if all_released && self.long_press_window {
            self.long_press_window = false;
            window_closed = true;
        }

        if window_opened {
            info!("AppTask: long-press window open");
            for led in &mut self.leds {
                led.set(false, now);
            }
            for led in &mut self.leds {
                led.blink(self.config.long_press_blink_ms, now);
            }
        } else if window_closed {
            info!("AppTask: long-press window closed");
            for led in &mut self.leds {
                led.set(false, now);
            }
            let level = self.device.indicator_level();
            self.leds[DEVICE_STATE_LED].set(level, now);
            self.poll_connectivity(now, svc);
        } else if !self.long_press_window {
            self.cycle_count = self.cycle_count.wrapping_add(1);
            if self.cycle_count % u32::from(self.config.connectivity_poll_every) == 0 {
                self.poll_connectivity(now, svc);
            }
        }

        for led in &mut self.leds {
            led.animate(now);
        }
    }

    fn poll_connectivity(&mut self, now: Instant, svc: &mut impl Services) {
        let subscriptions = svc.subscriptions_established();
        self.connectivity
            .update(subscriptions, &*svc, &mut self.leds[CONNECTIVITY_LED], now);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn led(&self, index: usize) -> &Led<P> {
        &self.leds[index]
    }

    pub fn button_state(&self, index: usize) -> ButtonPressState {
        self.buttons[index].state()
    }

    pub fn in_long_press_window(&self) -> bool {
        self.long_press_window
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        &self.connectivity
    }
}
