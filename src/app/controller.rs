//! Bolt-lock action controller.
//!
//! Two-phase action execution driven by the shared device timer:
//!
//! ```text
//!                 Unlock                           timer(ActuatorMovement)
//! LockingCompleted ──────▶ UnlockingInitiated ──────────────────────────▶ UnlockingCompleted
//!        ▲                                                                        │
//!        │ timer(ActuatorMovement)                      Lock (user / AutoLock)     │
//!        └──────────────────────── LockingInitiated ◀─────────────────────────────┘
//! ```
//!
//! The controller owns at most one outstanding device-timer intent. Arming
//! for a new context first stops the timer, and an expiry whose context no
//! longer matches is dropped.

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::app::commands::DeviceCommand;
use crate::app::device::{Device, DeviceState};
use crate::app::ports::{DeviceTimer, TimerContext, TraitSink};
use crate::app::task::ButtonAction;
use crate::config::{AppConfig, LockSettings};
use crate::drivers::led::Led;
use crate::error::Result;

/// Blink schedule of the state LED while the bolt is moving.
pub const ACTION_IN_PROGRESS_BLINK_MS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Lock,
    Unlock,
}

/// Who caused a lock operation, numbered as in the bolt-lock data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Actor {
    Other = 1,
    Physical = 2,
    KeypadPin = 3,
    LocalImplicit = 4,
    RemoteUserExplicit = 5,
    RemoteUserImplicit = 6,
    RemoteUserOther = 7,
    RemoteDelegate = 8,
    LowPowerShutdown = 9,
    VoiceAssistant = 10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    LockingInitiated,
    LockingCompleted,
    UnlockingInitiated,
    UnlockingCompleted,
}

impl LockState {
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::LockingInitiated | Self::UnlockingInitiated)
    }
}

pub struct DeviceController<T, S> {
    state: LockState,
    timer: T,
    sink: S,
    timer_context: Option<TimerContext>,
    actuator_movement_ms: u32,
    auto_lock_enabled: bool,
    auto_lock_duration_secs: u32,
    auto_lock_armed: bool,
}

impl<T: DeviceTimer, S: TraitSink> DeviceController<T, S> {
    pub fn new(timer: T, sink: S, config: &AppConfig) -> Self {
        Self {
            state: LockState::LockingCompleted,
            timer,
            sink,
            timer_context: None,
            actuator_movement_ms: config.actuator_movement_ms,
            auto_lock_enabled: config.auto_lock_enabled,
            auto_lock_duration_secs: config.auto_lock_duration_secs,
            auto_lock_armed: false,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == LockState::UnlockingCompleted
    }

    pub fn is_action_in_progress(&self) -> bool {
        self.state.is_in_progress()
    }

    pub fn auto_lock_armed(&self) -> bool {
        self.auto_lock_armed
    }

    /// Takes effect on the next unlock completion.
    pub fn enable_auto_lock(&mut self, enabled: bool) {
        self.auto_lock_enabled = enabled;
    }

    /// Takes effect on the next unlock completion.
    pub fn set_auto_lock_duration(&mut self, secs: u32) {
        self.auto_lock_duration_secs = secs;
    }

    pub fn settings(&self) -> LockSettings {
        LockSettings {
            auto_lock_enabled: self.auto_lock_enabled,
            auto_lock_duration_secs: self.auto_lock_duration_secs,
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Start a lock or unlock.
    ///
    /// Returns `Ok(false)` without side effects if the state does not allow
    /// `action` (another action in flight, or already there).
    pub fn initiate_action<P: OutputPin>(
        &mut self,
        actor: Actor,
        action: Action,
        led: &mut Led<P>,
        now: Instant,
    ) -> Result<bool> {
        let next = match (action, self.state) {
            (Action::Unlock, LockState::LockingCompleted) => LockState::UnlockingInitiated,
            (Action::Lock, LockState::UnlockingCompleted) => LockState::LockingInitiated,
            _ => {
                debug!("Lock: {:?} rejected in {:?}", action, self.state);
                return Ok(false);
            }
        };

        if action == Action::Lock && self.auto_lock_armed {
            self.auto_lock_armed = false;
            self.cancel_timer()?;
            info!("Lock: pending auto-lock cancelled");
        }

        self.arm_timer(TimerContext::ActuatorMovement, self.actuator_movement_ms)?;
        self.set_state(next);
        info!("Lock: {:?} initiated by {:?}", action, actor);
        self.sink.action_initiated(actor, action);
        led.blink(ACTION_IN_PROGRESS_BLINK_MS, now);
        Ok(true)
    }

    /// Toggle based on the current state. Used for the action button.
    pub fn toggle<P: OutputPin>(&mut self, actor: Actor, led: &mut Led<P>, now: Instant) -> Result<bool> {
        let action = if self.is_unlocked() { Action::Lock } else { Action::Unlock };
        self.initiate_action(actor, action, led, now)
    }

    pub fn on_timer_expired<P: OutputPin>(
        &mut self,
        context: TimerContext,
        led: &mut Led<P>,
        now: Instant,
    ) -> Result<()> {
        if self.timer_context != Some(context) {
            warn!(
                "Lock: stale {:?} expiry ignored (armed: {:?})",
                context, self.timer_context
            );
            return Ok(());
        }
        self.timer_context = None;

        match context {
            TimerContext::ActuatorMovement => self.complete_action(led, now),
            TimerContext::AutoLock => self.auto_lock(led, now),
        }
    }

    fn complete_action<P: OutputPin>(&mut self, led: &mut Led<P>, now: Instant) -> Result<()> {
        match self.state {
            LockState::LockingInitiated => {
                self.set_state(LockState::LockingCompleted);
                self.sink.action_completed(Action::Lock);
                led.set(true, now);
                info!("Lock: locked");
            }
            LockState::UnlockingInitiated => {
                self.set_state(LockState::UnlockingCompleted);
                self.sink.action_completed(Action::Unlock);
                led.set(false, now);
                info!("Lock: unlocked");

                if self.auto_lock_enabled {
                    let ms = self.auto_lock_duration_secs.saturating_mul(1000);
                    self.arm_timer(TimerContext::AutoLock, ms)?;
                    self.auto_lock_armed = true;
                    info!("Lock: auto-lock armed for {}s", self.auto_lock_duration_secs);
                }
            }
            settled => warn!("Lock: actuator expiry in settled state {:?}", settled),
        }
        Ok(())
    }

    fn auto_lock<P: OutputPin>(&mut self, led: &mut Led<P>, now: Instant) -> Result<()> {
        if !self.auto_lock_armed {
            debug!("Lock: auto-lock expiry after cancellation");
            return Ok(());
        }
        self.auto_lock_armed = false;
        if !self.initiate_action(Actor::LocalImplicit, Action::Lock, led, now)? {
            warn!("Lock: auto-lock rejected in {:?}", self.state);
        }
        Ok(())
    }

    fn arm_timer(&mut self, context: TimerContext, duration_ms: u32) -> Result<()> {
        if let Some(previous) = self.timer_context.take() {
            debug!("Lock: replacing outstanding {:?} timer", previous);
            self.timer.stop()?;
        }
        self.timer.start(context, duration_ms)?;
        self.timer_context = Some(context);
        Ok(())
    }

    fn cancel_timer(&mut self) -> Result<()> {
        if self.timer_context.take().is_some() {
            self.timer.stop()?;
        }
        Ok(())
    }

    fn set_state(&mut self, state: LockState) {
        self.state = state;
        self.sink.state_changed(DeviceState::Lock(state));
    }
}

impl<T: DeviceTimer, S: TraitSink> Device for DeviceController<T, S> {
    const LONG_PRESS_ACTION: ButtonAction = ButtonAction::SendIdentifyRequest;

    fn on_user_action<P: OutputPin>(&mut self, led: &mut Led<P>, now: Instant) -> Result<()> {
        if !self.toggle(Actor::Physical, led, now)? {
            info!("Lock: button ignored, action already in progress");
        }
        Ok(())
    }

    fn on_timer_expired<P: OutputPin>(
        &mut self,
        context: TimerContext,
        led: &mut Led<P>,
        now: Instant,
    ) -> Result<()> {
        DeviceController::on_timer_expired(self, context, led, now)
    }

    fn on_command<P: OutputPin>(
        &mut self,
        command: DeviceCommand,
        led: &mut Led<P>,
        now: Instant,
    ) -> Result<()> {
        match command {
            DeviceCommand::Lock { actor } => {
                if !self.initiate_action(actor, Action::Lock, led, now)? {
                    warn!("Lock: remote lock rejected in {:?}", self.state);
                }
            }
            DeviceCommand::Unlock { actor } => {
                if !self.initiate_action(actor, Action::Unlock, led, now)? {
                    warn!("Lock: remote unlock rejected in {:?}", self.state);
                }
            }
            DeviceCommand::ConfigureAutoLock { enabled, duration_secs } => {
                self.enable_auto_lock(enabled);
                self.set_auto_lock_duration(duration_secs);
                info!("Lock: auto-lock {} ({}s)", if enabled { "on" } else { "off" }, duration_secs);
            }
        }
        Ok(())
    }

    fn indicator_level(&self) -> bool {
        !self.is_unlocked()
    }

    fn state(&self) -> DeviceState {
        DeviceState::Lock(self.state)
    }

    fn lock_settings(&self) -> Option<LockSettings> {
        Some(self.settings())
    }
}
