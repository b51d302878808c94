//! The device personality seam.
//!
//! The application task is generic over [`Device`]; the bolt lock
//! ([`DeviceController`](super::controller::DeviceController)) and the
//! open/close sensor ([`OpenCloseSensor`](super::ocsensor::OpenCloseSensor))
//! both implement it.

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;

use crate::app::commands::DeviceCommand;
use crate::app::controller::LockState;
use crate::app::ocsensor::OpenCloseState;
use crate::app::ports::TimerContext;
use crate::app::task::ButtonAction;
use crate::config::LockSettings;
use crate::drivers::led::Led;
use crate::error::Result;

/// State reported through [`TraitSink::state_changed`](super::ports::TraitSink::state_changed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Lock(LockState),
    OpenClose(OpenCloseState),
}

pub trait Device {
    /// Action bound to a long press of the action button.
    const LONG_PRESS_ACTION: ButtonAction;

    /// Short press of the action button.
    fn on_user_action<P: OutputPin>(&mut self, led: &mut Led<P>, now: Instant) -> Result<()>;

    fn on_timer_expired<P: OutputPin>(
        &mut self,
        context: TimerContext,
        led: &mut Led<P>,
        now: Instant,
    ) -> Result<()>;

    fn on_command<P: OutputPin>(
        &mut self,
        command: DeviceCommand,
        led: &mut Led<P>,
        now: Instant,
    ) -> Result<()>;

    /// Solid level of the device-state LED when no action is in flight.
    fn indicator_level(&self) -> bool;

    fn state(&self) -> DeviceState;

    /// Current persisted settings, if this device has any.
    fn lock_settings(&self) -> Option<LockSettings> {
        None
    }
}
