//! Open/close sensor personality.
//!
//! Two states and no actuation delay: the action button toggles the
//! reported state immediately. The state LED is on while closed.

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::commands::DeviceCommand;
use crate::app::device::{Device, DeviceState};
use crate::app::ports::{TimerContext, TraitSink};
use crate::app::task::ButtonAction;
use crate::drivers::led::Led;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenCloseState {
    Open,
    Closed,
}

pub struct OpenCloseSensor<S> {
    state: OpenCloseState,
    sink: S,
}

impl<S: TraitSink> OpenCloseSensor<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: OpenCloseState::Closed,
            sink,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == OpenCloseState::Open
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn toggle<P: OutputPin>(&mut self, led: &mut Led<P>, now: Instant) {
        self.state = match self.state {
            OpenCloseState::Open => OpenCloseState::Closed,
            OpenCloseState::Closed => OpenCloseState::Open,
        };
        led.set(!self.is_open(), now);
        info!("Sensor: {:?}", self.state);
        self.sink.state_changed(DeviceState::OpenClose(self.state));
    }
}

impl<S: TraitSink> Device for OpenCloseSensor<S> {
    const LONG_PRESS_ACTION: ButtonAction = ButtonAction::EnableUserSelectedMode;

    fn on_user_action<P: OutputPin>(&mut self, led: &mut Led<P>, now: Instant) -> Result<()> {
        self.toggle(led, now);
        Ok(())
    }

    fn on_timer_expired<P: OutputPin>(
        &mut self,
        context: TimerContext,
        _led: &mut Led<P>,
        _now: Instant,
    ) -> Result<()> {
        warn!("Sensor: unexpected {:?} timer expiry", context);
        Ok(())
    }

    fn on_command<P: OutputPin>(
        &mut self,
        command: DeviceCommand,
        _led: &mut Led<P>,
        _now: Instant,
    ) -> Result<()> {
        warn!("Sensor: {:?} not supported", command);
        Ok(())
    }

    fn indicator_level(&self) -> bool {
        !self.is_open()
    }

    fn state(&self) -> DeviceState {
        DeviceState::OpenClose(self.state)
    }
}
