//! Log-based trait update sink.
//!
//! Implements [`TraitSink`] by writing each notification to the logger
//! (UART / USB-CDC in production). The protocol layer's attribute
//! updater would implement the same trait.

use log::info;

use crate::app::controller::{Action, Actor};
use crate::app::device::DeviceState;
use crate::app::ports::TraitSink;

#[derive(Debug, Default)]
pub struct LogTraitSink;

impl LogTraitSink {
    pub fn new() -> Self {
        Self
    }
}

impl TraitSink for LogTraitSink {
    fn action_initiated(&mut self, actor: Actor, action: Action) {
        info!("TRAIT | initiated action={:?} actor={:?} ({})", action, actor, actor as u8);
    }

    fn action_completed(&mut self, action: Action) {
        info!("TRAIT | completed action={:?}", action);
    }

    fn state_changed(&mut self, state: DeviceState) {
        match state {
            DeviceState::Lock(s) => info!("TRAIT | bolt state={:?}", s),
            DeviceState::OpenClose(s) => info!("TRAIT | open/close state={:?}", s),
        }
    }
}
