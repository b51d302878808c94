//! Inbound commands from the protocol layer.
//!
//! Remote lock / unlock requests and auto-lock configuration arrive from
//! the protocol stack's own task. They are posted to the application
//! queue by value and handled on the application task like any other
//! event.

use crate::app::controller::{Action, Actor};
use crate::events::{AppTaskEvent, EventQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Lock { actor: Actor },
    Unlock { actor: Actor },
    /// Update and persist the auto-lock policy.
    ConfigureAutoLock { enabled: bool, duration_secs: u32 },
}

impl DeviceCommand {
    pub fn for_action(action: Action, actor: Actor) -> Self {
        match action {
            Action::Lock => Self::Lock { actor },
            Action::Unlock => Self::Unlock { actor },
        }
    }
}

/// Queue a remote lock / unlock request.
/// Returns `false` if the queue was full.
pub fn post_action(queue: &EventQueue, action: Action, actor: Actor) -> bool {
    queue.post(AppTaskEvent::Command(DeviceCommand::for_action(action, actor)))
}
