//! Administrative request forwarding.
//!
//! Button-bound administrative hooks are fire-and-forget: the application
//! task posts an [`AdminRequest`] and the owning subsystem (software update,
//! configuration manager, protocol stack) drains [`ADMIN_REQUESTS`] on its
//! own task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::AdminPort;

pub const ADMIN_QUEUE_CAP: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequest {
    CheckForUpdate,
    FactoryReset,
    SendIdentify,
    EnableUserSelectedMode,
}

pub type AdminChannel = Channel<CriticalSectionRawMutex, AdminRequest, ADMIN_QUEUE_CAP>;

/// Requests waiting for their subsystem.
pub static ADMIN_REQUESTS: AdminChannel = Channel::new();

/// [`AdminPort`] that forwards into an [`AdminChannel`].
pub struct ChannelAdmin<'a> {
    channel: &'a AdminChannel,
}

impl<'a> ChannelAdmin<'a> {
    pub fn new(channel: &'a AdminChannel) -> Self {
        Self { channel }
    }

    fn forward(&self, request: AdminRequest) {
        match self.channel.try_send(request) {
            Ok(()) => info!("Admin: {:?} requested", request),
            Err(_) => warn!("Admin: queue full, {:?} dropped", request),
        }
    }
}

impl AdminPort for ChannelAdmin<'_> {
    fn check_for_update_now(&mut self) {
        self.forward(AdminRequest::CheckForUpdate);
    }

    fn initiate_factory_reset(&mut self) {
        self.forward(AdminRequest::FactoryReset);
    }

    fn send_identify_request(&mut self) {
        self.forward(AdminRequest::SendIdentify);
    }

    fn enable_user_selected_mode(&mut self) {
        self.forward(AdminRequest::EnableUserSelectedMode);
    }
}
