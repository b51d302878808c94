//! Bundles the platform adapters behind the application task's
//! [`Services`](crate::app::ports::Services) bound.

use crate::adapters::admin::ChannelAdmin;
use crate::adapters::connectivity::SharedConnectivity;
use crate::adapters::nvs::NvsAdapter;
use crate::app::ports::{AdminPort, ConfigError, ConfigPort, ConnectivityProvider, ProviderFlags};
use crate::config::LockSettings;

pub struct PlatformServices<'a> {
    connectivity: &'a SharedConnectivity,
    admin: ChannelAdmin<'a>,
    nvs: NvsAdapter,
}

impl<'a> PlatformServices<'a> {
    pub fn new(connectivity: &'a SharedConnectivity, admin: ChannelAdmin<'a>, nvs: NvsAdapter) -> Self {
        Self {
            connectivity,
            admin,
            nvs,
        }
    }
}

impl ConnectivityProvider for PlatformServices<'_> {
    fn try_snapshot(&self) -> Option<ProviderFlags> {
        self.connectivity.try_snapshot()
    }

    fn subscriptions_established(&self) -> bool {
        self.connectivity.subscriptions_established()
    }
}

impl AdminPort for PlatformServices<'_> {
    fn check_for_update_now(&mut self) {
        self.admin.check_for_update_now();
    }

    fn initiate_factory_reset(&mut self) {
        self.admin.initiate_factory_reset();
    }

    fn send_identify_request(&mut self) {
        self.admin.send_identify_request();
    }

    fn enable_user_selected_mode(&mut self) {
        self.admin.enable_user_selected_mode();
    }
}

impl ConfigPort for PlatformServices<'_> {
    fn load(&self) -> Result<LockSettings, ConfigError> {
        self.nvs.load()
    }

    fn save(&self, settings: &LockSettings) -> Result<(), ConfigError> {
        self.nvs.save(settings)
    }
}
