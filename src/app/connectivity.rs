//! Connectivity status presentation.
//!
//! Maps the protocol stack's provisioning / connectivity flags onto the
//! connectivity LED. First match wins:
//!
//! | # | Condition                                        | LED                  |
//! |---|--------------------------------------------------|----------------------|
//! | 1 | service connectivity ∧ subscriptions established | solid on             |
//! | 2 | thread provisioned ∧ enabled ∧ paired to account | on 950 ms / off 50   |
//! | 3 | BLE connection present                           | 100 ms / 100 ms      |
//! | 4 | otherwise                                        | on 50 ms / off 950   |
//!
//! Flags are read with a try-lock; when the stack holds its lock the
//! previous snapshot is reused for this cycle.

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;
use log::{debug, info};

use crate::app::ports::{ConnectivityProvider, ProviderFlags};
use crate::drivers::led::{Led, LedPattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivitySnapshot {
    pub thread_provisioned: bool,
    pub thread_enabled: bool,
    pub thread_attached: bool,
    pub has_ble_connections: bool,
    pub paired_to_account: bool,
    pub has_service_connectivity: bool,
    pub subscriptions_established: bool,
}

impl ConnectivitySnapshot {
    pub fn new(flags: ProviderFlags, subscriptions_established: bool) -> Self {
        Self {
            thread_provisioned: flags.thread_provisioned,
            thread_enabled: flags.thread_enabled,
            thread_attached: flags.thread_attached,
            has_ble_connections: flags.has_ble_connections,
            paired_to_account: flags.paired_to_account,
            has_service_connectivity: flags.has_service_connectivity,
            subscriptions_established,
        }
    }

    pub fn is_fully_connected(&self) -> bool {
        self.has_service_connectivity && self.subscriptions_established
    }

    pub fn status(&self) -> ConnectivityStatus {
        if self.is_fully_connected() {
            ConnectivityStatus::FullyConnected
        } else if self.thread_provisioned && self.thread_enabled && self.paired_to_account {
            ConnectivityStatus::AlmostThere
        } else if self.has_ble_connections {
            ConnectivityStatus::Commissioning
        } else {
            ConnectivityStatus::Unprovisioned
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    FullyConnected,
    AlmostThere,
    Commissioning,
    Unprovisioned,
}

impl ConnectivityStatus {
    pub const fn led_pattern(self) -> LedPattern {
        match self {
            Self::FullyConnected => LedPattern::Solid(true),
            Self::AlmostThere => LedPattern::Blink { on_ms: 950, off_ms: 50 },
            Self::Commissioning => LedPattern::Blink { on_ms: 100, off_ms: 100 },
            Self::Unprovisioned => LedPattern::Blink { on_ms: 50, off_ms: 950 },
        }
    }
}

/// Last snapshot read from the provider and the status shown for it.
#[derive(Debug, Default)]
pub struct ConnectivityState {
    flags: ProviderFlags,
    status: Option<ConnectivityStatus>,
}

impl ConnectivityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the provider (or reuse the stale flags) and install the
    /// matching LED pattern.
    pub fn update<P: OutputPin>(
        &mut self,
        subscriptions_established: bool,
        provider: &impl ConnectivityProvider,
        led: &mut Led<P>,
        now: Instant,
    ) {
        match provider.try_snapshot() {
            Some(flags) => self.flags = flags,
            None => debug!("Connectivity: provider busy, reusing last snapshot"),
        }

        let status = self.snapshot(subscriptions_established).status();
        if self.status != Some(status) {
            info!("Connectivity: {:?}", status);
            self.status = Some(status);
        }
        led.apply(status.led_pattern(), now);
    }

    pub fn snapshot(&self, subscriptions_established: bool) -> ConnectivitySnapshot {
        ConnectivitySnapshot::new(self.flags, subscriptions_established)
    }

    pub fn status(&self) -> Option<ConnectivityStatus> {
        self.status
    }
}
