//! Shared connectivity status between the protocol stack and the app task.
//!
//! The protocol stack owns the flags and updates them under an
//! `embassy-sync` mutex. The application task only ever *tries* the lock
//! and falls back to its previous snapshot, so a slow stack operation can
//! never stall the UI loop.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::app::ports::{ConnectivityProvider, ProviderFlags};

pub struct SharedConnectivity {
    flags: Mutex<CriticalSectionRawMutex, ProviderFlags>,
    subscriptions_established: AtomicBool,
}

impl SharedConnectivity {
    pub const fn new() -> Self {
        Self {
            flags: Mutex::new(ProviderFlags {
                thread_provisioned: false,
                thread_enabled: false,
                thread_attached: false,
                has_ble_connections: false,
                paired_to_account: false,
                has_service_connectivity: false,
            }),
            subscriptions_established: AtomicBool::new(false),
        }
    }

    /// Stack side: take the lock for a multi-field update.
    /// Returns `None` if another holder has it.
    pub fn try_lock_stack(&self) -> Option<MutexGuard<'_, CriticalSectionRawMutex, ProviderFlags>> {
        self.flags.try_lock().ok()
    }

    /// Stack side: replace all flags at once.
    /// Returns `false` if the lock was busy and nothing was written.
    pub fn publish(&self, flags: ProviderFlags) -> bool {
        match self.try_lock_stack() {
            Some(mut guard) => {
                *guard = flags;
                true
            }
            None => false,
        }
    }

    pub fn set_subscriptions_established(&self, established: bool) {
        self.subscriptions_established
            .store(established, Ordering::Release);
    }
}

impl Default for SharedConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityProvider for SharedConnectivity {
    fn try_snapshot(&self) -> Option<ProviderFlags> {
        self.flags.try_lock().ok().map(|guard| *guard)
    }

    fn subscriptions_established(&self) -> bool {
        self.subscriptions_established.load(Ordering::Acquire)
    }
}

/// The device's connectivity status, written by the protocol task.
pub static CONNECTIVITY: SharedConnectivity = SharedConnectivity::new();
