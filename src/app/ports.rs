//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppTask / DeviceController (domain)
//! ```
//!
//! Driven adapters (timer service, protocol stack, persistence, logging)
//! implement these traits. The domain consumes them via generics, so the
//! state machines never touch ESP-IDF directly and run unchanged on host.

use embassy_time::Instant;

use crate::app::controller::{Action, Actor};
use crate::app::device::DeviceState;
use crate::config::LockSettings;
use crate::error::TimerError;

// ───────────────────────────────────────────────────────────────
// Device timer port (domain → timer service → event queue)
// ───────────────────────────────────────────────────────────────

/// What an outstanding device-timer expiry means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerContext {
    /// The armed auto-lock delay elapsed.
    AutoLock,
    /// The simulated bolt finished travelling.
    ActuatorMovement,
}

/// Single one-shot timer shared by all device-level delays.
///
/// On expiry the implementation posts
/// [`AppTaskEvent::DeviceTimer`](crate::events::AppTaskEvent::DeviceTimer)
/// carrying the context it was started with.
pub trait DeviceTimer {
    /// Arm the timer, replacing any pending expiry.
    fn start(&mut self, context: TimerContext, duration_ms: u32) -> Result<(), TimerError>;

    /// Disarm the timer. Stopping an idle timer is not an error.
    fn stop(&mut self) -> Result<(), TimerError>;
}

// ───────────────────────────────────────────────────────────────
// Trait update sink (domain → protocol data model)
// ───────────────────────────────────────────────────────────────

/// Receives every externally visible device change so the protocol layer
/// can update its attributes.
pub trait TraitSink {
    fn action_initiated(&mut self, actor: Actor, action: Action);
    fn action_completed(&mut self, action: Action);
    fn state_changed(&mut self, state: DeviceState);
}

// ───────────────────────────────────────────────────────────────
// Connectivity provider (protocol stack → domain)
// ───────────────────────────────────────────────────────────────

/// Raw connectivity flags owned by the protocol stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderFlags {
    pub thread_provisioned: bool,
    pub thread_enabled: bool,
    pub thread_attached: bool,
    pub has_ble_connections: bool,
    pub paired_to_account: bool,
    pub has_service_connectivity: bool,
}

pub trait ConnectivityProvider {
    /// Read the flags without blocking.
    /// Returns `None` if the stack currently holds its lock.
    fn try_snapshot(&self) -> Option<ProviderFlags>;

    /// Whether the service subscriptions have been established.
    fn subscriptions_established(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Administrative actions (domain → update / reset / identify)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget requests bound to long and short button presses.
pub trait AdminPort {
    fn check_for_update_now(&mut self);
    fn initiate_factory_reset(&mut self);
    fn send_identify_request(&mut self);
    fn enable_user_selected_mode(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the runtime-changeable lock settings.
pub trait ConfigPort {
    /// Load settings from persistent storage.
    /// Returns [`LockSettings::default()`] if none are stored.
    fn load(&self) -> Result<LockSettings, ConfigError>;

    /// Validate and persist settings.
    fn save(&self, settings: &LockSettings) -> Result<(), ConfigError>;
}

/// Everything the application task needs from the platform besides LEDs
/// and the device itself.
pub trait Services: ConnectivityProvider + AdminPort + ConfigPort {}

impl<T: ConnectivityProvider + AdminPort + ConfigPort> Services for T {}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored settings failed deserialization.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

