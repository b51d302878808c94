//! Unified error types for the lock firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! application loop's fatal-error path uniform.  All variants are `Copy`
//! so they pass through the controller and the task loop without allocation.
//!
//! Expected, transient conditions (queue full, connectivity lock busy, an
//! action already in flight) are *not* errors: they are reported through
//! `bool` / `Option` returns and logged by the caller.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fatal condition in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The timer service refused to create, start or stop a timer.
    Timer(TimerError),
    /// GPIO bring-up or ISR registration failed.
    Gpio(GpioError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The timer could not be created (out of handles / memory).
    CreateFailed(i32),
    /// Arming the one-shot timer failed.
    StartFailed(i32),
    /// Disarming the timer failed.
    StopFailed(i32),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateFailed(rc) => write!(f, "create failed (rc={rc})"),
            Self::StartFailed(rc) => write!(f, "start failed (rc={rc})"),
            Self::StopFailed(rc) => write!(f, "stop failed (rc={rc})"),
        }
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// Pin direction / pull configuration failed.
    ConfigFailed(i32),
    /// Installing the shared GPIO ISR service failed.
    IsrInstallFailed(i32),
    /// Registering a per-pin ISR handler failed.
    IsrAddFailed(i32),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigFailed(rc) => write!(f, "pin config failed (rc={rc})"),
            Self::IsrInstallFailed(rc) => write!(f, "ISR service install failed (rc={rc})"),
            Self::IsrAddFailed(rc) => write!(f, "ISR handler add failed (rc={rc})"),
        }
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
