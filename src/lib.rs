//! Lockkit firmware library.
//!
//! Event-driven control core for the smart-lock / open-close sensor
//! dev-kit. Exposes the pure-logic modules for integration testing; all
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod pins;
