//! Application core: pure domain logic, zero I/O.
//!
//! Button gesture handling, the device action state machines, connectivity
//! presentation and the task loop that drives them. All interaction with
//! the platform happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod connectivity;
pub mod controller;
pub mod device;
pub mod ocsensor;
pub mod ports;
pub mod task;
