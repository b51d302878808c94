//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements           | Connects to                 |
//! |----------------|----------------------|-----------------------------|
//! | `admin`        | AdminPort            | Update / reset / identify   |
//! | `connectivity` | ConnectivityProvider | Protocol stack status flags |
//! | `log_sink`     | TraitSink            | Serial log output           |
//! | `nvs`          | ConfigPort           | NVS / in-memory store       |
//! | `platform`     | Services             | All of the above            |
//! | `time`         | Clock                | ESP32 system timer          |

pub mod admin;
pub mod connectivity;
pub mod log_sink;
pub mod nvs;
pub mod platform;
pub mod time;
