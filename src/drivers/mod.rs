//! Button, LED and timer drivers, plus ESP-IDF GPIO bring-up.

pub mod button;
#[cfg(target_os = "espidf")]
pub mod hw_init;
pub mod hw_timer;
pub mod led;
