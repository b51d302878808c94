//! AppTask wired to the real platform adapters (host builds).
//!
//! Covers the paths a mock would hide: admin requests reaching their
//! channel, connectivity published by the protocol side, and settings
//! surviving a save / load through the NVS adapter.

use embassy_sync::channel::Channel;

use lockkit::adapters::admin::{AdminChannel, AdminRequest, ChannelAdmin};
use lockkit::adapters::connectivity::SharedConnectivity;
use lockkit::adapters::nvs::NvsAdapter;
use lockkit::adapters::platform::PlatformServices;
use lockkit::app::commands::DeviceCommand;
use lockkit::app::ports::{ConfigPort, ProviderFlags};
use lockkit::app::task::AppTask;
use lockkit::config::{AppConfig, LockSettings};
use lockkit::drivers::led::LedPattern;
use lockkit::events::{AppTaskEvent, EventQueue, PhysicalButtonAction};
use lockkit::pins::{CONNECTIVITY_LED, FUNCTION_BUTTON};

use crate::mock_hw::{MockClock, MockDelay, at, mock_leds, mock_lock};

#[test]
fn adapters_carry_admin_connectivity_and_settings() {
    let connectivity = SharedConnectivity::new();
    let admin: AdminChannel = Channel::new();
    let nvs = NvsAdapter::new().unwrap();
    let mut services = PlatformServices::new(&connectivity, ChannelAdmin::new(&admin), nvs);

    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let config = AppConfig::default();
    let device = mock_lock(&config);
    let mut task = AppTask::new(config, device, mock_leds(), &queue).unwrap();
    task.start(at(0), &mut services);
    assert_eq!(
        task.led(CONNECTIVITY_LED).pattern(),
        LedPattern::Blink { on_ms: 50, off_ms: 950 }
    );

    // Protocol side reports a commissioning window.
    assert!(connectivity.publish(ProviderFlags {
        has_ble_connections: true,
        ..ProviderFlags::default()
    }));
    clock.set(100);
    task.run_once(&clock, &mut MockDelay::default(), &mut services).unwrap();
    assert_eq!(
        task.led(CONNECTIVITY_LED).pattern(),
        LedPattern::Blink { on_ms: 100, off_ms: 100 }
    );

    // Short press on the function button.
    for action in [PhysicalButtonAction::Press, PhysicalButtonAction::Release] {
        queue.post(AppTaskEvent::Button {
            index: FUNCTION_BUTTON as u8,
            action,
        });
    }
    task.run_once(&clock, &mut MockDelay::default(), &mut services).unwrap();
    assert_eq!(admin.try_receive().ok(), Some(AdminRequest::CheckForUpdate));
    assert!(admin.try_receive().is_err());

    // Remote auto-lock configuration lands in NVS.
    queue.post(AppTaskEvent::Command(DeviceCommand::ConfigureAutoLock {
        enabled: true,
        duration_secs: 45,
    }));
    task.run_once(&clock, &mut MockDelay::default(), &mut services).unwrap();
    assert_eq!(
        services.load(),
        Ok(LockSettings {
            auto_lock_enabled: true,
            auto_lock_duration_secs: 45,
        })
    );
}

#[test]
fn invalid_settings_are_not_persisted() {
    let connectivity = SharedConnectivity::new();
    let admin: AdminChannel = Channel::new();
    let mut services = PlatformServices::new(&connectivity, ChannelAdmin::new(&admin), NvsAdapter::new().unwrap());

    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let config = AppConfig::default();
    let device = mock_lock(&config);
    let mut task = AppTask::new(config, device, mock_leds(), &queue).unwrap();
    task.start(at(0), &mut services);

    // Enabled with no duration fails validation; the device still applies it.
    queue.post(AppTaskEvent::Command(DeviceCommand::ConfigureAutoLock {
        enabled: true,
        duration_secs: 0,
    }));
    task.run_once(&clock, &mut MockDelay::default(), &mut services).unwrap();
    assert!(task.device().settings().auto_lock_enabled);
    assert_eq!(services.load(), Ok(LockSettings::default()));
}
