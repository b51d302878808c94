//! Host device-timer tests.
//!
//! `ThreadDeviceTimer` posts into a `'static` queue from its own thread,
//! just as the esp_timer callback does on target. Each test owns its
//! queue so parallel tests never see each other's expiries.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use lockkit::app::commands::DeviceCommand;
use lockkit::app::controller::{Actor, DeviceController, LockState};
use lockkit::app::ports::{Clock, DeviceTimer, TimerContext};
use lockkit::app::task::AppTask;
use lockkit::adapters::log_sink::LogTraitSink;
use lockkit::adapters::time::SystemClock;
use lockkit::config::AppConfig;
use lockkit::drivers::hw_timer::ThreadDeviceTimer;
use lockkit::events::{AppTaskEvent, EventQueue};

use crate::mock_hw::{MockServices, mock_leds};

/// Wait until `queue` holds an event, or give up after `limit`.
fn wait_for_post(queue: &EventQueue, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while queue.is_empty() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    true
}

fn drain(queue: &EventQueue) -> Vec<AppTaskEvent> {
    let mut events = Vec::new();
    queue.drain_pending(|e| events.push(e));
    events
}

struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

#[test]
fn expiry_posts_armed_context() {
    static QUEUE: EventQueue = EventQueue::new();
    let mut timer = ThreadDeviceTimer::new(&QUEUE);

    timer.start(TimerContext::ActuatorMovement, 20).unwrap();
    assert!(wait_for_post(&QUEUE, Duration::from_secs(2)));
    assert_eq!(
        drain(&QUEUE),
        vec![AppTaskEvent::DeviceTimer(TimerContext::ActuatorMovement)]
    );
}

#[test]
fn stop_suppresses_expiry() {
    static QUEUE: EventQueue = EventQueue::new();
    let mut timer = ThreadDeviceTimer::new(&QUEUE);

    timer.start(TimerContext::AutoLock, 30).unwrap();
    timer.stop().unwrap();
    assert!(!wait_for_post(&QUEUE, Duration::from_millis(200)));
}

#[test]
fn restart_replaces_pending_expiry() {
    static QUEUE: EventQueue = EventQueue::new();
    let mut timer = ThreadDeviceTimer::new(&QUEUE);

    timer.start(TimerContext::AutoLock, 30).unwrap();
    timer.start(TimerContext::ActuatorMovement, 60).unwrap();
    assert!(wait_for_post(&QUEUE, Duration::from_secs(2)));
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(
        drain(&QUEUE),
        vec![AppTaskEvent::DeviceTimer(TimerContext::ActuatorMovement)]
    );
}

#[test]
fn unlock_completes_through_real_timer() {
    static QUEUE: EventQueue = EventQueue::new();
    let config = AppConfig {
        actuator_movement_ms: 20,
        ..AppConfig::default()
    };
    let device = DeviceController::new(ThreadDeviceTimer::new(&QUEUE), LogTraitSink::new(), &config);
    let mut task = AppTask::new(config, device, mock_leds(), &QUEUE).unwrap();
    let clock = SystemClock::new();
    let mut svc = MockServices::fully_connected();
    let mut delay = StdDelay;
    task.start(clock.now(), &mut svc);

    QUEUE.post(AppTaskEvent::Command(DeviceCommand::Unlock {
        actor: Actor::RemoteUserExplicit,
    }));
    task.run_once(&clock, &mut delay, &mut svc).unwrap();
    assert_eq!(task.device().state(), LockState::UnlockingInitiated);

    for _ in 0..200 {
        task.run_once(&clock, &mut delay, &mut svc).unwrap();
        if task.device().state() == LockState::UnlockingCompleted {
            break;
        }
    }
    assert_eq!(task.device().state(), LockState::UnlockingCompleted);
}
