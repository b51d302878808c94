//! Integration tests for the event queue → AppTask → device pipeline.
//!
//! Events are posted exactly as the debounce timers, the device timer and
//! the protocol layer post them; every assertion is made on what reached
//! the LEDs, the trait sink, the timer and the platform services.

use crate::mock_hw::{
    AdminCall, MockClock, MockDelay, MockLock, MockPin, MockServices, MockTimer, RecordingSink,
    TickDelay, TraitUpdate, at, mock_leds, mock_lock,
};

use lockkit::app::commands::DeviceCommand;
use lockkit::app::connectivity::ConnectivityStatus;
use lockkit::app::controller::{Action, Actor, DeviceController, LockState};
use lockkit::app::device::DeviceState;
use lockkit::app::ocsensor::{OpenCloseSensor, OpenCloseState};
use lockkit::app::ports::{Clock, TimerContext};
use lockkit::app::task::AppTask;
use lockkit::config::{AppConfig, LockSettings};
use lockkit::drivers::button::ButtonPressState;
use lockkit::drivers::led::LedPattern;
use lockkit::error::{Error, TimerError};
use lockkit::events::{AppTaskEvent, EventQueue, PhysicalButtonAction};
use lockkit::pins::{ACTION_BUTTON, CONNECTIVITY_LED, DEVICE_STATE_LED, FUNCTION_BUTTON};

type LockTask<'q> = AppTask<'q, MockLock, MockPin>;

fn press(index: usize) -> AppTaskEvent {
    AppTaskEvent::Button {
        index: index as u8,
        action: PhysicalButtonAction::Press,
    }
}

fn release(index: usize) -> AppTaskEvent {
    AppTaskEvent::Button {
        index: index as u8,
        action: PhysicalButtonAction::Release,
    }
}

fn lock_task<'q>(queue: &'q EventQueue, config: AppConfig, clock: &MockClock, svc: &mut MockServices) -> LockTask<'q> {
    let device = mock_lock(&config);
    let mut task = AppTask::new(config, device, mock_leds(), queue).unwrap();
    task.start(clock.now(), svc);
    task
}

/// Post `event` at `ms` and run one loop step.
fn step(task: &mut LockTask<'_>, queue: &EventQueue, clock: &MockClock, svc: &mut MockServices, ms: u64, event: AppTaskEvent) {
    clock.set(ms);
    assert!(queue.post(event));
    task.run_once(clock, &mut MockDelay::default(), svc).unwrap();
}

/// Run one loop step with nothing queued.
fn idle(task: &mut LockTask<'_>, clock: &MockClock, svc: &mut MockServices, ms: u64) {
    clock.set(ms);
    task.run_once(clock, &mut MockDelay::default(), svc).unwrap();
}

// ── Lock scenario ─────────────────────────────────────────────

#[test]
fn start_shows_locked_state_and_connectivity() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    assert_eq!(task.led(DEVICE_STATE_LED).pattern(), LedPattern::Solid(true));
    assert_eq!(task.led(CONNECTIVITY_LED).pattern(), LedPattern::Solid(true));
    assert_eq!(task.connectivity().status(), Some(ConnectivityStatus::FullyConnected));
}

#[test]
fn action_button_locks_an_unlocked_device() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    // Remote unlock, then the bolt finishes travelling.
    let unlock = AppTaskEvent::Command(DeviceCommand::Unlock {
        actor: Actor::RemoteUserExplicit,
    });
    step(&mut task, &queue, &clock, &mut svc, 0, unlock);
    assert_eq!(task.device().state(), LockState::UnlockingInitiated);
    step(&mut task, &queue, &clock, &mut svc, 2000, AppTaskEvent::DeviceTimer(TimerContext::ActuatorMovement));
    assert_eq!(task.device().state(), LockState::UnlockingCompleted);
    assert_eq!(task.led(DEVICE_STATE_LED).pattern(), LedPattern::Solid(false));

    // Short press on the action button.
    step(&mut task, &queue, &clock, &mut svc, 10_000, press(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 10_200, release(ACTION_BUTTON));
    assert_eq!(task.device().state(), LockState::LockingInitiated);
    assert_eq!(
        task.led(DEVICE_STATE_LED).pattern(),
        LedPattern::Blink { on_ms: 50, off_ms: 50 }
    );
    assert_eq!(
        task.device().sink().updates.last(),
        Some(&TraitUpdate::Initiated(Actor::Physical, Action::Lock))
    );
    assert_eq!(
        task.device().timer().starts.last(),
        Some(&(TimerContext::ActuatorMovement, 2000))
    );

    step(&mut task, &queue, &clock, &mut svc, 12_200, AppTaskEvent::DeviceTimer(TimerContext::ActuatorMovement));
    assert_eq!(task.device().state(), LockState::LockingCompleted);
    assert_eq!(task.led(DEVICE_STATE_LED).pattern(), LedPattern::Solid(true));
    assert_eq!(
        task.device().sink().states(),
        vec![
            DeviceState::Lock(LockState::UnlockingInitiated),
            DeviceState::Lock(LockState::UnlockingCompleted),
            DeviceState::Lock(LockState::LockingInitiated),
            DeviceState::Lock(LockState::LockingCompleted),
        ]
    );
    assert!(svc.admin.is_empty());
}

#[test]
fn state_led_blinks_while_bolt_moves() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 100, release(ACTION_BUTTON));
    assert!(task.led(DEVICE_STATE_LED).is_blinking());

    let before = task.led(DEVICE_STATE_LED).is_on();
    idle(&mut task, &clock, &mut svc, 160);
    assert_ne!(task.led(DEVICE_STATE_LED).is_on(), before);
}

#[test]
fn press_during_actuation_is_ignored() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 100, release(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 500, press(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 600, release(ACTION_BUTTON));

    assert_eq!(task.device().state(), LockState::UnlockingInitiated);
    assert_eq!(task.device().timer().starts.len(), 1);
}

#[test]
fn one_step_drains_everything_queued_in_order() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    // The remote unlock is handled first, so the button toggle that
    // follows it in the same step hits the in-progress guard.
    queue.post(AppTaskEvent::Command(DeviceCommand::Unlock {
        actor: Actor::RemoteUserExplicit,
    }));
    queue.post(press(ACTION_BUTTON));
    queue.post(release(ACTION_BUTTON));
    task.run_once(&clock, &mut MockDelay::default(), &mut svc).unwrap();

    assert!(queue.is_empty());
    assert_eq!(task.button_state(ACTION_BUTTON), ButtonPressState::Inactive);
    assert_eq!(
        task.device().sink().updates[..2],
        [
            TraitUpdate::State(DeviceState::Lock(LockState::UnlockingInitiated)),
            TraitUpdate::Initiated(Actor::RemoteUserExplicit, Action::Unlock),
        ]
    );
    assert_eq!(task.device().sink().updates.len(), 2);
}

#[test]
fn auto_lock_relocks_after_unlock() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let config = AppConfig {
        auto_lock_enabled: true,
        auto_lock_duration_secs: 10,
        ..AppConfig::default()
    };
    let mut task = lock_task(&queue, config, &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 100, release(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 2100, AppTaskEvent::DeviceTimer(TimerContext::ActuatorMovement));
    assert!(task.device().auto_lock_armed());
    assert_eq!(task.device().timer().starts.last(), Some(&(TimerContext::AutoLock, 10_000)));

    step(&mut task, &queue, &clock, &mut svc, 12_100, AppTaskEvent::DeviceTimer(TimerContext::AutoLock));
    assert_eq!(task.device().state(), LockState::LockingInitiated);
    assert_eq!(
        task.device().sink().updates.last(),
        Some(&TraitUpdate::Initiated(Actor::LocalImplicit, Action::Lock))
    );
}

#[test]
fn timer_failure_stops_the_loop() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let config = AppConfig::default();
    let timer = MockTimer {
        fail_start: true,
        ..MockTimer::default()
    };
    let device = DeviceController::new(timer, RecordingSink::default(), &config);
    let mut task = AppTask::new(config, device, mock_leds(), &queue).unwrap();
    task.start(clock.now(), &mut svc);

    queue.post(press(ACTION_BUTTON));
    queue.post(release(ACTION_BUTTON));
    let result = task.run_once(&clock, &mut MockDelay::default(), &mut svc);
    assert_eq!(result, Err(Error::Timer(TimerError::StartFailed(-1))));
}

// ── Function button ───────────────────────────────────────────

#[test]
fn function_button_short_press_checks_for_update() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(FUNCTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 2000, release(FUNCTION_BUTTON));
    assert_eq!(svc.admin, vec![AdminCall::CheckForUpdate]);
    assert_eq!(task.device().state(), LockState::LockingCompleted);
}

#[test]
fn function_button_long_press_factory_resets() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(FUNCTION_BUTTON));
    idle(&mut task, &clock, &mut svc, 3000);
    assert_eq!(task.button_state(FUNCTION_BUTTON), ButtonPressState::LongStarted);
    idle(&mut task, &clock, &mut svc, 6000);
    assert_eq!(task.button_state(FUNCTION_BUTTON), ButtonPressState::LongCompleted);
    step(&mut task, &queue, &clock, &mut svc, 7000, release(FUNCTION_BUTTON));

    assert_eq!(svc.admin, vec![AdminCall::FactoryReset]);
}

#[test]
fn long_press_classified_at_release_without_cycles() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    // No cycle runs between the two edges.
    task.dispatch(press(FUNCTION_BUTTON), at(0), &mut svc).unwrap();
    task.dispatch(release(FUNCTION_BUTTON), at(7000), &mut svc).unwrap();
    assert_eq!(svc.admin, vec![AdminCall::FactoryReset]);
}

#[test]
fn action_button_long_press_sends_identify() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(ACTION_BUTTON));
    step(&mut task, &queue, &clock, &mut svc, 6500, release(ACTION_BUTTON));

    assert_eq!(svc.admin, vec![AdminCall::Identify]);
    assert_eq!(task.device().state(), LockState::LockingCompleted);
}

// ── Long-press activation window ──────────────────────────────

#[test]
fn long_press_window_blinks_all_leds_then_restores() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(FUNCTION_BUTTON));
    idle(&mut task, &clock, &mut svc, 3000);
    assert!(task.in_long_press_window());
    for index in [CONNECTIVITY_LED, DEVICE_STATE_LED] {
        assert_eq!(
            task.led(index).pattern(),
            LedPattern::Blink { on_ms: 500, off_ms: 500 }
        );
    }

    // Cancelled: released inside the window.
    step(&mut task, &queue, &clock, &mut svc, 4500, release(FUNCTION_BUTTON));
    assert!(!task.in_long_press_window());
    assert!(svc.admin.is_empty());
    assert_eq!(task.led(DEVICE_STATE_LED).pattern(), LedPattern::Solid(true));
    assert_eq!(task.led(CONNECTIVITY_LED).pattern(), LedPattern::Solid(true));
}

#[test]
fn long_press_window_closes_when_long_press_completes() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::new();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(FUNCTION_BUTTON));
    idle(&mut task, &clock, &mut svc, 3500);
    assert!(task.in_long_press_window());

    idle(&mut task, &clock, &mut svc, 6000);
    assert!(!task.in_long_press_window());
    assert_eq!(task.led(DEVICE_STATE_LED).pattern(), LedPattern::Solid(true));
    assert_eq!(
        task.led(CONNECTIVITY_LED).pattern(),
        ConnectivityStatus::Unprovisioned.led_pattern()
    );
}

// ── Robustness ────────────────────────────────────────────────

#[test]
fn event_for_unbound_button_is_dropped() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    step(&mut task, &queue, &clock, &mut svc, 0, press(5));
    step(&mut task, &queue, &clock, &mut svc, 100, release(5));

    assert!(queue.is_empty());
    assert!(svc.admin.is_empty());
    assert!(task.device().sink().updates.is_empty());
}

#[test]
fn empty_step_waits_one_quantum() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    let mut delay = MockDelay::default();
    task.run_once(&clock, &mut delay, &mut svc).unwrap();
    assert_eq!(delay.slept_ns, 10 * 1_000_000);
}

#[test]
fn coarse_scheduler_tick_keeps_the_step_at_one_quantum() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    // 100 Hz tick: one sleep covers the whole 10 ms quantum.
    let mut delay = TickDelay::new(&clock, 10);
    for _ in 0..5 {
        task.run_once(&clock, &mut delay, &mut svc).unwrap();
    }
    assert_eq!(delay.calls, 5);
    assert_eq!(clock.now(), at(50));
}

// ── Connectivity ──────────────────────────────────────────────

#[test]
fn connectivity_led_follows_provider() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::new();
    svc.flags = Some(Default::default());
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);
    assert_eq!(
        task.led(CONNECTIVITY_LED).pattern(),
        LedPattern::Blink { on_ms: 50, off_ms: 950 }
    );

    let connected = MockServices::fully_connected();
    svc.flags = connected.flags;
    svc.subscriptions = true;
    idle(&mut task, &clock, &mut svc, 100);
    assert_eq!(task.led(CONNECTIVITY_LED).pattern(), LedPattern::Solid(true));

    // Stack busy: the last snapshot stays on display.
    svc.flags = None;
    idle(&mut task, &clock, &mut svc, 200);
    assert_eq!(task.led(CONNECTIVITY_LED).pattern(), LedPattern::Solid(true));
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn configure_auto_lock_is_applied_and_persisted() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let mut task = lock_task(&queue, AppConfig::default(), &clock, &mut svc);

    let configure = AppTaskEvent::Command(DeviceCommand::ConfigureAutoLock {
        enabled: true,
        duration_secs: 30,
    });
    step(&mut task, &queue, &clock, &mut svc, 0, configure);

    let expected = LockSettings {
        auto_lock_enabled: true,
        auto_lock_duration_secs: 30,
    };
    assert_eq!(task.device().settings(), expected);
    assert_eq!(*svc.saved.borrow(), vec![expected]);
}

// ── Open/close sensor ─────────────────────────────────────────

#[test]
fn sensor_toggles_on_action_button() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let config = AppConfig::open_close_sensor();
    let sensor = OpenCloseSensor::new(RecordingSink::default());
    let mut task = AppTask::new(config, sensor, mock_leds(), &queue).unwrap();
    task.start(clock.now(), &mut svc);
    assert_eq!(task.led(DEVICE_STATE_LED).pattern(), LedPattern::Solid(true));

    let mut delay = MockDelay::default();
    queue.post(press(ACTION_BUTTON));
    clock.set(100);
    queue.post(release(ACTION_BUTTON));
    task.run_once(&clock, &mut delay, &mut svc).unwrap();

    assert!(task.device().is_open());
    assert_eq!(task.led(DEVICE_STATE_LED).pattern(), LedPattern::Solid(false));
    assert_eq!(
        task.device().sink().updates,
        vec![TraitUpdate::State(DeviceState::OpenClose(OpenCloseState::Open))]
    );

    // Timer expiries and lock commands have no meaning for a sensor.
    queue.post(AppTaskEvent::DeviceTimer(TimerContext::AutoLock));
    queue.post(AppTaskEvent::Command(DeviceCommand::Lock { actor: Actor::Other }));
    task.run_once(&clock, &mut delay, &mut svc).unwrap();
    assert!(task.device().is_open());
    assert_eq!(task.device().sink().updates.len(), 1);
}

#[test]
fn sensor_long_press_enables_user_selected_mode() {
    let queue = EventQueue::new();
    let clock = MockClock::at(0);
    let mut svc = MockServices::fully_connected();
    let sensor = OpenCloseSensor::new(RecordingSink::default());
    let mut task = AppTask::new(AppConfig::open_close_sensor(), sensor, mock_leds(), &queue).unwrap();
    task.start(clock.now(), &mut svc);

    queue.post(press(ACTION_BUTTON));
    task.run_once(&clock, &mut MockDelay::default(), &mut svc).unwrap();
    clock.set(7000);
    queue.post(release(ACTION_BUTTON));
    task.run_once(&clock, &mut MockDelay::default(), &mut svc).unwrap();

    assert_eq!(svc.admin, vec![AdminCall::UserSelectedMode]);
    assert!(!task.device().is_open());
}
