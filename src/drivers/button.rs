//! Button press-duration state machine and ISR edge filter.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. The GPIO interrupt fires on
//! any edge and only restarts the button's debounce timer. When the timer
//! expires it samples the settled level, passes it through [`EdgeFilter`]
//! and posts a press / release event to the application queue.
//!
//! ## Gesture detection
//!
//! | Hold duration at release | State at release | Emits            |
//! |--------------------------|------------------|------------------|
//! | d < T1                   | `Short`          | short handler    |
//! | T1 <= d < T2             | `LongStarted`    | nothing          |
//! | d >= T2                  | `LongCompleted`  | long handler     |
//!
//! `T1` / `T2` come from `AppConfig::long_press_{start,complete}_ms`.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_time::{Duration, Instant};
use log::{debug, error, info, warn};

use crate::events::{AppTaskEvent, EventQueue, PhysicalButtonAction};
use crate::pins::BUTTON_COUNT;

/// Press-duration classification of a held button.
///
/// Ordered: while a press is held the state only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ButtonPressState {
    Inactive,
    Short,
    LongStarted,
    LongCompleted,
}

impl ButtonPressState {
    pub fn is_active(self) -> bool {
        self != Self::Inactive
    }
}

pub struct Button<H> {
    index: u8,
    state: ButtonPressState,
    pressed_at: Instant,
    long_press_start: Duration,
    long_press_complete: Duration,
    short_press_handler: Option<H>,
    long_press_handler: Option<H>,
}

impl<H: Copy> Button<H> {
    pub fn new(index: u8, long_press_start_ms: u32, long_press_complete_ms: u32) -> Self {
        debug_assert!(long_press_start_ms < long_press_complete_ms);
        Self {
            index,
            state: ButtonPressState::Inactive,
            pressed_at: Instant::from_ticks(0),
            long_press_start: Duration::from_millis(u64::from(long_press_start_ms)),
            long_press_complete: Duration::from_millis(u64::from(long_press_complete_ms)),
            short_press_handler: None,
            long_press_handler: None,
        }
    }

    pub fn set_short_press_handler(&mut self, handler: H) {
        self.short_press_handler = Some(handler);
    }

    pub fn set_long_press_handler(&mut self, handler: H) {
        self.long_press_handler = Some(handler);
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn state(&self) -> ButtonPressState {
        self.state
    }

    /// Feed a debounced edge.
    ///
    /// On release the press state is first re-evaluated against `now`, so
    /// the gesture follows the full hold duration rather than whatever
    /// state the last `tick` left behind.
    ///
    /// Returns the handler to run, if the release completed a gesture that
    /// has one registered.
    pub fn on_edge(&mut self, pressed: bool, now: Instant) -> Option<H> {
        if pressed {
            self.on_press(now);
            return None;
        }
        self.on_release(now)
    }

    fn on_press(&mut self, now: Instant) {
        if self.state.is_active() {
            warn!(
                "Button{}: press while already {:?}, ignored",
                self.index, self.state
            );
            return;
        }
        self.state = ButtonPressState::Short;
        self.pressed_at = now;
        debug!("Button{}: pressed", self.index);
    }

    fn on_release(&mut self, now: Instant) -> Option<H> {
        // Classify on the full hold duration, even if no cycle ran since
        // the last threshold was crossed.
        self.advance(now);
        let released_from = self.state;
        self.state = ButtonPressState::Inactive;

        match released_from {
            ButtonPressState::Inactive => {
                error!("Button{}: release without a press", self.index);
                None
            }
            ButtonPressState::Short => {
                info!("Button{}: short press", self.index);
                self.short_press_handler
            }
            ButtonPressState::LongStarted => {
                info!("Button{}: long press cancelled", self.index);
                None
            }
            ButtonPressState::LongCompleted => {
                info!("Button{}: long press", self.index);
                self.long_press_handler
            }
        }
    }

    /// Advance the hold-duration state of a pressed button.
    /// Called once per event-loop cycle.
    pub fn tick(&mut self, now: Instant) -> ButtonPressState {
        let before = self.state;
        self.advance(now);
        if self.state != before {
            debug!("Button{}: {:?} -> {:?}", self.index, before, self.state);
        }
        self.state
    }

    fn advance(&mut self, now: Instant) {
        if !self.state.is_active() {
            return;
        }
        let held = now.saturating_duration_since(self.pressed_at);
        let next = if held >= self.long_press_complete {
            ButtonPressState::LongCompleted
        } else if held >= self.long_press_start {
            ButtonPressState::LongStarted
        } else {
            ButtonPressState::Short
        };
        self.state = self.state.max(next);
    }
}

// ---------------------------------------------------------------------------
// ISR-side edge filtering
// ---------------------------------------------------------------------------

/// Drops debounce expiries whose settled level equals the last one reported.
pub struct EdgeFilter {
    last_pressed: AtomicBool,
}

impl EdgeFilter {
    pub const fn new() -> Self {
        Self {
            last_pressed: AtomicBool::new(false),
        }
    }

    /// Returns the level if it differs from the previously reported one.
    pub fn settle(&self, pressed: bool) -> Option<bool> {
        let previous = self.last_pressed.swap(pressed, Ordering::AcqRel);
        (previous != pressed).then_some(pressed)
    }
}

impl Default for EdgeFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// One filter per button, shared between debounce timer callbacks.
pub static EDGE_FILTERS: [EdgeFilter; BUTTON_COUNT] = [const { EdgeFilter::new() }; BUTTON_COUNT];

/// Debounce-expiry path: filter the sampled level and post a button event.
/// Safe to call from timer-service context.
///
/// Returns `true` if an event was queued.
pub fn report_settled_level(
    queue: &EventQueue,
    filter: &EdgeFilter,
    index: u8,
    pressed: bool,
) -> bool {
    match filter.settle(pressed) {
        Some(level) => queue.post(AppTaskEvent::Button {
            index,
            action: PhysicalButtonAction::from_pressed(level),
        }),
        None => false,
    }
}
