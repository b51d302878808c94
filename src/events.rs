//! Interrupt-safe application event queue.
//!
//! Events are produced by:
//! - Button debounce timers (settled press / release edges)
//! - The device timer service (actuator movement, auto-lock)
//! - The protocol layer (remote lock / unlock, auto-lock settings)
//!
//! Events are consumed by the application task, which drains everything
//! that was pending when the step began, in FIFO order, then runs one
//! event-loop cycle.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Debounce tmr │────▶│              │     │              │
//! │ Device timer │────▶│  EventQueue  │────▶│   AppTask    │
//! │ Protocol     │────▶│  (cap = 10)  │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Every payload travels by value; nothing in the queue points back into
//! producer storage.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use log::error;

use crate::app::commands::DeviceCommand;
use crate::app::ports::{Clock, TimerContext};

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 10;

/// Sleep requested between queue polls while waiting.
const WAIT_SLICE: Duration = Duration::from_millis(1);

/// Debounced physical transition of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalButtonAction {
    Press,
    Release,
}

impl PhysicalButtonAction {
    pub fn from_pressed(pressed: bool) -> Self {
        if pressed { Self::Press } else { Self::Release }
    }

    pub fn is_press(self) -> bool {
        self == Self::Press
    }
}

/// Work handed to the application task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTaskEvent {
    /// A debounced edge on button `index`.
    Button {
        index: u8,
        action: PhysicalButtonAction,
    },
    /// The device timer expired while armed for `TimerContext`.
    DeviceTimer(TimerContext),
    /// A request coming from the protocol layer.
    Command(DeviceCommand),
}

/// Bounded multi-producer, single-consumer event queue.
///
/// `post` never blocks and never allocates, so it can be called from
/// timer-service callbacks and from interrupt handlers.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, AppTaskEvent, EVENT_QUEUE_CAP>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue an event.
    /// Returns `false` if the queue is full (event dropped).
    pub fn post(&self, event: AppTaskEvent) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                error!("EventQueue: full, dropping {:?}", dropped);
                false
            }
        }
    }

    /// Invoke `handler` for every event that was queued when this call
    /// began, in FIFO order.  Events posted by the handler itself (or by
    /// producers running concurrently) wait for the next call.
    ///
    /// Returns the number of events handled.
    pub fn drain_pending(&self, mut handler: impl FnMut(AppTaskEvent)) -> usize {
        let pending = self.channel.len();
        let mut handled = 0;
        for _ in 0..pending {
            let Ok(event) = self.channel.try_receive() else {
                break;
            };
            handler(event);
            handled += 1;
        }
        handled
    }

    /// Wait up to `quantum_ms` for at least one event to be queued,
    /// polling between 1 ms sleeps on `delay`.
    ///
    /// Each sleep is charged at the time `clock` saw pass, and never less
    /// than was requested, so a delay that rounds up to a scheduler tick
    /// still ends the wait after one quantum.
    /// Returns `true` if an event is pending.
    pub fn wait_for_event(&self, quantum_ms: u32, clock: &impl Clock, delay: &mut impl DelayNs) -> bool {
        let quantum = Duration::from_millis(u64::from(quantum_ms));
        let mut waited = Duration::from_ticks(0);
        while self.channel.is_empty() {
            if waited >= quantum {
                return false;
            }
            let before = clock.now();
            delay.delay_ms(1);
            waited += clock.now().saturating_duration_since(before).max(WAIT_SLICE);
        }
        true
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The application task's queue.  Lives in a static so interrupt handlers
/// and timer callbacks can reach it without a context pointer.
pub static APP_EVENTS: EventQueue = EventQueue::new();

/// Post into [`APP_EVENTS`].
/// Safe to call from ISR and timer-service context.
pub fn post_event(event: AppTaskEvent) -> bool {
    APP_EVENTS.post(event)
}
