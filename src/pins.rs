//! GPIO pin assignments for the lock dev-kit board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Buttons (active-low, internal pull-up, any-edge interrupt)
// ---------------------------------------------------------------------------

/// Button 1: short = check for firmware update, long = factory reset.
pub const FUNCTION_BUTTON_GPIO: i32 = 9;
/// Button 2: short = device action, long = identify / user-selected mode.
pub const ACTION_BUTTON_GPIO: i32 = 8;

/// Button GPIOs indexed by button number.
pub const BUTTON_GPIOS: [i32; BUTTON_COUNT] = [FUNCTION_BUTTON_GPIO, ACTION_BUTTON_GPIO];

pub const BUTTON_COUNT: usize = 2;
pub const FUNCTION_BUTTON: usize = 0;
pub const ACTION_BUTTON: usize = 1;

// ---------------------------------------------------------------------------
// LEDs (active-high)
// ---------------------------------------------------------------------------

/// LED 1: connectivity status.
pub const CONNECTIVITY_LED_GPIO: i32 = 4;
/// LED 2: device state (locked / closed = on).
pub const DEVICE_STATE_LED_GPIO: i32 = 5;

pub const LED_COUNT: usize = 2;
pub const CONNECTIVITY_LED: usize = 0;
pub const DEVICE_STATE_LED: usize = 1;
