//! GPIO pin assignments for the MotionLamp main board.
//!
//! Single source of truth — the default configuration references this
//! module rather than hard-coding pin numbers.  Change a pin here and it
//! propagates everywhere.

// ---------------------------------------------------------------------------
// PIR sensors (HC-SR501, push-pull output, HIGH = motion)
// ---------------------------------------------------------------------------

pub const PIR0_GPIO: i32 = 4;
pub const PIR1_GPIO: i32 = 5;
pub const PIR2_GPIO: i32 = 6;
pub const PIR3_GPIO: i32 = 7;
pub const PIR4_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Indicator LEDs (active HIGH through a low-side driver)
// ---------------------------------------------------------------------------

pub const LED0_GPIO: i32 = 38;
pub const LED1_GPIO: i32 = 39;
pub const LED2_GPIO: i32 = 40;
pub const LED3_GPIO: i32 = 41;
pub const LED4_GPIO: i32 = 42;

// ---------------------------------------------------------------------------
// Channel table
// ---------------------------------------------------------------------------

/// `(sensor, indicator)` GPIO pairs, indexed by channel number.
pub const CHANNEL_PINS: [(i32, i32); 5] = [
    (PIR0_GPIO, LED0_GPIO),
    (PIR1_GPIO, LED1_GPIO),
    (PIR2_GPIO, LED2_GPIO),
    (PIR3_GPIO, LED3_GPIO),
    (PIR4_GPIO, LED4_GPIO),
];
