//! Application-wide constants and compile-time configuration.
//!
//! USB identity, descriptor strings, task timing, pin assignments and
//! clock parameters live here so they can be tuned in one place.

// USB identity

/// USB VID/PID - a test pair, fine for bench use only.
/// Replace with your own allocated VID/PID before shipping anything.
pub const USB_VID: u16 = 0xCAFE;
pub const USB_PID: u16 = 0xEF1A;

/// Device release number (BCD).
pub const USB_DEVICE_RELEASE: u16 = 0x0100;

/// USB specification release implemented by the PIO engine (1.1, BCD).
pub const USB_SPEC_RELEASE: u16 = 0x0110;

/// Max packet size of the default control endpoint.
pub const USB_CONTROL_MAX_PACKET: u8 = 64;

/// Language ID reported at string index 0 (English, United States).
pub const USB_LANGUAGE_ID: u16 = 0x0409;

/// USB device strings (indices 1, 2, 3).
pub const USB_MANUFACTURER: &str = "Pico PIO USB";
pub const USB_PRODUCT: &str = "Pico PIO USB Device";
pub const USB_SERIAL_NUMBER: &str = "123456";

/// Bus power drawn from the host (mA).
pub const USB_MAX_POWER_MA: u16 = 100;

/// HID interrupt IN polling interval (frames, i.e. ms at full speed).
pub const USB_HID_POLL_MS: u8 = 10;

/// HID interrupt IN endpoint max packet size.
pub const USB_HID_EP_SIZE: u16 = 64;

// Task timing

/// Report injection period (ms).
pub const REPORT_INTERVAL_MS: u64 = 500;

/// Half period of the heartbeat LED (ms): on for this long, then off.
pub const HEARTBEAT_HALF_PERIOD_MS: u64 = 500;

/// Keycode held down by every injected keyboard report ('a').
pub const DEMO_KEYCODE: u8 = crate::hid::keyboard::KEY_A;

// GPIO pin assignments (Raspberry Pi Pico defaults)
//
//   USB D+         → GP0  (D- is always D+ + 1)
//   Heartbeat LED  → GP25 (on-board LED)
//
// The actual `embassy_rp::peripherals::*` types are selected in `main.rs`.

/// GPIO carrying USB D+ for the PIO engine.
pub const USB_DP_PIN: u8 = 0;

/// GPIO driving the heartbeat LED.
pub const HEARTBEAT_LED_PIN: u8 = 25;

// Clocks

/// Crystal oscillator frequency on the Pico board.
pub const XOSC_HZ: u32 = 12_000_000;

/// System PLL settings: 12 MHz / 1 × 120 = 1440 MHz VCO, / 6 / 2 = 120 MHz.
///
/// The PIO USB engine needs the system clock to be a multiple of 12 MHz.
pub const SYS_PLL_REFDIV: u8 = 1;
pub const SYS_PLL_FBDIV: u16 = 120;
pub const SYS_PLL_POST_DIV1: u8 = 6;
pub const SYS_PLL_POST_DIV2: u8 = 2;

/// Target system clock frequency.
pub const SYS_CLOCK_HZ: u32 = 120_000_000;

/// System clock produced by a PLL configuration.
pub const fn pll_output_hz(xosc_hz: u32, refdiv: u8, fbdiv: u16, post_div1: u8, post_div2: u8) -> u32 {
    let vco = (xosc_hz / refdiv as u32) as u64 * fbdiv as u64;
    (vco / (post_div1 as u64 * post_div2 as u64)) as u32
}
