//! GPIO / peripheral pin assignments for the dew controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Heater outputs (logic-level MOSFETs, one per dew strap)
// ---------------------------------------------------------------------------

pub const CH1_HEATER_GPIO: i32 = 9;
pub const CH2_HEATER_GPIO: i32 = 10;
/// Channel 3 shadows ch1/ch2, runs manually, or uses its own probe.
pub const CH3_HEATER_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Cooling fan (12 V, PWM through a MOSFET)
// ---------------------------------------------------------------------------

pub const FAN_PWM_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// 1-Wire temperature probes (DS18B20, 4.7 kΩ pull-up on each bus)
// ---------------------------------------------------------------------------

pub const CH1_PROBE_GPIO: i32 = 6;
pub const CH2_PROBE_GPIO: i32 = 7;
pub const CH3_PROBE_GPIO: i32 = 8;
/// Board temperature probe next to the MOSFETs.
pub const BOARD_PROBE_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Ambient sensor (DHT11 / DHT22 single-wire)
// ---------------------------------------------------------------------------

pub const DHT_DATA_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Override toggle switches: resistor ladder into ADC1
// ---------------------------------------------------------------------------

/// ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const SWITCH_LADDER_GPIO: i32 = 1;

// ---------------------------------------------------------------------------
// Status LED (discrete RGB, mirrors the fan speed)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 11;
pub const LED_G_GPIO: i32 = 12;
pub const LED_B_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Serial links
// ---------------------------------------------------------------------------

/// UART0 is the USB serial console, on the default pins.
pub const USB_UART_PORT: i32 = 0;
/// UART1 talks to the Bluetooth SPP module.
pub const BT_UART_PORT: i32 = 1;
pub const BT_TX_GPIO: i32 = 17;
pub const BT_RX_GPIO: i32 = 18;
pub const SERIAL_BAUD: i32 = 57_600;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// Resistive heater straps.
pub const HEATER_PWM_FREQ_HZ: u32 = 1_000;
/// Fan PWM above the audible range.
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
