//! One-shot hardware peripheral initialization.
//!
//! Configures the switch-ladder ADC, LED and sensor-bus GPIOs, LEDC
//! timers/channels and the two UARTs using raw ESP-IDF sys calls.  Called
//! once from `main()` before the control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::UartInitFailed(rc)   => write!(f, "UART driver install failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
fn check(ret: i32, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(err(ret)) }
}

/// Configure every peripheral.  `bluetooth` selects whether UART1 is
/// brought up for the SPP module.
#[cfg(target_os = "espidf")]
pub fn init_peripherals(bluetooth: bool) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_outputs()?;
        init_open_drain()?;
        init_ledc()?;
        init_uart(pins::USB_UART_PORT, None)?;
        if bluetooth {
            init_uart(pins::BT_UART_PORT, Some((pins::BT_TX_GPIO, pins::BT_RX_GPIO)))?;
        }
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(_bluetooth: bool) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

pub const ADC1_CH_SWITCHES: u32 = 0;

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    check(unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) }, HwInitError::AdcInitFailed)?;

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    check(
        unsafe { adc_oneshot_config_channel(adc1_handle(), ADC1_CH_SWITCHES, &chan_cfg) },
        HwInitError::AdcInitFailed,
    )?;

    info!("hw_init: ADC1 configured (CH0=switch ladder)");
    Ok(())
}

/// 12-bit oneshot conversion; 0 on error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.clamp(0, 4095) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    4095
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn configure_pins(pins: &[i32], mode: gpio_mode_t, pull_up: bool) -> Result<(), HwInitError> {
    for &pin in pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode,
            pull_up_en: if pull_up { gpio_pullup_t_GPIO_PULLUP_ENABLE } else { gpio_pullup_t_GPIO_PULLUP_DISABLE },
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let leds = [pins::LED_R_GPIO, pins::LED_G_GPIO, pins::LED_B_GPIO];
    unsafe { configure_pins(&leds, gpio_mode_t_GPIO_MODE_OUTPUT, false)? };
    for pin in leds {
        unsafe { gpio_set_level(pin, 0) };
    }
    info!("hw_init: LED outputs configured");
    Ok(())
}

/// Sensor data lines: open-drain, released (high) at rest.  The board
/// carries the external pull-ups; the internal ones are enabled as backup.
#[cfg(target_os = "espidf")]
unsafe fn init_open_drain() -> Result<(), HwInitError> {
    let lines = [
        pins::CH1_PROBE_GPIO,
        pins::CH2_PROBE_GPIO,
        pins::CH3_PROBE_GPIO,
        pins::BOARD_PROBE_GPIO,
        pins::DHT_DATA_GPIO,
    ];
    unsafe { configure_pins(&lines, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD, true)? };
    for pin in lines {
        unsafe { gpio_set_level(pin, 1) };
    }
    info!("hw_init: sensor buses configured (open-drain)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on an already-configured pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as an output during init; main-loop only.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

/// An open-drain GPIO configured by [`init_peripherals`], exposed through
/// the `embedded-hal` digital traits for the bit-banged sensor buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenDrainPin(pub i32);

impl embedded_hal::digital::ErrorType for OpenDrainPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for OpenDrainPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.0, true);
        Ok(())
    }
}

impl embedded_hal::digital::InputPin for OpenDrainPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.0))
    }
}

// ── LEDC PWM ─────────────────────────────────────────────────

pub const LEDC_CH_HEATER_1: u32 = 0;
pub const LEDC_CH_HEATER_2: u32 = 1;
pub const LEDC_CH_HEATER_3: u32 = 2;
pub const LEDC_CH_FAN: u32 = 3;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: heaters, Timer 1: fan.  Both 8-bit.
    for (timer_num, freq_hz) in [
        (ledc_timer_t_LEDC_TIMER_0, pins::HEATER_PWM_FREQ_HZ),
        (ledc_timer_t_LEDC_TIMER_1, pins::FAN_PWM_FREQ_HZ),
    ] {
        let timer = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
            freq_hz,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        check(unsafe { ledc_timer_config(&timer) }, HwInitError::LedcInitFailed)?;
    }

    let channels = [
        (LEDC_CH_HEATER_1, ledc_timer_t_LEDC_TIMER_0, pins::CH1_HEATER_GPIO),
        (LEDC_CH_HEATER_2, ledc_timer_t_LEDC_TIMER_0, pins::CH2_HEATER_GPIO),
        (LEDC_CH_HEATER_3, ledc_timer_t_LEDC_TIMER_0, pins::CH3_HEATER_GPIO),
        (LEDC_CH_FAN, ledc_timer_t_LEDC_TIMER_1, pins::FAN_PWM_GPIO),
    ];
    for (channel, timer_sel, gpio_num) in channels {
        let cfg = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel,
            gpio_num,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        check(unsafe { ledc_channel_config(&cfg) }, HwInitError::LedcInitFailed)?;
    }

    info!("hw_init: LEDC configured (heaters=CH0-2, fan=CH3)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); only the main
    // loop writes duty registers.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── UART ─────────────────────────────────────────────────────

pub const UART_RX_BUFFER: i32 = 256;

#[cfg(target_os = "espidf")]
unsafe fn init_uart(port: i32, route: Option<(i32, i32)>) -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::SERIAL_BAUD,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    check(unsafe { uart_param_config(port, &cfg) }, HwInitError::UartInitFailed)?;
    if let Some((tx, rx)) = route {
        check(unsafe { uart_set_pin(port, tx, rx, -1, -1) }, HwInitError::UartInitFailed)?;
    }
    check(
        unsafe { uart_driver_install(port, UART_RX_BUFFER, 0, 0, core::ptr::null_mut(), 0) },
        HwInitError::UartInitFailed,
    )?;
    info!("hw_init: UART{} at {} baud", port, pins::SERIAL_BAUD);
    Ok(())
}
