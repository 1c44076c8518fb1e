//! Peripheral bring-up and raw pin helpers.
//!
//! Relay and sensor pins come from the device document, so nothing here is
//! wired to a fixed board layout: pins are configured lazily the first time
//! a driver touches them.  `init_peripherals()` only creates the shared ADC
//! unit and the LEDC timer, once, from `main()`.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC timer config failed (rc={})", rc),
        }
    }
}

/// LEDC channels available for PWM relays.
pub const LEDC_CHANNELS: u8 = 8;
/// Relay PWM carrier.
pub const PWM_FREQ_HZ: u32 = 1_000;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop starts.
    unsafe {
        init_adc()?;
        init_ledc_timer()?;
    }
    info!("hw_init: ADC1 + LEDC timer ready");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

/// ADC1 channel wired to `gpio` on the ESP32.  ADC2 is unusable while
/// WiFi is up, so only ADC1 pins qualify.
pub fn adc1_channel(gpio: u8) -> Option<u32> {
    match gpio {
        36 => Some(0),
        37 => Some(1),
        38 => Some(2),
        39 => Some(3),
        32 => Some(4),
        33 => Some(5),
        34 => Some(6),
        35 => Some(7),
        _ => None,
    }
}

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// Bitmask of ADC1 channels already configured.
#[cfg(target_os = "espidf")]
static ADC1_CONFIGURED: core::sync::atomic::AtomicU8 = core::sync::atomic::AtomicU8::new(0);

/// SAFETY: ADC1_HANDLE is written once in `init_adc()` before the control
/// loop starts and only read afterwards.
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
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    Ok(())
}

/// One 12-bit sample from `gpio`, configuring its channel on first use.
#[cfg(target_os = "espidf")]
pub fn adc_read(gpio: u8) -> Option<u16> {
    use core::sync::atomic::Ordering;

    let channel = adc1_channel(gpio)?;
    // SAFETY: adc1_handle() contract; single control task.
    let handle = unsafe { adc1_handle() };
    if handle.is_null() {
        return None;
    }
    let bit = 1u8 << channel;
    if ADC1_CONFIGURED.load(Ordering::Relaxed) & bit == 0 {
        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            log::warn!("ADC1 CH{} (GPIO{}) config failed: {}", channel, gpio, ret);
            return None;
        }
        ADC1_CONFIGURED.fetch_or(bit, Ordering::Relaxed);
    }
    let mut raw: i32 = 0;
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.clamp(0, 4095) as u16)
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn gpio_configure(gpio: u8, mode: gpio_mode_t, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << gpio,
        mode,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: gpio_config only touches the pin named in the mask.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    Ok(())
}

/// Configure `gpio` as a push-pull output, driven low.
#[cfg(target_os = "espidf")]
pub fn configure_output(gpio: u8) -> Result<(), HwInitError> {
    gpio_configure(gpio, gpio_mode_t_GPIO_MODE_OUTPUT, false)?;
    gpio_write(gpio, false);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_output(_gpio: u8) -> Result<(), HwInitError> {
    Ok(())
}

/// Configure `gpio` as an input with the internal pull-up.
#[cfg(target_os = "espidf")]
pub fn configure_input(gpio: u8) -> Result<(), HwInitError> {
    gpio_configure(gpio, gpio_mode_t_GPIO_MODE_INPUT, true)
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_input(_gpio: u8) -> Result<(), HwInitError> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(gpio: u8) -> bool {
    // SAFETY: register read on a configured pin.
    (unsafe { gpio_get_level(gpio as i32) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(gpio: u8, high: bool) {
    // SAFETY: register write on a pin configured by configure_output().
    unsafe { gpio_set_level(gpio as i32, u32::from(high)); }
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc_timer() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    Ok(())
}

/// Route LEDC `channel` to `gpio`, starting at duty 0.
#[cfg(target_os = "espidf")]
pub fn ledc_attach(channel: u8, gpio: u8) -> Result<(), HwInitError> {
    // SAFETY: channel < LEDC_CHANNELS, timer 0 configured at boot.
    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: u32::from(channel),
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: i32::from(gpio),
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_attach(_channel: u8, _gpio: u8) -> Result<(), HwInitError> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u8, duty: u8) {
    // SAFETY: duty register writes come from the control task only.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, u32::from(channel), u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, u32::from(channel));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u8, _duty: u8) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_adc1_pins_have_channels() {
        assert_eq!(adc1_channel(33), Some(5));
        assert_eq!(adc1_channel(36), Some(0));
        assert_eq!(adc1_channel(25), None, "ADC2 pin");
        assert_eq!(adc1_channel(23), None);
    }
}
