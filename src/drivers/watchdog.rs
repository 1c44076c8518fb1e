//! Task Watchdog Timer (TWDT) guard for the control loop.
//!
//! A stalled loop leaves relays frozen in whatever state they were last
//! driven to, so the device resets instead.  The loop calls `feed()` once
//! per control cycle; the timeout is sized from the cycle length.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Never trip faster than this, whatever the cycle length.
pub const MIN_TIMEOUT_MS: u32 = 10_000;

/// Cycles the loop may miss before the watchdog fires.
const MISSED_CYCLES: u32 = 5;

/// Timeout for a loop running every `cycle_ms`.
pub fn timeout_for_cycle(cycle_ms: u32) -> u32 {
    cycle_ms.saturating_mul(MISSED_CYCLES).max(MIN_TIMEOUT_MS)
}

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT calls from the main task during startup.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    log::info!("Watchdog: subscribed ({} ms timeout)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }
                Self { timeout_ms, subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {} ms, no-op", timeout_ms);
            Self { timeout_ms }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the subscribed task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_scales_with_cycle_but_has_a_floor() {
        assert_eq!(timeout_for_cycle(1_000), MIN_TIMEOUT_MS);
        assert_eq!(timeout_for_cycle(5_000), 25_000);
        assert_eq!(timeout_for_cycle(u32::MAX), u32::MAX);
        assert_eq!(Watchdog::new(12_000).timeout_ms(), 12_000);
    }
}
