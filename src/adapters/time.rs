//! System clock adapter.
//!
//! - **`target_os = "espidf"`**: monotonic uptime from `esp_timer_get_time()`,
//!   wall clock from `gettimeofday` + `localtime_r` (set by SNTP elsewhere).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and chrono's
//!   local time, for host-side runs.
//!
//! Until the wall clock reaches `min_year` it is treated as unsynchronised
//! and [`ClockPort::now`] returns `None`.

use chrono::{Datelike, NaiveDateTime};

use crate::app::ports::ClockPort;

pub struct SystemClock {
    min_year: i32,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl SystemClock {
    pub fn new(min_year: i32) -> Self {
        Self {
            min_year,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn wall_clock(&self) -> Option<NaiveDateTime> {
        use chrono::{NaiveDate, NaiveTime};
        use core::ptr;

        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        let date = NaiveDate::from_ymd_opt(tm.tm_year + 1900, (tm.tm_mon + 1) as u32, tm.tm_mday as u32)?;
        let time = NaiveTime::from_hms_opt(tm.tm_hour as u32, tm.tm_min as u32, tm.tm_sec as u32)?;
        Some(date.and_time(time))
    }

    #[cfg(not(target_os = "espidf"))]
    fn wall_clock(&self) -> Option<NaiveDateTime> {
        Some(chrono::Local::now().naive_local())
    }
}

/// `at`, unless it predates `min_year`.
pub fn synced(at: Option<NaiveDateTime>, min_year: i32) -> Option<NaiveDateTime> {
    at.filter(|t| t.year() >= min_year)
}

impl ClockPort for SystemClock {
    fn now(&self) -> Option<NaiveDateTime> {
        synced(self.wall_clock(), self.min_year)
    }

    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
