//! PID controller and time-proportioning window.
//!
//! The temperature loop switches an on/off relay, so the PID output is an
//! on-time in milliseconds within a fixed window.  The relay is held on for
//! that long at the start of each window and off for the rest.

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: f32,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint,
            integral: 0.0,
            prev_error: 0.0,
            output_min: 0.0,
            output_max: 100.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
    }

    /// Replace the gains without touching accumulated state.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Compute the output for `measurement` after `dt` seconds.
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;
        let p = self.kp * error;

        self.integral += error * dt;
        let i = self.ki * self.integral;

        let derivative = if dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };
        let d = self.kd * derivative;
        self.prev_error = error;

        let output = (p + i + d).clamp(self.output_min, self.output_max);

        // Saturated: undo this step's integration.
        if output >= self.output_max || output <= self.output_min {
            self.integral -= error * dt;
        }

        output
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }
}

/// Fixed-length switching window.
#[derive(Debug, Clone, Copy)]
pub struct TimeProportioner {
    window_ms: u64,
    window_start_ms: u64,
}

impl TimeProportioner {
    pub fn new(window_ms: u32, now_ms: u64) -> Self {
        Self {
            window_ms: u64::from(window_ms.max(1)),
            window_start_ms: now_ms,
        }
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms as u32
    }

    /// Restart the window at `now_ms`.
    pub fn restart(&mut self, now_ms: u64) {
        self.window_start_ms = now_ms;
    }

    /// Whether the output should be on at `now_ms` for an on-time of
    /// `on_ms` per window.
    pub fn is_on(&mut self, on_ms: f32, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_sub(self.window_start_ms);
        if elapsed >= self.window_ms {
            // Skip whole windows when cycles were missed.
            self.window_start_ms += elapsed - elapsed % self.window_ms;
        }
        let into_window = now_ms.saturating_sub(self.window_start_ms);
        on_ms > into_window as f32
    }
}
