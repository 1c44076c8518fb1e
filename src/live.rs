//! Live-data slices and the change tracker that decides which to push.
//!
//! A poller keeps one [`ChangeTracker`].  Each poll recomputes the four
//! [`ChangeHashes`] and re-serializes only the slices whose hash moved
//! since the last payload.  The static block is always included.

use core::str::FromStr;

use chrono::NaiveDateTime;
use serde_json::{Map, Value, json};

use crate::checksum::ChangeHashes;
use crate::codec::normalize_flags;
use crate::model::Device;
use crate::pins;

/// Observable slice of the active device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    Relays,
    Sensors,
    Timers,
    Flags,
    Static,
}

impl SliceKind {
    /// Key the slice is published under in a combined payload.
    pub const fn update_key(self) -> &'static str {
        match self {
            Self::Relays => "relays_update",
            Self::Sensors => "sensors_update",
            Self::Timers => "timers_update",
            Self::Flags => "settings_update",
            Self::Static => "static_info",
        }
    }
}

impl FromStr for SliceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relays" => Ok(Self::Relays),
            "sensors" => Ok(Self::Sensors),
            "timers" => Ok(Self::Timers),
            "flags" => Ok(Self::Flags),
            "static" => Ok(Self::Static),
            _ => Err(()),
        }
    }
}

/// Process-level facts for the static block.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticInfo {
    pub uptime_ms: u64,
    pub now: Option<NaiveDateTime>,
}

/// NaN readings go out as `null`.
fn reading(v: f32) -> Value {
    if v.is_finite() { json!(v) } else { Value::Null }
}

pub fn serialize_slice(device: &Device, kind: SliceKind, info: &StaticInfo) -> Value {
    let mut out = match kind {
        SliceKind::Relays => json!({
            "rel": device.output_relays().map(|r| json!({
                "id": r.id,
                "dsc": r.label.as_str(),
                "stp": r.state,
                "man": r.manual,
            })).collect::<Vec<_>>()
        }),
        SliceKind::Sensors => json!({
            "sen": device.sensors.iter().filter(|s| s.enabled).map(|s| json!({
                "id": s.id,
                "cv": reading(s.current_value),
                "hv": reading(s.humidity_value),
            })).collect::<Vec<_>>()
        }),
        SliceKind::Timers => json!({
            "tmr": device.timers.iter().enumerate().map(|(i, t)| json!({
                "i": i,
                "e": t.enabled,
                "et": t.progress.elapsed_ms,
                "rt": t.progress.remaining_ms,
                "r": t.progress.running,
                "s": t.progress.stopped,
            })).collect::<Vec<_>>()
        }),
        SliceKind::Flags => json!({
            "ite": device.timers_enabled,
            "iet": device.timers_repeat,
            "ise": device.schedules_enabled,
            "iae": device.actions_enabled,
            "tmp_use": device.temperature.enabled,
        }),
        SliceKind::Static => json!({
            "uptime": info.uptime_ms / 1000,
            "dateTime": info
                .now
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            "name": device.name.as_str(),
            "firmware": env!("CARGO_PKG_VERSION"),
            "device": pins::BOARD,
        }),
    };
    normalize_flags(&mut out);
    out
}

/// Last hashes sent to one poller.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    sent: Option<ChangeHashes>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the next payload.  `force` (and the first call) sends every
    /// slice; timers are only sent while timers are enabled.
    pub fn poll(&mut self, device: &Device, info: &StaticInfo, force: bool) -> Value {
        let now = ChangeHashes::compute(device);
        let last = if force { None } else { self.sent };
        let changed = |pick: fn(&ChangeHashes) -> u32| last.is_none_or(|l| pick(&l) != pick(&now));

        let mut payload = Map::new();
        let mut push = |kind: SliceKind| {
            payload.insert(
                kind.update_key().into(),
                serialize_slice(device, kind, info),
            );
        };
        if changed(|h| h.relays) {
            push(SliceKind::Relays);
        }
        if changed(|h| h.sensors) {
            push(SliceKind::Sensors);
        }
        let mut timers_sent = false;
        if device.timers_enabled && changed(|h| h.timers) {
            push(SliceKind::Timers);
            timers_sent = true;
        }
        if changed(|h| h.flags) {
            push(SliceKind::Flags);
        }
        push(SliceKind::Static);

        // An unsent timer slice keeps its old hash so it goes out once
        // timers are switched back on.
        let timers = match (timers_sent, self.sent) {
            (false, Some(prev)) => prev.timers,
            (false, None) => now.timers.wrapping_add(1),
            (true, _) => now.timers,
        };
        self.sent = Some(ChangeHashes { timers, ..now });
        Value::Object(payload)
    }
}
