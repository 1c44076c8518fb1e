//! Single-field updates addressed by a short path.
//!
//! ```text
//!   ite            device flag
//!   tmp.use        temperature block field
//!   act[2].use     field of the third action
//! ```
//!
//! Indices here are positions in the UI's list view, not record ids.

use serde_json::Value;

use super::DecodeError;
use super::reader::{as_flag, as_float, as_int, as_text};
use crate::model::Device;

/// A parsed `collection[index].field` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath<'a> {
    pub collection: &'a str,
    pub index: Option<usize>,
    pub field: Option<&'a str>,
}

impl<'a> FieldPath<'a> {
    pub fn parse(path: &'a str) -> Result<Self, DecodeError> {
        let (head, field) = match path.split_once('.') {
            Some((h, f)) if !f.is_empty() => (h, Some(f)),
            Some(_) => return Err(DecodeError::UnknownField),
            None => (path, None),
        };
        let (collection, index) = match head.split_once('[') {
            Some((name, rest)) => {
                let digits = rest.strip_suffix(']').ok_or(DecodeError::UnknownField)?;
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| DecodeError::OutOfRange("index"))?;
                (name, Some(index))
            }
            None => (head, None),
        };
        if collection.is_empty() {
            return Err(DecodeError::UnknownField);
        }
        Ok(Self {
            collection,
            index,
            field,
        })
    }
}

fn item<T>(items: &mut [T], index: Option<usize>) -> Result<&mut T, DecodeError> {
    let i = index.ok_or(DecodeError::UnknownField)?;
    items.get_mut(i).ok_or(DecodeError::OutOfRange("index"))
}

/// Apply one field update.  On error nothing changed.
pub fn set_field(device: &mut Device, path: &str, value: &Value) -> Result<(), DecodeError> {
    let p = FieldPath::parse(path)?;
    match (p.collection, p.index, p.field) {
        ("nmd", None, None) => device.name = as_text(value, "nmd")?,
        ("isl", None, None) => device.selected = as_flag(value, "isl")?,
        ("ite", None, None) => device.timers_enabled = as_flag(value, "ite")?,
        ("iet", None, None) => device.timers_repeat = as_flag(value, "iet")?,
        ("ise", None, None) => device.schedules_enabled = as_flag(value, "ise")?,
        ("iae", None, None) => device.actions_enabled = as_flag(value, "iae")?,

        ("tmp", None, Some("use")) => device.temperature.enabled = as_flag(value, "use")?,
        ("tmp", None, Some("stT")) => device.temperature.target = as_float(value, "stT")?,
        ("tmp", None, Some("spi")) => device.temperature.pid_index = as_int(value, "spi")?,

        ("act", i, Some("use")) => {
            let enabled = as_flag(value, "use")?;
            item(&mut device.actions, i)?.enabled = enabled;
        }
        ("act", i, Some("dsc")) => {
            let label = as_text(value, "dsc")?;
            item(&mut device.actions, i)?.label = label;
        }

        ("tmr", i, Some("use")) => {
            let enabled = as_flag(value, "use")?;
            let timer = item(&mut device.timers, i)?;
            if enabled && !timer.enabled {
                timer.rearm();
            }
            timer.enabled = enabled;
        }
        ("tmr", i, Some("tim")) => {
            let duration = as_text(value, "tim")?;
            let timer = item(&mut device.timers, i)?;
            timer.duration = duration;
            timer.rearm();
        }

        ("sch", i, Some("use")) => {
            let enabled = as_flag(value, "use")?;
            item(&mut device.schedules, i)?.enabled = enabled;
        }
        ("sen", i, Some("use")) => {
            let enabled = as_flag(value, "use")?;
            item(&mut device.sensors, i)?.enabled = enabled;
        }

        ("rel", i, Some("man")) => {
            let manual = as_flag(value, "man")?;
            item(&mut device.relays, i)?.manual = manual;
        }
        ("rel", i, Some("stp")) => {
            let state = as_flag(value, "stp")?;
            item(&mut device.relays, i)?.state = state;
        }
        ("rel", i, Some("dsc")) => {
            let label = as_text(value, "dsc")?;
            item(&mut device.relays, i)?.label = label;
        }

        ("pid", i, Some(gain @ ("Kp" | "Ki" | "Kd"))) => {
            let g = as_float(value, "K")?;
            let profile = item(&mut device.pids, i)?;
            match gain {
                "Kp" => profile.kp = g,
                "Ki" => profile.ki = g,
                _ => profile.kd = g,
            }
        }

        _ => return Err(DecodeError::UnknownField),
    }
    Ok(())
}

/// Apply every `path: value` pair of `updates`, skipping the ones that fail.
///
/// Returns how many were applied; zero is an error.
pub fn set_fields(device: &mut Device, updates: &Value) -> Result<usize, DecodeError> {
    let map = updates.as_object().ok_or(DecodeError::NotAnObject)?;
    let applied = map
        .iter()
        .filter(|(path, value)| match set_field(device, path, value) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("set_fields: skipping '{}': {}", path, e);
                false
            }
        })
        .count();
    if applied == 0 {
        return Err(DecodeError::NothingApplied);
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::factory::factory_device;
    use serde_json::json;

    #[test]
    fn parses_all_path_shapes() {
        assert_eq!(
            FieldPath::parse("ite").unwrap(),
            FieldPath {
                collection: "ite",
                index: None,
                field: None
            }
        );
        let p = FieldPath::parse("act[12].dsc").unwrap();
        assert_eq!((p.collection, p.index, p.field), ("act", Some(12), Some("dsc")));
        let p = FieldPath::parse("tmp.use").unwrap();
        assert_eq!((p.index, p.field), (None, Some("use")));
        assert!(FieldPath::parse("act[x].use").is_err());
        assert!(FieldPath::parse("act[1.use").is_err());
        assert!(FieldPath::parse("tmp.").is_err());
    }

    #[test]
    fn sets_flags_and_indexed_fields() {
        let mut d = factory_device();
        set_field(&mut d, "iae", &json!(1)).unwrap();
        set_field(&mut d, "rel[1].stp", &json!(true)).unwrap();
        set_field(&mut d, "pid[2].Ki", &json!(0.7)).unwrap();
        assert!(d.actions_enabled);
        assert!(d.relays[1].state);
        assert!((d.pids[2].ki - 0.7).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_index_is_rejected_without_change() {
        let mut d = factory_device();
        let before = d.clone();
        assert_eq!(
            set_field(&mut d, "act[5].use", &json!(0)),
            Err(DecodeError::OutOfRange("index"))
        );
        assert_eq!(d, before);
    }

    #[test]
    fn enabling_a_timer_rearms_it() {
        let mut d = factory_device();
        d.timers[0].enabled = false;
        d.timers[0].progress.stopped = true;
        set_field(&mut d, "tmr[0].use", &json!(1)).unwrap();
        assert!(d.timers[0].is_armed());
    }

    #[test]
    fn batch_update_skips_bad_keys() {
        let mut d = factory_device();
        let n = set_fields(&mut d, &json!({"ite": 1, "bogus": 1, "sch[9].use": 1})).unwrap();
        assert_eq!(n, 1);
        assert!(d.timers_enabled);
        assert_eq!(
            set_fields(&mut d, &json!({"bogus": 1})),
            Err(DecodeError::NothingApplied)
        );
    }
}
