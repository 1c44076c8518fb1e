//! Persistence & wire codec.
//!
//! The document is JSON with short, stable tags.  Encoding always emits the
//! full graph and finishes with a pass that rewrites every boolean leaf as
//! 0/1.  Decoding is key-presence driven: scalars absent from the document
//! keep their in-memory value, list-typed keys replace the whole collection.
//!
//! Decoding happens in two phases so a half-parsed document can never leak
//! into the live model:
//!
//! ```text
//!   bytes ──▶ Value ──▶ DevicePatch::parse ──(all validation)──▶ patch
//!                                                                 │
//!   live Device ◀──────────── DevicePatch::apply (moves only) ◀──┘
//! ```

mod encode;
mod patch;
pub(crate) mod reader;
pub mod path;

use core::fmt;

use serde_json::Value;

use crate::model::Device;

pub use encode::{encode_device, normalize_flags};
pub use patch::{DevicePatch, TemperaturePatch};
pub use path::{FieldPath, set_field, set_fields};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Bytes are not a JSON document.
    Syntax { line: usize, column: usize },
    /// The top-level value is not a device object (or array of them).
    NotAnObject,
    /// A tag holds a value of the wrong JSON type.
    InvalidType(&'static str),
    /// A text field exceeds its fixed capacity.
    TooLong(&'static str),
    /// A number or collection index is out of range.
    OutOfRange(&'static str),
    /// A field path names nothing the device has.
    UnknownField,
    /// A multi-field update matched no known field.
    NothingApplied,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { line, column } => {
                write!(f, "invalid JSON at line {line}, column {column}")
            }
            Self::NotAnObject => write!(f, "document is not a device object"),
            Self::InvalidType(key) => write!(f, "wrong type for '{key}'"),
            Self::TooLong(key) => write!(f, "text too long for '{key}'"),
            Self::OutOfRange(key) => write!(f, "value out of range for '{key}'"),
            Self::UnknownField => write!(f, "unknown field"),
            Self::NothingApplied => write!(f, "no fields updated"),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Syntax {
            line: e.line(),
            column: e.column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Single-device entry points
// ---------------------------------------------------------------------------

/// Merge `document` into `device`.  On error `device` is untouched.
pub fn decode(document: &Value, device: &mut Device) -> Result<(), DecodeError> {
    DevicePatch::parse(document)?.apply(device);
    Ok(())
}

/// Parse raw bytes into a document value.
pub fn parse_bytes(bytes: &[u8]) -> Result<Value, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Hydrate a fresh device from a stored profile document.
pub fn hydrate(document: &Value) -> Result<Device, DecodeError> {
    let mut device = Device {
        timers_repeat: true,
        ..Device::default()
    };
    decode(document, &mut device)?;
    device.clear_runtime();
    Ok(device)
}

// ---------------------------------------------------------------------------
// Multi-profile store document
// ---------------------------------------------------------------------------

/// Split a stored document into per-profile documents.
///
/// A single object is one profile; an array holds several.
pub fn split_profiles(document: Value) -> Result<Vec<Value>, DecodeError> {
    match document {
        Value::Object(_) => Ok(vec![document]),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            Ok(items)
        }
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Inverse of [`split_profiles`].
pub fn join_profiles(mut profiles: Vec<Value>) -> Value {
    if profiles.len() == 1 {
        profiles.swap_remove(0)
    } else {
        Value::Array(profiles)
    }
}

/// Index of the first profile flagged `isl`, or 0.
pub fn selected_index(profiles: &[Value]) -> usize {
    profiles
        .iter()
        .position(|p| p.get("isl").is_some_and(|v| reader::as_flag(v, "isl").unwrap_or(false)))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::factory::factory_device;
    use serde_json::json;

    #[test]
    fn factory_device_round_trips() {
        let device = factory_device();
        let doc = encode_device(&device);
        let back = hydrate(&doc).unwrap();
        assert_eq!(back, device);
    }

    #[test]
    fn encoded_booleans_are_integers() {
        let doc = encode_device(&factory_device());
        assert_eq!(doc["isl"], json!(1));
        assert_eq!(doc["rel"][0]["man"], json!(1));
        assert_eq!(doc["rel"][1]["man"], json!(0));
        assert_eq!(doc["tmp"]["use"], json!(0));
    }

    #[test]
    fn absent_scalar_keeps_current_value() {
        let mut device = factory_device();
        decode(&json!({"ite": 1}), &mut device).unwrap();
        assert!(device.timers_enabled);
        assert_eq!(device.name.as_str(), "MyDevice1");
        assert_eq!(device.relays.len(), 6);
    }

    #[test]
    fn present_list_replaces_collection() {
        let mut device = factory_device();
        decode(&json!({"rel": [{"id": 9, "pin": 4, "out": 1}]}), &mut device).unwrap();
        assert_eq!(device.relays.len(), 1);
        assert_eq!(device.relays[0].id, 9);
        assert!(device.relays[0].is_output);
    }

    #[test]
    fn malformed_document_leaves_device_untouched() {
        let mut device = factory_device();
        let before = device.clone();
        let err = decode(
            &json!({"nmd": "renamed", "rel": [{"id": 1, "pin": "x"}]}),
            &mut device,
        );
        assert_eq!(err, Err(DecodeError::InvalidType("pin")));
        assert_eq!(device, before);
    }

    #[test]
    fn syntax_errors_carry_position() {
        let err = parse_bytes(b"{\"nmd\": ").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { line: 1, .. }));
    }

    #[test]
    fn profiles_split_and_join() {
        let one = json!({"nmd": "a"});
        assert_eq!(split_profiles(one.clone()).unwrap().len(), 1);
        assert_eq!(join_profiles(vec![one.clone()]), one);

        let many = json!([{"nmd": "a"}, {"nmd": "b", "isl": 1}]);
        let profiles = split_profiles(many.clone()).unwrap();
        assert_eq!(selected_index(&profiles), 1);
        assert_eq!(join_profiles(profiles), many);

        assert_eq!(split_profiles(json!([])), Err(DecodeError::NotAnObject));
        assert_eq!(split_profiles(json!(3)), Err(DecodeError::NotAnObject));
    }
}
