//! Typed, key-presence-aware access to one document object.
//!
//! Every getter returns `Ok(None)` when the key is absent, so callers can
//! implement merge semantics with a plain `if let Some(..)`.

use serde_json::{Map, Value};

use super::DecodeError;

pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// View `value` as an object; `what` names it in the error.
    pub fn of(value: &'a Value, what: &'static str) -> Result<Self, DecodeError> {
        value
            .as_object()
            .map(|map| Self { map })
            .ok_or(DecodeError::InvalidType(what))
    }

    pub fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn flag(&self, key: &'static str) -> Result<Option<bool>, DecodeError> {
        self.map.get(key).map(|v| as_flag(v, key)).transpose()
    }

    pub fn int<T: TryFrom<i64>>(&self, key: &'static str) -> Result<Option<T>, DecodeError> {
        self.map.get(key).map(|v| as_int(v, key)).transpose()
    }

    /// `null` reads as NaN.
    pub fn float(&self, key: &'static str) -> Result<Option<f32>, DecodeError> {
        self.map
            .get(key)
            .map(|v| match v {
                Value::Null => Ok(f32::NAN),
                Value::Number(_) => as_float(v, key),
                _ => Err(DecodeError::InvalidType(key)),
            })
            .transpose()
    }

    pub fn text<const N: usize>(
        &self,
        key: &'static str,
    ) -> Result<Option<heapless::String<N>>, DecodeError> {
        self.map.get(key).map(|v| as_text(v, key)).transpose()
    }

    pub fn object(&self, key: &'static str) -> Result<Option<Fields<'a>>, DecodeError> {
        self.map.get(key).map(|v| Fields::of(v, key)).transpose()
    }

    pub fn array(&self, key: &'static str) -> Result<Option<&'a [Value]>, DecodeError> {
        self.map
            .get(key)
            .map(|v| {
                v.as_array()
                    .map(Vec::as_slice)
                    .ok_or(DecodeError::InvalidType(key))
            })
            .transpose()
    }

    /// Array of 0/1 (or bool) leaves.
    pub fn flags(&self, key: &'static str) -> Result<Option<Vec<bool>>, DecodeError> {
        self.array(key)?
            .map(|items| items.iter().map(|v| as_flag(v, key)).collect())
            .transpose()
    }

    /// Parse every element of the array under `key` with `item`.
    pub fn list<T>(
        &self,
        key: &'static str,
        item: impl Fn(&Value) -> Result<T, DecodeError>,
    ) -> Result<Option<Vec<T>>, DecodeError> {
        self.array(key)?
            .map(|items| items.iter().map(&item).collect())
            .transpose()
    }
}

/// Booleans travel as 0/1 but plain `true`/`false` is accepted too.
pub(crate) fn as_flag(v: &Value, key: &'static str) -> Result<bool, DecodeError> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => n
            .as_f64()
            .map(|f| f != 0.0)
            .ok_or(DecodeError::InvalidType(key)),
        _ => Err(DecodeError::InvalidType(key)),
    }
}

pub(crate) fn as_int<T: TryFrom<i64>>(v: &Value, key: &'static str) -> Result<T, DecodeError> {
    let raw = match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => f as i64,
                _ => return Err(DecodeError::InvalidType(key)),
            },
        },
        _ => return Err(DecodeError::InvalidType(key)),
    };
    T::try_from(raw).map_err(|_| DecodeError::OutOfRange(key))
}

pub(crate) fn as_float(v: &Value, key: &'static str) -> Result<f32, DecodeError> {
    let f = v.as_f64().ok_or(DecodeError::InvalidType(key))? as f32;
    if f.is_finite() {
        Ok(f)
    } else {
        Err(DecodeError::OutOfRange(key))
    }
}

pub(crate) fn as_text<const N: usize>(
    v: &Value,
    key: &'static str,
) -> Result<heapless::String<N>, DecodeError> {
    let s = v.as_str().ok_or(DecodeError::InvalidType(key))?;
    heapless::String::try_from(s).map_err(|()| DecodeError::TooLong(key))
}
