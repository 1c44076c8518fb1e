//! Fixed-width boolean vectors.
//!
//! Weekday masks, month masks, sensor type masks and per-rule option masks
//! are all small bit vectors.  On the wire each one is an array of 0/1
//! integers, index 0 first.

use serde_json::Value;

/// `N` booleans packed into a `u32`.  `N` must not exceed 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagSet<const N: usize> {
    bits: u32,
}

/// Monday = index 0 … Sunday = index 6.
pub type WeekMask = FlagSet<7>;
/// January = index 0 … December = index 11.
pub type MonthMask = FlagSet<12>;
/// Per-rule option bits (`cls` on the wire).
pub type OptionMask = FlagSet<4>;
/// Sensor type selector (`typ` on the wire).
pub type TypeMask = FlagSet<7>;

impl<const N: usize> FlagSet<N> {
    const MASK: u32 = if N >= 32 { u32::MAX } else { (1u32 << N) - 1 };

    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn all() -> Self {
        Self { bits: Self::MASK }
    }

    /// Build from a raw word; bits above `N` are dropped.
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            bits: bits & Self::MASK,
        }
    }

    pub const fn bits(self) -> u32 {
        self.bits
    }

    pub const fn len(self) -> usize {
        N
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Out-of-range indices read as `false`.
    pub const fn get(self, index: usize) -> bool {
        index < N && self.bits & (1 << index) != 0
    }

    /// Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= N {
            return;
        }
        if value {
            self.bits |= 1 << index;
        } else {
            self.bits &= !(1 << index);
        }
    }

    /// Lowest set index, if any.
    pub fn first_set(self) -> Option<usize> {
        (self.bits != 0).then(|| self.bits.trailing_zeros() as usize)
    }

    pub fn iter(self) -> impl Iterator<Item = bool> {
        (0..N).map(move |i| self.get(i))
    }

    /// Overwrite the leading bits from `values`; bits past the end of
    /// `values` keep their current value.
    pub fn merge(&mut self, values: &[bool]) {
        for (i, v) in values.iter().take(N).enumerate() {
            self.set(i, *v);
        }
    }

    /// Wire form: `[1,0,1,...]`.
    pub fn to_value(self) -> Value {
        Value::Array(self.iter().map(|b| Value::from(u8::from(b))).collect())
    }
}
