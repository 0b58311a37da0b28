//! Errors and helpers for serializing messages to wire bytes.

use tinyvec::ArrayVec;

use crate::registry::ValueError;

/// Errors encounterable serializing to bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub enum MessageToBytesError {
  /// An option value failed registry validation
  Value(ValueError),

  /// An option value was longer than the two-byte length extension
  /// can express (65804 bytes)
  OptionTooLong {
    /// Offending option number
    number: u32,
    /// Actual value length
    len: usize,
  },

  /// The gap to the previous option number was larger than the
  /// two-byte delta extension can express (65804)
  DeltaTooLarge {
    /// Offending option number
    number: u32,
  },
}

impl From<ValueError> for MessageToBytesError {
  fn from(e: ValueError) -> Self {
    MessageToBytesError::Value(e)
  }
}

/// Largest value a delta or length nibble plus two-byte extension can
/// carry.
pub(crate) const NIBBLE_MAX: u32 = 65_804;

/// Split a delta or length into its 4-bit nibble and extension bytes.
/// Inverse of `parse_opt_len_or_delta`; `val` must be `<= NIBBLE_MAX`.
pub(crate) fn opt_len_or_delta(val: u32) -> (u8, Option<ArrayVec<[u8; 2]>>) {
  match val {
    | n if n >= 269 => {
      let mut bytes = ArrayVec::new();
      bytes.extend(((n - 269) as u16).to_be_bytes());
      (14, Some(bytes))
    },
    | n if n >= 13 => {
      let mut bytes = ArrayVec::new();
      bytes.push((n - 13) as u8);
      (13, Some(bytes))
    },
    | n => (n as u8, None),
  }
}
