//! Errors and helpers for parsing messages from wire bytes.

use crate::registry::ValueError;

/// Errors encounterable while parsing an option from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub enum OptParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// A delta or length nibble was set to the reserved value 15
  ReservedNibble(u8),
}

/// Errors encounterable while parsing a message from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub enum MessageParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// Version bits were not 1; there is no other CoAP version
  UnknownVersion(u8),

  /// Token length nibble was > 8
  InvalidTokenLength(u8),

  /// Error parsing option
  OptParseError(OptParseError),

  /// An option value failed registry validation
  Value(ValueError),
}

impl From<OptParseError> for MessageParseError {
  fn from(e: OptParseError) -> Self {
    MessageParseError::OptParseError(e)
  }
}

impl From<ValueError> for MessageParseError {
  fn from(e: ValueError) -> Self {
    MessageParseError::Value(e)
  }
}

/// Resolve a 4-bit delta or length nibble against its extension
/// bytes: 0-12 literal, 13 means one byte holding `actual - 13`,
/// 14 means two big-endian bytes holding `actual - 269`, 15 is
/// reserved (`0xFF` was already split out as the payload marker).
pub(crate) fn parse_opt_len_or_delta(head: u8,
                                     bytes: &mut impl Iterator<Item = u8>)
                                     -> Result<u32, OptParseError> {
  match head {
    | 15 => Err(OptParseError::ReservedNibble(15)),
    | 13 => {
      let n = bytes.next().ok_or(OptParseError::UnexpectedEndOfStream)?;
      Ok(u32::from(n) + 13)
    },
    | 14 => {
      let hi = bytes.next().ok_or(OptParseError::UnexpectedEndOfStream)?;
      let lo = bytes.next().ok_or(OptParseError::UnexpectedEndOfStream)?;
      Ok(u32::from(u16::from_be_bytes([hi, lo])) + 269)
    },
    | n => Ok(u32::from(n)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn literal_nibble() {
    assert_eq!(parse_opt_len_or_delta(12, &mut std::iter::empty()), Ok(12));
  }

  #[test]
  fn one_byte_extension() {
    let mut bytes = [0u8].into_iter();
    assert_eq!(parse_opt_len_or_delta(13, &mut bytes), Ok(13));

    let mut bytes = [255u8].into_iter();
    assert_eq!(parse_opt_len_or_delta(13, &mut bytes), Ok(268));
  }

  #[test]
  fn two_byte_extension() {
    let mut bytes = [0u8, 0].into_iter();
    assert_eq!(parse_opt_len_or_delta(14, &mut bytes), Ok(269));

    let mut bytes = 12_076u16.to_be_bytes().into_iter();
    assert_eq!(parse_opt_len_or_delta(14, &mut bytes), Ok(12_345));

    let mut bytes = u16::MAX.to_be_bytes().into_iter();
    assert_eq!(parse_opt_len_or_delta(14, &mut bytes), Ok(65_804));
  }

  #[test]
  fn reserved_nibble() {
    assert_eq!(parse_opt_len_or_delta(15, &mut std::iter::empty()),
               Err(OptParseError::ReservedNibble(15)));
  }

  #[test]
  fn truncated_extension() {
    assert_eq!(parse_opt_len_or_delta(13, &mut std::iter::empty()),
               Err(OptParseError::UnexpectedEndOfStream));

    let mut bytes = [1u8].into_iter();
    assert_eq!(parse_opt_len_or_delta(14, &mut bytes),
               Err(OptParseError::UnexpectedEndOfStream));
  }
}
