//! Raw options as they sit on the wire.
//!
//! An [`Opt`] stores the absolute option number, already resolved
//! from the delta encoding. Deltas are recomputed against the
//! previous option's number at serialization time, which is why
//! options must be emitted in ascending number order.

use crate::from_bytes::{parse_opt_len_or_delta, OptParseError};
use crate::to_bytes::{opt_len_or_delta, MessageToBytesError, NIBBLE_MAX};

/// A single option occurrence: absolute number plus raw value bytes.
///
/// One registered option may occur several times in a message
/// (repeatable options); each occurrence is its own `Opt`.
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Opt {
  /// Absolute option number
  pub number: u32,
  /// Raw value bytes, uninterpreted
  pub value: Vec<u8>,
}

/// Consume options from `bytes` until the payload marker (`0xFF`) or
/// the end of the stream, accumulating deltas into absolute numbers.
pub(crate) fn parse_opts(bytes: &mut impl Iterator<Item = u8>) -> Result<Vec<Opt>, OptParseError> {
  let mut opts = Vec::new();
  let mut number = 0u32;

  loop {
    let header = match bytes.next() {
      // 0xFF is the payload marker; the options are done either way
      | Some(0xff) | None => return Ok(opts),
      | Some(b) => b,
    };

    let delta = parse_opt_len_or_delta(header >> 4, bytes)?;
    let len = parse_opt_len_or_delta(header & 0x0f, bytes)?;
    number += delta;

    let value = bytes.take(len as usize).collect::<Vec<u8>>();
    if value.len() < len as usize {
      return Err(OptParseError::UnexpectedEndOfStream);
    }

    opts.push(Opt { number, value });
  }
}

impl Opt {
  /// Append this option's wire bytes, encoding the number as a delta
  /// against `prev_number` (the previously emitted option's number,
  /// or 0 for the first option).
  pub(crate) fn extend_bytes(&self,
                             prev_number: u32,
                             bytes: &mut Vec<u8>)
                             -> Result<(), MessageToBytesError> {
    let delta = self.number - prev_number;
    if delta > NIBBLE_MAX {
      return Err(MessageToBytesError::DeltaTooLarge { number: self.number });
    }
    if self.value.len() > NIBBLE_MAX as usize {
      return Err(MessageToBytesError::OptionTooLong { number: self.number,
                                                      len: self.value.len() });
    }

    let (del, del_bytes) = opt_len_or_delta(delta);
    let (len, len_bytes) = opt_len_or_delta(self.value.len() as u32);

    bytes.push(del << 4 | len);

    if let Some(bs) = del_bytes {
      bytes.extend(bs);
    }

    if let Some(bs) = len_bytes {
      bytes.extend(bs);
    }

    bytes.extend_from_slice(&self.value);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_opt() {
    let bytes: [u8; 2] = [0b0000_0001, 0b0000_0001];
    let opts = parse_opts(&mut bytes.into_iter()).unwrap();
    assert_eq!(opts, vec![Opt { number: 0, value: vec![1] }]);
  }

  #[test]
  fn parse_accumulates_deltas() {
    let bytes: [u8; 5] = [0b0001_0001, 0b0000_0001, 0b0010_0001, 0b0000_0011, 0xff];
    let opts = parse_opts(&mut bytes.into_iter()).unwrap();
    assert_eq!(opts,
               vec![Opt { number: 1, value: vec![1] },
                    Opt { number: 3, value: vec![3] }]);
  }

  #[test]
  fn parse_stops_at_payload_marker() {
    let bytes: [u8; 3] = [0xff, 0x61, 0x62];
    let mut iter = bytes.into_iter();
    assert_eq!(parse_opts(&mut iter).unwrap(), vec![]);
    // the marker is consumed, the payload is not
    assert_eq!(iter.collect::<Vec<_>>(), vec![0x61, 0x62]);
  }

  #[test]
  fn parse_truncated_value() {
    let bytes: [u8; 2] = [0b0000_0011, 0x61];
    assert_eq!(parse_opts(&mut bytes.into_iter()),
               Err(OptParseError::UnexpectedEndOfStream));
  }

  #[test]
  fn parse_reserved_delta_nibble() {
    // 0xF0 is delta nibble 15 with length 0; only the full byte 0xFF
    // is legal (as the payload marker)
    let bytes: [u8; 1] = [0xf0];
    assert_eq!(parse_opts(&mut bytes.into_iter()),
               Err(OptParseError::ReservedNibble(15)));
  }

  #[test]
  fn extend_bytes_uses_extensions() {
    let opt = Opt { number: 285, value: b"x".to_vec() };
    let mut bytes = Vec::new();
    opt.extend_bytes(0, &mut bytes).unwrap();
    assert_eq!(bytes, vec![0xe1, 0x00, 0x10, b'x']);

    let reparsed = parse_opts(&mut bytes.into_iter()).unwrap();
    assert_eq!(reparsed, vec![opt]);
  }

  #[test]
  fn extend_bytes_delta_is_relative() {
    let opt = Opt { number: 11, value: vec![] };
    let mut bytes = Vec::new();
    opt.extend_bytes(4, &mut bytes).unwrap();
    assert_eq!(bytes, vec![0x70]);
  }
}
