//! The CoAP message and its wire codec.

use std::collections::BTreeMap;

use tinyvec::ArrayVec;

use crate::from_bytes::MessageParseError;
use crate::num::{o256_decode, o256_encode};
use crate::opt::{parse_opts, Opt};
use crate::registry::{Registry, Value, TOKEN};
use crate::to_bytes::MessageToBytesError;

/// Message version; only version 1 exists.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(pub u8);

impl Default for Version {
  fn default() -> Self {
    Version(1)
  }
}

/// Indicates if this message is of type Confirmable (0),
/// Non-confirmable (1), Acknowledgement (2) or Reset (3).
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Type {
  /// Requires an Acknowledgement (or Reset) from the receiver.
  Con,
  /// Fire and forget; never retransmitted by the reliability layer.
  Non,
  /// Acknowledges a specific Con message by message id. May carry a
  /// piggybacked response.
  Ack,
  /// The receiver could not process a message (e.g. lost state).
  Reset,
}

impl Type {
  pub(crate) fn from_bits(b: u8) -> Type {
    match b & 0b11 {
      | 0 => Type::Con,
      | 1 => Type::Non,
      | 2 => Type::Ack,
      | _ => Type::Reset,
    }
  }

  pub(crate) fn bits(&self) -> u8 {
    match self {
      | Type::Con => 0,
      | Type::Non => 1,
      | Type::Ack => 2,
      | Type::Reset => 3,
    }
  }
}

/// Request method, or `class.detail` code for responses and empty
/// messages.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Code {
  /// GET (0.01)
  Get,
  /// POST (0.02)
  Post,
  /// PUT (0.03)
  Put,
  /// DELETE (0.04)
  Delete,
  /// Any other code as a `(class, detail)` pair; class is 3 bits,
  /// detail 5.
  Pair(u8, u8),
}

impl Code {
  /// `(0, 0)`, the code of Empty messages (and separate-response
  /// promises).
  pub const EMPTY: Code = Code::Pair(0, 0);

  /// Decode the code byte; method numbers become their symbolic
  /// variant, everything else falls back to the `(class, detail)`
  /// pair.
  pub fn from_byte(b: u8) -> Code {
    match b {
      | 1 => Code::Get,
      | 2 => Code::Post,
      | 3 => Code::Put,
      | 4 => Code::Delete,
      | b => Code::Pair(b >> 5, b & 0x1f),
    }
  }

  /// The wire byte: `class << 5 | detail`.
  pub fn byte(&self) -> u8 {
    match self {
      | Code::Get => 1,
      | Code::Post => 2,
      | Code::Put => 3,
      | Code::Delete => 4,
      | Code::Pair(class, detail) => (class & 0b111) << 5 | (detail & 0b11111),
    }
  }
}

/// 16-bit id correlating a Con message with its Ack/Reset, and used
/// for duplicate detection at the transport layer.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Id(pub u16);

/// 0-8 byte opaque value correlating a request with its (possibly
/// delayed) response, independently of [`Id`].
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// A token from its one-plus-256 ordinal; 0 is the empty token.
  pub fn from_ordinal(n: u128) -> Token {
    Token(o256_encode(n).into_iter().collect())
  }

  /// The one-plus-256 ordinal of this token's bytes.
  pub fn ordinal(&self) -> u128 {
    o256_decode(&self.0)
  }

  /// Is this the zero-length token?
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Message body bytes. Empty means no payload marker on the wire.
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct Payload(pub Vec<u8>);

/// A CoAP message.
///
/// Options are kept decoded, keyed by number; the [`BTreeMap`]
/// guarantees ascending emission order so relative deltas are never
/// negative. Unknown option numbers hold [`Value::Opaque`] entries.
#[derive(Clone, PartialEq, Debug)]
pub struct Message {
  /// Protocol version, always 1
  pub ver: Version,
  /// See [`Type`]
  pub ty: Type,
  /// See [`Code`]
  pub code: Code,
  /// See [`Id`]
  pub id: Id,
  /// See [`Token`]
  pub token: Token,
  /// Decoded options, keyed by option number
  pub opts: BTreeMap<u32, Vec<Value>>,
  /// See [`Payload`]
  pub payload: Payload,
}

impl Message {
  /// An empty-bodied, optionless, tokenless message.
  pub fn new(ty: Type, code: Code, id: Id) -> Message {
    Message { ver: Version::default(),
              ty,
              code,
              id,
              token: Token::default(),
              opts: BTreeMap::new(),
              payload: Payload::default() }
  }

  /// Replace all values of option `number` with a single value.
  pub fn set(&mut self, number: u32, value: Value) {
    self.opts.insert(number, vec![value]);
  }

  /// Append one more value to option `number` (repeatable options).
  pub fn push(&mut self, number: u32, value: Value) {
    self.opts.entry(number).or_default().push(value);
  }

  /// The values of option `number`, if present.
  pub fn get(&self, number: u32) -> Option<&[Value]> {
    self.opts.get(&number).map(Vec::as_slice)
  }

  /// The single `Uint` value of option `number`, if present.
  pub fn get_uint(&self, number: u32) -> Option<u64> {
    self.get(number).and_then(|vs| vs.first()).and_then(Value::as_uint)
  }

  /// Parse a message from its exact wire layout, validating options
  /// against `registry` and pre-filling registry defaults.
  pub fn try_from_bytes(bytes: impl AsRef<[u8]>,
                        registry: &Registry)
                        -> Result<Message, MessageParseError> {
    let mut bytes = bytes.as_ref().iter().copied();

    let b1 = bytes.next().ok_or(MessageParseError::UnexpectedEndOfStream)?;
    let ver = b1 >> 6;
    if ver != 1 {
      return Err(MessageParseError::UnknownVersion(ver));
    }
    let ty = Type::from_bits(b1 >> 4);
    let tkl = b1 & 0b1111;
    if tkl > 8 {
      return Err(MessageParseError::InvalidTokenLength(tkl));
    }

    let code = Code::from_byte(bytes.next().ok_or(MessageParseError::UnexpectedEndOfStream)?);
    let id_hi = bytes.next().ok_or(MessageParseError::UnexpectedEndOfStream)?;
    let id_lo = bytes.next().ok_or(MessageParseError::UnexpectedEndOfStream)?;
    let id = Id(u16::from_be_bytes([id_hi, id_lo]));

    let token = bytes.by_ref().take(tkl as usize).collect::<ArrayVec<[u8; 8]>>();
    if token.len() < tkl as usize {
      return Err(MessageParseError::UnexpectedEndOfStream);
    }

    let raw_opts = parse_opts(&mut bytes)?;
    let payload = Payload(bytes.collect());

    let mut grouped: BTreeMap<u32, Vec<Vec<u8>>> = BTreeMap::new();
    for opt in raw_opts {
      grouped.entry(opt.number).or_default().push(opt.value);
    }

    let mut opts: BTreeMap<u32, Vec<Value>> = BTreeMap::new();
    for desc in registry.defaults() {
      // the token is a header field here, not a phantom option
      if desc.number != TOKEN {
        if let Some(default) = &desc.default {
          opts.insert(desc.number, vec![default.clone()]);
        }
      }
    }
    for (number, raw) in grouped {
      opts.insert(number, registry.decode(number, &raw)?);
    }

    Ok(Message { ver: Version(ver),
                 ty,
                 code,
                 id,
                 token: Token(token),
                 opts,
                 payload })
  }

  /// Serialize to the exact wire layout, validating options against
  /// `registry`. Values equal to their registry default are elided.
  pub fn try_into_bytes(&self, registry: &Registry) -> Result<Vec<u8>, MessageToBytesError> {
    // validate and encode every option before emitting any bytes
    let mut prepared: Vec<Opt> = Vec::new();
    for (&number, values) in &self.opts {
      for value in registry.encode(number, values)? {
        prepared.push(Opt { number, value });
      }
    }

    let mut bytes = Vec::with_capacity(4 + self.token.0.len() + self.payload.0.len() + 16);

    bytes.push((self.ver.0 & 0b11) << 6 | self.ty.bits() << 4 | self.token.0.len() as u8);
    bytes.push(self.code.byte());
    bytes.extend(self.id.0.to_be_bytes());
    bytes.extend_from_slice(&self.token.0);

    let mut prev_number = 0u32;
    for opt in &prepared {
      opt.extend_bytes(prev_number, &mut bytes)?;
      prev_number = opt.number;
    }

    if !self.payload.0.is_empty() {
      bytes.push(0xff);
      bytes.extend_from_slice(&self.payload.0);
    }

    Ok(bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::registry;

  #[test]
  fn byte1_fields() {
    let reg = Registry::core();
    let msg = Message::try_from_bytes([0x60, 0x45, 0x00, 0x2a], &reg).unwrap();
    assert_eq!(msg.ty, Type::Ack);
    assert_eq!(msg.code, Code::Pair(2, 5));
    assert_eq!(msg.id, Id(42));
    assert!(msg.token.is_empty());
  }

  #[test]
  fn unknown_version_is_fatal() {
    let reg = Registry::core();
    assert_eq!(Message::try_from_bytes([0x84, 0x45, 0x00, 0x2a], &reg),
               Err(MessageParseError::UnknownVersion(2)));
  }

  #[test]
  fn token_length_is_capped() {
    let reg = Registry::core();
    assert_eq!(Message::try_from_bytes([0x49, 0x45, 0x00, 0x2a, 1, 2, 3, 4, 5, 6, 7, 8, 9], &reg),
               Err(MessageParseError::InvalidTokenLength(9)));
  }

  #[test]
  fn truncated_header_is_fatal() {
    let reg = Registry::core();
    assert_eq!(Message::try_from_bytes([0x40, 0x01], &reg),
               Err(MessageParseError::UnexpectedEndOfStream));
  }

  #[test]
  fn truncated_token_is_fatal() {
    let reg = Registry::core();
    assert_eq!(Message::try_from_bytes([0x42, 0x01, 0x00, 0x01, 0xaa], &reg),
               Err(MessageParseError::UnexpectedEndOfStream));
  }

  #[test]
  fn code_byte_round_trip() {
    assert_eq!(Code::from_byte(1), Code::Get);
    assert_eq!(Code::from_byte(0x45), Code::Pair(2, 5));
    assert_eq!(Code::Pair(2, 5).byte(), 0x45);
    assert_eq!(Code::EMPTY.byte(), 0);
    assert_eq!(Code::Delete.byte(), 4);
  }

  #[test]
  fn version_field_reaches_the_wire() {
    let reg = Registry::core();
    let mut msg = Message::new(Type::Con, Code::Get, Id(1));
    assert_eq!(msg.try_into_bytes(&reg).unwrap()[0] >> 6, 1);

    msg.ver = Version(0);
    assert_eq!(msg.try_into_bytes(&reg).unwrap()[0] >> 6, 0);
  }

  #[test]
  fn empty_payload_has_no_marker() {
    let reg = Registry::core();
    let msg = Message::new(Type::Con, Code::Get, Id(1));
    let bytes = msg.try_into_bytes(&reg).unwrap();
    assert_eq!(bytes, vec![0x40, 0x01, 0x00, 0x01]);
  }

  #[test]
  fn payload_marker_precedes_payload() {
    let reg = Registry::core();
    let mut msg = Message::new(Type::Con, Code::Get, Id(1));
    msg.payload = Payload(b"hi".to_vec());
    let bytes = msg.try_into_bytes(&reg).unwrap();
    assert_eq!(bytes, vec![0x40, 0x01, 0x00, 0x01, 0xff, b'h', b'i']);
  }

  #[test]
  fn defaults_prefill_on_parse() {
    let reg = Registry::core();
    let msg = Message::new(Type::Con, Code::Get, Id(7));
    let parsed = Message::try_from_bytes(msg.try_into_bytes(&reg).unwrap(), &reg).unwrap();
    assert_eq!(parsed.get_uint(registry::MAX_AGE), Some(60));
    // the token default stays out of the option map
    assert_eq!(parsed.get(registry::TOKEN), None);
  }

  #[test]
  fn default_valued_option_elided_from_wire() {
    let reg = Registry::core();
    let mut with = Message::new(Type::Con, Code::Get, Id(7));
    with.set(registry::MAX_AGE, Value::Uint(60));
    let without = Message::new(Type::Con, Code::Get, Id(7));

    assert_eq!(with.try_into_bytes(&reg).unwrap(), without.try_into_bytes(&reg).unwrap());
  }

  #[test]
  fn repeated_values_serialize_with_zero_delta() {
    let reg = Registry::core();
    let mut msg = Message::new(Type::Con, Code::Get, Id(7));
    msg.push(registry::URI_PATH, Value::String("a".into()));
    msg.push(registry::URI_PATH, Value::String("b".into()));

    let bytes = msg.try_into_bytes(&reg).unwrap();
    assert_eq!(&bytes[4..], &[0xb1, b'a', 0x01, b'b']);
  }

  #[test]
  fn token_round_trips_through_header() {
    let reg = Registry::core();
    let mut msg = Message::new(Type::Con, Code::Post, Id(0x1234));
    msg.token = Token::from_ordinal(0xdead_beef);

    let parsed = Message::try_from_bytes(msg.try_into_bytes(&reg).unwrap(), &reg).unwrap();
    assert_eq!(parsed.token, msg.token);
    assert_eq!(parsed.token.ordinal(), 0xdead_beef);
  }

  #[test]
  fn cardinality_violation_fails_encode() {
    let reg = Registry::core();
    let mut msg = Message::new(Type::Con, Code::Get, Id(7));
    msg.push(registry::OBSERVE, Value::Uint(0));
    msg.push(registry::OBSERVE, Value::Uint(1));

    assert_eq!(msg.try_into_bytes(&reg),
               Err(MessageToBytesError::Value(registry::ValueError::Repeated {
                 number: registry::OBSERVE,
               })));
  }
}
