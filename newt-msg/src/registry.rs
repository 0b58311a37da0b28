//! The option registry: what each option number means and how its
//! values are coded.
//!
//! The registry is explicit state passed by reference into codec
//! calls. [`Registry::core`] builds the standard table; vendors
//! extend it at runtime with [`Registry::register`]. Callers mutating
//! a registry must not share it with an in-flight codec call.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::num::{o256_decode, o256_encode, vlb_decode, vlb_encode};

/// if-match
pub const IF_MATCH: u32 = 1;
/// uri-host
pub const URI_HOST: u32 = 3;
/// etag
pub const ETAG: u32 = 4;
/// if-none-match
pub const IF_NONE_MATCH: u32 = 5;
/// observe
pub const OBSERVE: u32 = 6;
/// uri-port
pub const URI_PORT: u32 = 7;
/// location-path
pub const LOCATION_PATH: u32 = 8;
/// uri-path
pub const URI_PATH: u32 = 11;
/// content-format
pub const CONTENT_FORMAT: u32 = 12;
/// max-age
pub const MAX_AGE: u32 = 14;
/// uri-query
pub const URI_QUERY: u32 = 15;
/// accept
pub const ACCEPT: u32 = 17;
/// token (the header token mirrored as an option by older stacks)
pub const TOKEN: u32 = 19;
/// location-query
pub const LOCATION_QUERY: u32 = 20;
/// block2
pub const BLOCK2: u32 = 23;
/// block1
pub const BLOCK1: u32 = 27;
/// size2
pub const SIZE2: u32 = 28;
/// proxy-uri
pub const PROXY_URI: u32 = 35;
/// proxy-scheme
pub const PROXY_SCHEME: u32 = 39;
/// size1
pub const SIZE1: u32 = 60;

/// How an option's raw bytes map to a typed value.
///
/// The original closure-per-option design is pinned down to this
/// fixed variant set; registering a new option picks one of these
/// codings rather than supplying functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
  /// The option carries no data; its presence is the value.
  Presence,
  /// Variable-length big-endian unsigned integer.
  Uint,
  /// Opaque bytes ranked via the one-plus-256 numeral system.
  Ordinal,
  /// Raw opaque bytes.
  Opaque,
  /// UTF-8 text.
  String,
}

/// A decoded option value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  /// See [`ValueKind::Presence`]
  Presence,
  /// See [`ValueKind::Uint`]
  Uint(u64),
  /// See [`ValueKind::Ordinal`]
  Ordinal(u128),
  /// See [`ValueKind::Opaque`]
  Opaque(Vec<u8>),
  /// See [`ValueKind::String`]
  String(String),
}

impl Value {
  /// The integer inside a `Uint`, if that is what this is.
  pub fn as_uint(&self) -> Option<u64> {
    match self {
      | Value::Uint(n) => Some(*n),
      | _ => None,
    }
  }

  /// The text inside a `String`, if that is what this is.
  pub fn as_str(&self) -> Option<&str> {
    match self {
      | Value::String(s) => Some(s),
      | _ => None,
    }
  }

  /// The bytes inside an `Opaque`, if that is what this is.
  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      | Value::Opaque(b) => Some(b),
      | _ => None,
    }
  }
}

/// Everything the codec needs to know about one option number.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
  /// Option number
  pub number: u32,
  /// Human-readable name, e.g. `"uri-path"`
  pub name: &'static str,
  /// Value coding
  pub kind: ValueKind,
  /// May the option occur more than once per message?
  pub repeatable: bool,
  /// Legal encoded byte length per value
  pub len: RangeInclusive<usize>,
  /// Value implied by the option's absence; equal values are elided
  /// from the wire
  pub default: Option<Value>,
}

/// An option value failed validation against its descriptor.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub enum ValueError {
  /// Value byte length outside the descriptor's range
  OutOfRange {
    /// Offending option number
    number: u32,
    /// Encoded byte length of the value
    len: usize,
    /// Lower bound of the legal range
    min: usize,
    /// Upper bound of the legal range
    max: usize,
  },
  /// A non-repeatable option occurred more than once
  Repeated {
    /// Offending option number
    number: u32,
  },
  /// A string-kind option held bytes that were not UTF-8
  InvalidUtf8 {
    /// Offending option number
    number: u32,
  },
  /// A value's variant does not match the descriptor's kind
  KindMismatch {
    /// Offending option number
    number: u32,
  },
}

/// The option table, keyed by number.
#[derive(Clone, Debug, Default)]
pub struct Registry {
  opts: BTreeMap<u32, Descriptor>,
}

// number, name, kind, repeatable, length range, default
#[rustfmt::skip]
const CORE_OPTIONS: [(u32, &str, ValueKind, bool, RangeInclusive<usize>, Option<Value>); 20] = [
  (IF_MATCH,       "if-match",       ValueKind::Ordinal,  true,  0..=8,    None),
  (URI_HOST,       "uri-host",       ValueKind::String,   false, 1..=255,  None),
  (ETAG,           "etag",           ValueKind::Ordinal,  true,  1..=8,    None),
  (IF_NONE_MATCH,  "if-none-match",  ValueKind::Presence, false, 0..=0,    None),
  (OBSERVE,        "observe",        ValueKind::Uint,     false, 0..=3,    None),
  (URI_PORT,       "uri-port",       ValueKind::Uint,     false, 0..=2,    None),
  (LOCATION_PATH,  "location-path",  ValueKind::String,   true,  0..=255,  None),
  (URI_PATH,       "uri-path",       ValueKind::String,   true,  0..=255,  None),
  (CONTENT_FORMAT, "content-format", ValueKind::Uint,     false, 0..=2,    None),
  (MAX_AGE,        "max-age",        ValueKind::Uint,     false, 0..=4,    Some(Value::Uint(60))),
  (URI_QUERY,      "uri-query",      ValueKind::String,   true,  0..=255,  None),
  (ACCEPT,         "accept",         ValueKind::Uint,     false, 0..=2,    None),
  (TOKEN,          "token",          ValueKind::Ordinal,  false, 1..=8,    Some(Value::Ordinal(0))),
  (LOCATION_QUERY, "location-query", ValueKind::String,   true,  0..=255,  None),
  (BLOCK2,         "block2",         ValueKind::Uint,     false, 0..=3,    None),
  (BLOCK1,         "block1",         ValueKind::Uint,     false, 0..=3,    None),
  (SIZE2,          "size2",          ValueKind::Uint,     false, 0..=4,    None),
  (PROXY_URI,      "proxy-uri",      ValueKind::String,   false, 1..=1034, None),
  (PROXY_SCHEME,   "proxy-scheme",   ValueKind::String,   false, 1..=255,  None),
  (SIZE1,          "size1",          ValueKind::Uint,     false, 0..=4,    None),
];

impl Registry {
  /// The standard option table.
  pub fn core() -> Self {
    let mut reg = Registry::default();
    for (number, name, kind, repeatable, len, default) in CORE_OPTIONS {
      reg.register(Descriptor { number,
                                name,
                                kind,
                                repeatable,
                                len,
                                default });
    }
    reg
  }

  /// Insert (or replace) a descriptor.
  pub fn register(&mut self, descriptor: Descriptor) {
    self.opts.insert(descriptor.number, descriptor);
  }

  /// Look an option up by number.
  pub fn get(&self, number: u32) -> Option<&Descriptor> {
    self.opts.get(&number)
  }

  /// Look an option up by name.
  pub fn by_name(&self, name: &str) -> Option<&Descriptor> {
    self.opts.values().find(|d| d.name == name)
  }

  /// The number registered under `name`.
  pub fn number_of(&self, name: &str) -> Option<u32> {
    self.by_name(name).map(|d| d.number)
  }

  /// Descriptors that declare a default value.
  pub fn defaults(&self) -> impl Iterator<Item = &Descriptor> {
    self.opts.values().filter(|d| d.default.is_some())
  }

  /// Decode the raw occurrences of option `number` into typed values,
  /// validating cardinality and per-value length.
  ///
  /// Unregistered numbers pass through as [`Value::Opaque`] with no
  /// validation at all; this includes unrecognized critical options,
  /// which are deliberately not rejected.
  pub fn decode(&self, number: u32, raw: &[Vec<u8>]) -> Result<Vec<Value>, ValueError> {
    let desc = match self.get(number) {
      | None => return Ok(raw.iter().map(|v| Value::Opaque(v.clone())).collect()),
      | Some(d) => d,
    };

    if !desc.repeatable && raw.len() > 1 {
      return Err(ValueError::Repeated { number });
    }

    raw.iter()
       .map(|v| {
         check_len(desc, v.len())?;
         match desc.kind {
           | ValueKind::Presence => Ok(Value::Presence),
           | ValueKind::Uint => Ok(Value::Uint(vlb_decode(v))),
           | ValueKind::Ordinal => Ok(Value::Ordinal(o256_decode(v))),
           | ValueKind::Opaque => Ok(Value::Opaque(v.clone())),
           | ValueKind::String => String::from_utf8(v.clone()).map(Value::String)
                                                              .map_err(|_| {
                                                                ValueError::InvalidUtf8 { number }
                                                              }),
         }
       })
       .collect()
  }

  /// Encode typed values of option `number` into raw wire values,
  /// validating cardinality, kind and encoded length. A single value
  /// equal to the descriptor's default encodes to nothing at all.
  pub fn encode(&self, number: u32, values: &[Value]) -> Result<Vec<Vec<u8>>, ValueError> {
    let desc = match self.get(number) {
      | None => {
        return values.iter()
                     .map(|v| match v {
                       | Value::Opaque(b) => Ok(b.clone()),
                       | _ => Err(ValueError::KindMismatch { number }),
                     })
                     .collect()
      },
      | Some(d) => d,
    };

    if let Some(default) = &desc.default {
      if values.len() == 1 && values[0] == *default {
        return Ok(vec![]);
      }
    }

    if !desc.repeatable && values.len() > 1 {
      return Err(ValueError::Repeated { number });
    }

    values.iter()
          .map(|v| {
            let raw = match (desc.kind, v) {
              | (ValueKind::Presence, Value::Presence) => vec![],
              | (ValueKind::Uint, Value::Uint(n)) => vlb_encode(*n),
              | (ValueKind::Ordinal, Value::Ordinal(n)) => o256_encode(*n),
              | (ValueKind::Opaque, Value::Opaque(b)) => b.clone(),
              | (ValueKind::String, Value::String(s)) => s.as_bytes().to_vec(),
              | _ => return Err(ValueError::KindMismatch { number }),
            };
            check_len(desc, raw.len())?;
            Ok(raw)
          })
          .collect()
  }
}

fn check_len(desc: &Descriptor, len: usize) -> Result<(), ValueError> {
  if desc.len.contains(&len) {
    Ok(())
  } else {
    Err(ValueError::OutOfRange { number: desc.number,
                                 len,
                                 min: *desc.len.start(),
                                 max: *desc.len.end() })
  }
}

/// Critical options must be understood by the receiver: odd numbers.
///
/// Exposed for option-handling policy; the codec itself stores
/// unrecognized critical options without rejecting the message.
pub fn is_critical(number: u32) -> bool {
  number & 1 == 1
}

/// Unsafe-to-forward options have bit 1 set.
pub fn is_unsafe(number: u32) -> bool {
  number & 2 == 2
}

/// NoCacheKey options match `xxx11100`.
pub fn is_no_cache_key(number: u32) -> bool {
  number & 0x1e == 0x1c
}
