//! Low-level representation of CoAP messages.
//!
//! The most notable item in `newt_msg` is [`Message`]; a CoAP message
//! very close to the actual byte layout, with its options kept
//! decoded.
//!
//! ## Options
//! Option values are decoded through a [`Registry`] of option
//! descriptors. The registry ships with the standard option set
//! (uri-path, content-format, block1/2, observe, ..) and can be
//! extended at runtime with vendor options, so parsing and
//! serializing both take a `&Registry`:
//!
//! ```rust
//! use newt_msg::{registry, Code, Id, Message, Registry, Type, Value};
//!
//! let reg = Registry::core();
//!
//! let mut req = Message::new(Type::Con, Code::Get, Id(0x1234));
//! req.push(registry::URI_PATH, Value::String(".well-known".into()));
//! req.push(registry::URI_PATH, Value::String("core".into()));
//!
//! let bytes = req.try_into_bytes(&reg).unwrap();
//! let rep = Message::try_from_bytes(&bytes, &reg).unwrap();
//! assert_eq!(rep.get(registry::URI_PATH), req.get(registry::URI_PATH));
//! ```
//!
//! ## Blocks
//! [`Block`] packs and unpacks the Block1/Block2 option value and
//! slices message bodies into fixed-size chunks.

#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![deny(missing_docs)]

#[doc(hidden)]
pub mod block;
#[doc(hidden)]
pub mod from_bytes;
#[doc(hidden)]
pub mod msg;
#[doc(hidden)]
pub mod num;
#[doc(hidden)]
pub mod opt;
pub mod registry;
#[doc(hidden)]
pub mod to_bytes;

#[doc(inline)]
pub use block::{Block, BlockError};
#[doc(inline)]
pub use from_bytes::{MessageParseError, OptParseError};
#[doc(inline)]
pub use msg::{Code, Id, Message, Payload, Token, Type, Version};
#[doc(inline)]
pub use registry::{Registry, Value, ValueError, ValueKind};
#[doc(inline)]
pub use to_bytes::MessageToBytesError;
