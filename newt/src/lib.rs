//! A blocking client-side CoAP runtime.
//!
//! CoAP is an HTTP-like request/response protocol for constrained
//! devices, customarily carried over UDP. Because UDP gives no
//! delivery guarantee, the protocol layers its own reliability on
//! top: Con(firmable) messages are retransmitted until acknowledged,
//! message ids correlate a Con with its Ack, and tokens correlate a
//! request with its (possibly delayed) response.
//!
//! This crate drives that machinery from the client side:
//! * [`net::Transmission`] owns a socket and performs one exchange at
//!   a time: send, timeout, retransmit, duplicate suppression,
//!   auto-ack of inbound Con, separate-response follow-up.
//! * [`observe`] keeps an exchange open and streams server
//!   notifications (RFC 7641) to a callback until it cancels.
//! * [`Client`] composes logical requests on top of both, fragmenting
//!   oversized bodies block-wise (RFC 7959) in either direction.
//!
//! Message encoding and decoding live in [`newt_msg`].
//!
//! ```no_run
//! use newt::{Client, Config};
//!
//! let mut client = Client::new(Config::default());
//! let rep = client.get_by_uri("coap://coap.me/hello").unwrap();
//! println!("{}", String::from_utf8_lossy(&rep.payload.0));
//! ```

#![cfg_attr(not(test),
            deny(missing_debug_implementations,
                 unreachable_pub,
                 unsafe_code,
                 missing_copy_implementations))]
#![deny(missing_docs)]

/// The blocking client
pub mod client;
/// Exchange-level configuration
pub mod config;
/// Content-format names and numbers
pub mod content_format;
/// Error types
pub mod error;
/// CoRE Link Format documents
pub mod link;
/// Reliable message transmission over UDP
pub mod net;
/// Observe subscriptions
pub mod observe;
/// Hostname resolution
pub mod resolve;
/// `coap://` URI helpers
pub mod uri;

pub(crate) mod logging;

#[doc(inline)]
pub use client::Client;
#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use observe::ObserveAction;
