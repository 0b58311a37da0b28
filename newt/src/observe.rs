//! The observe (RFC 7641) notification loop.
//!
//! Notifications arrive on the same exchange that registered the
//! observation. Freshness is judged with the lollipop sequence number
//! rule so reordered and wrapped-around notifications are told apart;
//! stale notifications are dropped without reaching the callback.

use std::net::SocketAddr;

use log::error;
use newt_msg::{registry, Message, Registry};

use crate::error::{Error, Result};
use crate::net::{Receive, Transmission};

/// Half the observe sequence number space, `2^23`. Distances shorter
/// than this count forward, longer ones count as wrap-around.
pub const MAX_OBSERVE_VALUE: u64 = 8_388_608;

/// What the notification callback wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveAction {
  /// Keep the subscription and wait for the next notification.
  Continue,
  /// End the loop; dropping the transmission closes the socket, which
  /// is the only unsubscription this design has.
  Cancel,
}

/// Is `new` a fresher sequence number than `old`?
fn fresh(old: u64, new: u64) -> bool {
  if new > old {
    new - old < MAX_OBSERVE_VALUE
  } else if new < old {
    old - new > MAX_OBSERVE_VALUE
  } else {
    false
  }
}

/// Drive an observe subscription until the callback cancels it.
///
/// `first` is the registration response that carried the initial
/// observe value; it is delivered to the callback unconditionally.
/// After that the loop receives on `transmission` with a 60 second
/// timeout (timeouts are logged and survived), acknowledges Con
/// notifications, drops datagrams without an observe option, and
/// hands fresh notifications to the callback.
pub fn observe(first: &Message,
               peer: SocketAddr,
               transmission: &Transmission,
               registry: &Registry,
               mut callback: impl FnMut(&Message, SocketAddr) -> ObserveAction)
               -> Result<()> {
  let mut last = first.get_uint(registry::OBSERVE).unwrap_or(0);

  if callback(first, peer) == ObserveAction::Cancel {
    return Ok(());
  }

  loop {
    let (msg, peer) = match transmission.receive(Receive { timeout: Some(60),
                                                           retry_count: 0,
                                                           mid: None },
                                                 registry)
    {
      | Ok(received) => received,
      | Err(Error::Timeout) => {
        error!("observe receive timed out");
        continue;
      },
      | Err(e) => return Err(e),
    };

    let n = match msg.get_uint(registry::OBSERVE) {
      | Some(n) => n,
      | None => continue,
    };

    if fresh(last, n) {
      if callback(&msg, peer) == ObserveAction::Cancel {
        return Ok(());
      }
      last = n;
    }
  }
}
