//! The reliable-transmission layer: one socket, one exchange at a
//! time.
//!
//! A [`Transmission`] owns a UDP socket bound to the unspecified
//! address of the destination's family. It serializes and sends
//! messages, receives and parses answers under an exponential
//! timeout, retransmits unanswered Con requests, suppresses
//! duplicated acks, acknowledges inbound Con messages and follows
//! separate (delayed) responses. Correlation is split:
//! [`Transmission::request`] checks the message id, the
//! [`Client`](crate::Client) checks the token.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use log::debug;
use newt_msg::{Code, Id, Message, Registry, Type};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::msg_summary;
use crate::resolve;

/// Largest datagram we accept; RFC 7252's recommended message size
/// cap.
pub const MAX_DATAGRAM: usize = 1152;

pub(crate) type Dgram = tinyvec::ArrayVec<[u8; MAX_DATAGRAM]>;

/// Parameters of a single [`Transmission::receive`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Receive {
  /// Base timeout in seconds; the transmission's configured base when
  /// absent.
  pub timeout: Option<u64>,
  /// How many retransmissions preceded this receive; grows the
  /// effective timeout to `base ^ (retry_count + 1)`.
  pub retry_count: u32,
  /// Message id we expect to be answered. When set the read is a
  /// peek, and a matching id triggers a short drain receive to
  /// swallow a duplicated datagram.
  pub mid: Option<Id>,
}

/// A bound socket plus the retransmission policy read from a
/// [`Config`].
#[derive(Debug)]
pub struct Transmission {
  socket: UdpSocket,
  recv_timeout: u64,
  max_retransmit: u32,
  retransmit: bool,
}

impl Transmission {
  /// Bind a fresh socket on the unspecified address of `ip`'s family.
  pub fn new(ip: IpAddr, config: &Config) -> Result<Transmission> {
    let socket = match ip {
      | IpAddr::V4(_) => UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?,
      | IpAddr::V6(_) => UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0))?,
    };

    Ok(Transmission { socket,
                      recv_timeout: config.recv_timeout,
                      max_retransmit: config.max_retransmit,
                      retransmit: config.retransmit })
  }

  /// A transmission whose socket family matches `host`, plus the
  /// address to send to. Literal addresses bind directly; hostnames
  /// go through [`resolve::address`] first.
  pub fn from_host(host: &str, config: &Config) -> Result<(Transmission, IpAddr)> {
    let ip = match host.parse::<IpAddr>() {
      | Ok(ip) => ip,
      | Err(_) => resolve::address(host, config.prefer_ipv6)?,
    };

    Ok((Transmission::new(ip, config)?, ip))
  }

  /// The bound socket, mainly for inspecting its local address.
  pub fn socket(&self) -> &UdpSocket {
    &self.socket
  }

  /// Serialize and send `msg` to `addr`.
  pub fn send(&self, msg: &Message, addr: SocketAddr, registry: &Registry) -> Result<()> {
    let bytes = msg.try_into_bytes(registry)?;
    debug!("-> {} {}", addr, msg_summary(msg));
    self.socket.send_to(&bytes, addr)?;
    Ok(())
  }

  /// Receive and parse one datagram. Inbound Con messages are
  /// acknowledged (empty Ack, same id, peer token) before being
  /// returned.
  pub fn receive(&self, params: Receive, registry: &Registry) -> Result<(Message, SocketAddr)> {
    let base = params.timeout.unwrap_or(self.recv_timeout);
    let timeout = base.saturating_pow(params.retry_count + 1);

    let mut buf = [0u8; MAX_DATAGRAM];
    self.socket.set_read_timeout(Some(Duration::from_secs(timeout.max(1))))?;

    let peeking = params.mid.is_some();
    let (n, peer) = if peeking {
      self.socket.peek_from(&mut buf)
    } else {
      self.socket.recv_from(&mut buf)
    }.map_err(into_timeout)?;

    let dgram = buf[..n].iter().copied().collect::<Dgram>();
    let answer = Message::try_from_bytes(&dgram, registry)?;
    debug!("<- {} {}", peer, msg_summary(&answer));

    if params.mid == Some(answer.id) {
      // the datagram is known to be queued, so this drain returns at
      // once unless the peer duplicated it
      self.socket.set_read_timeout(Some(Duration::from_secs(1)))?;
      self.socket.recv_from(&mut buf).map_err(into_timeout)?;
    }

    if answer.ty == Type::Con {
      let mut ack = Message::new(Type::Ack, Code::EMPTY, answer.id);
      ack.token = answer.token;
      self.send(&ack, peer, registry)?;
    }

    Ok((answer, peer))
  }

  /// Send `msg`, retransmitting while timeouts last (Con only), and
  /// return the answering message. An empty `(0,0)` Ack is a promise
  /// of a separate response, which is awaited with a fixed 10 second
  /// timeout.
  pub fn request(&self, msg: &Message, addr: SocketAddr, registry: &Registry) -> Result<Message> {
    let retransmit = self.retransmit && msg.ty == Type::Con;
    let mut retry_count = 0u32;

    let answer = loop {
      self.send(msg, addr, registry)?;

      match self.receive(Receive { timeout: None,
                                   retry_count,
                                   mid: Some(msg.id) },
                         registry)
      {
        | Ok((answer, _)) => break answer,
        | Err(Error::Timeout) => {
          if !retransmit {
            return Err(Error::Timeout);
          }

          retry_count += 1;
          if retry_count > self.max_retransmit {
            return Err(Error::RetransmitsExceeded(self.max_retransmit));
          }
        },
        | Err(e) => return Err(e),
      }
    };

    if answer.id != msg.id {
      return Err(Error::MidMismatch { expected: msg.id,
                                      actual: answer.id });
    }

    if is_separate(&answer) {
      let (answer, _) = self.receive(Receive { timeout: Some(10),
                                               retry_count: 0,
                                               mid: Some(msg.id) },
                                     registry)?;
      return Ok(answer);
    }

    Ok(answer)
  }
}

/// An empty Ack with code `(0,0)` promises a delayed response.
fn is_separate(answer: &Message) -> bool {
  answer.ty == Type::Ack && answer.payload.0.is_empty() && answer.code == Code::EMPTY
}

fn into_timeout(e: std::io::Error) -> Error {
  match e.kind() {
    | std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => Error::Timeout,
    | _ => Error::Io(e),
  }
}
