//! The blocking client: one logical request per call, block-wise
//! transfer and observe wired in.

use std::net::SocketAddr;

use log::debug;
use newt_msg::{registry, Block, Code, Id, Message, Payload, Registry, Token, Type, Value};
use rand::Rng;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::msg_summary;
use crate::net::Transmission;
use crate::observe::{self, ObserveAction};
use crate::uri;

/// A blocking CoAP client.
///
/// The target host and port are sticky: set them once with
/// [`Client::target`] (or implicitly through a `*_by_uri` call) and
/// every following request goes there until they change. Each request
/// constructs its own [`Transmission`] and socket, so a `Client` is
/// cheap and holds no connection state between calls.
///
/// ```no_run
/// use newt::{Client, Config};
///
/// let mut client = Client::new(Config::default());
/// client.target("coap.me", 5683);
/// let rep = client.get("/hello").unwrap();
/// println!("{:?}", rep.payload);
/// ```
#[derive(Debug)]
pub struct Client {
  host: Option<String>,
  port: u16,
  config: Config,
  registry: Registry,
}

impl Client {
  /// A client with no target yet. The maximum single-message body
  /// size comes from [`Config::max_payload`].
  pub fn new(config: Config) -> Client {
    Client { host: None,
             port: uri::PORT,
             config,
             registry: Registry::core() }
  }

  /// Point all following requests at `host:port`.
  pub fn target(&mut self, host: impl Into<String>, port: u16) -> &mut Self {
    self.host = Some(host.into());
    self.port = port;
    self
  }

  /// The option registry used for all codec calls, for registering
  /// vendor options.
  pub fn registry_mut(&mut self) -> &mut Registry {
    &mut self.registry
  }

  /// GET `path` (which may carry a `?query`) from the current target.
  pub fn get(&mut self, path: &str) -> Result<Message> {
    self.request_with(Code::Get, path, None, &[])
  }

  /// POST `payload` to `path` on the current target.
  pub fn post(&mut self, path: &str, payload: &[u8]) -> Result<Message> {
    self.request_with(Code::Post, path, Some(payload), &[])
  }

  /// PUT `payload` to `path` on the current target.
  pub fn put(&mut self, path: &str, payload: &[u8]) -> Result<Message> {
    self.request_with(Code::Put, path, Some(payload), &[])
  }

  /// DELETE `path` on the current target.
  pub fn delete(&mut self, path: &str) -> Result<Message> {
    self.request_with(Code::Delete, path, None, &[])
  }

  /// GET by full `coap://` URI; retargets the client.
  pub fn get_by_uri(&mut self, uri: &str) -> Result<Message> {
    let path = self.retarget(uri)?;
    self.get(&path)
  }

  /// POST by full `coap://` URI; retargets the client.
  pub fn post_by_uri(&mut self, uri: &str, payload: &[u8]) -> Result<Message> {
    let path = self.retarget(uri)?;
    self.post(&path, payload)
  }

  /// PUT by full `coap://` URI; retargets the client.
  pub fn put_by_uri(&mut self, uri: &str, payload: &[u8]) -> Result<Message> {
    let path = self.retarget(uri)?;
    self.put(&path, payload)
  }

  /// DELETE by full `coap://` URI; retargets the client.
  pub fn delete_by_uri(&mut self, uri: &str) -> Result<Message> {
    let path = self.retarget(uri)?;
    self.delete(&path)
  }

  /// Register an observation on `path` and feed notifications to
  /// `callback` until it returns [`ObserveAction::Cancel`]. The
  /// registration response is returned after the loop ends; if the
  /// server ignored the observe option the callback is never invoked
  /// and the response comes back immediately.
  pub fn observe(&mut self,
                 path: &str,
                 callback: impl FnMut(&Message, SocketAddr) -> ObserveAction)
                 -> Result<Message> {
    let extra = [(registry::OBSERVE, Value::Uint(0))];
    let (transmission, peer, _, response) = self.exchange(Code::Get, path, None, &extra)?;

    if response.get_uint(registry::OBSERVE).is_some() {
      observe::observe(&response, peer, &transmission, &self.registry, callback)?;
    }

    Ok(response)
  }

  /// Observe by full `coap://` URI; retargets the client.
  pub fn observe_by_uri(&mut self,
                        uri: &str,
                        callback: impl FnMut(&Message, SocketAddr) -> ObserveAction)
                        -> Result<Message> {
    let path = self.retarget(uri)?;
    self.observe(&path, callback)
  }

  /// One logical request with full control over method, body and
  /// extra options. Bodies larger than the configured maximum go
  /// block-wise, as do oversized response bodies.
  pub fn request_with(&mut self,
                      code: Code,
                      path: &str,
                      payload: Option<&[u8]>,
                      extra: &[(u32, Value)])
                      -> Result<Message> {
    self.exchange(code, path, payload, extra)
        .map(|(_, _, _, response)| response)
  }

  fn retarget(&mut self, uri: &str) -> Result<String> {
    let (host, port, path) = uri::scheme_and_authority_decode(uri)?;
    debug!("URI decoded: host {} port {} path {:?}", host, port, path);
    self.target(host, port);
    path.ok_or(Error::InvalidArgument("path"))
  }

  fn exchange(&mut self,
              code: Code,
              path: &str,
              payload: Option<&[u8]>,
              extra: &[(u32, Value)])
              -> Result<(Transmission, SocketAddr, Message, Message)> {
    let host = self.host.clone().ok_or(Error::InvalidArgument("host"))?;
    if path.is_empty() {
      return Err(Error::InvalidArgument("path"));
    }
    if payload.map(<[u8]>::is_empty) == Some(true) {
      return Err(Error::InvalidArgument("payload"));
    }

    let (path, query) = match path.split_once('?') {
      | Some((p, q)) => (p, Some(q)),
      | None => (path, None),
    };

    let (transmission, ip) = Transmission::from_host(&host, &self.config)?;
    let peer = SocketAddr::new(ip, self.port);

    let szx = block_size(self.config.max_payload);

    let (request, mut response) = match payload {
      | Some(body) if body.len() > self.config.max_payload => {
        self.upload(code, path, query, extra, body, szx, &transmission, peer)?
      },
      | _ => {
        let mut msg = self.make_message(code, path, query, payload)?;
        apply_extra(&mut msg, extra);

        debug!("sending {}", msg_summary(&msg));
        let rep = transmission.request(&msg, peer, &self.registry)?;
        debug!("received {}", msg_summary(&rep));

        check_token(&msg, &rep)?;
        (msg, rep)
      },
    };

    self.download_rest(code, path, query, extra, &transmission, peer, &mut response)?;

    Ok((transmission, peer, request, response))
  }

  /// Send an oversized body as a sequence of Block1 exchanges, one
  /// chunk per message, each with a fresh mid and token.
  #[allow(clippy::too_many_arguments)]
  fn upload(&self,
            code: Code,
            path: &str,
            query: Option<&str>,
            extra: &[(u32, Value)],
            body: &[u8],
            szx: u16,
            transmission: &Transmission,
            peer: SocketAddr)
            -> Result<(Message, Message)> {
    let chunks = Block::chunkify(body, szx);

    let mut num = 0u32;
    loop {
      let more = (num as usize) < chunks.len() - 1;
      let block1 = Block::new(num, more, szx)?;

      let mut msg = self.make_message(code, path, query, Some(chunks[num as usize]))?;
      msg.set(registry::BLOCK1, Value::Uint(u64::from(block1.value())));
      apply_extra(&mut msg, extra);

      debug!("sending block {} of {}: {}", num + 1, chunks.len(), msg_summary(&msg));
      let rep = transmission.request(&msg, peer, &self.registry)?;
      check_token(&msg, &rep)?;

      if !more {
        return Ok((msg, rep));
      }
      num += 1;
    }
  }

  /// Follow Block2 continuations until the body is complete,
  /// accumulating payloads into `response`.
  #[allow(clippy::too_many_arguments)]
  fn download_rest(&self,
                   code: Code,
                   path: &str,
                   query: Option<&str>,
                   extra: &[(u32, Value)],
                   transmission: &Transmission,
                   peer: SocketAddr,
                   response: &mut Message)
                   -> Result<()> {
    let packed = match response.get_uint(registry::BLOCK2) {
      | Some(packed) => packed,
      | None => return Ok(()),
    };
    let mut block2 = Block::from_value(packed as u32)?;

    while block2.more() {
      let next = Block::new(block2.num() + 1, false, block2.size())?;

      let mut msg = self.make_message(code, path, query, None)?;
      msg.set(registry::BLOCK2, Value::Uint(u64::from(next.value())));
      apply_extra(&mut msg, extra);

      debug!("fetching block {}: {}", next.num(), msg_summary(&msg));
      let rep = transmission.request(&msg, peer, &self.registry)?;
      check_token(&msg, &rep)?;

      response.payload.0.extend_from_slice(&rep.payload.0);
      block2 = Block::from_value(rep.get_uint(registry::BLOCK2).unwrap_or(0) as u32)?;
    }

    Ok(())
  }

  fn make_message(&self,
                  code: Code,
                  path: &str,
                  query: Option<&str>,
                  payload: Option<&[u8]>)
                  -> Result<Message> {
    let mut rng = rand::thread_rng();

    let ty = if self.config.non_confirmable {
      Type::Non
    } else {
      Type::Con
    };

    let mut msg = Message::new(ty, code, Id(rng.gen()));
    if self.config.token {
      msg.token = Token::from_ordinal(u128::from(rng.gen::<u32>()));
    }

    for seg in uri::path_decode(path)? {
      msg.push(registry::URI_PATH, Value::String(seg));
    }
    if let Some(q) = query {
      for el in uri::query_decode(&format!("?{}", q))? {
        msg.push(registry::URI_QUERY, Value::String(el));
      }
    }
    if let Some(p) = payload {
      msg.payload = Payload(p.to_vec());
    }

    Ok(msg)
  }
}

/// The largest legal block size not exceeding `max_payload`, so the
/// declared size and the actual chunk length always agree.
fn block_size(max_payload: usize) -> u16 {
  let clamped = max_payload.clamp(16, 1024) as u32;
  (1u32 << (31 - clamped.leading_zeros())) as u16
}

fn apply_extra(msg: &mut Message, extra: &[(u32, Value)]) {
  for (number, value) in extra {
    msg.push(*number, value.clone());
  }
}

fn check_token(request: &Message, response: &Message) -> Result<()> {
  if response.token == request.token {
    Ok(())
  } else {
    Err(Error::TokenMismatch)
  }
}

#[cfg(test)]
mod tests {
  use std::net::{Ipv4Addr, UdpSocket};
  use std::thread;
  use std::thread::JoinHandle;

  use super::*;
  use crate::net::MAX_DATAGRAM;

  fn fast_client() -> Client {
    Client::new(Config { recv_timeout: 1,
                         max_retransmit: 1,
                         ..Config::default() })
  }

  fn spawn_server(turns: usize,
                  mut respond: impl FnMut(&Message) -> Message + Send + 'static)
                  -> (SocketAddr, JoinHandle<Vec<Message>>) {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let addr = socket.local_addr().unwrap();

    let handle = thread::spawn(move || {
      let reg = Registry::core();
      let mut seen = Vec::new();
      let mut buf = [0u8; MAX_DATAGRAM];

      for _ in 0..turns {
        let (n, peer) = socket.recv_from(&mut buf).unwrap();
        let req = Message::try_from_bytes(&buf[..n], &reg).unwrap();
        let rep = respond(&req);
        socket.send_to(&rep.try_into_bytes(&reg).unwrap(), peer).unwrap();
        seen.push(req);
      }

      seen
    });

    (addr, handle)
  }

  fn piggyback(req: &Message, payload: &[u8]) -> Message {
    let mut rep = Message::new(Type::Ack, Code::Pair(2, 5), req.id);
    rep.token = req.token;
    rep.payload = Payload(payload.to_vec());
    rep
  }

  #[test]
  fn get_round_trip() {
    let (addr, handle) = spawn_server(1, |req| piggyback(req, b"hi there"));

    let mut client = fast_client();
    client.target("127.0.0.1", addr.port());

    let rep = client.get("/hello?who=you").unwrap();
    assert_eq!(rep.payload.0, b"hi there");

    let seen = handle.join().unwrap();
    assert_eq!(seen[0].code, Code::Get);
    assert_eq!(seen[0].get(registry::URI_PATH),
               Some([Value::String("hello".into())].as_slice()));
    assert_eq!(seen[0].get(registry::URI_QUERY),
               Some([Value::String("who=you".into())].as_slice()));
  }

  #[test]
  fn response_with_wrong_token_is_rejected() {
    let (addr, handle) = spawn_server(1, |req| {
      let mut rep = piggyback(req, b"evil");
      rep.token = Token::from_ordinal(u128::from(req.token.ordinal()) + 1);
      rep
    });

    let mut client = fast_client();
    client.target("127.0.0.1", addr.port());

    assert!(matches!(client.get("/x"), Err(Error::TokenMismatch)));
    handle.join().unwrap();
  }

  #[test]
  fn missing_target_is_an_error() {
    let mut client = fast_client();
    assert!(matches!(client.get("/x"), Err(Error::InvalidArgument("host"))));
  }

  #[test]
  fn empty_payload_is_an_error() {
    let mut client = fast_client();
    client.target("127.0.0.1", 5683);
    assert!(matches!(client.post("/x", b""), Err(Error::InvalidArgument("payload"))));
  }

  #[test]
  fn by_uri_retargets() {
    let (addr, handle) = spawn_server(1, |req| piggyback(req, b"ok"));

    let mut client = fast_client();
    let uri = format!("coap://127.0.0.1:{}/stats", addr.port());
    let rep = client.get_by_uri(&uri).unwrap();
    assert_eq!(rep.payload.0, b"ok");
    handle.join().unwrap();
  }

  #[test]
  fn large_body_uploads_block_wise() {
    let body = vec![0x5a_u8; 600];

    let (addr, handle) = spawn_server(3, |req| piggyback(req, b""));

    let mut client = fast_client();
    client.target("127.0.0.1", addr.port());
    client.put("/upload", &body).unwrap();

    let seen = handle.join().unwrap();
    let blocks = seen.iter()
                     .map(|req| Block::from_value(req.get_uint(registry::BLOCK1).unwrap() as u32).unwrap())
                     .collect::<Vec<_>>();

    assert_eq!(blocks.iter().map(Block::num).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(blocks.iter().map(Block::more).collect::<Vec<_>>(), vec![true, true, false]);

    let reassembled = seen.iter()
                          .flat_map(|req| req.payload.0.iter().copied())
                          .collect::<Vec<_>>();
    assert_eq!(reassembled, body);
  }

  #[test]
  fn odd_payload_cap_chunks_at_declared_block_size() {
    let body = vec![0xa5_u8; 300];

    let (addr, handle) = spawn_server(3, |req| piggyback(req, b""));

    let mut client = Client::new(Config { recv_timeout: 1,
                                          max_retransmit: 1,
                                          max_payload: 200,
                                          ..Config::default() });
    client.target("127.0.0.1", addr.port());
    client.put("/upload", &body).unwrap();

    let seen = handle.join().unwrap();
    for req in &seen {
      let block = Block::from_value(req.get_uint(registry::BLOCK1).unwrap() as u32).unwrap();
      assert_eq!(block.size(), 128);
    }
    assert_eq!(seen.iter().map(|req| req.payload.0.len()).collect::<Vec<_>>(),
               vec![128, 128, 44]);
  }

  #[test]
  fn large_response_downloads_block_wise() {
    let body: Vec<u8> = (0..600u32).map(|i| i as u8).collect();
    let chunks: Vec<Vec<u8>> = body.chunks(256).map(<[u8]>::to_vec).collect();

    let (addr, handle) = spawn_server(3, move |req| {
      let num = match req.get_uint(registry::BLOCK2) {
        | Some(packed) => Block::from_value(packed as u32).unwrap().num(),
        | None => 0,
      };
      let block2 = Block::new(num, (num as usize) < chunks.len() - 1, 256).unwrap();
      let mut rep = piggyback(req, &chunks[num as usize]);
      rep.set(registry::BLOCK2, Value::Uint(u64::from(block2.value())));
      rep
    });

    let mut client = fast_client();
    client.target("127.0.0.1", addr.port());

    let rep = client.get("/big").unwrap();
    assert_eq!(rep.payload.0, body);
    handle.join().unwrap();
  }

  #[test]
  fn observe_delivers_until_cancelled() {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let addr = socket.local_addr().unwrap();

    let handle = thread::spawn(move || {
      let reg = Registry::core();
      let mut buf = [0u8; MAX_DATAGRAM];
      let (n, peer) = socket.recv_from(&mut buf).unwrap();
      let req = Message::try_from_bytes(&buf[..n], &reg).unwrap();

      let mut rep = piggyback(&req, b"state 0");
      rep.set(registry::OBSERVE, Value::Uint(0));
      socket.send_to(&rep.try_into_bytes(&reg).unwrap(), peer).unwrap();

      for seq in 1..=2u64 {
        let mut note = Message::new(Type::Non, Code::Pair(2, 5), Id(100 + seq as u16));
        note.token = req.token;
        note.set(registry::OBSERVE, Value::Uint(seq));
        note.payload = Payload(format!("state {}", seq).into_bytes());
        socket.send_to(&note.try_into_bytes(&reg).unwrap(), peer).unwrap();
      }
    });

    let mut client = fast_client();
    client.target("127.0.0.1", addr.port());

    let mut states = Vec::new();
    client.observe("/sensor", |msg, _| {
            states.push(String::from_utf8_lossy(&msg.payload.0).into_owned());
            if states.len() == 3 {
              ObserveAction::Cancel
            } else {
              ObserveAction::Continue
            }
          })
          .unwrap();

    assert_eq!(states, vec!["state 0", "state 1", "state 2"]);
    handle.join().unwrap();
  }
}
