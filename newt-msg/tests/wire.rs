use newt_msg::*;

fn known_good() -> (Message, Vec<u8>) {
  let bytes = [b"\x44\x02\x12\xA0abcd".as_slice(),
               b"\x41A".as_slice(),
               b"\x7B.well-known\x04core".as_slice(),
               b"\x0D\x04rhabarbersaftglas".as_slice(),
               b"\xFFfoobar".as_slice()].concat();

  let mut msg = Message::new(Type::Con, Code::Post, Id(0x12A0));
  msg.token = Token(b"abcd".iter().copied().collect());
  msg.set(registry::ETAG, Value::Ordinal(66));
  msg.push(registry::URI_PATH, Value::String(".well-known".into()));
  msg.push(registry::URI_PATH, Value::String("core".into()));
  msg.push(registry::URI_PATH, Value::String("rhabarbersaftglas".into()));
  msg.payload = Payload(b"foobar".to_vec());

  (msg, bytes)
}

#[test]
fn parses_known_good_request() {
  let reg = Registry::core();
  let (expected, bytes) = known_good();
  let msg = Message::try_from_bytes(&bytes, &reg).unwrap();

  assert_eq!(msg.ty, expected.ty);
  assert_eq!(msg.code, expected.code);
  assert_eq!(msg.id, expected.id);
  assert_eq!(msg.token, expected.token);
  assert_eq!(msg.get(registry::ETAG), Some([Value::Ordinal(66)].as_slice()));
  assert_eq!(msg.get(registry::URI_PATH), expected.get(registry::URI_PATH));
  assert_eq!(msg.payload, expected.payload);

  // registry defaults fill in on parse
  assert_eq!(msg.get_uint(registry::MAX_AGE), Some(60));
}

#[test]
fn serializes_known_good_request() {
  let reg = Registry::core();
  let (msg, bytes) = known_good();
  assert_eq!(msg.try_into_bytes(&reg).unwrap(), bytes);
}

#[test]
fn round_trips_known_good_request() {
  let reg = Registry::core();
  let (_, bytes) = known_good();
  let msg = Message::try_from_bytes(&bytes, &reg).unwrap();
  assert_eq!(msg.try_into_bytes(&reg).unwrap(), bytes);
}

#[test]
fn round_trips_every_encodable_option_number() {
  let reg = Registry::core();

  for number in 0u32..65536 {
    if reg.get(number).is_some() {
      continue;
    }

    let mut msg = Message::new(Type::Con, Code::Get, Id(1));
    msg.set(number, Value::Opaque(vec![]));

    let bytes = msg.try_into_bytes(&reg).unwrap();
    let rep = Message::try_from_bytes(&bytes, &reg).unwrap();
    assert_eq!(rep.get(number),
               Some([Value::Opaque(vec![])].as_slice()),
               "option number {}",
               number);
  }
}

#[test]
fn round_trips_every_encodable_option_length() {
  let reg = Registry::core();

  // 99 is unregistered, so any length passes validation
  for len in 0usize..=1034 {
    let mut msg = Message::new(Type::Con, Code::Get, Id(1));
    msg.set(99, Value::Opaque(vec![0xab; len]));

    let bytes = msg.try_into_bytes(&reg).unwrap();
    let rep = Message::try_from_bytes(&bytes, &reg).unwrap();
    assert_eq!(rep.get(99),
               Some([Value::Opaque(vec![0xab; len])].as_slice()),
               "option length {}",
               len);
  }
}

#[test]
fn block_options_carry_packed_blocks() {
  let reg = Registry::core();

  let block = Block::new(3, true, 128).unwrap();
  let mut msg = Message::new(Type::Con, Code::Put, Id(9));
  msg.set(registry::BLOCK1, Value::Uint(u64::from(block.value())));

  let rep = Message::try_from_bytes(msg.try_into_bytes(&reg).unwrap(), &reg).unwrap();
  let packed = rep.get_uint(registry::BLOCK1).unwrap();
  assert_eq!(Block::from_value(packed as u32), Ok(block));
}
