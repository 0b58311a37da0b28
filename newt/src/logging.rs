use newt_msg::Message;

pub(crate) fn msg_summary(msg: &Message) -> String {
  format!("{:?} {:?} id {} token {} with {} byte payload",
          msg.ty,
          msg.code,
          msg.id.0,
          msg.token.ordinal(),
          msg.payload.0.len())
}
