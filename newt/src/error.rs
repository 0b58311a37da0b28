use newt_msg::{BlockError, Id, MessageParseError, MessageToBytesError};

/// Alias for `Result<T, newt::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// An error encounterable while driving an exchange
#[derive(Debug)]
pub enum Error {
  /// Parsing an inbound datagram failed
  FromBytes(MessageParseError),
  /// Serializing an outbound message failed
  ToBytes(MessageToBytesError),
  /// A block descriptor violated a field invariant
  Block(BlockError),
  /// Some socket operation failed
  Io(std::io::Error),
  /// No datagram arrived within the receive timeout
  Timeout,
  /// A Con message was sent `max_retransmit + 1` times without an
  /// answer
  RetransmitsExceeded(u32),
  /// Hostname resolution produced no usable address
  HostNotFound(String),
  /// The answer's message id did not match the request's
  MidMismatch {
    /// The request's message id
    expected: Id,
    /// The answer's message id
    actual: Id,
  },
  /// The response's token did not match the request's
  TokenMismatch,
  /// A URI could not be understood
  InvalidUri(String),
  /// A link-format document or attribute could not be understood
  InvalidLink(String),
  /// A request argument failed validation
  InvalidArgument(&'static str),
}

impl From<MessageParseError> for Error {
  fn from(e: MessageParseError) -> Self {
    Error::FromBytes(e)
  }
}

impl From<MessageToBytesError> for Error {
  fn from(e: MessageToBytesError) -> Self {
    Error::ToBytes(e)
  }
}

impl From<BlockError> for Error {
  fn from(e: BlockError) -> Self {
    Error::Block(e)
  }
}

impl From<std::io::Error> for Error {
  fn from(e: std::io::Error) -> Self {
    Error::Io(e)
  }
}
