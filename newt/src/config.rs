/// Knobs read once at exchange construction time.
///
/// There is no global state; every [`Transmission`](crate::net::Transmission)
/// and [`Client`](crate::Client) copies the values it needs out of the
/// config it was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Config {
  /// Base receive timeout in whole seconds.
  ///
  /// The timeout for retry `n` is `recv_timeout ^ (n + 1)`, so the
  /// base also steers retransmission backoff.
  ///
  /// ```
  /// use newt::config::Config;
  ///
  /// assert_eq!(Config::default().recv_timeout, 2);
  /// ```
  pub recv_timeout: u64,
  /// Number of times we are allowed to resend an unacked Con request
  /// before erroring.
  ///
  /// ```
  /// use newt::config::Config;
  ///
  /// assert_eq!(Config::default().max_retransmit, 4);
  /// ```
  pub max_retransmit: u32,
  /// Whether Con requests are retransmitted at all.
  pub retransmit: bool,
  /// Prefer IPv6 addresses when a hostname resolves to both families.
  pub prefer_ipv6: bool,
  /// Largest request/response body carried in a single message;
  /// bigger bodies go block-wise, chunked at the largest legal block
  /// size (a power of two in `16..=1024`) not exceeding this value.
  ///
  /// ```
  /// use newt::config::Config;
  ///
  /// assert_eq!(Config::default().max_payload, 256);
  /// ```
  pub max_payload: usize,
  /// Send requests as Non instead of Con.
  pub non_confirmable: bool,
  /// Attach a random token to each request. Turning this off sends
  /// tokenless requests, which makes response correlation mid-only.
  pub token: bool,
}

impl Default for Config {
  fn default() -> Self {
    Config { recv_timeout: 2,
             max_retransmit: 4,
             retransmit: true,
             prefer_ipv6: true,
             max_payload: 256,
             non_confirmable: false,
             token: true }
  }
}
