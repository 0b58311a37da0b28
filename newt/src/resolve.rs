//! Hostname resolution with a configurable IPv6 preference.

use std::net::{IpAddr, ToSocketAddrs};

use crate::error::{Error, Result};

/// Resolve `host` to a single address, preferring IPv6 addresses over
/// IPv4 when `prefer_ipv6` is set; otherwise the resolver's first
/// answer wins. An empty answer is a [`Error::HostNotFound`].
pub fn address(host: &str, prefer_ipv6: bool) -> Result<IpAddr> {
  let addrs = (host, 0u16).to_socket_addrs()
                          .map_err(|_| Error::HostNotFound(host.to_string()))?
                          .map(|sa| sa.ip())
                          .collect::<Vec<_>>();

  let found = if prefer_ipv6 {
    addrs.iter().find(|ip| ip.is_ipv6()).or_else(|| addrs.first())
  } else {
    addrs.first()
  };

  found.copied().ok_or_else(|| Error::HostNotFound(host.to_string()))
}
