//! `coap://` URI helpers: authority, path and query codecs.
//!
//! Path and query segments travel percent-encoded on the URI side
//! and decoded (one option value per segment) on the message side.
//! The unencoded character sets follow RFC 3986: unreserved plus
//! sub-delims plus `:` and `@`; query elements additionally allow
//! `/` and `?` but escape `&`, which is the element separator.

use crate::error::{Error, Result};

/// Default CoAP UDP port; elided when printing an authority.
pub const PORT: u16 = 5683;

const UNRESERVED: &str = "-._~";
const SUB_DELIM: &str = "!$&'()*+,;=";

fn path_unencoded(b: u8) -> bool {
  b.is_ascii_alphanumeric()
  || UNRESERVED.as_bytes().contains(&b)
  || SUB_DELIM.as_bytes().contains(&b)
  || b == b':'
  || b == b'@'
}

fn query_unencoded(b: u8) -> bool {
  b != b'&' && (path_unencoded(b) || b == b'/' || b == b'?')
}

fn encode_element(el: &str, unencoded: fn(u8) -> bool) -> String {
  el.bytes()
    .map(|b| {
      if unencoded(b) {
        (b as char).to_string()
      } else {
        format!("%{:02X}", b)
      }
    })
    .collect()
}

fn percent_decode(el: &str) -> String {
  let mut out = Vec::with_capacity(el.len());
  let mut bytes = el.bytes();

  while let Some(b) = bytes.next() {
    if b == b'%' {
      let hex = [bytes.next(), bytes.next()];
      match hex {
        | [Some(hi), Some(lo)] => {
          match u8::from_str_radix(std::str::from_utf8(&[hi, lo]).unwrap_or(""), 16) {
            | Ok(byte) => out.push(byte),
            | Err(_) => out.extend([b'%', hi, lo]),
          }
        },
        // dangling escape, keep it literally
        | _ => out.push(b),
      }
    } else {
      out.push(b);
    }
  }

  String::from_utf8_lossy(&out).into_owned()
}

/// `coap://host[:port]`, bracketing IPv6 literals and eliding the
/// default port.
pub fn scheme_and_authority_encode(host: &str, port: u16) -> String {
  let host = if host.contains(':') && !host.starts_with('[') {
    format!("[{}]", host)
  } else {
    host.to_string()
  };

  if port == PORT {
    format!("coap://{}", host)
  } else {
    format!("coap://{}:{}", host, port)
  }
}

/// Split a `coap://` URI into host, port and the path-and-query
/// remainder (if any). Accepts `[..]` and `%5B..%5D` bracketing for
/// hosts containing colons.
pub fn scheme_and_authority_decode(uri: &str) -> Result<(String, u16, Option<String>)> {
  let invalid = || Error::InvalidUri(uri.to_string());

  let rest = match uri.get(..7) {
    | Some(scheme) if scheme.eq_ignore_ascii_case("coap://") => &uri[7..],
    | _ => return Err(invalid()),
  };

  let (host, rest) = if let Some(r) = rest.strip_prefix('[') {
    let end = r.find(']').ok_or_else(invalid)?;
    (r[..end].to_string(), &r[end + 1..])
  } else if rest.get(..3).map(|p| p.eq_ignore_ascii_case("%5b")) == Some(true) {
    let r = &rest[3..];
    let end = r.to_ascii_lowercase().find("%5d").ok_or_else(invalid)?;
    (r[..end].to_string(), &r[end + 3..])
  } else {
    let end = rest.find([':', '/']).unwrap_or(rest.len());
    (rest[..end].to_string(), &rest[end..])
  };

  if host.is_empty() {
    return Err(invalid());
  }

  let (port, rest) = if let Some(r) = rest.strip_prefix(':') {
    let end = r.find('/').unwrap_or(r.len());
    (r[..end].parse::<u16>().map_err(|_| invalid())?, &r[end..])
  } else {
    (PORT, rest)
  };

  let path = if rest.is_empty() {
    None
  } else {
    Some(rest.to_string())
  };

  Ok((host, port, path))
}

/// Join decoded path segments into a percent-encoded absolute path.
pub fn path_encode<S: AsRef<str>>(elements: &[S]) -> String {
  let encoded = elements.iter()
                        .map(|el| encode_element(el.as_ref(), path_unencoded))
                        .collect::<Vec<_>>();
  format!("/{}", encoded.join("/"))
}

/// Split an absolute path into decoded segments. `/` yields no
/// segments; a trailing slash yields a trailing empty segment.
pub fn path_decode(path: &str) -> Result<Vec<String>> {
  if path.is_empty() {
    return Ok(vec![]);
  }

  let parts = path.split('/').collect::<Vec<_>>();

  if !parts[0].is_empty() {
    return Err(Error::InvalidUri(path.to_string()));
  }
  if parts.len() == 2 && parts[1].is_empty() {
    return Ok(vec![]);
  }

  Ok(parts[1..].iter().map(|el| percent_decode(el)).collect())
}

/// Join decoded query elements into a `?`-prefixed query string;
/// no elements means no query at all.
pub fn query_encode<S: AsRef<str>>(elements: &[S]) -> String {
  if elements.is_empty() {
    return String::new();
  }

  let encoded = elements.iter()
                        .map(|el| encode_element(el.as_ref(), query_unencoded))
                        .collect::<Vec<_>>();
  format!("?{}", encoded.join("&"))
}

/// Split a `?`-prefixed query string into decoded elements.
pub fn query_decode(query: &str) -> Result<Vec<String>> {
  if query.is_empty() {
    return Ok(vec![]);
  }
  if !query.starts_with('?') {
    return Err(Error::InvalidUri(query.to_string()));
  }

  Ok(query[1..].split('&').map(percent_decode).collect())
}
