//! CoRE Link Format (RFC 6690), the `application/link-format`
//! documents served under `/.well-known/core`.
//!
//! A document is a comma-separated list of links, each a `<uri>`
//! followed by `;name="value"` attribute pairs. Attribute names are
//! limited to the registered set; values are stored with their quotes
//! stripped, and attributes without a `=` are kept as empty-valued
//! flags (`obs` is the usual one).

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// The attribute names a link may carry.
pub const LINK_ATTRS: &[&str] = &["anchor", "ct", "exp", "hreflang", "if", "ins", "media",
                                  "obs", "rt", "rel", "rev", "sz", "title", "type"];

/// One link of a link-format document.
///
/// Attributes are kept sorted by name so serialization is
/// deterministic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
  /// The target URI (the part between `<` and `>`).
  pub uri: String,
  attrs: BTreeMap<&'static str, String>,
}

impl Link {
  /// A link to `uri` with no attributes.
  pub fn new(uri: impl Into<String>) -> Link {
    Link { uri: uri.into(),
           attrs: BTreeMap::new() }
  }

  /// The value of attribute `name`, if set.
  pub fn attr(&self, name: &str) -> Option<&str> {
    self.attrs.get(name).map(String::as_str)
  }

  /// Set attribute `name`, rejecting names outside [`LINK_ATTRS`].
  pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Link> {
    match LINK_ATTRS.iter().copied().find(|a| *a == name) {
      | Some(known) => {
        self.attrs.insert(known, value.into());
        Ok(self)
      },
      | None => Err(Error::InvalidLink(name.to_string())),
    }
  }

  /// Parse one link, e.g. `<test>;if="test";rel="hosts"`.
  pub fn parse(text: &str) -> Result<Link> {
    let mut parts = text.split(';').filter(|p| !p.is_empty());

    let uri = parts.next()
                   .and_then(|p| p.strip_prefix('<'))
                   .and_then(|p| p.strip_suffix('>'))
                   .filter(|u| !u.is_empty())
                   .ok_or_else(|| Error::InvalidLink(text.to_string()))?;

    let mut link = Link::new(uri);
    for part in parts {
      match part.split_once('=') {
        | Some((name, value)) => link.set(name, value.replace('"', ""))?,
        | None => link.set(part, "")?,
      };
    }

    Ok(link)
  }

  /// Parse a whole document: comma-separated links.
  pub fn parse_multiple(text: &str) -> Result<Vec<Link>> {
    text.split(',').map(Link::parse).collect()
  }
}

impl fmt::Display for Link {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<{}>", self.uri)?;
    for (name, value) in &self.attrs {
      write!(f, ";{}=\"{}\"", name, value)?;
    }
    Ok(())
  }
}
