//! The IANA content-format numbering carried by the content-format
//! and accept options.

/// The registered formats this crate knows by name.
pub const CONTENT_FORMATS: &[(u16, &str)] = &[(0, "text/plain;charset=utf-8"),
                                              (40, "application/link-format"),
                                              (41, "application/xml"),
                                              (42, "application/octet-stream"),
                                              (47, "application/exi"),
                                              (50, "application/json"),
                                              (60, "application/cbor")];

/// The media type name for `number`, if registered.
pub fn name(number: u16) -> Option<&'static str> {
  CONTENT_FORMATS.iter()
                 .find(|(n, _)| *n == number)
                 .map(|(_, name)| *name)
}

/// The content-format number for a media type name. A name without
/// parameters also matches a registered name that carries a charset
/// parameter, so `text/plain` finds 0.
pub fn number(name: &str) -> Option<u16> {
  CONTENT_FORMATS.iter()
                 .find(|(_, n)| *n == name || n.split(';').next() == Some(name))
                 .map(|(number, _)| *number)
}
