//! The variable-length numeric encodings used by option values.
//!
//! `vlb` is the variable-length binary unsigned integer format of
//! RFC7252 Appendix A: shortest big-endian byte string, no leading
//! zero byte, zero is the empty string.
//!
//! `o256` is a shifted base-256 numeral system in which each byte `b`
//! contributes `b + 1` at its position, so every byte string (the
//! empty string included) has a distinct rank. Tokens and other
//! opaque values are goedelized with it.

/// Encode `n` as the shortest big-endian byte string.
///
/// ```
/// use newt_msg::num::vlb_encode;
///
/// assert_eq!(vlb_encode(0), Vec::<u8>::new());
/// assert_eq!(vlb_encode(60), vec![60]);
/// assert_eq!(vlb_encode(0x1234), vec![0x12, 0x34]);
/// ```
pub fn vlb_encode(n: u64) -> Vec<u8> {
  let mut n = n;
  let mut v = Vec::new();

  while n > 0 {
    v.push((n & 0xff) as u8);
    n >>= 8;
  }

  v.reverse();
  v
}

/// Big-endian interpretation of a byte string; empty decodes to zero.
///
/// There is no canonical-form check on this side: leading zero bytes
/// are accepted and ignored.
pub fn vlb_decode(bytes: &[u8]) -> u64 {
  bytes.iter().fold(0u64, |n, &b| (n << 8) + u64::from(b))
}

/// Encode `n` in the one-plus-256 numeral system.
/// `o256_encode(0)` is the empty string.
pub fn o256_encode(n: u128) -> Vec<u8> {
  let mut n = n;
  let mut v = Vec::new();

  while n > 0 {
    n -= 1;
    v.push((n & 0xff) as u8);
    n >>= 8;
  }

  v.reverse();
  v
}

/// Decode a one-plus-256 byte string. Inverse of [`o256_encode`].
pub fn o256_decode(bytes: &[u8]) -> u128 {
  bytes.iter().fold(0u128, |n, &b| (n << 8) + u128::from(b) + 1)
}

/// For `n == 2^k`, returns `k` (the bit length of `n - 1`, i.e.
/// `ceil(log2(n))` for any positive `n`).
///
/// Maps a block size to its size exponent: `bits_up_to(16) == 4`.
pub fn bits_up_to(n: u32) -> u32 {
  match n {
    | 0 | 1 => 0,
    | n => 32 - (n - 1).leading_zeros(),
  }
}
