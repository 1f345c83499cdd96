#![forbid(unsafe_code)]

//! Windows-1252 text decoding.
//!
//! Lots of older formats store text as "whatever the PC was using", which in
//! practice is almost always Windows-1252 (a superset of ASCII and, mostly, of
//! Latin-1). Only the `0x80..=0x9F` range differs from Latin-1, so that's the
//! only part that needs a table.

/// `0x80..=0x9F`. Holes in the code page decode as the C1 control with the
/// same value, the same as Latin-1.
static HIGH_CONTROLS: [char; 32] = [
  '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
  '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
  '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
  '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Decodes a single Windows-1252 byte.
#[inline]
#[must_use]
pub fn cp1252_char(u: u8) -> char {
  match u {
    0x80..=0x9F => HIGH_CONTROLS[usize::from(u - 0x80)],
    _ => char::from(u),
  }
}

/// Decodes Windows-1252 bytes into a `String`.
///
/// Decoding stops at the first NUL byte, if any.
#[must_use]
pub fn cp1252_to_string(bytes: &[u8]) -> String {
  bytes.iter().copied().take_while(|&u| u != 0).map(cp1252_char).collect()
}

#[test]
fn test_cp1252_to_string() {
  assert_eq!(cp1252_to_string(b"Test Song"), "Test Song");
  assert_eq!(cp1252_to_string(b"abc\0def"), "abc");
  assert_eq!(cp1252_to_string(&[0x80, b'5']), "\u{20AC}5");
  assert_eq!(cp1252_to_string(&[0x93, b'x', 0x94]), "\u{201C}x\u{201D}");
  assert_eq!(cp1252_to_string(&[0xE9]), "\u{E9}");
}
