use core::fmt::Write;

/// An array of bytes expected to contain ascii data.
///
/// There's no actual enforced encoding! The `Debug` and `Display` impls will
/// just `as` cast each byte into a character. This works just as expected for
/// ascii data (`32..=126`), and is still safe for non-ascii data, but you just
/// might get non-printing characters or multi-byte unicode characters.
///
/// ROM and disc headers are full of fixed-width text fields that are *not*
/// null terminated: a 32 byte title might use all 32 bytes, or it might be
/// padded out with zeroes, spaces, or garbage after a zero. The array keeps
/// the bytes exactly as they were on disk. Use [`trimmed`](Self::trimmed) or
/// [`to_display_string`](Self::to_display_string) when you want text.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AsciiArray<const N: usize>(pub [u8; N]);

// Safety: it's just a byte array.
unsafe impl<const N: usize> bytemuck::Zeroable for AsciiArray<N> {}
unsafe impl<const N: usize> bytemuck::Pod for AsciiArray<N> {}

impl<const N: usize> Default for AsciiArray<N> {
  #[inline]
  #[must_use]
  fn default() -> Self {
    Self([0; N])
  }
}

impl<const N: usize> core::fmt::Debug for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char('\"')?;
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    f.write_char('\"')?;
    Ok(())
  }
}
impl<const N: usize> core::fmt::Display for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    Ok(())
  }
}

impl<const N: usize> From<[u8; N]> for AsciiArray<N> {
  #[inline]
  #[must_use]
  fn from(array: [u8; N]) -> Self {
    Self(array)
  }
}

impl<const N: usize> AsciiArray<N> {
  /// The bytes up to the first NUL, with any trailing spaces also cut off.
  #[inline]
  #[must_use]
  pub fn trimmed(&self) -> &[u8] {
    let end = self.0.iter().position(|&u| u == 0).unwrap_or(N);
    let mut out = &self.0[..end];
    while let [head @ .., b' '] = out {
      out = head;
    }
    out
  }

  /// If the field is empty (the first byte is NUL).
  #[inline]
  #[must_use]
  pub fn is_blank(&self) -> bool {
    self.0.first().map_or(true, |&u| u == 0)
  }

  /// The trimmed bytes, decoded as Windows-1252 text.
  #[inline]
  #[must_use]
  pub fn to_display_string(&self) -> String {
    crate::cp1252::cp1252_to_string(self.trimmed())
  }
}

#[test]
fn test_ascii_array_trimming() {
  let a = AsciiArray(*b"GAME  \0\xFFjunk");
  assert_eq!(a.trimmed(), b"GAME");
  assert_eq!(a.to_display_string(), "GAME");
  assert_eq!(a.0.len(), 12);

  let full = AsciiArray(*b"ABCD");
  assert_eq!(full.trimmed(), b"ABCD");
  assert!(!full.is_blank());
  assert!(AsciiArray::<4>::default().is_blank());
}
