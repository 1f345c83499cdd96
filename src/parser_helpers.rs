#![forbid(unsafe_code)]

//! Helpers for pulling plain data out of byte slices, and a bounded
//! cursor for walking through a byte buffer.

use bytemuck::{try_pod_read_unaligned, Pod};

/// Pulls a plain-data struct off the front of the bytes.
///
/// The struct is copied out, so the bytes don't need any alignment.
pub fn try_pull_pod<T: Pod>(bytes: &[u8]) -> Option<(T, &[u8])> {
  let size = core::mem::size_of::<T>();
  if bytes.len() >= size {
    let (head, tail) = bytes.split_at(size);
    let t: T = try_pod_read_unaligned(head).ok()?;
    Some((t, tail))
  } else {
    None
  }
}

/// Rounds `n` up to a multiple of `align` (which must be a power of two).
#[inline]
#[must_use]
pub const fn align_up(n: usize, align: usize) -> usize {
  (n + (align - 1)) & !(align - 1)
}

/// A read cursor over a byte slice that can't go past the end.
///
/// Every read goes through the same length check. When a read would cross the
/// end of the slice you get `None` and the position doesn't move.
#[derive(Debug, Clone)]
pub struct ByteCursor<'b> {
  bytes: &'b [u8],
  pos: usize,
}
impl<'b> ByteCursor<'b> {
  #[inline]
  pub const fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  #[inline]
  #[must_use]
  pub const fn position(&self) -> usize {
    self.pos
  }

  /// Looks at the next `n` bytes without moving.
  #[inline]
  #[must_use]
  pub fn peek(&self, n: usize) -> Option<&'b [u8]> {
    let end = self.pos.checked_add(n)?;
    self.bytes.get(self.pos..end)
  }

  /// Looks at the next `N` bytes, as an array, without moving.
  #[inline]
  #[must_use]
  pub fn peek_array<const N: usize>(&self) -> Option<[u8; N]> {
    self.peek(N)?.try_into().ok()
  }

  /// Looks at `n` bytes starting `skip` bytes ahead, without moving.
  #[inline]
  #[must_use]
  pub fn peek_at(&self, skip: usize, n: usize) -> Option<&'b [u8]> {
    let start = self.pos.checked_add(skip)?;
    let end = start.checked_add(n)?;
    self.bytes.get(start..end)
  }

  /// Moves ahead `n` bytes. Fails (without moving) if that passes the end.
  #[inline]
  #[must_use]
  pub fn advance(&mut self, n: usize) -> Option<()> {
    let new_pos = self.pos.checked_add(n)?;
    if new_pos <= self.bytes.len() {
      self.pos = new_pos;
      Some(())
    } else {
      None
    }
  }

  /// Moves up to the next multiple of `align`. Fails (without moving) if that
  /// passes the end.
  #[inline]
  #[must_use]
  pub fn align_to(&mut self, align: usize) -> Option<()> {
    let aligned = align_up(self.pos, align);
    self.advance(aligned - self.pos)
  }
}

#[test]
fn test_byte_cursor_never_passes_the_end() {
  let bytes = [1_u8, 2, 3, 4, 5, 6];
  let mut c = ByteCursor::new(&bytes);
  assert_eq!(c.peek_array::<2>(), Some([1, 2]));
  assert!(c.advance(2).is_some());
  assert_eq!(c.position(), 2);
  assert_eq!(c.peek_at(1, 3), Some(&[4, 5, 6][..]));
  assert_eq!(c.peek_at(1, 4), None);
  assert_eq!(c.peek_array::<5>(), None);

  let mut c = ByteCursor::new(&bytes);
  assert!(c.advance(5).is_some());
  // 5 rounds to 8, which is past the end.
  assert!(c.align_to(4).is_none());
  assert_eq!(c.position(), 5);
  assert!(c.advance(2).is_none());
  assert!(c.advance(1).is_some());
  assert!(c.align_to(2).is_some());
  assert_eq!(c.peek_at(0, 1), None);
  assert_eq!(c.advance(usize::MAX), None);
}

#[test]
fn test_align_up() {
  assert_eq!(align_up(0, 4), 0);
  assert_eq!(align_up(1, 4), 4);
  assert_eq!(align_up(4, 4), 4);
  assert_eq!(align_up(13, 16), 16);
}
