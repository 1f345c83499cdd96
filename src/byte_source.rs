//! The seekable byte stream that every reader pulls from.
//!
//! Readers in this crate never own a file. The host opens something seekable
//! and hands it over as a [`ByteSource`]. Anything that's [`Read`] + [`Seek`]
//! (a `File`, a `Cursor<Vec<u8>>`, and so on) already is one.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// A readable, seekable source of bytes.
///
/// Both read methods fill as much of `buf` as the source can give and return
/// the count. A count less than `buf.len()` is a short read (end of data), and
/// callers decide whether that's fatal. An `Err` is always a failure of the
/// source itself.
pub trait ByteSource {
  /// Reads from the current position.
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

  /// Reads from an absolute offset. The position afterwards is just past the
  /// bytes that were read.
  fn seek_and_read(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize>;

  /// Goes back to offset 0.
  fn rewind(&mut self) -> std::io::Result<()>;
}

impl<T: Read + Seek + ?Sized> ByteSource for T {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
      match Read::read(self, &mut buf[total..]) {
        Ok(0) => break,
        Ok(n) => total += n,
        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
        Err(e) => return Err(e),
      }
    }
    Ok(total)
  }

  fn seek_and_read(&mut self, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    Seek::seek(self, SeekFrom::Start(offset))?;
    ByteSource::read(self, buf)
  }

  fn rewind(&mut self) -> std::io::Result<()> {
    Seek::seek(self, SeekFrom::Start(0)).map(|_| ())
  }
}

/// Reads exactly `N` bytes from the current position, `None` on a short read.
pub(crate) fn read_array<S: ByteSource + ?Sized, const N: usize>(
  source: &mut S,
) -> std::io::Result<Option<[u8; N]>> {
  let mut a = [0_u8; N];
  let n = source.read(&mut a)?;
  Ok(if n == N { Some(a) } else { None })
}

/// Reads exactly `N` bytes at `offset`, `None` on a short read.
pub(crate) fn seek_and_read_array<S: ByteSource + ?Sized, const N: usize>(
  source: &mut S, offset: u64,
) -> std::io::Result<Option<[u8; N]>> {
  let mut a = [0_u8; N];
  let n = source.seek_and_read(offset, &mut a)?;
  Ok(if n == N { Some(a) } else { None })
}

#[test]
fn test_cursor_is_a_byte_source() {
  let mut c = std::io::Cursor::new(vec![1_u8, 2, 3, 4, 5]);
  let mut buf = [0_u8; 3];
  assert_eq!(ByteSource::seek_and_read(&mut c, 3, &mut buf).unwrap(), 2);
  assert_eq!(&buf[..2], &[4, 5]);
  ByteSource::rewind(&mut c).unwrap();
  assert_eq!(ByteSource::read(&mut c, &mut buf).unwrap(), 3);
  assert_eq!(buf, [1, 2, 3]);
  assert_eq!(seek_and_read_array::<_, 2>(&mut c, 4).unwrap(), None);
}
