#![allow(bad_style)]

use std::io::{Read, Seek, SeekFrom};

mod detect;
mod gcn;
mod png;
mod spc;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// A `Read + Seek` fake that remembers the furthest byte anyone asked for,
/// whether or not the data actually reaches that far.
pub struct BoundsCheckedSource {
  data: Vec<u8>,
  pos: u64,
  pub furthest_request: u64,
}
impl BoundsCheckedSource {
  pub fn new(data: Vec<u8>) -> Self {
    Self { data, pos: 0, furthest_request: 0 }
  }
}
impl Read for BoundsCheckedSource {
  fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
    self.furthest_request = self.furthest_request.max(self.pos + buf.len() as u64);
    let start = (self.pos as usize).min(self.data.len());
    let n = buf.len().min(self.data.len() - start);
    buf[..n].copy_from_slice(&self.data[start..start + n]);
    self.pos += n as u64;
    Ok(n)
  }
}
impl Seek for BoundsCheckedSource {
  fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
    self.pos = match pos {
      SeekFrom::Start(p) => p,
      SeekFrom::End(d) => (self.data.len() as i64 + d) as u64,
      SeekFrom::Current(d) => (self.pos as i64 + d) as u64,
    };
    Ok(self.pos)
  }
}
