#![forbid(unsafe_code)]

//! Module for Super NES SPC700 sound files (`.spc`).
//!
//! An SPC file is a snapshot of the SNES sound CPU: a 256 byte header, then
//! the 64K of audio RAM, the DSP registers, and so on. The header can carry a
//! fixed "ID666" tag area, and after the RAM snapshot there can be an
//! extended "xID6" tag block.
//!
//! ```no_run
//! # fn main() -> rommeta::MetaResult<()> {
//! let mut file = std::fs::File::open("song.spc")?;
//! let spc = rommeta::spc::Spc::open(&mut file)?;
//! let tags = spc.parse_tags(&mut file)?;
//! for field in &rommeta::spc::fields(&tags) {
//!   println!("{}: {}", field.name, field.value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## ID666 layouts
//!
//! The ID666 area comes in two layouts that are *mostly* the same. The text
//! layout stores the dump date and the song lengths as ASCII digits, the
//! binary layout stores them as integers, which shifts the artist field by one
//! byte. Nothing in the file says which one is in use, so it's guessed from
//! the bytes of the length fields (see [`Id666Layout::guess`]).

use bytemuck::{Pod, Zeroable};
use chrono::NaiveDate;
use pack1::U16LE;
use tracing::{debug, trace};

use crate::{
  byte_source::{read_array, seek_and_read_array},
  error::truncated,
  try_pull_pod, AsciiArray, ByteSource, MetaError, MetaResult,
};

mod project;
pub use project::*;

mod tags;
pub use tags::*;

mod xid6;
pub use xid6::*;

/// The SPC header size, which is also the fewest bytes needed for detection.
pub const SPC_HEADER_LEN: usize = 0x100;

/// The part of the magic string that's the same in every version.
///
/// The full 33 byte field ends with a version number (`v0.30`), which some
/// tools write differently.
pub const SPC_MAGIC: &[u8; 27] = b"SNES-SPC700 Sound File Data";

/// The value of the "has ID666" byte when the tag area is filled in.
pub const SPC_HAS_ID666: u8 = 26;

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawSpcHeader {
  pub magic: AsciiArray<33>,
  pub magic_1a: [u8; 2],
  pub has_id666: u8,
  pub version: u8,
  pub pc: U16LE,
  pub a: u8,
  pub x: u8,
  pub y: u8,
  pub psw: u8,
  pub sp: u8,
  pub reserved: [u8; 2],
  pub song_title: AsciiArray<32>,
  pub game_title: AsciiArray<32>,
  pub dumper_name: AsciiArray<16>,
  pub comments: AsciiArray<32>,
  /// Either a [`RawId666Text`] or a [`RawId666Binary`].
  pub tail: [u8; 98],
}
const _: () = assert!(core::mem::size_of::<RawSpcHeader>() == SPC_HEADER_LEN);

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawId666Text {
  pub dump_date: AsciiArray<11>,
  pub song_seconds: AsciiArray<3>,
  pub fade_ms: AsciiArray<5>,
  pub artist: AsciiArray<32>,
  pub channel_disables: u8,
  pub emulator: u8,
  pub reserved: [u8; 45],
}
const _: () = assert!(core::mem::size_of::<RawId666Text>() == 98);

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawId666Binary {
  pub dump_date: [u8; 4],
  pub unused: [u8; 7],
  pub song_seconds: [u8; 3],
  pub fade_ms: [u8; 4],
  pub artist: AsciiArray<32>,
  pub channel_disables: u8,
  pub emulator: u8,
  pub reserved: [u8; 46],
}
const _: () = assert!(core::mem::size_of::<RawId666Binary>() == 98);

/// Checks if the bytes start with an SPC header.
///
/// Needs at least [`SPC_HEADER_LEN`] bytes, anything shorter is never a match.
#[inline]
#[must_use]
pub fn is_spc_header_correct(bytes: &[u8]) -> bool {
  bytes.len() >= SPC_HEADER_LEN && bytes.starts_with(SPC_MAGIC)
}

/// The SPC700 register values at the moment of the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct SpcRegisters {
  pub pc: u16,
  pub a: u8,
  pub x: u8,
  pub y: u8,
  pub psw: u8,
  pub sp: u8,
}

/// Which of the two ID666 layouts a file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Id666Layout {
  /// Dates and lengths are ASCII digits.
  Text,
  /// Dates are BCD, lengths are little-endian integers.
  Binary,
}
impl Id666Layout {
  /// Guesses the layout from the 98 bytes that follow the comments field.
  ///
  /// * If any of the 8 length bytes is a control character or isn't ASCII,
  ///   it has to be binary.
  /// * Otherwise it's binary if the byte where the binary layout's artist
  ///   field starts is a letter-ish character (`>= 'A'`), since in the text
  ///   layout that byte is the last fade length digit.
  #[must_use]
  pub fn guess(tail: &[u8; 98]) -> Self {
    let lengths = &tail[11..19];
    if lengths.iter().any(|&u| (0x01..=0x1F).contains(&u) || u > 0x7E) {
      Self::Binary
    } else if tail[18] >= b'A' {
      Self::Binary
    } else {
      Self::Text
    }
  }
}

/// The emulators that ID666 knows the ids of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum SpcEmulator {
  Unknown,
  Zsnes,
  Snes9x,
}
impl SpcEmulator {
  /// Looks up the emulator for an "emulator used" byte.
  #[inline]
  #[must_use]
  pub const fn from_id(id: u32) -> Option<Self> {
    Some(match id {
      0 => Self::Unknown,
      1 => Self::Zsnes,
      2 => Self::Snes9x,
      _ => return None,
    })
  }

  /// The display name.
  #[inline]
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Unknown => "Unknown",
      Self::Zsnes => "ZSNES",
      Self::Snes9x => "Snes9x",
    }
  }
}

/// The fixed ID666 tag area, with both layouts decoded into one shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Id666 {
  /// Layout this was decoded from.
  pub layout: Option<Id666Layout>,
  #[allow(missing_docs)]
  pub song_title: AsciiArray<32>,
  #[allow(missing_docs)]
  pub game_title: AsciiArray<32>,
  #[allow(missing_docs)]
  pub dumper_name: AsciiArray<16>,
  #[allow(missing_docs)]
  pub comments: AsciiArray<32>,
  #[allow(missing_docs)]
  pub artist: AsciiArray<32>,
  /// Unix time of the dump date, if there was a usable one.
  pub dump_date: Option<i64>,
  /// Seconds to play before fading out.
  pub song_seconds: Option<u32>,
  /// Length of the fade out, in milliseconds.
  pub fade_ms: Option<u32>,
  /// One bit per DSP voice that should start muted.
  pub channel_disables: u8,
  /// Emulator id (see [`SpcEmulator`]).
  pub emulator: u8,
}
impl Id666 {
  fn from_raw(raw: &RawSpcHeader) -> Self {
    let layout = Id666Layout::guess(&raw.tail);
    let mut out = Self {
      layout: Some(layout),
      song_title: raw.song_title,
      game_title: raw.game_title,
      dumper_name: raw.dumper_name,
      comments: raw.comments,
      ..Self::default()
    };
    match layout {
      Id666Layout::Text => {
        let text: RawId666Text = bytemuck::cast(raw.tail);
        out.dump_date = parse_text_date(&text.dump_date);
        out.song_seconds = parse_ascii_u32(text.song_seconds.trimmed());
        out.fade_ms = parse_ascii_u32(text.fade_ms.trimmed());
        out.artist = text.artist;
        out.channel_disables = text.channel_disables;
        // Some taggers wrote the emulator id as an ASCII digit.
        out.emulator = if text.emulator.is_ascii_digit() {
          text.emulator - b'0'
        } else {
          text.emulator
        };
      }
      Id666Layout::Binary => {
        let bin: RawId666Binary = bytemuck::cast(raw.tail);
        out.dump_date = bcd_date_to_unix_time(bin.dump_date);
        let [s0, s1, s2] = bin.song_seconds;
        out.song_seconds = Some(u32::from_le_bytes([s0, s1, s2, 0]));
        out.fade_ms = Some(u32::from_le_bytes(bin.fade_ms));
        out.artist = bin.artist;
        out.channel_disables = bin.channel_disables;
        out.emulator = bin.emulator;
      }
    }
    out
  }

  /// Adds the tag values to a mapping.
  ///
  /// Blank text fields and missing dates don't make entries.
  pub fn add_to(&self, tags: &mut TagMapping) {
    let text_fields = [
      (Xid6Item::SongName, self.song_title.is_blank(), self.song_title.to_display_string()),
      (Xid6Item::GameName, self.game_title.is_blank(), self.game_title.to_display_string()),
      (Xid6Item::DumperName, self.dumper_name.is_blank(), self.dumper_name.to_display_string()),
      (Xid6Item::Comments, self.comments.is_blank(), self.comments.to_display_string()),
      (Xid6Item::ArtistName, self.artist.is_blank(), self.artist.to_display_string()),
    ];
    for (item, blank, text) in text_fields {
      if !blank {
        tags.insert_str(item, text);
      }
    }
    if let Some(t) = self.dump_date {
      tags.insert_timestamp(Xid6Item::DumpDate, t);
    }
    tags.insert_uint(Xid6Item::EmulatorUsed, u32::from(self.emulator));
  }
}

fn parse_ascii_u32(digits: &[u8]) -> Option<u32> {
  core::str::from_utf8(digits).ok()?.trim().parse().ok()
}

/// Text dump dates are `MM/DD/YYYY`, or sometimes `MM-DD-YYYY`.
fn parse_text_date(field: &AsciiArray<11>) -> Option<i64> {
  let s = core::str::from_utf8(field.trimmed()).ok()?;
  let date = ["%m/%d/%Y", "%m-%d-%Y"]
    .into_iter()
    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())?;
  date_to_unix_time(date)
}

/// The decoded SPC header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpcHeader {
  /// The file format's minor version number.
  pub version: u8,
  #[allow(missing_docs)]
  pub registers: SpcRegisters,
  /// Only filled in when the "has ID666" byte says the tag area is in use.
  pub id666: Option<Id666>,
}
impl SpcHeader {
  fn from_raw(raw: &RawSpcHeader) -> Self {
    Self {
      version: raw.version,
      registers: SpcRegisters {
        pc: raw.pc.get(),
        a: raw.a,
        x: raw.x,
        y: raw.y,
        psw: raw.psw,
        sp: raw.sp,
      },
      id666: if raw.has_id666 == SPC_HAS_ID666 { Some(Id666::from_raw(raw)) } else { None },
    }
  }
}
impl TryFrom<&[u8]> for SpcHeader {
  type Error = MetaError;
  #[inline]
  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    if !bytes.starts_with(SPC_MAGIC) {
      return Err(MetaError::NotSupported);
    }
    let (raw, _) = try_pull_pod::<RawSpcHeader>(bytes).ok_or_else(|| truncated("SPC header"))?;
    Ok(Self::from_raw(&raw))
  }
}

/// A reader for one SPC file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Spc {
  header: SpcHeader,
}
impl Spc {
  /// Reads and checks the header.
  ///
  /// ## Failure
  /// * [`MetaError::Truncated`] if there's less than a full header.
  /// * [`MetaError::NotSupported`] if the magic doesn't match.
  pub fn open<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<Self> {
    source.rewind()?;
    let bytes: [u8; SPC_HEADER_LEN] =
      read_array(source)?.ok_or_else(|| truncated("SPC header"))?;
    if !is_spc_header_correct(&bytes) {
      return Err(MetaError::NotSupported);
    }
    let header = SpcHeader::try_from(&bytes[..])?;
    debug!(
      version = header.version,
      id666 = ?header.id666.as_ref().and_then(|id| id.layout),
      "opened SPC"
    );
    Ok(Self { header })
  }

  /// The decoded header.
  #[inline]
  #[must_use]
  pub fn header(&self) -> &SpcHeader {
    &self.header
  }

  /// Decodes all the tags: the ID666 area first, then the xID6 block.
  ///
  /// Problems inside the xID6 block (bad length, short read, bad records)
  /// just mean fewer entries. Only a failure of the source itself is an
  /// error.
  pub fn parse_tags<S: ByteSource + ?Sized>(&self, source: &mut S) -> MetaResult<TagMapping> {
    let mut tags = TagMapping::new();
    if let Some(id666) = &self.header.id666 {
      id666.add_to(&mut tags);
    }
    if let Some(block) = read_xid6_block(source)? {
      parse_xid6_into(&block, &mut tags);
    }
    trace!(entries = tags.len(), "SPC tags");
    Ok(tags)
  }
}

/// Reads the xID6 block body, if the file has a usable one.
fn read_xid6_block<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<Option<Vec<u8>>> {
  let Some(head) = seek_and_read_array::<S, 8>(source, XID6_ADDRESS)? else {
    trace!("no xID6 header");
    return Ok(None);
  };
  let [m0, m1, m2, m3, l0, l1, l2, l3] = head;
  if [m0, m1, m2, m3] != XID6_MAGIC {
    trace!("no xID6 magic");
    return Ok(None);
  }
  let len = u32::from_le_bytes([l0, l1, l2, l3]);
  if !(XID6_MIN_LEN..=XID6_MAX_LEN).contains(&len) {
    debug!(len, max = XID6_MAX_LEN, "xID6 block length out of range, ignored");
    return Ok(None);
  }
  let mut block = Vec::new();
  block.try_reserve_exact(len as usize)?;
  block.resize(len as usize, 0_u8);
  let got = source.seek_and_read(XID6_ADDRESS + 8, &mut block)?;
  if got < block.len() {
    debug!(len, got, "xID6 block is cut short, ignored");
    return Ok(None);
  }
  Ok(Some(block))
}

#[cfg(test)]
pub(crate) fn test_header(layout: Id666Layout) -> [u8; SPC_HEADER_LEN] {
  let mut h = [0_u8; SPC_HEADER_LEN];
  h[..33].copy_from_slice(b"SNES-SPC700 Sound File Data v0.30");
  h[0x21] = 0x1A;
  h[0x22] = 0x1A;
  h[0x23] = SPC_HAS_ID666;
  h[0x24] = 30;
  h[0x25..0x27].copy_from_slice(&0x0400_u16.to_le_bytes());
  h[0x2E..0x2E + 9].copy_from_slice(b"Test Song");
  h[0x4E..0x4E + 9].copy_from_slice(b"Test Game");
  h[0x6E..0x6E + 6].copy_from_slice(b"Dumper");
  match layout {
    Id666Layout::Text => {
      h[0x9E..0x9E + 10].copy_from_slice(b"01/15/2023");
      h[0xA9..0xAC].copy_from_slice(b"180");
      h[0xAC..0xB0].copy_from_slice(b"5000");
      h[0xB1..0xB1 + 6].copy_from_slice(b"Artist");
      h[0xD2] = b'2';
    }
    Id666Layout::Binary => {
      h[0x9E..0xA2].copy_from_slice(&[0x20, 0x23, 0x01, 0x15]);
      h[0xA9..0xAC].copy_from_slice(&[180, 0, 0]);
      h[0xAC..0xB0].copy_from_slice(&5000_u32.to_le_bytes());
      h[0xB0..0xB0 + 6].copy_from_slice(b"Artist");
      h[0xD1] = 1;
    }
  }
  h
}

#[test]
fn test_id666_text_layout() {
  let h = test_header(Id666Layout::Text);
  assert!(is_spc_header_correct(&h));
  let header = SpcHeader::try_from(&h[..]).unwrap();
  assert_eq!(header.version, 30);
  assert_eq!(header.registers.pc, 0x0400);
  let id = header.id666.unwrap();
  assert_eq!(id.layout, Some(Id666Layout::Text));
  assert_eq!(id.song_title.to_display_string(), "Test Song");
  assert_eq!(id.artist.to_display_string(), "Artist");
  assert_eq!(id.dump_date, Some(1_673_740_800));
  assert_eq!(id.song_seconds, Some(180));
  assert_eq!(id.fade_ms, Some(5000));
  assert_eq!(id.emulator, 2);
}

#[test]
fn test_id666_binary_layout() {
  let h = test_header(Id666Layout::Binary);
  let header = SpcHeader::try_from(&h[..]).unwrap();
  let id = header.id666.unwrap();
  assert_eq!(id.layout, Some(Id666Layout::Binary));
  assert_eq!(id.artist.to_display_string(), "Artist");
  assert_eq!(id.dump_date, Some(1_673_740_800));
  assert_eq!(id.song_seconds, Some(180));
  assert_eq!(id.fade_ms, Some(5000));
  assert_eq!(id.emulator, 1);
}

#[test]
fn test_id666_layout_guess() {
  let mut tail = [0_u8; 98];
  // all zero lengths, and a zero where the binary artist would start
  assert_eq!(Id666Layout::guess(&tail), Id666Layout::Text);
  tail[11..14].copy_from_slice(b"120");
  tail[14..19].copy_from_slice(b"10000");
  assert_eq!(Id666Layout::guess(&tail), Id666Layout::Text);
  tail[12] = 0x05;
  assert_eq!(Id666Layout::guess(&tail), Id666Layout::Binary);
  tail[12] = b'2';
  tail[18] = b'Z';
  assert_eq!(Id666Layout::guess(&tail), Id666Layout::Binary);
}

#[test]
fn test_spc_without_id666() {
  let mut h = test_header(Id666Layout::Text);
  h[0x23] = 27;
  let header = SpcHeader::try_from(&h[..]).unwrap();
  assert!(header.id666.is_none());
}

#[test]
fn test_spc_parse_tags_with_xid6() {
  let mut file = vec![0_u8; XID6_ADDRESS as usize];
  file[..SPC_HEADER_LEN].copy_from_slice(&test_header(Id666Layout::Binary));
  file.extend_from_slice(b"xid6");
  #[rustfmt::skip]
  let block: &[u8] = &[
    // a second song name, which loses to the ID666 one
    0x01, 1, 4, 0, b'N', b'o', b'p', b'e',
    0x12, 0, 0x41, 0x01,
  ];
  file.extend_from_slice(&(block.len() as u32).to_le_bytes());
  file.extend_from_slice(block);

  let mut cursor = std::io::Cursor::new(file);
  let spc = Spc::open(&mut cursor).unwrap();
  let tags = spc.parse_tags(&mut cursor).unwrap();
  assert_eq!(tags.get_str(Xid6Item::SongName), Some("Test Song"));
  assert_eq!(tags.get_str(Xid6Item::GameName), Some("Test Game"));
  assert_eq!(tags.get_str(Xid6Item::ArtistName), Some("Artist"));
  assert_eq!(tags.get_timestamp(Xid6Item::DumpDate), Some(1_673_740_800));
  assert_eq!(tags.get_uint(Xid6Item::EmulatorUsed), Some(1));
  assert_eq!(tags.get_uint(Xid6Item::OstTrack), Some(0x0141));
}

#[test]
fn test_spc_xid6_length_limits() {
  for bad_len in [0_u32, 3, XID6_MAX_LEN + 1, u32::MAX] {
    let mut file = vec![0_u8; XID6_ADDRESS as usize];
    file[..SPC_HEADER_LEN].copy_from_slice(&test_header(Id666Layout::Text));
    file.extend_from_slice(b"xid6");
    file.extend_from_slice(&bad_len.to_le_bytes());
    file.extend_from_slice(&[0x11, 0, 1, 0]);
    let mut cursor = std::io::Cursor::new(file);
    let spc = Spc::open(&mut cursor).unwrap();
    let tags = spc.parse_tags(&mut cursor).unwrap();
    assert_eq!(tags.get(Xid6Item::OstDisc), None, "len {bad_len}");
    // the ID666 part is still there
    assert_eq!(tags.get_str(Xid6Item::SongName), Some("Test Song"));
  }
}

#[test]
fn test_spc_open_failures() {
  let h = test_header(Id666Layout::Text);
  let mut short = std::io::Cursor::new(h[..0xFF].to_vec());
  assert!(matches!(Spc::open(&mut short), Err(MetaError::Truncated(_))));
  let mut wrong = h;
  wrong[0] = b'X';
  let mut wrong = std::io::Cursor::new(wrong.to_vec());
  assert!(matches!(Spc::open(&mut wrong), Err(MetaError::NotSupported)));
}
