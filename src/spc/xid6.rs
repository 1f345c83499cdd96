//! The extended ID666 ("xID6") tag block.
//!
//! The block is a run of records, each one starting on a 4 byte boundary:
//!
//! | offset | size | meaning                                       |
//! |--------|------|-----------------------------------------------|
//! | 0      | 1    | item id                                       |
//! | 1      | 1    | 0 = value is in the header, else it follows   |
//! | 2      | 2    | (LE) the 16-bit value, or the payload length  |
//! | 4      | n    | payload, then padding up to a multiple of 4   |
//!
//! Scanning is purely slice based: the caller has already read the whole
//! block into memory, and every read goes through a [`ByteCursor`] so nothing
//! past the end of the block is ever touched. Bad data stops the scan, and
//! whatever was decoded before that point is kept.

use chrono::NaiveDate;
use tracing::{debug, trace};

use super::*;
use crate::{cp1252::cp1252_to_string, ByteCursor};

/// The xID6 block lives after the 64K of SPC700 RAM and the DSP registers.
pub const XID6_ADDRESS: u64 = 0x10200;

/// `"xid6"`
pub const XID6_MAGIC: [u8; 4] = *b"xid6";

/// The smallest declared block length that's accepted.
pub const XID6_MIN_LEN: u32 = 4;

/// The largest declared block length that's accepted.
pub const XID6_MAX_LEN: u32 = 16384;

/// Why a scan ended before the block did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
  /// The "payload follows" flag didn't match the item's kind.
  WrongPayloadFlag,
  /// A 32-bit item declared some length other than 4.
  BadLength,
  /// The payload would run past the end of the block.
  Truncated,
  /// The padding after the last payload runs past the end, so there's no
  /// room for another record anyway.
  End,
}

/// Decodes an xID6 block into a fresh [`TagMapping`].
///
/// `block` is the data *after* the 8 byte `"xid6"` + length header.
#[must_use]
pub fn parse_xid6(block: &[u8]) -> TagMapping {
  let mut tags = TagMapping::new();
  parse_xid6_into(block, &mut tags);
  tags
}

/// Decodes an xID6 block, adding to an existing [`TagMapping`].
///
/// Keys already in `tags` keep their old value.
pub fn parse_xid6_into(block: &[u8], tags: &mut TagMapping) {
  let mut cursor = ByteCursor::new(block);
  while let Some([id, payload_follows, lo, hi]) = cursor.peek_array::<4>() {
    let len_or_value = u16::from_le_bytes([lo, hi]);
    let payload_follows = payload_follows != 0;
    let outcome = match Xid6Item::from_id(id) {
      Some(item) => read_record(&mut cursor, item, payload_follows, len_or_value, tags),
      None => skip_record(&mut cursor, payload_follows, len_or_value),
    };
    match outcome {
      Ok(()) => (),
      Err(Stop::End) => break,
      Err(why) => {
        debug!(id, offset = cursor.position(), ?why, "xID6 scan stopped");
        break;
      }
    }
  }
}

fn read_record(
  cursor: &mut ByteCursor<'_>, item: Xid6Item, payload_follows: bool, len_or_value: u16,
  tags: &mut TagMapping,
) -> Result<(), Stop> {
  let kind = item.kind();
  if kind.payload_follows() != payload_follows {
    return Err(Stop::WrongPayloadFlag);
  }
  match kind {
    TagKind::Int8 => {
      tags.insert_uint(item, u32::from(len_or_value as u8));
      cursor.advance(4).ok_or(Stop::Truncated)
    }
    TagKind::Int16 => {
      tags.insert_uint(item, u32::from(len_or_value));
      cursor.advance(4).ok_or(Stop::Truncated)
    }
    TagKind::String => {
      let len = usize::from(len_or_value);
      let payload = cursor.peek_at(4, len).ok_or(Stop::Truncated)?;
      tags.insert_str(item, cp1252_to_string(payload));
      cursor.advance(4 + len).ok_or(Stop::Truncated)?;
      cursor.align_to(4).ok_or(Stop::End)
    }
    TagKind::Int32 | TagKind::Date => {
      if len_or_value != 4 {
        return Err(Stop::BadLength);
      }
      let payload: [u8; 4] =
        cursor.peek_at(4, 4).and_then(|s| s.try_into().ok()).ok_or(Stop::Truncated)?;
      if kind == TagKind::Date {
        match bcd_date_to_unix_time(payload) {
          Some(t) => tags.insert_timestamp(item, t),
          None => trace!(?payload, "xID6 date isn't valid BCD, skipped"),
        }
      } else {
        tags.insert_uint(item, u32::from_le_bytes(payload));
      }
      cursor.advance(8).ok_or(Stop::Truncated)
    }
  }
}

fn skip_record(
  cursor: &mut ByteCursor<'_>, payload_follows: bool, len_or_value: u16,
) -> Result<(), Stop> {
  if payload_follows {
    cursor.advance(4 + usize::from(len_or_value)).ok_or(Stop::Truncated)?;
    cursor.align_to(4).ok_or(Stop::End)
  } else {
    cursor.advance(4).ok_or(Stop::Truncated)
  }
}

/// Converts a BCD `YYYYMMDD` date (as 4 bytes, most significant first) into
/// Unix time at midnight UTC.
///
/// Any nibble above 9, or a date that doesn't exist, gives `None`.
#[must_use]
pub fn bcd_date_to_unix_time(bcd: [u8; 4]) -> Option<i64> {
  fn two_digits(u: u8) -> Option<u32> {
    let (hi, lo) = (u >> 4, u & 0xF);
    if hi > 9 || lo > 9 {
      None
    } else {
      Some(u32::from(hi) * 10 + u32::from(lo))
    }
  }
  let [cc, yy, mm, dd] = bcd;
  let year = two_digits(cc)? * 100 + two_digits(yy)?;
  let date = NaiveDate::from_ymd_opt(year as i32, two_digits(mm)?, two_digits(dd)?)?;
  date_to_unix_time(date)
}

/// Unix time at midnight UTC of the given day.
#[must_use]
pub(crate) fn date_to_unix_time(date: NaiveDate) -> Option<i64> {
  let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
  date.signed_duration_since(epoch).num_days().checked_mul(86_400)
}

#[test]
fn test_bcd_date_to_unix_time() {
  assert_eq!(bcd_date_to_unix_time([0x20, 0x23, 0x01, 0x15]), Some(1_673_740_800));
  assert_eq!(bcd_date_to_unix_time([0x19, 0x70, 0x01, 0x01]), Some(0));
  // not BCD
  assert_eq!(bcd_date_to_unix_time([0x20, 0x2A, 0x01, 0x15]), None);
  // no such day
  assert_eq!(bcd_date_to_unix_time([0x20, 0x23, 0x02, 0x30]), None);
  assert_eq!(bcd_date_to_unix_time([0x20, 0x23, 0x13, 0x01]), None);
}

#[test]
fn test_parse_xid6_kinds() {
  #[rustfmt::skip]
  let block: &[u8] = &[
    // OST title, 5 bytes of text + 3 padding
    0x10, 1, 5, 0, b'S', b'o', b'n', b'g', b'!', 0, 0, 0,
    // OST disc, 8-bit in header
    0x11, 0, 2, 0,
    // OST track, 16-bit in header
    0x12, 0, 0x41, 0x01,
    // dump date, BCD
    0x05, 1, 4, 0, 0x20, 0x23, 0x01, 0x15,
    // loop length, 32-bit LE
    0x31, 1, 4, 0, 0x78, 0x56, 0x34, 0x12,
    // unknown item with a payload, skipped
    0x7F, 1, 2, 0, 0xAA, 0xBB, 0, 0,
    // unknown item without a payload, skipped
    0x7E, 0, 0xFF, 0xFF,
    // copyright year
    0x14, 0, 0xCB, 0x07,
  ];
  let tags = parse_xid6(block);
  assert_eq!(tags.len(), 6);
  assert_eq!(tags.get_str(Xid6Item::OstTitle), Some("Song!"));
  assert_eq!(tags.get_uint(Xid6Item::OstDisc), Some(2));
  assert_eq!(tags.get_uint(Xid6Item::OstTrack), Some(0x0141));
  assert_eq!(tags.get_timestamp(Xid6Item::DumpDate), Some(1_673_740_800));
  assert_eq!(tags.get_uint(Xid6Item::LoopLength), Some(0x1234_5678));
  assert_eq!(tags.get_uint(Xid6Item::CopyrightYear), Some(1995));
  let order: Vec<Xid6Item> = tags.iter().map(|(k, _)| k).collect();
  assert_eq!(
    order,
    [
      Xid6Item::OstTitle,
      Xid6Item::OstDisc,
      Xid6Item::OstTrack,
      Xid6Item::DumpDate,
      Xid6Item::LoopLength,
      Xid6Item::CopyrightYear
    ]
  );
}

#[test]
fn test_parse_xid6_stops_on_bad_records() {
  // wrong "payload follows" flag on a string item
  let tags = parse_xid6(&[0x11, 0, 3, 0, 0x01, 0, 4, 0, b'a', b'b', b'c', b'd', 0x11, 0, 9, 0]);
  assert_eq!(tags.len(), 1);
  assert_eq!(tags.get_uint(Xid6Item::OstDisc), Some(3));

  // 32-bit item with a length other than 4
  let tags = parse_xid6(&[0x30, 1, 8, 0, 1, 2, 3, 4, 5, 6, 7, 8, 0x11, 0, 9, 0]);
  assert!(tags.is_empty());

  // string payload runs off the end
  let tags = parse_xid6(&[0x11, 0, 3, 0, 0x02, 1, 200, 0, b'a', b'b']);
  assert_eq!(tags.len(), 1);
  assert_eq!(tags.get_str(Xid6Item::GameName), None);

  // less than one record header is nothing at all
  assert!(parse_xid6(&[0x11, 0, 3]).is_empty());
  assert!(parse_xid6(&[]).is_empty());
}

#[test]
fn test_parse_xid6_bad_bcd_date_is_skipped() {
  let tags = parse_xid6(&[0x05, 1, 4, 0, 0x20, 0x23, 0x1F, 0x15, 0x11, 0, 1, 0]);
  assert_eq!(tags.get(Xid6Item::DumpDate), None);
  assert_eq!(tags.get_uint(Xid6Item::OstDisc), Some(1));
}

#[test]
fn test_parse_xid6_song_name_and_emulator() {
  #[rustfmt::skip]
  let block: &[u8] = &[
    0x01, 1, 9, 0, b'T', b'e', b's', b't', b' ', b'S', b'o', b'n', b'g', 0, 0, 0,
    0x06, 0, 2, 0,
  ];
  let tags = parse_xid6(block);
  assert_eq!(tags.len(), 2);
  assert_eq!(tags.get_str(Xid6Item::SongName), Some("Test Song"));
  assert_eq!(tags.get_uint(Xid6Item::EmulatorUsed), Some(2));
}
