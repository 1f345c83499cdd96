use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rommeta::{
  spc::{self, Spc, Xid6Item, XID6_ADDRESS},
  FieldValue, MetaError, MetaValue, Property,
};

use crate::BoundsCheckedSource;

/// An SPC file with no ID666 area, optionally followed by an xID6 block.
fn spc_file(has_id666: bool, xid6: Option<&[u8]>) -> Vec<u8> {
  let mut file = vec![0_u8; XID6_ADDRESS as usize];
  file[..33].copy_from_slice(b"SNES-SPC700 Sound File Data v0.30");
  file[0x21] = 0x1A;
  file[0x22] = 0x1A;
  file[0x23] = if has_id666 { 26 } else { 27 };
  file[0x24] = 30;
  if has_id666 {
    file[0x2E..0x2E + 3].copy_from_slice(b"Old");
    // text layout, emulator "1"
    file[0x9E..0x9E + 10].copy_from_slice(b"02/03/1999");
    file[0xD2] = b'1';
  }
  if let Some(block) = xid6 {
    file.extend_from_slice(b"xid6");
    file.extend_from_slice(&(block.len() as u32).to_le_bytes());
    file.extend_from_slice(block);
  }
  file
}

#[rustfmt::skip]
const SONG_AND_EMULATOR: &[u8] = &[
  0x01, 1, 9, 0, b'T', b'e', b's', b't', b' ', b'S', b'o', b'n', b'g', 0, 0, 0,
  0x06, 0, 2, 0,
];

#[test]
fn test_spc_xid6_only() {
  let mut source = std::io::Cursor::new(spc_file(false, Some(SONG_AND_EMULATOR)));
  let spc = Spc::open(&mut source).unwrap();
  assert!(spc.header().id666.is_none());
  let tags = spc.parse_tags(&mut source).unwrap();
  assert_eq!(tags.len(), 2);
  let (fields, meta) = spc::project(&tags);
  assert_eq!(fields.get("Song Name"), Some(&FieldValue::String("Test Song".into())));
  assert_eq!(fields.get("Emulator Used"), Some(&FieldValue::String("Snes9x".into())));
  assert_eq!(meta.get(Property::Title), Some(&MetaValue::String("Test Song".into())));
}

#[test]
fn test_spc_id666_wins_over_xid6() {
  let mut source = std::io::Cursor::new(spc_file(true, Some(SONG_AND_EMULATOR)));
  let spc = Spc::open(&mut source).unwrap();
  let tags = spc.parse_tags(&mut source).unwrap();
  assert_eq!(tags.get_str(Xid6Item::SongName), Some("Old"));
  assert_eq!(tags.get_uint(Xid6Item::EmulatorUsed), Some(1));
  assert_eq!(tags.get_timestamp(Xid6Item::DumpDate), Some(918_000_000));
  let (fields, _) = spc::project(&tags);
  assert_eq!(fields.get("Dump Date").map(ToString::to_string), Some("1999-02-03".into()));
}

#[test]
fn test_spc_open_errors() {
  let file = spc_file(false, None);
  assert!(matches!(
    Spc::open(&mut std::io::Cursor::new(&file[..0xFF])),
    Err(MetaError::Truncated(_))
  ));
  let mut not_spc = file.clone();
  not_spc[0] = b'X';
  assert!(matches!(Spc::open(&mut std::io::Cursor::new(not_spc)), Err(MetaError::NotSupported)));
}

#[test]
fn test_xid6_reads_stay_in_the_block() {
  let mut file = spc_file(false, Some(SONG_AND_EMULATOR));
  // junk after the block that must never be asked for
  file.extend_from_slice(&[0x01, 1, 4, 0, b'J', b'u', b'n', b'k']);
  let block_end = XID6_ADDRESS + 8 + SONG_AND_EMULATOR.len() as u64;
  let mut source = BoundsCheckedSource::new(file);
  let spc = Spc::open(&mut source).unwrap();
  let tags = spc.parse_tags(&mut source).unwrap();
  assert_eq!(tags.len(), 2);
  assert!(source.furthest_request <= block_end, "{} > {block_end}", source.furthest_request);
}

#[test]
fn test_xid6_oversized_block_is_not_read() {
  let mut file = spc_file(false, None);
  file.extend_from_slice(b"xid6");
  file.extend_from_slice(&16385_u32.to_le_bytes());
  file.extend_from_slice(SONG_AND_EMULATOR);
  let mut source = BoundsCheckedSource::new(file);
  let spc = Spc::open(&mut source).unwrap();
  assert!(spc.parse_tags(&mut source).unwrap().is_empty());
  assert!(source.furthest_request <= XID6_ADDRESS + 8);
}

#[test]
fn test_spc_no_panics() {
  for _ in 0..50 {
    let mut file = spc_file(false, None);
    let noise = super::rand_bytes(file.len() - 0x23);
    file[0x23..].copy_from_slice(&noise);
    let block = super::rand_bytes(512);
    file.extend_from_slice(b"xid6");
    file.extend_from_slice(&(block.len() as u32).to_le_bytes());
    file.extend_from_slice(&block);
    let mut source = std::io::Cursor::new(file);
    let spc = Spc::open(&mut source).unwrap();
    let tags = spc.parse_tags(&mut source).unwrap();
    let _ = spc::project(&tags);
  }
  for _ in 0..200 {
    let _ = spc::parse_xid6(&super::rand_bytes(256));
  }
}

/// Each record's id, and how far into the block its payload ends.
#[rustfmt::skip]
const RECORDS: &[u8] = &[
  0x02, 1, 5, 0, b'G', b'a', b'm', b'e', b'!', 0, 0, 0,
  0x11, 0, 3, 0,
  0x05, 1, 4, 0, 0x20, 0x23, 0x01, 0x15,
  0x03, 1, 2, 0, b'M', b'e', 0, 0,
  0x12, 0, 0x41, 0x01,
  0x31, 1, 4, 0, 1, 0, 0, 0,
];
const PAYLOAD_ENDS: &[(Xid6Item, usize)] = &[
  (Xid6Item::GameName, 9),
  (Xid6Item::OstDisc, 16),
  (Xid6Item::DumpDate, 24),
  (Xid6Item::ArtistName, 30),
  (Xid6Item::OstTrack, 36),
  (Xid6Item::LoopLength, 44),
];

proptest! {
  #[test]
  fn xid6_cut_short_keeps_whole_records(cut in 0..=RECORDS.len()) {
    let tags = spc::parse_xid6(&RECORDS[..cut]);
    let found: Vec<Xid6Item> = tags.iter().map(|(item, _)| item).collect();
    let expected: Vec<Xid6Item> =
      PAYLOAD_ENDS.iter().filter(|(_, end)| *end <= cut).map(|(item, _)| *item).collect();
    prop_assert_eq!(found, expected);
  }

  #[test]
  fn xid6_never_panics(block in proptest::collection::vec(any::<u8>(), 0..600)) {
    let tags = spc::parse_xid6(&block);
    prop_assert!(tags.len() <= block.len() / 4);
  }
}
