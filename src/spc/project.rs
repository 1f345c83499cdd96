use super::*;
use crate::{DateTimeFlags, FieldList, MetaList, Property};

/// How a tag is shown in the field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldShape {
  Text,
  Numeric,
  Date,
  Emulator,
  OstTrack,
}

static SPC_FIELDS: [(&str, Xid6Item, FieldShape); 12] = [
  ("Song Name", Xid6Item::SongName, FieldShape::Text),
  ("Game Name", Xid6Item::GameName, FieldShape::Text),
  ("Artist", Xid6Item::ArtistName, FieldShape::Text),
  ("Copyright Year", Xid6Item::CopyrightYear, FieldShape::Numeric),
  ("Dumper", Xid6Item::DumperName, FieldShape::Text),
  ("Dump Date", Xid6Item::DumpDate, FieldShape::Date),
  ("Comments", Xid6Item::Comments, FieldShape::Text),
  ("Emulator Used", Xid6Item::EmulatorUsed, FieldShape::Emulator),
  ("OST Title", Xid6Item::OstTitle, FieldShape::Text),
  ("OST Disc #", Xid6Item::OstDisc, FieldShape::Numeric),
  ("OST Track #", Xid6Item::OstTrack, FieldShape::OstTrack),
  ("Publisher", Xid6Item::Publisher, FieldShape::Text),
];

/// How a tag is stored in the metadata list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaShape {
  Text,
  UInt,
  Timestamp,
  /// Only the high byte (the track number, without the letter).
  TrackHigh,
}

static SPC_METADATA: [(Property, Xid6Item, MetaShape); 10] = [
  (Property::Title, Xid6Item::SongName, MetaShape::Text),
  (Property::Album, Xid6Item::GameName, MetaShape::Text),
  (Property::Artist, Xid6Item::ArtistName, MetaShape::Text),
  (Property::ReleaseYear, Xid6Item::CopyrightYear, MetaShape::UInt),
  (Property::CreationDate, Xid6Item::DumpDate, MetaShape::Timestamp),
  (Property::Description, Xid6Item::Comments, MetaShape::Text),
  (Property::Compilation, Xid6Item::OstTitle, MetaShape::Text),
  (Property::DiscNumber, Xid6Item::OstDisc, MetaShape::UInt),
  (Property::TrackNumber, Xid6Item::OstTrack, MetaShape::TrackHigh),
  (Property::Publisher, Xid6Item::Publisher, MetaShape::Text),
];

/// Formats an "emulator used" value.
#[must_use]
pub fn emulator_name(id: u32) -> String {
  match SpcEmulator::from_id(id) {
    Some(emu) => emu.name().to_string(),
    None => format!("Unknown (0x{id:02X})"),
  }
}

/// Formats an OST track value: the high byte is the track number and the low
/// byte is an optional letter, shown only when it's ASCII alphanumeric.
#[must_use]
pub fn ost_track_display(value: u32) -> String {
  let track = (value >> 8) as u8;
  let letter = value as u8;
  if letter.is_ascii_alphanumeric() {
    format!("{track}{}", letter as char)
  } else {
    format!("{track}")
  }
}

/// Builds the display fields for a tag mapping.
///
/// Tags holding the wrong kind of value for their label are skipped.
#[must_use]
pub fn fields(tags: &TagMapping) -> FieldList {
  let mut out = FieldList::new();
  for (name, item, shape) in SPC_FIELDS.iter().copied() {
    match shape {
      FieldShape::Text => {
        if let Some(s) = tags.get_str(item) {
          out.add_string(name, s);
        }
      }
      FieldShape::Numeric => {
        if let Some(u) = tags.get_uint(item) {
          out.add_string_numeric(name, u);
        }
      }
      FieldShape::Date => {
        if let Some(t) = tags.get_timestamp(item) {
          out.add_date_time(name, t, DateTimeFlags::HAS_DATE | DateTimeFlags::IS_UTC);
        }
      }
      FieldShape::Emulator => {
        if let Some(u) = tags.get_uint(item) {
          out.add_string(name, emulator_name(u));
        }
      }
      FieldShape::OstTrack => {
        if let Some(u) = tags.get_uint(item) {
          out.add_string(name, ost_track_display(u));
        }
      }
    }
  }
  out
}

/// Builds the metadata properties for a tag mapping.
#[must_use]
pub fn metadata(tags: &TagMapping) -> MetaList {
  let mut out = MetaList::new();
  for (property, item, shape) in SPC_METADATA.iter().copied() {
    match shape {
      MetaShape::Text => {
        if let Some(s) = tags.get_str(item) {
          out.add_string(property, s);
        }
      }
      MetaShape::UInt => {
        if let Some(u) = tags.get_uint(item) {
          out.add_uint(property, u);
        }
      }
      MetaShape::Timestamp => {
        if let Some(t) = tags.get_timestamp(item) {
          out.add_timestamp(property, t);
        }
      }
      MetaShape::TrackHigh => {
        if let Some(u) = tags.get_uint(item) {
          out.add_uint(property, (u >> 8) & 0xFF);
        }
      }
    }
  }
  out
}

/// Builds both views at once.
#[inline]
#[must_use]
pub fn project(tags: &TagMapping) -> (FieldList, MetaList) {
  (fields(tags), metadata(tags))
}

#[test]
fn test_ost_track_display() {
  assert_eq!(ost_track_display(0x0141), "1A");
  assert_eq!(ost_track_display(0x0C00), "12");
  assert_eq!(ost_track_display(0x0C20), "12");
  assert_eq!(ost_track_display(0x0C33), "123");
}

#[test]
fn test_emulator_name() {
  assert_eq!(emulator_name(0), "Unknown");
  assert_eq!(emulator_name(1), "ZSNES");
  assert_eq!(emulator_name(2), "Snes9x");
  assert_eq!(emulator_name(0x4A), "Unknown (0x4A)");
}

#[test]
fn test_project_ost_track() {
  let mut tags = TagMapping::new();
  tags.insert_uint(Xid6Item::OstTrack, 0x0141);
  let (fields, meta) = project(&tags);
  assert_eq!(fields.get("OST Track #"), Some(&crate::FieldValue::String("1A".into())));
  assert_eq!(meta.get(Property::TrackNumber), Some(&crate::MetaValue::UInt(1)));
}

#[test]
fn test_project_skips_wrong_variants() {
  let mut tags = TagMapping::new();
  // a number under a text label, and text under a number label
  tags.insert_uint(Xid6Item::SongName, 5);
  tags.insert_str(Xid6Item::OstDisc, "two".into());
  tags.insert_str(Xid6Item::GameName, "Game".into());
  let (fields, meta) = project(&tags);
  assert_eq!(fields.len(), 1);
  assert_eq!(fields.get("Game Name"), Some(&crate::FieldValue::String("Game".into())));
  assert_eq!(meta.len(), 1);
  assert_eq!(meta.get(Property::Album), Some(&crate::MetaValue::String("Game".into())));
}

#[test]
fn test_projection_is_repeatable() {
  let mut tags = TagMapping::new();
  tags.insert_str(Xid6Item::SongName, "Test Song".into());
  tags.insert_uint(Xid6Item::EmulatorUsed, 2);
  tags.insert_timestamp(Xid6Item::DumpDate, 1_673_740_800);
  let before = tags.clone();
  let first = project(&tags);
  let second = project(&tags);
  assert_eq!(first, second);
  assert_eq!(tags, before);
  let labels: Vec<&str> = first.0.as_slice().iter().map(|f| f.name).collect();
  assert_eq!(labels, ["Song Name", "Dump Date", "Emulator Used"]);
  assert_eq!(first.0.get("Emulator Used"), Some(&crate::FieldValue::String("Snes9x".into())));
}
