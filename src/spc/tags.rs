/// Extended ID666 item ids.
///
/// The fixed ID666 tags get stored under these same ids, so both tag sources
/// end up in one [`TagMapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Xid6Item {
  SongName = 0x01,
  GameName = 0x02,
  ArtistName = 0x03,
  DumperName = 0x04,
  DumpDate = 0x05,
  EmulatorUsed = 0x06,
  Comments = 0x07,
  OstTitle = 0x10,
  OstDisc = 0x11,
  OstTrack = 0x12,
  Publisher = 0x13,
  CopyrightYear = 0x14,
  IntroLength = 0x30,
  LoopLength = 0x31,
  EndLength = 0x32,
  FadeLength = 0x33,
  MutedChannels = 0x34,
  LoopCount = 0x35,
  AmpValue = 0x36,
}
impl Xid6Item {
  /// Every item, in id order.
  pub const ALL: [Self; 19] = [
    Self::SongName,
    Self::GameName,
    Self::ArtistName,
    Self::DumperName,
    Self::DumpDate,
    Self::EmulatorUsed,
    Self::Comments,
    Self::OstTitle,
    Self::OstDisc,
    Self::OstTrack,
    Self::Publisher,
    Self::CopyrightYear,
    Self::IntroLength,
    Self::LoopLength,
    Self::EndLength,
    Self::FadeLength,
    Self::MutedChannels,
    Self::LoopCount,
    Self::AmpValue,
  ];

  /// Looks up an item by id.
  #[inline]
  #[must_use]
  pub fn from_id(id: u8) -> Option<Self> {
    Self::ALL.iter().copied().find(|item| *item as u8 == id)
  }

  /// How this item's data is stored in an xID6 block.
  #[inline]
  #[must_use]
  pub const fn kind(self) -> TagKind {
    use Xid6Item::*;
    match self {
      SongName | GameName | ArtistName | DumperName | Comments | OstTitle | Publisher => {
        TagKind::String
      }
      EmulatorUsed | OstDisc | MutedChannels | LoopCount => TagKind::Int8,
      OstTrack | CopyrightYear => TagKind::Int16,
      DumpDate => TagKind::Date,
      IntroLength | LoopLength | EndLength | FadeLength | AmpValue => TagKind::Int32,
    }
  }
}

/// The record shapes of an xID6 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKind {
  /// Text stored after the record header, length in the header.
  String,
  /// An 8-bit value stored in the record header itself.
  Int8,
  /// A 16-bit value stored in the record header itself.
  Int16,
  /// A 32-bit value stored after the record header.
  Int32,
  /// A BCD `YYYYMMDD` date stored after the record header.
  Date,
}
impl TagKind {
  /// If the payload lives after the 4 byte record header (rather than inside
  /// of it).
  #[inline]
  #[must_use]
  pub const fn payload_follows(self) -> bool {
    matches!(self, Self::String | Self::Int32 | Self::Date)
  }
}

/// An index into a [`StringTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct StrIndex(u32);

/// Append-only storage for the text values of a [`TagMapping`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StringTable(Vec<String>);
impl StringTable {
  #[inline]
  fn push(&mut self, s: String) -> StrIndex {
    let i = StrIndex(self.0.len() as u32);
    self.0.push(s);
    i
  }

  /// Gets a string by index.
  #[inline]
  #[must_use]
  pub fn get(&self, i: StrIndex) -> Option<&str> {
    self.0.get(i.0 as usize).map(String::as_str)
  }

  /// How many strings are stored.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// If no strings are stored.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// The value of one decoded tag.
///
/// Text is held as an index into the owning mapping's [`StringTable`], never
/// as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagValue {
  /// Index of a text value.
  Str(StrIndex),
  /// A plain number.
  UInt(u32),
  /// Unix time, in seconds.
  Timestamp(i64),
}

/// The decoded tags of one SPC file.
///
/// Entries keep the order they were found in. When an id shows up more than
/// once the first value is kept and the later ones are ignored, so the fixed
/// ID666 fields (which are read first) win over the xID6 block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagMapping {
  entries: Vec<(Xid6Item, TagValue)>,
  strs: StringTable,
}
impl TagMapping {
  /// Makes an empty mapping.
  #[inline]
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  fn contains(&self, key: Xid6Item) -> bool {
    self.entries.iter().any(|(k, _)| *k == key)
  }

  /// Adds a text value, unless the key is already present.
  pub fn insert_str(&mut self, key: Xid6Item, s: String) {
    if self.contains(key) {
      return;
    }
    let i = self.strs.push(s);
    self.entries.push((key, TagValue::Str(i)));
  }

  /// Adds a number, unless the key is already present.
  pub fn insert_uint(&mut self, key: Xid6Item, value: u32) {
    if !self.contains(key) {
      self.entries.push((key, TagValue::UInt(value)));
    }
  }

  /// Adds a timestamp, unless the key is already present.
  pub fn insert_timestamp(&mut self, key: Xid6Item, timestamp: i64) {
    if !self.contains(key) {
      self.entries.push((key, TagValue::Timestamp(timestamp)));
    }
  }

  /// Gets the value for a key.
  #[inline]
  #[must_use]
  pub fn get(&self, key: Xid6Item) -> Option<&TagValue> {
    self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
  }

  /// Gets the text for a key, if that key holds text.
  #[inline]
  #[must_use]
  pub fn get_str(&self, key: Xid6Item) -> Option<&str> {
    match self.get(key)? {
      TagValue::Str(i) => self.strs.get(*i),
      _ => None,
    }
  }

  /// Gets the number for a key, if that key holds a number.
  #[inline]
  #[must_use]
  pub fn get_uint(&self, key: Xid6Item) -> Option<u32> {
    match self.get(key)? {
      TagValue::UInt(u) => Some(*u),
      _ => None,
    }
  }

  /// Gets the timestamp for a key, if that key holds a timestamp.
  #[inline]
  #[must_use]
  pub fn get_timestamp(&self, key: Xid6Item) -> Option<i64> {
    match self.get(key)? {
      TagValue::Timestamp(t) => Some(*t),
      _ => None,
    }
  }

  /// The strings backing the text values.
  #[inline]
  #[must_use]
  pub fn strings(&self) -> &StringTable {
    &self.strs
  }

  /// All entries, in the order they were found.
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (Xid6Item, &TagValue)> + '_ {
    self.entries.iter().map(|(k, v)| (*k, v))
  }

  /// How many entries there are.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// If there are no entries.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[test]
fn test_tag_mapping_first_value_wins() {
  let mut tags = TagMapping::new();
  tags.insert_str(Xid6Item::SongName, "first".into());
  tags.insert_str(Xid6Item::SongName, "second".into());
  tags.insert_uint(Xid6Item::OstDisc, 1);
  tags.insert_uint(Xid6Item::OstDisc, 2);
  assert_eq!(tags.len(), 2);
  assert_eq!(tags.get_str(Xid6Item::SongName), Some("first"));
  assert_eq!(tags.get_uint(Xid6Item::OstDisc), Some(1));
  // the ignored duplicate isn't left behind in the string table
  assert_eq!(tags.strings().len(), 1);
  // wrong variant lookups are just absent
  assert_eq!(tags.get_uint(Xid6Item::SongName), None);
  assert_eq!(tags.get_str(Xid6Item::OstDisc), None);
}

#[test]
fn test_xid6_item_ids() {
  for item in Xid6Item::ALL {
    assert_eq!(Xid6Item::from_id(item as u8), Some(item));
  }
  assert_eq!(Xid6Item::from_id(0x00), None);
  assert_eq!(Xid6Item::from_id(0x08), None);
  assert_eq!(Xid6Item::from_id(0xFF), None);
}
