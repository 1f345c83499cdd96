//! The two output views that readers produce.
//!
//! * A [`FieldList`] is meant for showing to a person: each entry has a human
//!   readable label and a value already shaped for display.
//! * A [`MetaList`] is meant for metadata queries: each entry uses a
//!   well-known [`Property`] and keeps the value as plain data.
//!
//! The two are built independently from the same source data, and they don't
//! always agree on how a value is shaped. Both are rebuilt fresh each time a
//! reader is asked for them.

use core::fmt::{Display, Write};

/// Flags for how a [`FieldValue::DateTime`] should be shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct DateTimeFlags(pub u8);
impl DateTimeFlags {
  /// The date portion is meaningful.
  pub const HAS_DATE: Self = Self(1 << 0);
  /// The time portion is meaningful.
  pub const HAS_TIME: Self = Self(1 << 1);
  /// The timestamp is UTC rather than local time.
  pub const IS_UTC: Self = Self(1 << 2);

  /// If all of the bits in `other` are also set here.
  #[inline]
  #[must_use]
  pub const fn contains(self, other: Self) -> bool {
    (self.0 & other.0) == other.0
  }
}
impl core::ops::BitOr for DateTimeFlags {
  type Output = Self;
  #[inline]
  fn bitor(self, rhs: Self) -> Self {
    Self(self.0 | rhs.0)
  }
}

/// A display value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
  /// Text.
  String(String),
  /// A number, shown in decimal.
  Numeric(u32),
  /// Unix time, in seconds.
  DateTime {
    /// Seconds since 1970-01-01 00:00:00 UTC.
    timestamp: i64,
    /// Which parts to show.
    flags: DateTimeFlags,
  },
}
impl Display for FieldValue {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::String(s) => f.write_str(s),
      Self::Numeric(n) => write!(f, "{n}"),
      Self::DateTime { timestamp, flags } => {
        let Some(dt) = chrono::DateTime::from_timestamp(*timestamp, 0) else {
          return write!(f, "{timestamp}");
        };
        let has_date = flags.contains(DateTimeFlags::HAS_DATE);
        if has_date {
          write!(f, "{}", dt.format("%Y-%m-%d"))?;
        }
        if flags.contains(DateTimeFlags::HAS_TIME) {
          if has_date {
            f.write_char(' ')?;
          }
          write!(f, "{}", dt.format("%H:%M:%S"))?;
        }
        Ok(())
      }
    }
  }
}

/// One labeled display value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
  /// Human readable label.
  pub name: &'static str,
  /// The value.
  pub value: FieldValue,
}

/// An ordered list of display fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldList(Vec<Field>);
impl FieldList {
  /// Makes an empty list.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(Vec::new())
  }

  /// Adds a text field.
  #[inline]
  pub fn add_string(&mut self, name: &'static str, value: impl Into<String>) {
    self.0.push(Field { name, value: FieldValue::String(value.into()) });
  }

  /// Adds a decimal number field.
  #[inline]
  pub fn add_string_numeric(&mut self, name: &'static str, value: u32) {
    self.0.push(Field { name, value: FieldValue::Numeric(value) });
  }

  /// Adds a date and/or time field.
  #[inline]
  pub fn add_date_time(&mut self, name: &'static str, timestamp: i64, flags: DateTimeFlags) {
    self.0.push(Field { name, value: FieldValue::DateTime { timestamp, flags } });
  }

  /// Looks up the first field with this label.
  #[inline]
  #[must_use]
  pub fn get(&self, name: &str) -> Option<&FieldValue> {
    self.0.iter().find(|field| field.name == name).map(|field| &field.value)
  }

  /// The fields, in order.
  #[inline]
  #[must_use]
  pub fn as_slice(&self) -> &[Field] {
    &self.0
  }

  /// How many fields there are.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// If there are no fields.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
impl<'a> IntoIterator for &'a FieldList {
  type Item = &'a Field;
  type IntoIter = core::slice::Iter<'a, Field>;
  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

/// Well-known metadata properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum Property {
  Title,
  Album,
  Artist,
  Publisher,
  ReleaseYear,
  CreationDate,
  Description,
  Compilation,
  DiscNumber,
  TrackNumber,
}

/// A metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaValue {
  /// Text.
  String(String),
  /// An unsigned number.
  UInt(u32),
  /// Unix time, in seconds.
  Timestamp(i64),
}

/// One metadata property and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetaEntry {
  /// Which property.
  pub property: Property,
  /// The value.
  pub value: MetaValue,
}

/// An ordered list of metadata properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MetaList(Vec<MetaEntry>);
impl MetaList {
  /// Makes an empty list.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(Vec::new())
  }

  /// Adds a text property.
  #[inline]
  pub fn add_string(&mut self, property: Property, value: impl Into<String>) {
    self.0.push(MetaEntry { property, value: MetaValue::String(value.into()) });
  }

  /// Adds a number property.
  #[inline]
  pub fn add_uint(&mut self, property: Property, value: u32) {
    self.0.push(MetaEntry { property, value: MetaValue::UInt(value) });
  }

  /// Adds a timestamp property.
  #[inline]
  pub fn add_timestamp(&mut self, property: Property, timestamp: i64) {
    self.0.push(MetaEntry { property, value: MetaValue::Timestamp(timestamp) });
  }

  /// Looks up the first entry for this property.
  #[inline]
  #[must_use]
  pub fn get(&self, property: Property) -> Option<&MetaValue> {
    self.0.iter().find(|entry| entry.property == property).map(|entry| &entry.value)
  }

  /// The entries, in order.
  #[inline]
  #[must_use]
  pub fn as_slice(&self) -> &[MetaEntry] {
    &self.0
  }

  /// How many entries there are.
  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// If there are no entries.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
impl<'a> IntoIterator for &'a MetaList {
  type Item = &'a MetaEntry;
  type IntoIter = core::slice::Iter<'a, MetaEntry>;
  #[inline]
  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

#[test]
fn test_field_value_display() {
  let date_only = FieldValue::DateTime {
    timestamp: 1_673_740_800,
    flags: DateTimeFlags::HAS_DATE | DateTimeFlags::IS_UTC,
  };
  assert_eq!(date_only.to_string(), "2023-01-15");
  let both = FieldValue::DateTime {
    timestamp: 1_673_740_800 + 3661,
    flags: DateTimeFlags::HAS_DATE | DateTimeFlags::HAS_TIME,
  };
  assert_eq!(both.to_string(), "2023-01-15 01:01:01");
  assert_eq!(FieldValue::Numeric(1995).to_string(), "1995");
}
