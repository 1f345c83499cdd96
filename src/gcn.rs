#![forbid(unsafe_code)]

//! Module for GameCube and Wii disc images.
//!
//! Both consoles use the same disc header layout. A disc is told apart by
//! which of the two magic numbers is set. Some GameCube demo discs also carry
//! games inside of "TGC" containers, which are a small header followed by an
//! embedded GameCube image.
//!
//! All multi-byte values on these discs are big-endian.
//!
//! Only the unencrypted parts of a disc are read, so this works the same on
//! retail Wii images as on GameCube images.

use bytemuck::{Pod, Zeroable};
use pack1::U32BE;
use tracing::{debug, trace};

use crate::{
  byte_source::{read_array, seek_and_read_array},
  error::truncated,
  try_pull_pod, AsciiArray, ByteSource, FieldList, FormatId, MetaError, MetaList, MetaResult,
  Property,
};

/// Magic number of a GameCube disc, at offset `0x1C`.
pub const GCN_MAGIC: u32 = 0xC233_9F3D;
/// Magic number of a Wii disc, at offset `0x18`.
pub const WII_MAGIC: u32 = 0x5D1C_9EA3;
/// Magic number of a TGC container, at offset 0.
pub const TGC_MAGIC: u32 = 0xAE0F_38A2;

/// Size of the disc header.
pub const DISC_HEADER_LEN: usize = 0x62;
/// Size of the TGC header.
pub const TGC_HEADER_LEN: usize = 0x40;
/// Where the boot block is, relative to the disc header.
pub const BOOT_BLOCK_ADDRESS: u64 = 0x420;
/// Where the boot info (`bi2.bin`) is, relative to the disc header.
pub const BOOT_INFO_ADDRESS: u64 = 0x440;
/// Where a Wii disc keeps its region setting.
pub const WII_REGION_ADDRESS: u64 = 0x4E000;

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawDiscHeader {
  pub id4: AsciiArray<4>,
  pub company: AsciiArray<2>,
  pub disc_number: u8,
  pub revision: u8,
  pub audio_streaming: u8,
  pub stream_buffer_size: u8,
  pub reserved1: [u8; 14],
  pub magic_wii: U32BE,
  pub magic_gcn: U32BE,
  pub game_title: AsciiArray<64>,
  pub hash_verify: u8,
  pub disc_no_crypto: u8,
}
const _: () = assert!(core::mem::size_of::<RawDiscHeader>() == DISC_HEADER_LEN);

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawBootBlock {
  pub dol_offset: U32BE,
  pub fst_offset: U32BE,
  pub fst_size: U32BE,
  pub fst_max_size: U32BE,
  pub fst_mem_addr: U32BE,
  pub user_pos: U32BE,
  pub user_len: U32BE,
  pub reserved: U32BE,
}
const _: () = assert!(core::mem::size_of::<RawBootBlock>() == 0x20);

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawBootInfo {
  pub debug_mon_size: U32BE,
  pub sim_mem_size: U32BE,
  pub arg_offset: U32BE,
  pub debug_flag: U32BE,
  pub trk_location: U32BE,
  pub trk_size: U32BE,
  pub region_code: U32BE,
  pub reserved1: [U32BE; 3],
  pub dol_limit: U32BE,
  pub reserved2: U32BE,
}
const _: () = assert!(core::mem::size_of::<RawBootInfo>() == 0x30);

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawFstEntry {
  pub type_and_name_offset: U32BE,
  pub a: U32BE,
  pub b: U32BE,
}
const _: () = assert!(core::mem::size_of::<RawFstEntry>() == 0x0C);

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub(crate) struct RawTgcHeader {
  pub tgc_magic: U32BE,
  pub reserved1: U32BE,
  pub header_size: U32BE,
  pub reserved2: U32BE,
  pub fst_offset: U32BE,
  pub fst_size: U32BE,
  pub fst_max_size: U32BE,
  pub dol_offset: U32BE,
  pub dol_size: U32BE,
  pub reserved3: [U32BE; 2],
  pub banner_offset: U32BE,
  pub banner_size: U32BE,
  pub reserved4: [U32BE; 3],
}
const _: () = assert!(core::mem::size_of::<RawTgcHeader>() == TGC_HEADER_LEN);

#[inline]
fn be_u32_at(bytes: &[u8], offset: usize) -> Option<u32> {
  let a: [u8; 4] = bytes.get(offset..offset + 4)?.try_into().ok()?;
  Some(u32::from_be_bytes(a))
}

/// Figures out if the bytes start with a GameCube disc, a Wii disc, or a TGC
/// container.
///
/// Disc headers need [`DISC_HEADER_LEN`] bytes and TGC headers need
/// [`TGC_HEADER_LEN`] bytes, anything shorter doesn't match.
#[must_use]
pub fn detect_disc(bytes: &[u8]) -> Option<FormatId> {
  if bytes.len() >= DISC_HEADER_LEN {
    if be_u32_at(bytes, 0x1C) == Some(GCN_MAGIC) {
      return Some(FormatId::GameCube);
    }
    if be_u32_at(bytes, 0x18) == Some(WII_MAGIC) {
      return Some(FormatId::Wii);
    }
  }
  if bytes.len() >= TGC_HEADER_LEN && be_u32_at(bytes, 0) == Some(TGC_MAGIC) {
    return Some(FormatId::GameCubeTgc);
  }
  None
}

/// A console region code, as used in `bi2.bin` and the Wii region setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum GcnRegion {
  /// Japan and Taiwan.
  Japan,
  Usa,
  /// Europe and Australia.
  Europe,
  RegionFree,
  SouthKorea,
}
impl GcnRegion {
  /// Looks up a region code.
  #[inline]
  #[must_use]
  pub const fn from_code(code: u32) -> Option<Self> {
    Some(match code {
      0 => Self::Japan,
      1 => Self::Usa,
      2 => Self::Europe,
      3 => Self::RegionFree,
      4 => Self::SouthKorea,
      _ => return None,
    })
  }

  /// The display name.
  #[inline]
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Japan => "Japan",
      Self::Usa => "USA",
      Self::Europe => "Europe",
      Self::RegionFree => "Region-Free",
      Self::SouthKorea => "South Korea",
    }
  }
}

/// The disc header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct DiscHeader {
  pub id4: AsciiArray<4>,
  /// Two character publisher code.
  pub company: AsciiArray<2>,
  /// Zero based.
  pub disc_number: u8,
  pub revision: u8,
  pub audio_streaming: u8,
  pub stream_buffer_size: u8,
  pub magic_wii: u32,
  pub magic_gcn: u32,
  pub game_title: AsciiArray<64>,
  pub hash_verify: u8,
  pub disc_no_crypto: u8,
}
impl DiscHeader {
  /// The full six character game id (`id4` + `company`).
  #[inline]
  #[must_use]
  pub fn id6(&self) -> AsciiArray<6> {
    let [a, b, c, d] = self.id4.0;
    let [e, f] = self.company.0;
    AsciiArray([a, b, c, d, e, f])
  }

  /// If this is a Wii disc (rather than a GameCube disc).
  #[inline]
  #[must_use]
  pub const fn is_wii(&self) -> bool {
    self.magic_wii == WII_MAGIC
  }
}
impl TryFrom<&[u8]> for DiscHeader {
  type Error = MetaError;
  #[inline]
  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    let (raw, _) = try_pull_pod::<RawDiscHeader>(bytes).ok_or_else(|| truncated("disc header"))?;
    Ok(Self {
      id4: raw.id4,
      company: raw.company,
      disc_number: raw.disc_number,
      revision: raw.revision,
      audio_streaming: raw.audio_streaming,
      stream_buffer_size: raw.stream_buffer_size,
      magic_wii: raw.magic_wii.get(),
      magic_gcn: raw.magic_gcn.get(),
      game_title: raw.game_title,
      hash_verify: raw.hash_verify,
      disc_no_crypto: raw.disc_no_crypto,
    })
  }
}

/// The boot block: where the main executable and the file table are.
///
/// On Wii discs the offsets and the FST size are stored shifted right by 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct BootBlock {
  pub dol_offset: u32,
  pub fst_offset: u32,
  pub fst_size: u32,
  pub fst_max_size: u32,
  pub fst_mem_addr: u32,
  pub user_pos: u32,
  pub user_len: u32,
}
impl TryFrom<&[u8]> for BootBlock {
  type Error = MetaError;
  #[inline]
  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    let (raw, _) = try_pull_pod::<RawBootBlock>(bytes).ok_or_else(|| truncated("boot block"))?;
    Ok(Self {
      dol_offset: raw.dol_offset.get(),
      fst_offset: raw.fst_offset.get(),
      fst_size: raw.fst_size.get(),
      fst_max_size: raw.fst_max_size.get(),
      fst_mem_addr: raw.fst_mem_addr.get(),
      user_pos: raw.user_pos.get(),
      user_len: raw.user_len.get(),
    })
  }
}

/// The boot info (`bi2.bin`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct BootInfo {
  pub debug_mon_size: u32,
  pub sim_mem_size: u32,
  pub arg_offset: u32,
  pub debug_flag: u32,
  pub trk_location: u32,
  pub trk_size: u32,
  /// See [`GcnRegion`].
  pub region_code: u32,
  /// Max total size of the executable's sections, 0 for no limit.
  pub dol_limit: u32,
}
impl TryFrom<&[u8]> for BootInfo {
  type Error = MetaError;
  #[inline]
  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    let (raw, _) = try_pull_pod::<RawBootInfo>(bytes).ok_or_else(|| truncated("boot info"))?;
    Ok(Self {
      debug_mon_size: raw.debug_mon_size.get(),
      sim_mem_size: raw.sim_mem_size.get(),
      arg_offset: raw.arg_offset.get(),
      debug_flag: raw.debug_flag.get(),
      trk_location: raw.trk_location.get(),
      trk_size: raw.trk_size.get(),
      region_code: raw.region_code.get(),
      dol_limit: raw.dol_limit.get(),
    })
  }
}

/// One entry of the file system table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FstEntry {
  /// A directory.
  Dir {
    /// Offset of the name in the string table.
    name_offset: u32,
    /// Index of the parent directory. Unused in the root entry.
    parent_index: u32,
    /// Index of the first entry that's *not* in this directory. In the root
    /// entry, this is the total entry count.
    next_index: u32,
  },
  /// A file.
  File {
    /// Offset of the name in the string table.
    name_offset: u32,
    /// File offset (shifted right by 2 on Wii).
    offset: u32,
    /// File size in bytes.
    size: u32,
  },
}
impl FstEntry {
  /// Size of one entry.
  pub const LEN: usize = 0x0C;

  /// Offset of the name in the string table.
  #[inline]
  #[must_use]
  pub const fn name_offset(&self) -> u32 {
    match self {
      Self::Dir { name_offset, .. } | Self::File { name_offset, .. } => *name_offset,
    }
  }
}
impl TryFrom<&[u8]> for FstEntry {
  type Error = MetaError;
  #[inline]
  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    let (raw, _) = try_pull_pod::<RawFstEntry>(bytes).ok_or_else(|| truncated("FST entry"))?;
    let type_and_name = raw.type_and_name_offset.get();
    let name_offset = type_and_name & 0x00FF_FFFF;
    Ok(if (type_and_name >> 24) != 0 {
      Self::Dir { name_offset, parent_index: raw.a.get(), next_index: raw.b.get() }
    } else {
      Self::File { name_offset, offset: raw.a.get(), size: raw.b.get() }
    })
  }
}

/// The TGC container header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct TgcHeader {
  pub tgc_magic: u32,
  /// Where the embedded disc image starts (usually `0x8000`).
  pub header_size: u32,
  pub fst_offset: u32,
  pub fst_size: u32,
  pub fst_max_size: u32,
  pub dol_offset: u32,
  pub dol_size: u32,
  pub banner_offset: u32,
  pub banner_size: u32,
}
impl TryFrom<&[u8]> for TgcHeader {
  type Error = MetaError;
  #[inline]
  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    let (raw, _) = try_pull_pod::<RawTgcHeader>(bytes).ok_or_else(|| truncated("TGC header"))?;
    Ok(Self {
      tgc_magic: raw.tgc_magic.get(),
      header_size: raw.header_size.get(),
      fst_offset: raw.fst_offset.get(),
      fst_size: raw.fst_size.get(),
      fst_max_size: raw.fst_max_size.get(),
      dol_offset: raw.dol_offset.get(),
      dol_size: raw.dol_size.get(),
      banner_offset: raw.banner_offset.get(),
      banner_size: raw.banner_size.get(),
    })
  }
}

/// A reader for one GameCube or Wii disc image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameCube {
  format: FormatId,
  /// Where the disc header is: 0, or the TGC header size.
  disc_offset: u64,
  tgc: Option<TgcHeader>,
  disc: DiscHeader,
  boot_block: Option<BootBlock>,
  boot_info: Option<BootInfo>,
  region: Option<u32>,
}
impl GameCube {
  /// Reads and checks the headers.
  ///
  /// The disc header has to be there. The boot block, boot info, and Wii
  /// region setting are optional: if they can't be read they're just left
  /// unknown.
  pub fn open<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<Self> {
    source.rewind()?;
    let mut head = [0_u8; DISC_HEADER_LEN];
    let got = source.read(&mut head)?;
    let format = detect_disc(&head[..got]).ok_or_else(|| {
      if got < DISC_HEADER_LEN {
        truncated("disc header")
      } else {
        MetaError::NotSupported
      }
    })?;

    let (tgc, disc_offset, disc) = if format == FormatId::GameCubeTgc {
      let tgc = TgcHeader::try_from(&head[..got])?;
      let disc_offset = u64::from(tgc.header_size);
      let disc_bytes: [u8; DISC_HEADER_LEN] = seek_and_read_array(source, disc_offset)?
        .ok_or_else(|| truncated("embedded disc header"))?;
      let disc = DiscHeader::try_from(&disc_bytes[..])?;
      if disc.magic_gcn != GCN_MAGIC {
        debug!(header_size = tgc.header_size, "TGC holds no GameCube disc header");
        return Err(MetaError::NotSupported);
      }
      (Some(tgc), disc_offset, disc)
    } else {
      if got < DISC_HEADER_LEN {
        return Err(truncated("disc header"));
      }
      (None, 0, DiscHeader::try_from(&head[..])?)
    };

    let boot_block = seek_and_read_array::<S, 0x20>(source, disc_offset + BOOT_BLOCK_ADDRESS)?
      .and_then(|b| BootBlock::try_from(&b[..]).ok());
    let boot_info = seek_and_read_array::<S, 0x30>(source, disc_offset + BOOT_INFO_ADDRESS)?
      .and_then(|b| BootInfo::try_from(&b[..]).ok());
    let region = if disc.is_wii() {
      seek_and_read_array::<S, 4>(source, WII_REGION_ADDRESS)?.map(u32::from_be_bytes)
    } else {
      boot_info.map(|bi| bi.region_code)
    };
    if region.is_none() {
      trace!("region setting couldn't be read");
    }

    debug!(?format, id6 = %disc.id6(), ?region, "opened disc");
    Ok(Self { format, disc_offset, tgc, disc, boot_block, boot_info, region })
  }

  /// Which kind of disc image this is.
  #[inline]
  #[must_use]
  pub const fn format(&self) -> FormatId {
    self.format
  }

  /// The disc header.
  #[inline]
  #[must_use]
  pub const fn disc_header(&self) -> &DiscHeader {
    &self.disc
  }

  /// The TGC header, for TGC containers.
  #[inline]
  #[must_use]
  pub const fn tgc_header(&self) -> Option<&TgcHeader> {
    self.tgc.as_ref()
  }

  /// The boot block, if it could be read.
  #[inline]
  #[must_use]
  pub const fn boot_block(&self) -> Option<&BootBlock> {
    self.boot_block.as_ref()
  }

  /// The boot info, if it could be read.
  #[inline]
  #[must_use]
  pub const fn boot_info(&self) -> Option<&BootInfo> {
    self.boot_info.as_ref()
  }

  /// The raw region code, if it could be read.
  #[inline]
  #[must_use]
  pub const fn region_code(&self) -> Option<u32> {
    self.region
  }

  /// Reads the root entry of the file system table.
  ///
  /// Gives `None` if there's no boot block, or the table isn't where the
  /// boot block says.
  pub fn read_fst_root<S: ByteSource + ?Sized>(
    &self, source: &mut S,
  ) -> MetaResult<Option<FstEntry>> {
    let Some(boot_block) = &self.boot_block else {
      return Ok(None);
    };
    let mut fst_offset = u64::from(boot_block.fst_offset);
    if self.disc.is_wii() {
      fst_offset <<= 2;
    }
    let at = self.disc_offset + fst_offset;
    let Some(bytes) = seek_and_read_array::<S, { FstEntry::LEN }>(source, at)? else {
      return Ok(None);
    };
    Ok(FstEntry::try_from(&bytes[..]).ok())
  }

  /// Builds the display fields.
  #[must_use]
  pub fn fields(&self) -> FieldList {
    let mut out = FieldList::new();
    out.add_string("Title", self.disc.game_title.to_display_string());
    out.add_string("Game ID", self.disc.id6().to_display_string());
    out.add_string("Publisher", self.disc.company.to_display_string());
    out.add_string_numeric("Disc #", u32::from(self.disc.disc_number) + 1);
    out.add_string_numeric("Revision", u32::from(self.disc.revision));
    let region = match self.region {
      Some(code) => match GcnRegion::from_code(code) {
        Some(r) => r.name().to_string(),
        None => format!("Unknown (0x{code:08X})"),
      },
      None => "Unknown".to_string(),
    };
    out.add_string("Region", region);
    out
  }

  /// Builds the metadata properties.
  #[must_use]
  pub fn metadata(&self) -> MetaList {
    let mut out = MetaList::new();
    if !self.disc.game_title.is_blank() {
      out.add_string(Property::Title, self.disc.game_title.to_display_string());
    }
    if !self.disc.company.is_blank() {
      out.add_string(Property::Publisher, self.disc.company.to_display_string());
    }
    out
  }
}

/// Reads just enough of a source to tell what kind of disc it is.
pub fn detect_disc_source<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<Option<FormatId>> {
  source.rewind()?;
  Ok(read_array::<S, DISC_HEADER_LEN>(source)?.and_then(|head| detect_disc(&head)))
}

#[cfg(test)]
pub(crate) fn test_disc(wii: bool) -> Vec<u8> {
  let mut disc = vec![0_u8; 0x4E004];
  disc[..6].copy_from_slice(b"GALE01");
  disc[6] = 0;
  disc[7] = 2;
  if wii {
    disc[0x18..0x1C].copy_from_slice(&WII_MAGIC.to_be_bytes());
    disc[0x4E000..0x4E004].copy_from_slice(&2_u32.to_be_bytes());
  } else {
    disc[0x1C..0x20].copy_from_slice(&GCN_MAGIC.to_be_bytes());
  }
  disc[0x20..0x20 + 18].copy_from_slice(b"Super Smash Bros. ");
  // boot block: FST at 0x1000
  disc[0x424..0x428].copy_from_slice(&0x1000_u32.to_be_bytes());
  // boot info: region USA
  disc[0x440 + 24..0x440 + 28].copy_from_slice(&1_u32.to_be_bytes());
  // FST root: a directory with 7 entries
  disc[0x1000] = 1;
  disc[0x1008..0x100C].copy_from_slice(&7_u32.to_be_bytes());
  disc
}

#[test]
fn test_detect_disc() {
  let gcn = test_disc(false);
  assert_eq!(detect_disc(&gcn), Some(FormatId::GameCube));
  assert_eq!(detect_disc(&gcn[..DISC_HEADER_LEN - 1]), None);
  let wii = test_disc(true);
  assert_eq!(detect_disc(&wii[..DISC_HEADER_LEN]), Some(FormatId::Wii));
  let mut tgc = [0_u8; TGC_HEADER_LEN];
  tgc[..4].copy_from_slice(&TGC_MAGIC.to_be_bytes());
  assert_eq!(detect_disc(&tgc), Some(FormatId::GameCubeTgc));
  assert_eq!(detect_disc(&tgc[..TGC_HEADER_LEN - 1]), None);
}

#[test]
fn test_gamecube_open() {
  let mut cursor = std::io::Cursor::new(test_disc(false));
  let gcn = GameCube::open(&mut cursor).unwrap();
  assert_eq!(gcn.format(), FormatId::GameCube);
  assert_eq!(gcn.disc_header().id6().0, *b"GALE01");
  assert_eq!(gcn.region_code(), Some(1));
  let fields = gcn.fields();
  assert_eq!(fields.get("Title"), Some(&crate::FieldValue::String("Super Smash Bros.".into())));
  assert_eq!(fields.get("Game ID"), Some(&crate::FieldValue::String("GALE01".into())));
  assert_eq!(fields.get("Publisher"), Some(&crate::FieldValue::String("01".into())));
  assert_eq!(fields.get("Disc #"), Some(&crate::FieldValue::Numeric(1)));
  assert_eq!(fields.get("Revision"), Some(&crate::FieldValue::Numeric(2)));
  assert_eq!(fields.get("Region"), Some(&crate::FieldValue::String("USA".into())));
  let root = gcn.read_fst_root(&mut cursor).unwrap();
  assert_eq!(root, Some(FstEntry::Dir { name_offset: 0, parent_index: 0, next_index: 7 }));
}

#[test]
fn test_wii_region_setting() {
  let mut cursor = std::io::Cursor::new(test_disc(true));
  let wii = GameCube::open(&mut cursor).unwrap();
  assert_eq!(wii.format(), FormatId::Wii);
  assert_eq!(wii.region_code(), Some(2));
  assert_eq!(wii.fields().get("Region"), Some(&crate::FieldValue::String("Europe".into())));

  // cut off before the region setting
  let mut short = test_disc(true);
  short.truncate(0x4E002);
  let wii = GameCube::open(&mut std::io::Cursor::new(short)).unwrap();
  assert_eq!(wii.region_code(), None);
  assert_eq!(wii.fields().get("Region"), Some(&crate::FieldValue::String("Unknown".into())));
}

#[test]
fn test_tgc_container() {
  let mut file = vec![0_u8; 0x8000];
  file[..4].copy_from_slice(&TGC_MAGIC.to_be_bytes());
  file[8..12].copy_from_slice(&0x8000_u32.to_be_bytes());
  file.extend_from_slice(&test_disc(false)[..0x2000]);
  let mut cursor = std::io::Cursor::new(file);
  assert_eq!(detect_disc_source(&mut cursor).unwrap(), Some(FormatId::GameCubeTgc));
  let gcn = GameCube::open(&mut cursor).unwrap();
  assert_eq!(gcn.format(), FormatId::GameCubeTgc);
  assert_eq!(gcn.tgc_header().map(|t| t.header_size), Some(0x8000));
  assert_eq!(gcn.region_code(), Some(1));
  assert_eq!(gcn.metadata().get(Property::Publisher), Some(&crate::MetaValue::String("01".into())));
  let root = gcn.read_fst_root(&mut cursor).unwrap();
  assert!(matches!(root, Some(FstEntry::Dir { next_index: 7, .. })));
}

#[test]
fn test_fst_entry_decode() {
  let file = [0x00, 0x00, 0x01, 0x23, 0, 0, 0x10, 0, 0, 0, 0, 0x40];
  assert_eq!(
    FstEntry::try_from(&file[..]).unwrap(),
    FstEntry::File { name_offset: 0x123, offset: 0x1000, size: 0x40 }
  );
  assert!(FstEntry::try_from(&file[..11]).is_err());
}
