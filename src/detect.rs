#![forbid(unsafe_code)]

//! Format detection from a header snapshot.
//!
//! Detection is pure byte comparison against a fixed magic value at a fixed
//! offset. Nothing is allocated, and nothing past the end of the snapshot is
//! ever looked at: a snapshot shorter than a format's minimum header size just
//! doesn't match that format.

use tracing::trace;

/// The formats this crate can identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum FormatId {
  /// Super NES SPC700 sound file.
  Spc,
  /// GameCube disc image.
  GameCube,
  /// Wii disc image (unencrypted header).
  Wii,
  /// GameCube image wrapped in a TGC container (found on demo discs).
  GameCubeTgc,
  /// Portable Network Graphics.
  Png,
}
impl FormatId {
  /// The fewest header bytes needed to identify this format.
  #[inline]
  #[must_use]
  pub const fn min_header_len(self) -> usize {
    match self {
      Self::Spc => 0x100,
      Self::GameCube | Self::Wii => 0x62,
      Self::GameCubeTgc => 0x40,
      Self::Png => 8,
    }
  }

  /// A short display name.
  #[inline]
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Spc => "SPC",
      Self::GameCube => "GameCube",
      Self::Wii => "Wii",
      Self::GameCubeTgc => "GameCube (TGC)",
      Self::Png => "PNG",
    }
  }
}

/// Figures out what format a header snapshot (taken from offset 0) is.
///
/// Gives `None` if nothing matched.
#[must_use]
pub fn detect(header: &[u8]) -> Option<FormatId> {
  let found = detect_inner(header);
  trace!(header_len = header.len(), ?found, "detect");
  found
}

#[allow(unused_variables)]
fn detect_inner(header: &[u8]) -> Option<FormatId> {
  #[cfg(feature = "spc")]
  if crate::spc::is_spc_header_correct(header) {
    return Some(FormatId::Spc);
  }
  #[cfg(feature = "gcn")]
  if let Some(id) = crate::gcn::detect_disc(header) {
    return Some(id);
  }
  #[cfg(feature = "png")]
  if crate::png::is_png_header_correct(header) {
    return Some(FormatId::Png);
  }
  None
}
