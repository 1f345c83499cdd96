#![forbid(unsafe_code)]

//! Module for decoding PNG data into a [`PixelBuffer`].
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! ## Output Formats
//!
//! The output format depends on the PNG's color type:
//!
//! * Grayscale becomes [`Ci8`](PixelFormat::Ci8) with a linear gray ramp as
//!   the palette. Bit depths below 8 are scaled up to 8 bits by bit
//!   replication, 16 bit samples keep their high byte.
//! * Indexed becomes [`Ci8`](PixelFormat::Ci8), with the `PLTE` colors and the
//!   `tRNS` alphas merged into the palette.
//! * Grayscale + Alpha, RGB, and RGBA become [`Argb32`](PixelFormat::Argb32).
//!
//! ## Decoding Process
//!
//! 1) The chunks are streamed from the [`ByteSource`]. Only `IHDR`, `PLTE`,
//!    `tRNS`, `sBIT`, and `IDAT` are kept, everything else is skipped over.
//!    Chunk data is read in bounded pieces, so a chunk that claims to be huge
//!    can't make us allocate more than the source actually has.
//! 2) All of the `IDAT` data is inflated as a single Zlib stream into a
//!    buffer that's exactly the size the header calls for.
//! 3) Each filtered line is unfiltered in place and each pixel is written
//!    straight into its final spot, which also undoes Adam7 interlacing.
//!
//! ## Parsing Errors
//!
//! Unlike a lot of PNG decoders, this one is strict about missing data: if
//! the source runs out early, or the image data inflates to less than the
//! header requires, the decode fails. You never get a partial image.
//!
//! We still ignore some spec violations that don't affect the pixels:
//!
//! * Both of the checksum systems (CRC32 on each chunk, and Adler32 on the
//!   Zlib stream).
//! * Chunk ordering rules, other than `IHDR` having to come first.
//! * Duplicate chunks (you get the first one).
//! * Extra Zlib data past what the image needs.

use core::fmt::{Debug, Write};

use bitfrob::u8_replicate_bits;
use miniz_oxide::inflate::{decompress_slice_iter_to_slice, TINFLStatus};
use tracing::{debug, trace};

use crate::{
  byte_source::{read_array, seek_and_read_array},
  error::{malformed, truncated},
  image::{check_dimensions, zeroed_vec},
  Argb32, ByteSource, MetaError, MetaResult, PixelBuffer, PixelFormat, SignificantBits,
};

mod unfilter;
use unfilter::*;

/// The 8 bytes at the start of all PNG data.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Chunk lengths above this are invalid.
pub const MAX_CHUNK_LEN: u32 = 0x7FFF_FFFF;

/// Chunk data gets read in pieces of at most this many bytes.
const READ_PIECE: usize = 64 * 1024;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
struct PngRawChunkType([u8; 4]);
#[allow(nonstandard_style)]
impl PngRawChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const sBIT: Self = Self(*b"sBIT");
}
impl Debug for PngRawChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for u in self.0 {
      f.write_char(u as char)?;
    }
    Ok(())
  }
}

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// The bit depths allowed with this color type.
  #[inline]
  #[must_use]
  pub const fn allowed_bit_depths(self) -> &'static [u8] {
    match self {
      Self::Y => &[1, 2, 4, 8, 16],
      Self::Index => &[1, 2, 4, 8],
      Self::RGB | Self::YA | Self::RGBA => &[8, 16],
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = MetaError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      _ => return Err(malformed(format!("PNG color type {value}"))),
    })
  }
}

/// Image Header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IHDR {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// if the image data is stored interlaced.
  ///
  /// please don't make new interlaced images, they're terrible.
  pub is_interlaced: bool,
}
impl IHDR {
  /// Bits used by each pixel of the filtered data.
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Filtering works on whole pixels when pixels are more than 1 byte each,
  /// and on single bytes otherwise.
  #[inline]
  #[must_use]
  pub const fn filter_chunk_size(&self) -> usize {
    let bytes = self.bits_per_pixel() / 8;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Each line is a filter byte (1) + pixel data. When pixels are less than 8
  /// bits per channel it's possible to end up with partial bytes on the end,
  /// so we must round up.
  #[inline]
  #[must_use]
  pub const fn bytes_per_filterline(&self, width: u32) -> usize {
    1 + ((self.bits_per_pixel() * (width as usize)) + 7) / 8
  }

  /// Gets the buffer size required to perform Zlib decompression.
  ///
  /// Interlaced images add up the size of all 7 reduced images.
  pub fn get_zlib_decompression_requirement(&self) -> MetaResult<usize> {
    let dims = reduced_image_dimensions(self.width, self.height);
    let levels = if self.is_interlaced { &dims[1..] } else { &dims[..1] };
    let mut total = 0_usize;
    for &(width, height) in levels {
      if width == 0 || height == 0 {
        continue;
      }
      total = self
        .bytes_per_filterline(width)
        .checked_mul(height as usize)
        .and_then(|bytes| total.checked_add(bytes))
        .ok_or(MetaError::Alloc)?;
    }
    Ok(total)
  }

  /// The number of bits in one sample. For indexed images that's the palette
  /// entry depth (8), not the index depth.
  #[inline]
  #[must_use]
  pub const fn sample_depth(&self) -> u8 {
    match self.color_type {
      PngColorType::Index => 8,
      _ => self.bit_depth,
    }
  }

  /// The pixel format this image decodes to.
  #[inline]
  #[must_use]
  pub const fn output_format(&self) -> PixelFormat {
    match self.color_type {
      PngColorType::Y | PngColorType::Index => PixelFormat::Ci8,
      PngColorType::YA | PngColorType::RGB | PngColorType::RGBA => PixelFormat::Argb32,
    }
  }
}
impl TryFrom<&[u8]> for IHDR {
  type Error = MetaError;
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    match value {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =>
      {
        let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
        let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
        check_dimensions(width, height)?;
        let color_type = PngColorType::try_from(*color_type)?;
        if !color_type.allowed_bit_depths().contains(bit_depth) {
          return Err(malformed(format!("bit depth {bit_depth} with {color_type:?}")));
        }
        if *compression_method != 0 {
          return Err(malformed(format!("compression method {compression_method}")));
        }
        if *filter_method != 0 {
          return Err(malformed(format!("filter method {filter_method}")));
        }
        let is_interlaced = match interlace_method {
          0 => false,
          1 => true,
          _ => return Err(malformed(format!("interlace method {interlace_method}"))),
        };
        Ok(Self { width, height, bit_depth: *bit_depth, color_type, is_interlaced })
      }
      _ => Err(malformed(format!("IHDR length {}", value.len()))),
    }
  }
}

/// Transparency data
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(nonstandard_style)]
pub struct tRNS<'b>(&'b [u8]);
impl<'b> From<&'b [u8]> for tRNS<'b> {
  #[inline]
  #[must_use]
  fn from(data: &'b [u8]) -> Self {
    Self(data)
  }
}
impl Debug for tRNS<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_tuple("tRNS").field(&self.0).field(&self.0.len()).finish()
  }
}
impl<'b> tRNS<'b> {
  /// Gets the grayscale value that is transparent.
  ///
  /// Fails when the chunk has the wrong length for grayscale.
  #[inline]
  #[must_use]
  pub const fn try_to_grayscale(&self) -> Option<u16> {
    match self.0 {
      [y0, y1] => Some(u16::from_be_bytes([*y0, *y1])),
      _ => None,
    }
  }
  /// Gets the RGB value that is transparent.
  ///
  /// Fails when the chunk has the wrong length for rgb.
  #[inline]
  #[must_use]
  pub const fn try_to_rgb(&self) -> Option<[u16; 3]> {
    match self.0 {
      [r0, r1, g0, g1, b0, b1] => Some([
        u16::from_be_bytes([*r0, *r1]),
        u16::from_be_bytes([*g0, *g1]),
        u16::from_be_bytes([*b0, *b1]),
      ]),
      _ => None,
    }
  }
  /// Gets the alpha values for each palette index.
  #[inline]
  #[must_use]
  pub const fn to_alphas(&self) -> &'b [u8] {
    self.0
  }
}

/// Palette data
///
/// Palette entries are always RGB.
///
/// If you want to have a paletted image with transparency then the transparency
/// info goes in a separate transparency chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PLTE<'b>(&'b [[u8; 3]]);
impl<'b> TryFrom<&'b [u8]> for PLTE<'b> {
  type Error = MetaError;
  #[inline]
  fn try_from(data: &'b [u8]) -> Result<Self, Self::Error> {
    match bytemuck::try_cast_slice::<u8, [u8; 3]>(data) {
      Ok(entries) if !entries.is_empty() && entries.len() <= 256 => Ok(Self(entries)),
      _ => Err(malformed(format!("PLTE length {}", data.len()))),
    }
  }
}
impl Debug for PLTE<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    // currently prints no more than 4 palette entries
    f.debug_tuple("PLTE").field(&&self.0[..self.0.len().min(4)]).field(&self.0.len()).finish()
  }
}
impl<'b> PLTE<'b> {
  /// Gets the entries as a slice.
  #[inline]
  #[must_use]
  pub fn entries(&self) -> &'b [[u8; 3]] {
    self.0
  }
}

/// Checks if the PNG's initial 8 bytes are correct.
///
/// * If this is the case, the rest of the bytes are very likely PNG data.
/// * If this is *not* the case, the rest of the bytes are very likely *not* PNG
///   data.
#[inline]
#[must_use]
pub const fn is_png_header_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// The chunks that matter for decoding, pulled out of the stream.
#[derive(Debug, Clone, Default)]
struct PngChunks {
  plte: Option<Vec<u8>>,
  trns: Option<Vec<u8>>,
  sbit: Option<Vec<u8>>,
  idat: Vec<Vec<u8>>,
}

/// Reads `len` bytes at `pos`, in bounded pieces.
fn read_chunk_data<S: ByteSource + ?Sized>(
  source: &mut S, pos: u64, len: u32, what: PngRawChunkType,
) -> MetaResult<Vec<u8>> {
  let len = len as usize;
  let mut out = Vec::new();
  while out.len() < len {
    let done = out.len();
    let piece = (len - done).min(READ_PIECE);
    out.try_reserve(piece)?;
    out.resize(done + piece, 0_u8);
    let got = source.seek_and_read(pos + done as u64, &mut out[done..])?;
    if got < piece {
      return Err(truncated(format!("{what:?} chunk data")));
    }
  }
  Ok(out)
}

/// Reads the chunk header at `pos`, giving the data length and chunk type.
fn read_chunk_header<S: ByteSource + ?Sized>(
  source: &mut S, pos: u64,
) -> MetaResult<(u32, PngRawChunkType)> {
  let [l0, l1, l2, l3, t0, t1, t2, t3] =
    seek_and_read_array::<S, 8>(source, pos)?.ok_or_else(|| truncated("PNG chunk header"))?;
  let len = u32::from_be_bytes([l0, l1, l2, l3]);
  let ty = PngRawChunkType([t0, t1, t2, t3]);
  if len > MAX_CHUNK_LEN {
    return Err(malformed(format!("{ty:?} chunk length {len:#X}")));
  }
  Ok((len, ty))
}

/// Checks the signature and reads the `IHDR`, which must be the first chunk.
fn read_signature_and_ihdr<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<IHDR> {
  source.rewind()?;
  let signature: [u8; 8] = read_array(source)?.ok_or_else(|| truncated("PNG signature"))?;
  if !is_png_header_correct(&signature) {
    return Err(MetaError::NotSupported);
  }
  let (len, ty) = read_chunk_header(source, 8)?;
  if ty != PngRawChunkType::IHDR {
    return Err(malformed(format!("first chunk is {ty:?}, not IHDR")));
  }
  if len != 13 {
    return Err(malformed(format!("IHDR length {len}")));
  }
  let data = read_chunk_data(source, 16, len, ty)?;
  IHDR::try_from(data.as_slice())
}

/// Reads just the [`IHDR`] of PNG data.
///
/// ## Failure
/// * [`MetaError::NotSupported`] if the signature is wrong.
/// * [`MetaError::Malformed`] or [`MetaError::ResourceLimitExceeded`] if the
///   header has bad values.
/// * [`MetaError::Truncated`] if the data runs out.
pub fn read_header<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<IHDR> {
  read_signature_and_ihdr(source)
}

fn read_chunks<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<PngChunks> {
  let mut chunks = PngChunks::default();
  // signature (8) + IHDR header (8) + IHDR data (13) + crc (4)
  let mut pos: u64 = 33;
  loop {
    let (len, ty) = read_chunk_header(source, pos)?;
    let data_pos = pos + 8;
    trace!(?ty, len, pos, "PNG chunk");
    match ty {
      PngRawChunkType::IEND => break,
      PngRawChunkType::IDAT => chunks.idat.push(read_chunk_data(source, data_pos, len, ty)?),
      PngRawChunkType::PLTE if chunks.plte.is_none() => {
        if len > 3 * 256 {
          return Err(malformed(format!("PLTE length {len}")));
        }
        chunks.plte = Some(read_chunk_data(source, data_pos, len, ty)?);
      }
      PngRawChunkType::tRNS if chunks.trns.is_none() && len <= 256 => {
        chunks.trns = Some(read_chunk_data(source, data_pos, len, ty)?);
      }
      PngRawChunkType::sBIT if chunks.sbit.is_none() && len <= 4 => {
        chunks.sbit = Some(read_chunk_data(source, data_pos, len, ty)?);
      }
      _ => trace!(?ty, "skipped"),
    }
    // data + crc
    pos = data_pos + u64::from(len) + 4;
  }
  Ok(chunks)
}

/// Decodes PNG data from a source.
///
/// ## Failure
/// * [`MetaError::NotSupported`] if the signature is wrong.
/// * [`MetaError::Truncated`] if the source runs out before `IEND`, or the
///   image data inflates to less than the image needs.
/// * [`MetaError::Malformed`] for bad header values, a missing palette, a
///   bad filter type, or a broken Zlib stream.
/// * [`MetaError::ResourceLimitExceeded`] if the image is too big.
/// * [`MetaError::Alloc`] if a buffer can't be allocated.
pub fn decode<S: ByteSource + ?Sized>(source: &mut S) -> MetaResult<PixelBuffer> {
  let ihdr = read_signature_and_ihdr(source)?;
  debug!(?ihdr, "PNG header");
  let chunks = read_chunks(source)?;
  decode_chunks(&ihdr, &chunks)
}

/// Decodes PNG data that's already in memory.
#[inline]
pub fn decode_png_bytes(bytes: &[u8]) -> MetaResult<PixelBuffer> {
  decode(&mut std::io::Cursor::new(bytes))
}

fn decode_chunks(ihdr: &IHDR, chunks: &PngChunks) -> MetaResult<PixelBuffer> {
  let mut image = PixelBuffer::try_new(ihdr.width, ihdr.height, ihdr.output_format())?;
  let trns = chunks.trns.as_deref().map(tRNS::from);
  let mut has_transparency = trns.is_some();

  match ihdr.color_type {
    PngColorType::Index => {
      let plte_bytes = chunks.plte.as_deref().ok_or_else(|| malformed("indexed PNG without PLTE"))?;
      let plte = PLTE::try_from(plte_bytes)?;
      let alphas = trns.map(|t| t.to_alphas()).unwrap_or(&[]);
      fill_indexed_palette(&mut image.palette, plte, alphas);
    }
    PngColorType::Y => {
      has_transparency = fill_gray_palette(
        &mut image.palette,
        ihdr.bit_depth,
        trns.and_then(|t| t.try_to_grayscale()),
      );
    }
    _ => (),
  }

  if chunks.idat.is_empty() {
    return Err(malformed("PNG without IDAT"));
  }
  let zlib_len = ihdr.get_zlib_decompression_requirement()?;
  let mut zlib_buffer = zeroed_vec(zlib_len)?;
  match decompress_slice_iter_to_slice(
    &mut zlib_buffer,
    chunks.idat.iter().map(Vec::as_slice),
    true,
    true,
  ) {
    Ok(count) if count < zlib_len => {
      return Err(truncated(format!("image data inflated to {count} of {zlib_len} bytes")));
    }
    Ok(_) => (),
    Err(TINFLStatus::HasMoreOutput) => trace!("extra image data ignored"),
    Err(TINFLStatus::FailedCannotMakeProgress | TINFLStatus::NeedsMoreInput) => {
      return Err(truncated("image data ends early"));
    }
    Err(e) => return Err(malformed(format!("image data inflate: {e:?}"))),
  }

  let trns_rgb = match ihdr.color_type {
    PngColorType::RGB => trns.and_then(|t| t.try_to_rgb()),
    _ => None,
  };
  unfilter_decompressed_data(ihdr, &mut zlib_buffer, |x, y, data| {
    store_pixel(&mut image, ihdr, trns_rgb, x, y, data)
  })?;

  image.sbit = significant_bits(ihdr, chunks.sbit.as_deref(), has_transparency);
  Ok(image)
}

/// `PLTE` colors with `tRNS` alphas. Entries with no alpha are opaque, and
/// slots past the end of the `PLTE` are left as zero.
fn fill_indexed_palette(palette: &mut [u32], plte: PLTE<'_>, alphas: &[u8]) {
  for (i, (slot, [r, g, b])) in palette.iter_mut().zip(plte.entries().iter().copied()).enumerate()
  {
    let a = alphas.get(i).copied().unwrap_or(0xFF);
    *slot = u32::from_be_bytes([a, r, g, b]);
  }
}

/// A linear gray ramp. A `tRNS` key makes its entry transparent, as long as
/// the samples are 8 bits or less (16 bit samples are cut down to their high
/// byte, so a key can't pick out a single entry).
///
/// Returns if a key was applied.
fn fill_gray_palette(palette: &mut [u32], bit_depth: u8, key: Option<u16>) -> bool {
  for (i, slot) in palette.iter_mut().enumerate() {
    *slot = 0xFF00_0000 + (i as u32) * 0x01_01_01;
  }
  let Some(key) = key else { return false };
  if bit_depth > 8 || key >= (1 << bit_depth) {
    return false;
  }
  let index = if bit_depth < 8 {
    u8_replicate_bits(u32::from(bit_depth), key as u8)
  } else {
    key as u8
  };
  match palette.get_mut(usize::from(index)) {
    Some(slot) => {
      *slot &= 0x00FF_FFFF;
      true
    }
    None => false,
  }
}

fn store_pixel(
  image: &mut PixelBuffer, ihdr: &IHDR, trns_rgb: Option<[u16; 3]>, x: u32, y: u32, data: &[u8],
) {
  let Some(px) = image.pixel_bytes_mut(x, y) else {
    return;
  };
  let sixteen = ihdr.bit_depth == 16;
  let argb = match (ihdr.color_type, sixteen, data) {
    (PngColorType::Y, _, [v, ..]) => {
      let index = if ihdr.bit_depth < 8 { u8_replicate_bits(u32::from(ihdr.bit_depth), *v) } else { *v };
      if let [out] = px {
        *out = index;
      }
      return;
    }
    (PngColorType::Index, _, [i]) => {
      if let [out] = px {
        *out = *i;
      }
      return;
    }
    (PngColorType::YA, false, [v, a]) => Argb32 { b: *v, g: *v, r: *v, a: *a },
    (PngColorType::YA, true, [v, _, a, _]) => Argb32 { b: *v, g: *v, r: *v, a: *a },
    (PngColorType::RGB, false, [r, g, b]) => {
      let full = [u16::from(*r), u16::from(*g), u16::from(*b)];
      let a = if trns_rgb == Some(full) { 0 } else { 0xFF };
      Argb32 { b: *b, g: *g, r: *r, a }
    }
    (PngColorType::RGB, true, [r0, r1, g0, g1, b0, b1]) => {
      let full = [
        u16::from_be_bytes([*r0, *r1]),
        u16::from_be_bytes([*g0, *g1]),
        u16::from_be_bytes([*b0, *b1]),
      ];
      let a = if trns_rgb == Some(full) { 0 } else { 0xFF };
      Argb32 { b: *b0, g: *g0, r: *r0, a }
    }
    (PngColorType::RGBA, false, [r, g, b, a]) => Argb32 { b: *b, g: *g, r: *r, a: *a },
    (PngColorType::RGBA, true, [r, _, g, _, b, _, a, _]) => {
      Argb32 { b: *b, g: *g, r: *r, a: *a }
    }
    _ => return,
  };
  px.copy_from_slice(bytemuck::bytes_of(&argb));
}

/// Uses a valid `sBIT` chunk if there is one, otherwise makes up values from
/// the bit depth.
///
/// `has_trns` means some pixel can come out transparent through `tRNS`. For
/// gray images that's only when the key landed on a palette entry.
fn significant_bits(ihdr: &IHDR, sbit: Option<&[u8]>, has_trns: bool) -> SignificantBits {
  let depth = ihdr.sample_depth();
  let expected_len = match ihdr.color_type {
    PngColorType::Index => 3,
    other => other.channel_count(),
  };
  let valid =
    sbit.filter(|v| v.len() == expected_len && v.iter().all(|b| (1..=depth).contains(b)));
  let from_chunk = match (ihdr.color_type, valid) {
    (PngColorType::Y, Some(&[g])) => {
      Some(SignificantBits { red: g, green: g, blue: g, gray: g, alpha: 0 })
    }
    (PngColorType::YA, Some(&[g, a])) => {
      Some(SignificantBits { red: g, green: g, blue: g, gray: g, alpha: a })
    }
    (PngColorType::RGB | PngColorType::Index, Some(&[r, g, b])) => {
      Some(SignificantBits { red: r, green: g, blue: b, gray: 0, alpha: 0 })
    }
    (PngColorType::RGBA, Some(&[r, g, b, a])) => {
      Some(SignificantBits { red: r, green: g, blue: b, gray: 0, alpha: a })
    }
    _ => None,
  };
  if let Some(sbit) = from_chunk {
    return sbit;
  }
  if sbit.is_some() {
    debug!(?sbit, "sBIT chunk ignored");
  }
  let bits = depth.min(8);
  match ihdr.color_type {
    PngColorType::Y => SignificantBits {
      red: bits,
      green: bits,
      blue: bits,
      gray: bits,
      alpha: if has_trns { 8 } else { 0 },
    },
    // only alpha survives the expansion to ARGB32 as its own channel
    PngColorType::YA => SignificantBits { red: 0, green: 0, blue: 0, gray: 0, alpha: bits },
    PngColorType::Index => SignificantBits {
      red: 8,
      green: 8,
      blue: 8,
      gray: 0,
      alpha: if has_trns { 8 } else { 0 },
    },
    PngColorType::RGB => SignificantBits {
      red: bits,
      green: bits,
      blue: bits,
      gray: 0,
      alpha: if has_trns { bits } else { 0 },
    },
    PngColorType::RGBA => {
      SignificantBits { red: bits, green: bits, blue: bits, gray: 0, alpha: bits }
    }
  }
}

#[cfg(test)]
fn test_png(ihdr: [u8; 13], extra: &[(&[u8; 4], &[u8])], raw_lines: &[u8]) -> Vec<u8> {
  fn chunk(out: &mut Vec<u8>, ty: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(ty);
    out.extend_from_slice(data);
    // CRCs aren't checked
    out.extend_from_slice(&[0; 4]);
  }
  let mut out = PNG_SIGNATURE.to_vec();
  chunk(&mut out, b"IHDR", &ihdr);
  for (ty, data) in extra {
    chunk(&mut out, ty, data);
  }
  chunk(&mut out, b"IDAT", &miniz_oxide::deflate::compress_to_vec_zlib(raw_lines, 6));
  chunk(&mut out, b"IEND", &[]);
  out
}

#[cfg(test)]
fn test_ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> [u8; 13] {
  let mut h = [0_u8; 13];
  h[..4].copy_from_slice(&width.to_be_bytes());
  h[4..8].copy_from_slice(&height.to_be_bytes());
  h[8] = bit_depth;
  h[9] = color_type;
  h[12] = interlace;
  h
}

#[test]
fn test_gray4_gets_a_ramp_palette() {
  // 3x2, two pixels per byte, each line is a filter byte + 2 bytes
  let lines = [0, 0x0F, 0x50, 0, 0xA3, 0xC0];
  let png = test_png(test_ihdr(3, 2, 4, 0, 0), &[], &lines);
  let image = decode_png_bytes(&png).unwrap();
  assert_eq!(image.format, PixelFormat::Ci8);
  assert_eq!(image.stride, 16);
  assert_eq!(image.palette.len(), 256);
  for (i, entry) in image.palette.iter().enumerate() {
    assert_eq!(*entry, 0xFF00_0000 + (i as u32) * 0x01_01_01);
  }
  assert_eq!(image.row(0), Some(&[0x00, 0xFF, 0x55][..]));
  assert_eq!(image.row(1), Some(&[0xAA, 0x33, 0xCC][..]));
  assert_eq!(image.sbit.gray, 4);
  assert_eq!(image.sbit.red, 4);
  assert_eq!(image.sbit.alpha, 0);
}

#[test]
fn test_indexed_palette_merge() {
  let plte = [255, 0, 0, 0, 255, 0, 0, 0, 255];
  let trns = [0x80];
  let lines = [0, 0, 1, 2];
  let png = test_png(test_ihdr(3, 1, 8, 3, 0), &[(b"PLTE", &plte), (b"tRNS", &trns)], &lines);
  let image = decode_png_bytes(&png).unwrap();
  assert_eq!(image.palette[0], 0x80FF_0000);
  assert_eq!(image.palette[1], 0xFF00_FF00);
  assert_eq!(image.palette[2], 0xFF00_00FF);
  assert!(image.palette[3..].iter().all(|&p| p == 0));
  assert_eq!(image.row(0), Some(&[0, 1, 2][..]));
  assert_eq!(image.sbit, SignificantBits { red: 8, green: 8, blue: 8, gray: 0, alpha: 8 });
}

#[test]
fn test_rgb_with_trns_key() {
  // Sub filter on the second pixel: 10,20,30 then +0,+0,+0
  let lines = [1, 10, 20, 30, 0, 0, 0];
  let trns = [0, 10, 0, 20, 0, 30];
  let png = test_png(test_ihdr(2, 1, 8, 2, 0), &[(b"tRNS", &trns)], &lines);
  let image = decode_png_bytes(&png).unwrap();
  assert_eq!(image.format, PixelFormat::Argb32);
  assert_eq!(image.argb_at(0, 0), Some(0x000A_141E));
  assert_eq!(image.argb_at(1, 0), Some(0x000A_141E));
  assert_eq!(image.sbit.alpha, 8);
}

#[test]
fn test_missing_image_data_is_an_error() {
  // the lines for a 4x4 RGBA image, minus the last one
  let lines = [0_u8; 17 * 3];
  let png = test_png(test_ihdr(4, 4, 8, 6, 0), &[], &lines);
  assert!(matches!(decode_png_bytes(&png), Err(MetaError::Truncated(_))));
  // and cut off in the middle of the file
  let full = test_png(test_ihdr(4, 4, 8, 6, 0), &[], &[0_u8; 17 * 4]);
  assert!(decode_png_bytes(&full).is_ok());
  for cut in [7, 20, 40, full.len() - 12] {
    assert!(decode_png_bytes(&full[..cut]).is_err(), "cut at {cut}");
  }
}

#[test]
fn test_ihdr_validation() {
  assert!(IHDR::try_from(&test_ihdr(1, 1, 8, 2, 0)[..]).is_ok());
  assert!(matches!(IHDR::try_from(&test_ihdr(0, 1, 8, 2, 0)[..]), Err(MetaError::Malformed(_))));
  assert!(matches!(
    IHDR::try_from(&test_ihdr(32769, 1, 8, 2, 0)[..]),
    Err(MetaError::ResourceLimitExceeded { .. })
  ));
  assert!(IHDR::try_from(&test_ihdr(1, 1, 4, 2, 0)[..]).is_err());
  assert!(IHDR::try_from(&test_ihdr(1, 1, 16, 3, 0)[..]).is_err());
  assert!(IHDR::try_from(&test_ihdr(1, 1, 8, 5, 0)[..]).is_err());
  assert!(IHDR::try_from(&test_ihdr(1, 1, 8, 2, 2)[..]).is_err());
  let mut bad_compression = test_ihdr(1, 1, 8, 2, 0);
  bad_compression[10] = 1;
  assert!(IHDR::try_from(&bad_compression[..]).is_err());
  assert!(IHDR::try_from(&test_ihdr(1, 1, 8, 2, 0)[..12]).is_err());
}

#[test]
fn test_huge_chunk_length_is_rejected() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend_from_slice(&0x8000_0000_u32.to_be_bytes());
  png.extend_from_slice(b"IHDR");
  assert!(matches!(decode_png_bytes(&png), Err(MetaError::Malformed(_))));
  assert!(matches!(decode_png_bytes(b"not a png"), Err(MetaError::NotSupported)));
}
