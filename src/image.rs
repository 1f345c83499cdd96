#![forbid(unsafe_code)]

//! Provides the decoded image type.

use crate::{MetaError, MetaResult};

/// The largest width or height that will be decoded.
pub const MAX_IMAGE_DIMENSION: u32 = 32768;

/// Rows of a [`PixelBuffer`] start on multiples of this many bytes.
pub const STRIDE_ALIGN: usize = 16;

/// The pixel layouts a [`PixelBuffer`] can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PixelFormat {
  /// One byte per pixel, an index into a 256 entry palette.
  Ci8,
  /// Four bytes per pixel, stored as `[b, g, r, a]` (which is `0xAARRGGBB`
  /// when read as a little-endian `u32`).
  Argb32,
}
impl PixelFormat {
  /// Bytes used by each pixel.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self) -> usize {
    match self {
      Self::Ci8 => 1,
      Self::Argb32 => 4,
    }
  }
}

/// One ARGB32 pixel, in memory order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
#[allow(missing_docs)]
pub struct Argb32 {
  pub b: u8,
  pub g: u8,
  pub r: u8,
  pub a: u8,
}
impl Argb32 {
  /// Makes a pixel from an `0xAARRGGBB` value.
  #[inline]
  #[must_use]
  pub const fn from_u32(argb: u32) -> Self {
    let [b, g, r, a] = argb.to_le_bytes();
    Self { b, g, r, a }
  }

  /// The pixel as an `0xAARRGGBB` value.
  #[inline]
  #[must_use]
  pub const fn to_u32(self) -> u32 {
    u32::from_le_bytes([self.b, self.g, self.r, self.a])
  }
}

/// How many bits of each channel actually carry information.
///
/// A channel that isn't present in the source image is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct SignificantBits {
  pub red: u8,
  pub green: u8,
  pub blue: u8,
  pub gray: u8,
  pub alpha: u8,
}

/// Bytes per row for the given width, rounded up to [`STRIDE_ALIGN`].
#[inline]
#[must_use]
pub const fn stride_for(width: u32, format: PixelFormat) -> usize {
  crate::align_up(width as usize * format.bytes_per_pixel(), STRIDE_ALIGN)
}

/// A decoded image.
///
/// Rows are stored top to bottom, each one `stride` bytes long. Bytes past
/// the end of a row's pixels (up to the stride) are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
  /// Width in pixels.
  pub width: u32,
  /// Height in pixels.
  pub height: u32,
  /// Bytes per row.
  pub stride: usize,
  /// Pixel layout.
  pub format: PixelFormat,
  /// All the rows.
  pub bits: Vec<u8>,
  /// 256 `0xAARRGGBB` entries for [`PixelFormat::Ci8`], empty otherwise.
  pub palette: Vec<u32>,
  #[allow(missing_docs)]
  pub sbit: SignificantBits,
}
impl Default for PixelFormat {
  #[inline]
  fn default() -> Self {
    Self::Argb32
  }
}
impl PixelBuffer {
  /// Makes an all-zero buffer.
  ///
  /// CI8 buffers get an all-zero palette of 256 entries.
  ///
  /// ## Failure
  /// * Either dimension is 0: [`MetaError::Malformed`].
  /// * Either dimension is above [`MAX_IMAGE_DIMENSION`]:
  ///   [`MetaError::ResourceLimitExceeded`].
  /// * The allocation fails: [`MetaError::Alloc`].
  pub fn try_new(width: u32, height: u32, format: PixelFormat) -> MetaResult<Self> {
    check_dimensions(width, height)?;
    let stride = stride_for(width, format);
    let bits = zeroed_vec(stride.checked_mul(height as usize).ok_or(MetaError::Alloc)?)?;
    let palette = match format {
      PixelFormat::Ci8 => {
        let mut p = Vec::new();
        p.try_reserve_exact(256)?;
        p.resize(256, 0_u32);
        p
      }
      PixelFormat::Argb32 => Vec::new(),
    };
    Ok(Self { width, height, stride, format, bits, palette, sbit: SignificantBits::default() })
  }

  /// The pixel bytes of one row (not including the stride padding).
  #[inline]
  #[must_use]
  pub fn row(&self, y: u32) -> Option<&[u8]> {
    if y >= self.height {
      return None;
    }
    let start = y as usize * self.stride;
    self.bits.get(start..start + self.width as usize * self.format.bytes_per_pixel())
  }

  /// Mutable pixel bytes of one row.
  #[inline]
  #[must_use]
  pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
    if y >= self.height {
      return None;
    }
    let start = y as usize * self.stride;
    let len = self.width as usize * self.format.bytes_per_pixel();
    self.bits.get_mut(start..start + len)
  }

  /// The bytes of a single pixel.
  #[inline]
  #[must_use]
  pub fn pixel_bytes_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
    if x >= self.width {
      return None;
    }
    let bpp = self.format.bytes_per_pixel();
    let start = x as usize * bpp;
    self.row_mut(y)?.get_mut(start..start + bpp)
  }

  /// The color of a pixel as `0xAARRGGBB`, going through the palette for
  /// CI8 buffers.
  #[must_use]
  pub fn argb_at(&self, x: u32, y: u32) -> Option<u32> {
    if x >= self.width {
      return None;
    }
    let row = self.row(y)?;
    match self.format {
      PixelFormat::Ci8 => {
        let i = *row.get(x as usize)?;
        self.palette.get(usize::from(i)).copied()
      }
      PixelFormat::Argb32 => {
        let start = x as usize * 4;
        let px: Argb32 = bytemuck::try_pod_read_unaligned(row.get(start..start + 4)?).ok()?;
        Some(px.to_u32())
      }
    }
  }
}

/// Checks width and height against the allowed range.
pub(crate) fn check_dimensions(width: u32, height: u32) -> MetaResult<()> {
  if width == 0 || height == 0 {
    return Err(crate::error::malformed(format!("image dimensions {width}x{height}")));
  }
  for (what, actual) in [("image width", width), ("image height", height)] {
    if actual > MAX_IMAGE_DIMENSION {
      return Err(MetaError::ResourceLimitExceeded {
        what,
        actual: u64::from(actual),
        limit: u64::from(MAX_IMAGE_DIMENSION),
      });
    }
  }
  Ok(())
}

/// Allocates a zeroed buffer, reporting allocation failure as an error.
pub(crate) fn zeroed_vec(len: usize) -> MetaResult<Vec<u8>> {
  let mut v = Vec::new();
  v.try_reserve_exact(len)?;
  v.resize(len, 0_u8);
  Ok(v)
}

#[test]
fn test_stride_rounding() {
  assert_eq!(stride_for(1, PixelFormat::Ci8), 16);
  assert_eq!(stride_for(16, PixelFormat::Ci8), 16);
  assert_eq!(stride_for(17, PixelFormat::Ci8), 32);
  assert_eq!(stride_for(5, PixelFormat::Argb32), 32);
}

#[test]
fn test_pixel_buffer_limits() {
  assert!(matches!(PixelBuffer::try_new(0, 1, PixelFormat::Ci8), Err(MetaError::Malformed(_))));
  assert!(matches!(
    PixelBuffer::try_new(1, MAX_IMAGE_DIMENSION + 1, PixelFormat::Ci8),
    Err(MetaError::ResourceLimitExceeded { what: "image height", .. })
  ));
  let buf = PixelBuffer::try_new(3, 2, PixelFormat::Ci8).unwrap();
  assert_eq!(buf.palette.len(), 256);
  assert_eq!(buf.bits.len(), 32);
  assert_eq!(buf.row(1).map(<[u8]>::len), Some(3));
  assert_eq!(buf.row(2), None);
}

#[test]
fn test_argb_byte_order() {
  let mut buf = PixelBuffer::try_new(1, 1, PixelFormat::Argb32).unwrap();
  let px = Argb32 { r: 0x11, g: 0x22, b: 0x33, a: 0x44 };
  buf.pixel_bytes_mut(0, 0).unwrap().copy_from_slice(bytemuck::bytes_of(&px));
  assert_eq!(&buf.bits[..4], &[0x33, 0x22, 0x11, 0x44]);
  assert_eq!(buf.argb_at(0, 0), Some(0x4411_2233));
  assert_eq!(Argb32::from_u32(0x4411_2233), px);
}
