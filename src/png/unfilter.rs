//! Unfiltering and de-interlacing of inflated image data.

use super::*;

/// Where each Adam7 pass starts, and how far apart its samples are:
/// `(x_start, y_start, x_step, y_step)` for passes 1 through 7.
const ADAM7_PASSES: [(u32, u32, u32, u32); 7] = [
  (0, 0, 8, 8),
  (4, 0, 8, 8),
  (0, 4, 4, 8),
  (2, 0, 4, 4),
  (0, 2, 2, 4),
  (1, 0, 2, 2),
  (0, 1, 1, 2),
];

/// How many samples a pass takes along one axis of `full` pixels.
const fn pass_len(full: u32, start: u32, step: u32) -> u32 {
  if full > start {
    (full - start - 1) / step + 1
  } else {
    0
  }
}

/// Size of each Adam7 pass image. Entry 0 is the full image, entries 1
/// through 7 are the passes. A pass can be empty in one or both directions.
#[inline]
#[must_use]
pub(crate) const fn reduced_image_dimensions(
  full_width: u32, full_height: u32,
) -> [(u32, u32); 8] {
  let mut out = [(full_width, full_height); 8];
  let mut i = 0;
  while i < 7 {
    let (x0, y0, dx, dy) = ADAM7_PASSES[i];
    out[i + 1] = (pass_len(full_width, x0, dx), pass_len(full_height, y0, dy));
    i += 1;
  }
  out
}

/// Converts a position in a pass image into the full image position.
///
/// Level 0 is the full image, so the position passes through unchanged.
#[inline]
#[must_use]
const fn interlaced_pos_to_full_pos(
  image_level: usize, reduced_x: u32, reduced_y: u32,
) -> (u32, u32) {
  if image_level == 0 || image_level > 7 {
    return (reduced_x, reduced_y);
  }
  let (x0, y0, dx, dy) = ADAM7_PASSES[image_level - 1];
  (reduced_x * dx + x0, reduced_y * dy + y0)
}

impl IHDR {
  /// Sends one filter unit's worth of pixels to `op`.
  ///
  /// With bit depths under 8 the unit is a byte holding several pixels, which
  /// get unpacked (high bits first) and sent one at a time. Padding bits past
  /// the edge of the image are never sent.
  fn send_out_pixel<F: FnMut(u32, u32, &[u8])>(
    &self, image_level: usize, reduced_x: u32, reduced_y: u32, data: &[u8], op: &mut F,
  ) {
    let depth = u32::from(self.bit_depth);
    if depth >= 8 {
      let (image_x, image_y) = interlaced_pos_to_full_pos(image_level, reduced_x, reduced_y);
      if image_x < self.width {
        op(image_x, image_y, data);
      }
      return;
    }
    let Some(&full_data) = data.first() else {
      return;
    };
    let per_byte = 8 / depth;
    let mask = (1_u8 << depth) - 1;
    for plus_x in 0..per_byte {
      let (image_x, image_y) =
        interlaced_pos_to_full_pos(image_level, reduced_x * per_byte + plus_x, reduced_y);
      if image_x >= self.width {
        // padding bits, so the rest of this byte is too
        return;
      }
      let down_shift = 8 - depth * (plus_x + 1);
      op(image_x, image_y, &[(full_data >> down_shift) & mask]);
    }
  }
}

const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // the order of these tests is fixed by the PNG standard
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Undoes one line's filter in place.
///
/// `prev` is the already unfiltered line above, or all zeroes for the first
/// line of a pass. `unit` is the byte distance to the "left" neighbor.
fn unfilter_line(filter: u8, line: &mut [u8], prev: &[u8], unit: usize) -> MetaResult<()> {
  let up = |i: usize| prev.get(i).copied().unwrap_or(0);
  match filter {
    0 => (),
    1 => {
      for i in unit..line.len() {
        line[i] = line[i].wrapping_add(line[i - unit]);
      }
    }
    2 => {
      for (i, x) in line.iter_mut().enumerate() {
        *x = x.wrapping_add(up(i));
      }
    }
    3 => {
      for i in 0..line.len() {
        let a = if i >= unit { line[i - unit] } else { 0 };
        let avg = ((u16::from(a) + u16::from(up(i))) / 2) as u8;
        line[i] = line[i].wrapping_add(avg);
      }
    }
    4 => {
      for i in 0..line.len() {
        let (a, c) = if i >= unit { (line[i - unit], up(i - unit)) } else { (0, 0) };
        line[i] = line[i].wrapping_add(paeth_predict(a, up(i), c));
      }
    }
    _ => return Err(malformed(format!("PNG filter type {filter}"))),
  }
  Ok(())
}

/// Unfilters the inflated data in place, sending each pixel to `op` with its
/// position in the full image.
///
/// The data for each pixel is 1 byte (an index or gray value, unpacked if the
/// depth is under 8) or the full set of channel bytes, big-endian for 16 bit
/// samples.
pub(crate) fn unfilter_decompressed_data<F>(
  ihdr: &IHDR, mut decompressed: &mut [u8], mut op: F,
) -> MetaResult<()>
where
  F: FnMut(u32, u32, &[u8]),
{
  let unit = ihdr.filter_chunk_size();
  let dims = reduced_image_dimensions(ihdr.width, ihdr.height);
  let levels = if ihdr.is_interlaced { 1..8 } else { 0..1 };
  for image_level in levels {
    let (reduced_width, reduced_height) = dims[image_level];
    if reduced_width == 0 || reduced_height == 0 {
      continue;
    }
    let line_len = ihdr.bytes_per_filterline(reduced_width);
    let pass_len = line_len.checked_mul(reduced_height as usize).ok_or(MetaError::Alloc)?;
    if decompressed.len() < pass_len {
      return Err(truncated(format!("image data for pass {image_level}")));
    }
    let (pass, rest) = core::mem::take(&mut decompressed).split_at_mut(pass_len);
    decompressed = rest;
    trace!(image_level, reduced_width, reduced_height, "unfiltering");

    let zero_line = zeroed_vec(line_len - 1)?;
    let mut prev: &[u8] = &zero_line;
    for (reduced_y, line) in pass.chunks_exact_mut(line_len).enumerate() {
      let Some((filter, pixels)) = line.split_first_mut() else {
        continue;
      };
      unfilter_line(*filter, pixels, prev, unit)?;
      for (reduced_x, data) in pixels.chunks_exact(unit).enumerate() {
        ihdr.send_out_pixel(image_level, reduced_x as u32, reduced_y as u32, data, &mut op);
      }
      prev = pixels;
    }
  }
  Ok(())
}

#[test]
fn test_reduced_image_dimensions() {
  // the 8x8 Adam7 pattern, by pass number
  const PATTERN: [[usize; 8]; 8] = [
    [1, 6, 4, 6, 2, 6, 4, 6],
    [7, 7, 7, 7, 7, 7, 7, 7],
    [5, 6, 5, 6, 5, 6, 5, 6],
    [7, 7, 7, 7, 7, 7, 7, 7],
    [3, 6, 4, 6, 3, 6, 4, 6],
    [7, 7, 7, 7, 7, 7, 7, 7],
    [5, 6, 5, 6, 5, 6, 5, 6],
    [7, 7, 7, 7, 7, 7, 7, 7],
  ];
  assert_eq!(reduced_image_dimensions(0, 0), [(0, 0); 8]);
  for w in 0..20_u32 {
    for h in 0..20_u32 {
      let dims = reduced_image_dimensions(w, h);
      assert_eq!(dims[0], (w, h));
      let mut counts = [0_u32; 8];
      for y in 0..h {
        for x in 0..w {
          counts[PATTERN[y as usize % 8][x as usize % 8]] += 1;
        }
      }
      for level in 1..8 {
        let (rw, rh) = dims[level];
        assert_eq!(rw * rh, counts[level], "{w}x{h} pass {level}");
        let (fx, fy) = interlaced_pos_to_full_pos(level, 0, 0);
        if rw > 0 && rh > 0 {
          assert_eq!(PATTERN[fy as usize][fx as usize], level);
          let (lx, ly) = interlaced_pos_to_full_pos(level, rw - 1, rh - 1);
          assert!(lx < w && ly < h, "{w}x{h} pass {level}");
        }
      }
    }
  }
}

#[test]
fn test_every_pixel_is_sent_once_when_interlaced() {
  let ihdr = IHDR {
    width: 5,
    height: 3,
    bit_depth: 2,
    color_type: PngColorType::Y,
    is_interlaced: true,
  };
  let mut data = zeroed_vec(ihdr.get_zlib_decompression_requirement().unwrap()).unwrap();
  let mut seen = [[0_u8; 5]; 3];
  unfilter_decompressed_data(&ihdr, &mut data, |x, y, _| seen[y as usize][x as usize] += 1)
    .unwrap();
  assert_eq!(seen, [[1; 5]; 3]);
}

#[test]
fn test_unfilter_line_kinds() {
  let prev = [10, 20, 30, 40];
  let mut line = [1, 2, 3, 4];
  unfilter_line(1, &mut line, &prev, 2).unwrap();
  assert_eq!(line, [1, 2, 4, 6]);
  let mut line = [1, 2, 3, 4];
  unfilter_line(2, &mut line, &prev, 2).unwrap();
  assert_eq!(line, [11, 22, 33, 44]);
  let mut line = [1, 2, 3, 4];
  unfilter_line(3, &mut line, &prev, 2).unwrap();
  assert_eq!(line, [6, 12, 3 + (6 + 30) / 2, 4 + (12 + 40) / 2]);
  let mut line = [0, 0, 0, 0];
  unfilter_line(4, &mut line, &[0; 4], 1).unwrap();
  assert_eq!(line, [0; 4]);
  assert!(matches!(unfilter_line(5, &mut line, &prev, 1), Err(MetaError::Malformed(_))));
}
