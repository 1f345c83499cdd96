use pretty_assertions::assert_eq;
use rommeta::{
  png::{self, PngColorType},
  MetaError, PixelBuffer, PixelFormat, SignificantBits,
};

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if (c & 1) != 0 { 0xEDB8_8320_u32 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    out[n] = c;
    n += 1;
  }
  out
}

fn png_crc(bytes: impl Iterator<Item = u8>) -> u32 {
  let mut crc = u32::MAX;
  for byte in bytes {
    crc = CRC_TABLE[((crc ^ u32::from(byte)) as u8) as usize] ^ (crc >> 8);
  }
  crc ^ u32::MAX
}

#[test]
fn test_png_crc() {
  // the CRC of an empty IEND chunk, as seen at the end of every PNG
  assert_eq!(png_crc(b"IEND".iter().copied()), 0xAE42_6082);
}

const ADAM7: [(usize, usize, usize, usize); 7] =
  [(0, 0, 8, 8), (4, 0, 8, 8), (0, 4, 4, 8), (2, 0, 4, 4), (0, 2, 2, 4), (1, 0, 2, 2), (0, 1, 1, 2)];

/// An image to encode. Each pixel is its channel bytes (big-endian for 16
/// bit samples), or a single sample value for depths under 8.
struct TestImage {
  width: usize,
  height: usize,
  bit_depth: u8,
  color_type: PngColorType,
  pixels: Vec<Vec<u8>>,
}
impl TestImage {
  fn new(
    width: usize, height: usize, bit_depth: u8, color_type: PngColorType,
    f: impl Fn(usize, usize) -> Vec<u8>,
  ) -> Self {
    let mut pixels = Vec::new();
    for y in 0..height {
      for x in 0..width {
        pixels.push(f(x, y));
      }
    }
    Self { width, height, bit_depth, color_type, pixels }
  }

  fn bits_per_pixel(&self) -> usize {
    usize::from(self.bit_depth) * self.color_type.channel_count()
  }

  fn pack_line(&self, y: usize, xs: impl Iterator<Item = usize>) -> Vec<u8> {
    let mut out = Vec::new();
    let depth = usize::from(self.bit_depth);
    let mut bits_used = 0;
    for x in xs {
      let px = &self.pixels[y * self.width + x];
      if depth >= 8 {
        out.extend_from_slice(px);
      } else {
        if bits_used % 8 == 0 {
          out.push(0);
        }
        let shift = 8 - depth - (bits_used % 8);
        *out.last_mut().unwrap() |= px[0] << shift;
        bits_used += depth;
      }
    }
    out
  }

  /// Filtered lines, cycling through all five filter types.
  fn filtered_data(&self, interlaced: bool) -> Vec<u8> {
    let passes: Vec<(usize, usize, usize, usize)> =
      if interlaced { ADAM7.to_vec() } else { vec![(0, 0, 1, 1)] };
    let unit = (self.bits_per_pixel() / 8).max(1);
    let mut out = Vec::new();
    let mut filter = 0_u8;
    for (x0, y0, dx, dy) in passes {
      if x0 >= self.width || y0 >= self.height {
        continue;
      }
      let mut prev: Option<Vec<u8>> = None;
      for y in (y0..self.height).step_by(dy) {
        let raw = self.pack_line(y, (x0..self.width).step_by(dx));
        let up = prev.clone().unwrap_or_else(|| vec![0; raw.len()]);
        out.push(filter);
        for i in 0..raw.len() {
          let a = if i >= unit { raw[i - unit] } else { 0 };
          let b = up[i];
          let c = if i >= unit { up[i - unit] } else { 0 };
          let predicted = match filter {
            0 => 0,
            1 => a,
            2 => b,
            3 => ((u16::from(a) + u16::from(b)) / 2) as u8,
            _ => paeth(a, b, c),
          };
          out.push(raw[i].wrapping_sub(predicted));
        }
        filter = (filter + 1) % 5;
        prev = Some(raw);
      }
    }
    out
  }

  fn encode(&self, interlaced: bool, extra: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&(self.width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(self.height as u32).to_be_bytes());
    ihdr.extend_from_slice(&[self.bit_depth, self.color_type as u8, 0, 0, interlaced as u8]);
    let zlib = miniz_oxide::deflate::compress_to_vec_zlib(&self.filtered_data(interlaced), 6);

    let mut out = vec![137, 80, 78, 71, 13, 10, 26, 10];
    push_chunk(&mut out, b"IHDR", &ihdr);
    push_chunk(&mut out, b"tEXt", b"Comment\0skipped");
    for (ty, data) in extra {
      push_chunk(&mut out, ty, data);
    }
    // lots of little IDAT chunks
    for piece in zlib.chunks(7) {
      push_chunk(&mut out, b"IDAT", piece);
    }
    push_chunk(&mut out, b"IEND", &[]);
    out
  }
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
  let p = i32::from(a) + i32::from(b) - i32::from(c);
  let (pa, pb, pc) = ((p - i32::from(a)).abs(), (p - i32::from(b)).abs(), (p - i32::from(c)).abs());
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

fn push_chunk(out: &mut Vec<u8>, ty: &[u8; 4], data: &[u8]) {
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(ty);
  out.extend_from_slice(data);
  let crc = png_crc(ty.iter().chain(data.iter()).copied());
  out.extend_from_slice(&crc.to_be_bytes());
}

fn decode_both(image: &TestImage, extra: &[(&[u8; 4], &[u8])]) -> PixelBuffer {
  let plain = png::decode_png_bytes(&image.encode(false, extra)).unwrap();
  let interlaced = png::decode_png_bytes(&image.encode(true, extra)).unwrap();
  assert_eq!(plain, interlaced);
  plain
}

#[test]
fn test_rgba16_keeps_high_bytes() {
  let image = TestImage::new(11, 9, 16, PngColorType::RGBA, |x, y| {
    vec![x as u8, 0xEE, y as u8, 0xEE, (x * y) as u8, 0xEE, 0x80, 0x01]
  });
  let decoded = decode_both(&image, &[]);
  assert_eq!(decoded.format, PixelFormat::Argb32);
  for y in 0..9_u32 {
    for x in 0..11_u32 {
      let expected = u32::from_be_bytes([0x80, x as u8, y as u8, (x * y) as u8]);
      assert_eq!(decoded.argb_at(x, y), Some(expected), "({x},{y})");
    }
  }
  assert_eq!(decoded.sbit, SignificantBits { red: 8, green: 8, blue: 8, gray: 0, alpha: 8 });
}

#[test]
fn test_gray_alpha() {
  let image =
    TestImage::new(13, 5, 8, PngColorType::YA, |x, y| vec![(x * 16 + y) as u8, (255 - x) as u8]);
  let decoded = decode_both(&image, &[]);
  let v = 3 * 16 + 2;
  assert_eq!(decoded.argb_at(3, 2), Some(u32::from_be_bytes([252, v, v, v])));
  // gray is spread over red, green, and blue, so only alpha is reported
  assert_eq!(decoded.sbit, SignificantBits { red: 0, green: 0, blue: 0, gray: 0, alpha: 8 });
}

#[test]
fn test_gray_depths_become_ci8() {
  for depth in [1_u8, 2, 4, 8] {
    let max = ((1_u16 << depth) - 1) as usize;
    let image =
      TestImage::new(17, 10, depth, PngColorType::Y, |x, y| vec![((x + y) % (max + 1)) as u8]);
    let decoded = decode_both(&image, &[]);
    assert_eq!(decoded.format, PixelFormat::Ci8);
    assert_eq!(decoded.sbit.gray, depth);
    let scale = 255 / max;
    for y in 0..10_usize {
      let row = decoded.row(y as u32).unwrap();
      for x in 0..17_usize {
        assert_eq!(usize::from(row[x]), ((x + y) % (max + 1)) * scale, "depth {depth} ({x},{y})");
      }
    }
  }
}

#[test]
fn test_gray_trns_key() {
  let image = TestImage::new(4, 4, 2, PngColorType::Y, |x, _| vec![x as u8]);
  let decoded = decode_both(&image, &[(b"tRNS", &[0, 1])]);
  // 2-bit value 1 is index 0x55
  assert_eq!(decoded.palette[0x55], 0x0055_5555);
  assert_eq!(decoded.palette[0xAA], 0xFFAA_AAAA);
  assert_eq!(decoded.argb_at(1, 0), Some(0x0055_5555));
  assert_eq!(decoded.sbit, SignificantBits { red: 2, green: 2, blue: 2, gray: 2, alpha: 8 });
  // a key outside the sample range matches nothing
  let decoded = decode_both(&image, &[(b"tRNS", &[0, 9])]);
  assert!(decoded.palette.iter().all(|&c| c >> 24 == 0xFF));
  assert_eq!(decoded.sbit.alpha, 0);
}

#[test]
fn test_indexed_low_depth() {
  let plte = [0, 0, 0, 255, 255, 255, 10, 20, 30];
  let image = TestImage::new(7, 3, 2, PngColorType::Index, |x, y| vec![((x + y) % 3) as u8]);
  let decoded = decode_both(&image, &[(b"PLTE", &plte), (b"sBIT", &[5, 6, 5])]);
  assert_eq!(decoded.format, PixelFormat::Ci8);
  assert_eq!(decoded.row(1).unwrap(), &[1, 2, 0, 1, 2, 0, 1]);
  assert_eq!(decoded.argb_at(1, 0), Some(0xFFFF_FFFF));
  assert_eq!(decoded.argb_at(2, 0), Some(0xFF0A_141E));
  assert_eq!(decoded.palette[3], 0);
  assert_eq!(decoded.sbit, SignificantBits { red: 5, green: 6, blue: 5, gray: 0, alpha: 0 });
}

#[test]
fn test_bad_sbit_is_replaced() {
  let image = TestImage::new(2, 2, 8, PngColorType::RGB, |x, y| vec![x as u8, y as u8, 0]);
  // a zero is out of range
  let decoded = decode_both(&image, &[(b"sBIT", &[0, 8, 8])]);
  assert_eq!(decoded.sbit, SignificantBits { red: 8, green: 8, blue: 8, gray: 0, alpha: 0 });
  // too many values for RGB
  let decoded = decode_both(&image, &[(b"sBIT", &[4, 4, 4, 4])]);
  assert_eq!(decoded.sbit.red, 8);
}

#[test]
fn test_stride_padding_is_zero() {
  let image = TestImage::new(5, 2, 8, PngColorType::RGB, |_, _| vec![0xFF, 0xFF, 0xFF]);
  let decoded = decode_both(&image, &[]);
  assert_eq!(decoded.stride, 32);
  assert!(decoded.bits[20..32].iter().all(|&b| b == 0));
  assert!(decoded.bits[..20].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_decode_errors() {
  let image = TestImage::new(3, 3, 8, PngColorType::Index, |_, _| vec![0]);
  assert!(matches!(
    png::decode_png_bytes(&image.encode(false, &[])),
    Err(MetaError::Malformed(_))
  ));

  let image = TestImage::new(3, 3, 8, PngColorType::RGB, |_, _| vec![1, 2, 3]);
  let good = image.encode(false, &[]);
  assert!(png::decode_png_bytes(&good).is_ok());
  // every cut is an error, never a partial image (the IEND CRC isn't read)
  for cut in (0..good.len() - 4).step_by(5) {
    assert!(png::decode_png_bytes(&good[..cut]).is_err(), "cut at {cut}");
  }

  // filter type 5
  let mut lines = image.filtered_data(false);
  lines[0] = 5;
  let mut bad = vec![137, 80, 78, 71, 13, 10, 26, 10];
  push_chunk(&mut bad, b"IHDR", &[0, 0, 0, 3, 0, 0, 0, 3, 8, 2, 0, 0, 0]);
  push_chunk(&mut bad, b"IDAT", &miniz_oxide::deflate::compress_to_vec_zlib(&lines, 6));
  push_chunk(&mut bad, b"IEND", &[]);
  assert!(matches!(png::decode_png_bytes(&bad), Err(MetaError::Malformed(_))));

  // first chunk isn't IHDR
  let mut bad = vec![137, 80, 78, 71, 13, 10, 26, 10];
  push_chunk(&mut bad, b"IEND", &[]);
  assert!(matches!(png::decode_png_bytes(&bad), Err(MetaError::Malformed(_))));
}

#[test]
fn test_read_header_only() {
  let image = TestImage::new(6, 4, 4, PngColorType::Index, |_, _| vec![0]);
  let header = png::read_header(&mut std::io::Cursor::new(image.encode(true, &[]))).unwrap();
  assert_eq!((header.width, header.height, header.bit_depth), (6, 4, 4));
  assert_eq!(header.color_type, PngColorType::Index);
  assert!(header.is_interlaced);
}

#[test]
fn test_png_decode_no_panics() {
  for _ in 0..100 {
    let mut bytes = super::rand_bytes(1024);
    let _ = png::decode_png_bytes(&bytes);
    bytes[..8].copy_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);
    let _ = png::decode_png_bytes(&bytes);
  }
  // valid framing around random image data
  let image = TestImage::new(9, 9, 8, PngColorType::RGBA, |_, _| vec![0; 4]);
  let good = image.encode(true, &[]);
  for _ in 0..100 {
    let noise = super::rand_bytes(9 * 9 * 4 + 200);
    let mut bytes = good[..33].to_vec();
    push_chunk(&mut bytes, b"IDAT", &miniz_oxide::deflate::compress_to_vec_zlib(&noise, 1));
    push_chunk(&mut bytes, b"IEND", &[]);
    let _ = png::decode_png_bytes(&bytes);
  }
}
