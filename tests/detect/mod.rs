use rommeta::{detect, FormatId};

#[test]
fn test_detect_each_format() {
  let mut spc = vec![0_u8; 0x100];
  spc[..27].copy_from_slice(b"SNES-SPC700 Sound File Data");
  assert_eq!(detect(&spc), Some(FormatId::Spc));

  let mut gcn = vec![0_u8; 0x62];
  gcn[0x1C..0x20].copy_from_slice(&[0xC2, 0x33, 0x9F, 0x3D]);
  assert_eq!(detect(&gcn), Some(FormatId::GameCube));

  let png = [137, 80, 78, 71, 13, 10, 26, 10];
  assert_eq!(detect(&png), Some(FormatId::Png));

  assert_eq!(detect(b"nothing to see here"), None);
}

#[test]
fn test_detect_short_snapshots_never_match() {
  let mut spc = vec![0_u8; 0x100];
  spc[..27].copy_from_slice(b"SNES-SPC700 Sound File Data");
  for len in 0..0x100 {
    assert_ne!(detect(&spc[..len]), Some(FormatId::Spc), "len {len}");
  }
  let png = [137, 80, 78, 71, 13, 10, 26, 10];
  for len in 0..8 {
    assert_eq!(detect(&png[..len]), None, "len {len}");
  }
}

#[test]
fn test_detect_no_panics() {
  for len in [0, 1, 7, 8, 0x40, 0x62, 0x100, 0x400] {
    for _ in 0..20 {
      let _ = detect(&super::rand_bytes(len));
    }
  }
}

#[test]
fn test_format_min_header_len() {
  assert_eq!(FormatId::Spc.min_header_len(), 0x100);
  assert_eq!(FormatId::Png.min_header_len(), 8);
  assert_eq!(FormatId::GameCubeTgc.name(), "GameCube (TGC)");
}
