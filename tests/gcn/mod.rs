use pretty_assertions::assert_eq;
use rommeta::{
  gcn::{GameCube, GCN_MAGIC, TGC_MAGIC, WII_MAGIC},
  FieldValue, FormatId, MetaError, MetaValue, Property,
};

fn disc(wii: bool, region: u32) -> Vec<u8> {
  let mut disc = vec![0_u8; if wii { 0x4E004 } else { 0x2000 }];
  disc[..6].copy_from_slice(b"RSBE01");
  disc[6] = 1;
  if wii {
    disc[0x18..0x1C].copy_from_slice(&WII_MAGIC.to_be_bytes());
    disc[0x4E000..0x4E004].copy_from_slice(&region.to_be_bytes());
  } else {
    disc[0x1C..0x20].copy_from_slice(&GCN_MAGIC.to_be_bytes());
    disc[0x440 + 24..0x440 + 28].copy_from_slice(&region.to_be_bytes());
  }
  disc[0x20..0x20 + 12].copy_from_slice(b"Brawl Test  ");
  disc
}

#[test]
fn test_gamecube_fields() {
  let gcn = GameCube::open(&mut std::io::Cursor::new(disc(false, 0))).unwrap();
  let fields = gcn.fields();
  let names: Vec<&str> = fields.as_slice().iter().map(|f| f.name).collect();
  assert_eq!(names, ["Title", "Game ID", "Publisher", "Disc #", "Revision", "Region"]);
  assert_eq!(fields.get("Title"), Some(&FieldValue::String("Brawl Test".into())));
  assert_eq!(fields.get("Disc #"), Some(&FieldValue::Numeric(2)));
  assert_eq!(fields.get("Region"), Some(&FieldValue::String("Japan".into())));
  let meta = gcn.metadata();
  assert_eq!(meta.get(Property::Title), Some(&MetaValue::String("Brawl Test".into())));
}

#[test]
fn test_unknown_region_code() {
  let wii = GameCube::open(&mut std::io::Cursor::new(disc(true, 0x99))).unwrap();
  assert_eq!(wii.format(), FormatId::Wii);
  assert_eq!(wii.fields().get("Region"), Some(&FieldValue::String("Unknown (0x00000099)".into())));
}

#[test]
fn test_disc_open_errors() {
  let full = disc(false, 1);
  assert!(matches!(
    GameCube::open(&mut std::io::Cursor::new(&full[..0x61])),
    Err(MetaError::Truncated(_))
  ));
  assert!(matches!(
    GameCube::open(&mut std::io::Cursor::new(vec![0_u8; 0x100])),
    Err(MetaError::NotSupported)
  ));
  // just the disc header is enough, the rest is optional
  let header_only = GameCube::open(&mut std::io::Cursor::new(&full[..0x62])).unwrap();
  assert_eq!(header_only.boot_block(), None);
  assert_eq!(header_only.region_code(), None);

  // a TGC container around something that isn't a GameCube disc
  let mut tgc = vec![0_u8; 0x100];
  tgc[..4].copy_from_slice(&TGC_MAGIC.to_be_bytes());
  tgc[8..12].copy_from_slice(&0x40_u32.to_be_bytes());
  assert!(matches!(GameCube::open(&mut std::io::Cursor::new(tgc)), Err(MetaError::NotSupported)));
}

#[test]
fn test_disc_no_panics() {
  for i in 0..50 {
    let mut bytes = super::rand_bytes(0x600);
    let magic_at = if i % 2 == 0 { 0x1C } else { 0x18 };
    let magic = if i % 2 == 0 { GCN_MAGIC } else { WII_MAGIC };
    bytes[magic_at..magic_at + 4].copy_from_slice(&magic.to_be_bytes());
    let mut source = std::io::Cursor::new(bytes);
    if let Ok(disc) = GameCube::open(&mut source) {
      let _ = disc.fields();
      let _ = disc.metadata();
      let _ = disc.read_fst_root(&mut source);
    }
  }
}
