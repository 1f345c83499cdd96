use rommeta::*;

use std::{fs::File, io::BufReader, path::Path};

use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() {
  tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

  let paths: Vec<String> = std::env::args().skip(1).collect();
  if paths.is_empty() {
    eprintln!("usage: rommeta FILE...");
    std::process::exit(2);
  }
  let mut failed = false;
  for path in &paths {
    if let Err(e) = show_file(Path::new(path)) {
      error!("{path}: {e}");
      failed = true;
    }
  }
  if failed {
    std::process::exit(1);
  }
}

fn show_file(path: &Path) -> MetaResult<()> {
  let mut source = BufReader::new(File::open(path)?);
  let mut header = [0_u8; 0x100];
  let got = ByteSource::read(&mut source, &mut header)?;
  let Some(format) = detect(&header[..got]) else {
    println!("{}: unknown format", path.display());
    return Ok(());
  };
  debug!(?format, "detected");
  println!("{}: {}", path.display(), format.name());
  match format {
    FormatId::Spc => {
      let spc = spc::Spc::open(&mut source)?;
      let tags = spc.parse_tags(&mut source)?;
      let (fields, meta) = spc::project(&tags);
      print_lists(&fields, &meta);
    }
    FormatId::GameCube | FormatId::Wii | FormatId::GameCubeTgc => {
      let disc = gcn::GameCube::open(&mut source)?;
      print_lists(&disc.fields(), &disc.metadata());
    }
    FormatId::Png => {
      let image = png::decode(&mut source)?;
      println!("  {}x{} {:?}, stride {}", image.width, image.height, image.format, image.stride);
      println!("  significant bits: {:?}", image.sbit);
    }
    _ => println!("  (no reader)"),
  }
  Ok(())
}

fn print_lists(fields: &FieldList, meta: &MetaList) {
  for field in fields {
    println!("  {}: {}", field.name, field.value);
  }
  for entry in meta.as_slice() {
    println!("  [{:?}] {:?}", entry.property, entry.value);
  }
}
