// src/io/mod.rs
pub mod poscar;

use crate::model::SuperCell;
use std::io;
use std::path::Path;

/// Writes the supercell in the format picked from the file name.
/// POSCAR is the only structure format; anything else falls back to it.
pub fn save_structure(path: &Path, super_cell: &SuperCell) -> io::Result<()> {
  let name = path
    .file_name()
    .and_then(|n| n.to_str())
    .unwrap_or_default()
    .to_lowercase();
  if !(name.contains("poscar") || name.contains("contcar") || name.ends_with(".vasp")) {
    log::warn!("Unrecognised structure extension for {:?}; writing POSCAR", path);
  }
  poscar::write(path, super_cell)
}
