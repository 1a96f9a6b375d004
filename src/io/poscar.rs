// src/io/poscar.rs

use crate::model::SuperCell;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub const DEFAULT_FILE_NAME: &str = "crystal_model.POSCAR";
const HEADER: &str = "POSCAR file written by Crystal Constructor";

/// Shortest round-trip decimal, switching to exponent form below 1e-6 and
/// from 1e21 up (`1e-7`, `1.5e+21`).
pub fn format_number(v: f64) -> String {
  if v == 0.0 {
    return "0".to_string();
  }
  if v.is_nan() {
    return "NaN".to_string();
  }
  if v.is_infinite() {
    return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
  }
  let magnitude = v.abs();
  if magnitude < 1e-6 {
    format!("{:e}", v)
  } else if magnitude >= 1e21 {
    format!("{:e}", v).replacen('e', "e+", 1)
  } else {
    format!("{}", v)
  }
}

/// Element symbols with their counts, in order of first appearance.
pub fn element_groups(super_cell: &SuperCell) -> Vec<(&str, usize)> {
  let mut groups: Vec<(&str, usize)> = Vec::new();
  for atom in &super_cell.atoms {
    match groups.iter_mut().find(|(el, _)| *el == atom.element) {
      Some((_, count)) => *count += 1,
      None => groups.push((&atom.element, 1)),
    }
  }
  groups
}

/// Renders the supercell in direct (fractional) coordinates.
pub fn write_poscar(super_cell: &SuperCell) -> String {
  let mut out = String::new();
  out.push_str(HEADER);
  out.push('\n');
  out.push_str("1.0\n");

  for v in [&super_cell.a_hat, &super_cell.b_hat, &super_cell.c_hat] {
    out.push_str(&format!(
      "{} {} {}\n",
      format_number(v.x),
      format_number(v.y),
      format_number(v.z)
    ));
  }

  let groups = element_groups(super_cell);
  for (element, _) in &groups {
    out.push_str(element);
    out.push(' ');
  }
  out.push('\n');
  for (_, count) in &groups {
    out.push_str(&format!("{} ", count));
  }
  out.push('\n');
  out.push_str("direct\n");

  for (element, _) in &groups {
    for atom in super_cell.atoms.iter().filter(|a| a.element == *element) {
      let [x, y, z] = atom.position;
      out.push_str(&format!(
        "{} {} {}\n",
        format_number(x),
        format_number(y),
        format_number(z)
      ));
    }
  }
  out
}

pub fn write(path: &Path, super_cell: &SuperCell) -> io::Result<()> {
  let mut file = File::create(path)?;
  file.write_all(write_poscar(super_cell).as_bytes())?;
  log::info!(
    "POSCAR with {} atoms written to {:?}",
    super_cell.atoms.len(),
    path
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{build_super_cell, Atom, Multipliers, UnitCell};
  use nalgebra::Vector3;

  #[test]
  fn test_format_number() {
    assert_eq!(format_number(1.0), "1");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(0.5), "0.5");
    assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(format_number(-2.25), "-2.25");
    assert_eq!(format_number(1e-7), "1e-7");
    assert_eq!(format_number(0.000001), "0.000001");
    assert_eq!(format_number(1.5e21), "1.5e+21");
    assert_eq!(format_number(f64::NAN), "NaN");
  }

  #[test]
  fn test_groups_follow_first_appearance() {
    let unit = UnitCell {
      atoms: vec![
        Atom::new("O", 0.0, 0.0, 0.0).unwrap(),
        Atom::new("Ti", 0.5, 0.5, 0.5).unwrap(),
        Atom::new("O", 0.5, 0.0, 0.0).unwrap(),
      ],
      ..UnitCell::default()
    };
    let sc = build_super_cell(&unit, Multipliers::new(2, 1, 1).unwrap());
    assert_eq!(element_groups(&sc), vec![("O", 4), ("Ti", 2)]);
  }

  #[test]
  fn test_layout() {
    let unit = UnitCell {
      a_hat: Vector3::new(2.0, 0.0, 0.0),
      atoms: vec![
        Atom::new("Na", 0.0, 0.0, 0.0).unwrap(),
        Atom::new("Cl", 0.5, 0.5, 0.5).unwrap(),
      ],
      ..UnitCell::default()
    };
    let sc = build_super_cell(&unit, Multipliers::new(2, 1, 1).unwrap());
    let expected = "POSCAR file written by Crystal Constructor\n\
                    1.0\n\
                    4 0 0\n\
                    0 1 0\n\
                    0 0 1\n\
                    Na Cl \n\
                    2 2 \n\
                    direct\n\
                    0 0 0\n\
                    0.5 0 0\n\
                    0.25 0.5 0.5\n\
                    0.75 0.5 0.5\n";
    assert_eq!(write_poscar(&sc), expected);
  }

  #[test]
  fn test_empty_cell_has_blank_group_lines() {
    let sc = build_super_cell(&UnitCell::default(), Multipliers::ONE);
    let text = write_poscar(&sc);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[5], "");
    assert_eq!(lines[6], "");
    assert_eq!(lines[7], "direct");
  }

  #[test]
  fn test_write_to_file() {
    let sc = build_super_cell(&UnitCell::default(), Multipliers::ONE);
    let path = std::env::temp_dir().join(format!("cc-{}-{}", std::process::id(), DEFAULT_FILE_NAME));
    write(&path, &sc).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), write_poscar(&sc));
    let _ = std::fs::remove_file(&path);
  }
}
