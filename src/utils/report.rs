// src/utils/report.rs

use crate::model::{CrystalModel, LatticeParameters, UnitCell};
use crate::io::poscar::element_groups;

/// One line per unit-cell atom: `"Na 0.000 0.500 0.500"`.
pub fn atom_list(unit_cell: &UnitCell) -> Vec<String> {
  unit_cell
    .atoms
    .iter()
    .map(|atom| {
      format!(
        "{} {:.3} {:.3} {:.3}",
        atom.element, atom.position[0], atom.position[1], atom.position[2]
      )
    })
    .collect()
}

/// Plain-text overview of the model: composition, cell vectors, parameters.
pub fn structure_summary(model: &CrystalModel) -> String {
  let unit = model.unit_cell();
  let sc = model.super_cell();
  let m = sc.multipliers;

  let formula_str: String = element_groups(sc)
    .iter()
    .map(|(el, count)| format!("{}{}", el, count))
    .collect::<Vec<_>>()
    .join(" ");

  let mut out = String::new();
  out.push_str(&format!("Supercell: {}x{}x{}\n", m.a, m.b, m.c));
  out.push_str(&format!(
    "Atoms: {} in unit cell, {} in supercell\n",
    unit.atoms.len(),
    sc.atoms.len()
  ));
  out.push_str(&format!("Formula: {}\n", formula_str));
  out.push_str("--------------------------------------------------\n");
  out.push_str(&format!("{:<8} {:>10} {:>10} {:>10}\n", "Vector", "X", "Y", "Z"));
  for (name, v) in [("a", &unit.a_hat), ("b", &unit.b_hat), ("c", &unit.c_hat)] {
    out.push_str(&format!("{:<8} {:>10.4} {:>10.4} {:>10.4}\n", name, v.x, v.y, v.z));
  }
  out.push_str("--------------------------------------------------\n");

  let p = LatticeParameters::from_basis(&unit.a_hat, &unit.b_hat, &unit.c_hat);
  out.push_str(&format!("a = {:.4}  b = {:.4}  c = {:.4}\n", p.a, p.b, p.c));
  out.push_str(&format!(
    "alpha = {:.3}  beta = {:.3}  gamma = {:.3}\n",
    p.alpha, p.beta, p.gamma
  ));
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Atom, Multipliers};

  #[test]
  fn test_atom_list_format() {
    let unit = UnitCell {
      atoms: vec![Atom::new("Fe", 0.25, 0.0, 0.123456).unwrap()],
      ..UnitCell::default()
    };
    assert_eq!(atom_list(&unit), vec!["Fe 0.250 0.000 0.123".to_string()]);
  }

  #[test]
  fn test_summary_counts_supercell() {
    let mut model = CrystalModel::new(UnitCell::default(), Multipliers::new(2, 2, 1).unwrap());
    model.add_atom(Atom::new("Na", 0.0, 0.0, 0.0).unwrap()).unwrap();
    model.add_atom(Atom::new("Cl", 0.5, 0.5, 0.5).unwrap()).unwrap();
    let text = structure_summary(&model);
    assert!(text.contains("Supercell: 2x2x1"));
    assert!(text.contains("Atoms: 2 in unit cell, 8 in supercell"));
    assert!(text.contains("Formula: Na4 Cl4"));
    assert!(text.contains("alpha = 90.000  beta = 90.000  gamma = 90.000"));
  }
}
