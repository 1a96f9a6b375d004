// src/model/supercell.rs

use super::structure::{Atom, Multipliers, SuperCell, UnitCell, MAX_SUPERCELL_ATOMS};

/// Largest `f64` strictly below 1.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Replicates the unit cell `na x nb x nc` times.
///
/// Atom order is c outermost, b middle, a innermost, then unit-cell order,
/// so exports of the same model are byte-identical.
pub fn build_super_cell(unit_cell: &UnitCell, multipliers: Multipliers) -> SuperCell {
  let Multipliers { a: na, b: nb, c: nc } = multipliers;
  let capacity = unit_cell
    .atoms
    .len()
    .saturating_mul(multipliers.count())
    .min(MAX_SUPERCELL_ATOMS);
  let mut atoms = Vec::with_capacity(capacity);

  for k in 0..nc {
    for j in 0..nb {
      for i in 0..na {
        for atom in &unit_cell.atoms {
          atoms.push(Atom {
            element: atom.element.clone(),
            position: [
              renormalize(atom.position[0], i, na),
              renormalize(atom.position[1], j, nb),
              renormalize(atom.position[2], k, nc),
            ],
          });
        }
      }
    }
  }

  SuperCell {
    multipliers,
    a_hat: unit_cell.a_hat * na as f64,
    b_hat: unit_cell.b_hat * nb as f64,
    c_hat: unit_cell.c_hat * nc as f64,
    atoms,
  }
}

/// `(x + offset) / n`, kept below 1 when rounding of `x + offset` would reach it.
fn renormalize(x: f64, offset: u32, n: u32) -> f64 {
  let v = (x + offset as f64) / n as f64;
  if v < 1.0 {
    v
  } else {
    BELOW_ONE
  }
}
