// src/model/structure.rs

use super::lattice::LatticeError;
use super::supercell;
use nalgebra::Vector3;
use thiserror::Error;

/// Most atoms a supercell may hold. Also bounds the number of images.
pub const MAX_SUPERCELL_ATOMS: usize = 1_000_000;

/// Reasons an atom edit is refused. The model is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AtomError {
  #[error("Please select an atom.")]
  NoElementSelected,
  #[error("'{0}' is not an element symbol.")]
  UnknownElement(String),
  #[error("Input fields must be numeric values.")]
  NonNumeric,
  #[error("Atom coordinate components must be greater than or equal to 0.0 and less than 1.0.")]
  OutOfRange,
  #[error("Please select an atom from the list to remove.")]
  NoAtomSelected,
  #[error("No atom at index {index} (unit cell has {count}).")]
  IndexOutOfRange { index: usize, count: usize },
  #[error("The supercell would hold more than {max} atoms.")]
  SuperCellFull { max: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
  pub element: String,
  /// Fractional coordinates, each in `[0, 1)`.
  pub position: [f64; 3],
}

impl Atom {
  /// Checks the coordinates (numeric first, then range) and builds the atom.
  pub fn new(element: impl Into<String>, x: f64, y: f64, z: f64) -> Result<Self, AtomError> {
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
      return Err(AtomError::NonNumeric);
    }
    let in_range = |v: f64| (0.0..1.0).contains(&v);
    if !(in_range(x) && in_range(y) && in_range(z)) {
      return Err(AtomError::OutOfRange);
    }
    Ok(Self {
      element: element.into(),
      position: [x, y, z],
    })
  }
}

/// Integer replication counts along a, b and c. Always at least 1, and the
/// image count never exceeds [`MAX_SUPERCELL_ATOMS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Multipliers {
  pub a: u32,
  pub b: u32,
  pub c: u32,
}

impl Multipliers {
  pub const ONE: Multipliers = Multipliers { a: 1, b: 1, c: 1 };

  pub fn new(a: u32, b: u32, c: u32) -> Option<Self> {
    if a == 0 || b == 0 || c == 0 {
      return None;
    }
    let multipliers = Self { a, b, c };
    match multipliers.checked_count() {
      Some(n) if n <= MAX_SUPERCELL_ATOMS => Some(multipliers),
      _ => None,
    }
  }

  /// Number of unit-cell images in the supercell, saturating at `usize::MAX`.
  pub fn count(&self) -> usize {
    self.checked_count().unwrap_or(usize::MAX)
  }

  fn checked_count(&self) -> Option<usize> {
    (self.a as usize)
      .checked_mul(self.b as usize)?
      .checked_mul(self.c as usize)
  }

  /// Supercell atom count for `atoms` unit-cell atoms, if within the cap.
  pub fn super_cell_len(&self, atoms: usize) -> Option<usize> {
    atoms
      .checked_mul(self.checked_count()?)
      .filter(|&n| n <= MAX_SUPERCELL_ATOMS)
  }
}

impl Default for Multipliers {
  fn default() -> Self {
    Self::ONE
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnitCell {
  pub a_hat: Vector3<f64>,
  pub b_hat: Vector3<f64>,
  pub c_hat: Vector3<f64>,
  pub atoms: Vec<Atom>,
}

impl Default for UnitCell {
  /// Unit cube, no atoms.
  fn default() -> Self {
    Self {
      a_hat: Vector3::x(),
      b_hat: Vector3::y(),
      c_hat: Vector3::z(),
      atoms: Vec::new(),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SuperCell {
  pub multipliers: Multipliers,
  pub a_hat: Vector3<f64>,
  pub b_hat: Vector3<f64>,
  pub c_hat: Vector3<f64>,
  /// Fractional coordinates relative to the supercell vectors.
  pub atoms: Vec<Atom>,
}

impl SuperCell {
  /// `A + B + C`, the far corner of the cell.
  pub fn diagonal(&self) -> Vector3<f64> {
    self.a_hat + self.b_hat + self.c_hat
  }

  pub fn edge_lengths(&self) -> [f64; 3] {
    [self.a_hat.norm(), self.b_hat.norm(), self.c_hat.norm()]
  }
}

/// One unit cell plus the supercell derived from it.
///
/// The supercell is rebuilt in full whenever the unit cell or the
/// multipliers change, so the two can never disagree.
#[derive(Clone, Debug, PartialEq)]
pub struct CrystalModel {
  unit_cell: UnitCell,
  super_cell: SuperCell,
}

impl Default for CrystalModel {
  fn default() -> Self {
    Self::new(UnitCell::default(), Multipliers::ONE)
  }
}

impl CrystalModel {
  pub fn new(unit_cell: UnitCell, multipliers: Multipliers) -> Self {
    let super_cell = supercell::build_super_cell(&unit_cell, multipliers);
    Self {
      unit_cell,
      super_cell,
    }
  }

  pub fn unit_cell(&self) -> &UnitCell {
    &self.unit_cell
  }

  pub fn super_cell(&self) -> &SuperCell {
    &self.super_cell
  }

  pub fn multipliers(&self) -> Multipliers {
    self.super_cell.multipliers
  }

  /// Replaces the three basis vectors and the multipliers, keeping the atoms.
  /// Refused, with the model untouched, when the supercell would be too large.
  pub fn set_basis(
    &mut self,
    basis: [Vector3<f64>; 3],
    multipliers: Multipliers,
  ) -> Result<(), LatticeError> {
    if multipliers.super_cell_len(self.unit_cell.atoms.len()).is_none() {
      return Err(LatticeError::SuperCellTooLarge {
        max: MAX_SUPERCELL_ATOMS,
      });
    }
    let [a_hat, b_hat, c_hat] = basis;
    self.unit_cell.a_hat = a_hat;
    self.unit_cell.b_hat = b_hat;
    self.unit_cell.c_hat = c_hat;
    self.rebuild(multipliers);
    Ok(())
  }

  pub fn add_atom(&mut self, atom: Atom) -> Result<(), AtomError> {
    let multipliers = self.super_cell.multipliers;
    if multipliers.super_cell_len(self.unit_cell.atoms.len() + 1).is_none() {
      return Err(AtomError::SuperCellFull {
        max: MAX_SUPERCELL_ATOMS,
      });
    }
    self.unit_cell.atoms.push(atom);
    self.rebuild(multipliers);
    Ok(())
  }

  pub fn remove_atom(&mut self, index: usize) -> Result<Atom, AtomError> {
    let count = self.unit_cell.atoms.len();
    if index >= count {
      return Err(AtomError::IndexOutOfRange { index, count });
    }
    let removed = self.unit_cell.atoms.remove(index);
    self.rebuild(self.super_cell.multipliers);
    Ok(removed)
  }

  /// Back to the unit cube with no atoms and single multipliers.
  pub fn reset(&mut self) {
    *self = Self::default();
  }

  fn rebuild(&mut self, multipliers: Multipliers) {
    self.super_cell = supercell::build_super_cell(&self.unit_cell, multipliers);
    log::debug!(
      "Supercell {}x{}x{} rebuilt: {} atoms",
      multipliers.a,
      multipliers.b,
      multipliers.c,
      self.super_cell.atoms.len()
    );
  }
}
