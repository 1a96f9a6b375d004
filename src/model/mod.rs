//src/model/mod.rs
pub mod elements;
pub mod lattice;
pub mod structure;
pub mod supercell;

// Re-exports for cleaner imports
pub use elements::get_element_color;
pub use lattice::{
  BasisVectorInput, Constraint, LatticeBuild, LatticeError, LatticeParameterInput,
  LatticeParameters,
};
pub use structure::{Atom, AtomError, CrystalModel, Multipliers, SuperCell, UnitCell};
pub use supercell::build_super_cell;
