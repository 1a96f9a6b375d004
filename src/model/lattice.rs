// src/model/lattice.rs

//! Unit-cell construction from basis vectors or lattice parameters.
//!
//! Both input modes run their checks in a fixed order and stop at the first
//! failure. Nothing here touches a `CrystalModel`; callers apply an accepted
//! [`LatticeBuild`] themselves, so a rejected input leaves the model as it was.

use super::structure::Multipliers;
use crate::utils::linalg::{cell_volume, deg_to_rad, rad_to_deg};
use nalgebra::Vector3;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Stable identifier of each validity rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
  Numeric,
  AHatAlongX,
  BHatInXyPlane,
  CHatPositiveZ,
  PositiveIntegerMultipliers,
  PositiveLengths,
  BetaGammaRange,
  AlphaRange,
  RealCellHeight,
  SuperCellSize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LatticeError {
  #[error("Input fields must be numeric values.")]
  NonNumeric,
  #[error("â must lay along x-axis with positive x-component.")]
  AHatNotAlongX,
  #[error("b̂ must lay in xy-plane with positive y-component.")]
  BHatNotInXyPlane,
  #[error("ĉ must have positive z-component.")]
  CHatNotPositiveZ,
  #[error("â, b̂, and ĉ multipliers must be non-zero, positive integers.")]
  InvalidMultipliers,
  #[error("a, b, and c must be non-zero, positive numbers.")]
  NonPositiveLength,
  #[error("β and γ must be greater than 0° and less than 180°.")]
  AngleOutOfRange,
  #[error("α must be greater than {min:.3}° and less than {max:.3}° with the given β and γ values.")]
  AlphaOutOfRange { min: f64, max: f64 },
  #[error("α, β, and γ do not give the cell a real height along z.")]
  NonRealCellHeight,
  #[error("The supercell would hold more than {max} atoms.")]
  SuperCellTooLarge { max: usize },
}

impl LatticeError {
  pub fn constraint(&self) -> Constraint {
    match self {
      LatticeError::NonNumeric => Constraint::Numeric,
      LatticeError::AHatNotAlongX => Constraint::AHatAlongX,
      LatticeError::BHatNotInXyPlane => Constraint::BHatInXyPlane,
      LatticeError::CHatNotPositiveZ => Constraint::CHatPositiveZ,
      LatticeError::InvalidMultipliers => Constraint::PositiveIntegerMultipliers,
      LatticeError::NonPositiveLength => Constraint::PositiveLengths,
      LatticeError::AngleOutOfRange => Constraint::BetaGammaRange,
      LatticeError::AlphaOutOfRange { .. } => Constraint::AlphaRange,
      LatticeError::NonRealCellHeight => Constraint::RealCellHeight,
      LatticeError::SuperCellTooLarge { .. } => Constraint::SuperCellSize,
    }
  }
}

/// Lengths and inter-axis angles (degrees) of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatticeParameters {
  pub a: f64,
  pub b: f64,
  pub c: f64,
  pub alpha: f64,
  pub beta: f64,
  pub gamma: f64,
}

impl LatticeParameters {
  /// Euclidean lengths and the angles b^c, c^a, a^b.
  pub fn from_basis(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> Self {
    Self {
      a: a.norm(),
      b: b.norm(),
      c: c.norm(),
      alpha: rad_to_deg(b.angle(c)),
      beta: rad_to_deg(c.angle(a)),
      gamma: rad_to_deg(a.angle(b)),
    }
  }
}

/// An accepted input, ready to be applied to a model.
#[derive(Clone, Debug, PartialEq)]
pub struct LatticeBuild {
  pub basis: [Vector3<f64>; 3],
  pub multipliers: Multipliers,
  pub parameters: LatticeParameters,
}

/// Parses one text field. Anything that is not a finite number becomes NaN
/// and fails the numeric check later.
pub fn parse_field(text: &str) -> f64 {
  match text.trim().parse::<f64>() {
    Ok(v) if v.is_finite() => v,
    _ => f64::NAN,
  }
}

/// Accepts either a JSON number or a text field.
pub(crate) fn numeric_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Number(f64),
    Text(String),
  }
  Ok(match Raw::deserialize(deserializer)? {
    Raw::Number(v) => v,
    Raw::Text(s) => parse_field(&s),
  })
}

fn numeric_triple<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[f64; 3], D::Error> {
  #[derive(Deserialize)]
  struct Wrap(#[serde(deserialize_with = "numeric_field")] f64);
  let [a, b, c] = <[Wrap; 3]>::deserialize(deserializer)?;
  Ok([a.0, b.0, c.0])
}

fn unit_multipliers() -> [f64; 3] {
  [1.0; 3]
}

/// Basis-vector mode: `â = (a_x, 0, 0)`, `b̂ = (b_x, b_y, 0)`, `ĉ = (c_x, c_y, c_z)`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct BasisVectorInput {
  #[serde(deserialize_with = "numeric_field")]
  pub a_x: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub b_x: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub b_y: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub c_x: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub c_y: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub c_z: f64,
  #[serde(default = "unit_multipliers", deserialize_with = "numeric_triple")]
  pub multipliers: [f64; 3],
}

impl BasisVectorInput {
  pub fn validate(&self) -> Result<LatticeBuild, LatticeError> {
    let fields = [self.a_x, self.b_x, self.b_y, self.c_x, self.c_y, self.c_z];
    if !all_numeric(&fields) || !all_numeric(&self.multipliers) {
      return Err(LatticeError::NonNumeric);
    }
    if self.a_x < 0.0 {
      return Err(LatticeError::AHatNotAlongX);
    }
    if self.b_y < 0.0 {
      return Err(LatticeError::BHatNotInXyPlane);
    }
    if self.c_z < 0.0 {
      return Err(LatticeError::CHatNotPositiveZ);
    }
    let multipliers = check_multipliers(&self.multipliers)?;

    let a = Vector3::new(self.a_x, 0.0, 0.0);
    let b = Vector3::new(self.b_x, self.b_y, 0.0);
    let c = Vector3::new(self.c_x, self.c_y, self.c_z);

    if cell_volume(&a, &b, &c).abs() < f64::EPSILON {
      log::warn!("Basis vectors are coplanar; the cell has zero volume");
    }

    Ok(LatticeBuild {
      parameters: LatticeParameters::from_basis(&a, &b, &c),
      basis: [a, b, c],
      multipliers,
    })
  }
}

/// Lattice-parameter mode. Angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LatticeParameterInput {
  #[serde(deserialize_with = "numeric_field")]
  pub a: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub b: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub c: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub alpha: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub beta: f64,
  #[serde(deserialize_with = "numeric_field")]
  pub gamma: f64,
  #[serde(default = "unit_multipliers", deserialize_with = "numeric_triple")]
  pub multipliers: [f64; 3],
}

impl LatticeParameterInput {
  /// Open interval of α that admits a real cell for the given β and γ.
  pub fn alpha_bounds(&self) -> (f64, f64) {
    let (sb, cb) = deg_to_rad(self.beta).sin_cos();
    let (sg, cg) = deg_to_rad(self.gamma).sin_cos();
    let min = rad_to_deg((cb * cg + sb * sg).clamp(-1.0, 1.0).acos());
    let max = rad_to_deg((cb * cg - sb * sg).clamp(-1.0, 1.0).acos());
    (min, max)
  }

  pub fn validate(&self) -> Result<LatticeBuild, LatticeError> {
    let fields = [self.a, self.b, self.c, self.alpha, self.beta, self.gamma];
    if !all_numeric(&fields) || !all_numeric(&self.multipliers) {
      return Err(LatticeError::NonNumeric);
    }
    if self.a <= 0.0 || self.b <= 0.0 || self.c <= 0.0 {
      return Err(LatticeError::NonPositiveLength);
    }
    let open_angle = |deg: f64| deg > 0.0 && deg < 180.0;
    if !open_angle(self.gamma) || !open_angle(self.beta) {
      return Err(LatticeError::AngleOutOfRange);
    }
    let (min, max) = self.alpha_bounds();
    if self.alpha <= min || self.alpha >= max {
      return Err(LatticeError::AlphaOutOfRange { min, max });
    }
    let multipliers = check_multipliers(&self.multipliers)?;

    let basis = self.to_basis()?;
    Ok(LatticeBuild {
      basis,
      multipliers,
      parameters: LatticeParameters {
        a: self.a,
        b: self.b,
        c: self.c,
        alpha: self.alpha,
        beta: self.beta,
        gamma: self.gamma,
      },
    })
  }

  /// Standard crystallographic orientation: â on x, b̂ in the xy-plane.
  fn to_basis(&self) -> Result<[Vector3<f64>; 3], LatticeError> {
    let (sin_g, cos_g) = deg_to_rad(self.gamma).sin_cos();
    let cos_b = deg_to_rad(self.beta).cos();
    let cos_a = deg_to_rad(self.alpha).cos();

    let a1 = self.a;
    let b1 = self.b * cos_g;
    let b2 = self.b * sin_g;
    let c1 = self.a * self.c * cos_b / a1;
    let c2 = (self.b * self.c * cos_a - b1 * c1) / b2;

    let radicand = self.c * self.c - c1 * c1 - c2 * c2;
    if !radicand.is_finite() || radicand < 0.0 {
      return Err(LatticeError::NonRealCellHeight);
    }

    Ok([
      Vector3::new(a1, 0.0, 0.0),
      Vector3::new(b1, b2, 0.0),
      Vector3::new(c1, c2, radicand.sqrt()),
    ])
  }
}

fn all_numeric(values: &[f64]) -> bool {
  values.iter().all(|v| v.is_finite())
}

/// Whole, positive and small enough that the image count stays under the
/// supercell cap.
fn check_multipliers(values: &[f64; 3]) -> Result<Multipliers, LatticeError> {
  let as_count = |v: f64| {
    if v > 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
      Some(v as u32)
    } else {
      None
    }
  };
  match (as_count(values[0]), as_count(values[1]), as_count(values[2])) {
    (Some(a), Some(b), Some(c)) => Multipliers::new(a, b, c).ok_or(LatticeError::InvalidMultipliers),
    _ => Err(LatticeError::InvalidMultipliers),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn basis(a_x: f64, b_x: f64, b_y: f64, c_x: f64, c_y: f64, c_z: f64) -> BasisVectorInput {
    BasisVectorInput {
      a_x,
      b_x,
      b_y,
      c_x,
      c_y,
      c_z,
      multipliers: [1.0; 3],
    }
  }

  fn params(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> LatticeParameterInput {
    LatticeParameterInput {
      a,
      b,
      c,
      alpha,
      beta,
      gamma,
      multipliers: [1.0; 3],
    }
  }

  fn assert_vec_close(a: &Vector3<f64>, b: &Vector3<f64>, tol: f64) {
    assert!((a - b).norm() < tol, "{:?} vs {:?}", a, b);
  }

  #[test]
  fn test_parse_field() {
    assert_eq!(parse_field(" 2.5 "), 2.5);
    assert_eq!(parse_field("-1e2"), -100.0);
    assert!(parse_field("abc").is_nan());
    assert!(parse_field("").is_nan());
    assert!(parse_field("inf").is_nan());
  }

  #[test]
  fn test_basis_check_order() {
    let mut input = basis(-1.0, 0.0, -1.0, 0.0, 0.0, -1.0);
    input.multipliers = [0.0, 1.0, 1.0];
    assert_eq!(input.validate(), Err(LatticeError::AHatNotAlongX));
    input.a_x = 1.0;
    assert_eq!(input.validate(), Err(LatticeError::BHatNotInXyPlane));
    input.b_y = 1.0;
    assert_eq!(input.validate(), Err(LatticeError::CHatNotPositiveZ));
    input.c_z = 1.0;
    assert_eq!(input.validate(), Err(LatticeError::InvalidMultipliers));
    input.multipliers = [1.0, 2.0, 3.0];
    let build = input.validate().unwrap();
    assert_eq!(build.multipliers, Multipliers::new(1, 2, 3).unwrap());

    input.c_y = f64::NAN;
    input.a_x = -5.0;
    assert_eq!(input.validate(), Err(LatticeError::NonNumeric));
  }

  #[test]
  fn test_negative_a_reports_constraint() {
    let err = basis(-1.0, 0.0, 1.0, 0.0, 0.0, 1.0).validate().unwrap_err();
    assert_eq!(err.constraint(), Constraint::AHatAlongX);
    assert_eq!(err.to_string(), "â must lay along x-axis with positive x-component.");
  }

  #[test]
  fn test_multiplier_rules() {
    let mut input = basis(1.0, 0.0, 1.0, 0.0, 0.0, 1.0);
    for bad in [[1.5, 1.0, 1.0], [1.0, -2.0, 1.0], [1.0, 1.0, 0.0]] {
      input.multipliers = bad;
      assert_eq!(input.validate(), Err(LatticeError::InvalidMultipliers));
    }
    input.multipliers = [f64::NAN, 1.0, 1.0];
    assert_eq!(input.validate(), Err(LatticeError::NonNumeric));
  }

  #[test]
  fn test_huge_multipliers_rejected() {
    let mut input = basis(1.0, 0.0, 1.0, 0.0, 0.0, 1.0);
    for bad in [
      [4294967295.0, 4294967295.0, 2.0],
      [4294967296.0, 1.0, 1.0],
      [1001.0, 1000.0, 1.0],
    ] {
      input.multipliers = bad;
      assert_eq!(input.validate(), Err(LatticeError::InvalidMultipliers));
    }
    input.multipliers = [100.0, 100.0, 100.0];
    assert!(input.validate().is_ok());
  }

  #[test]
  fn test_zero_components_are_accepted() {
    // Boundary values satisfy the >= 0 rules.
    assert!(basis(0.0, 1.0, 0.0, 0.0, 0.0, 0.0).validate().is_ok());
  }

  #[test]
  fn test_cubic_parameters() {
    let build = params(2.0, 2.0, 2.0, 90.0, 90.0, 90.0).validate().unwrap();
    assert_vec_close(&build.basis[0], &Vector3::new(2.0, 0.0, 0.0), 1e-12);
    assert_vec_close(&build.basis[1], &Vector3::new(0.0, 2.0, 0.0), 1e-12);
    assert_vec_close(&build.basis[2], &Vector3::new(0.0, 0.0, 2.0), 1e-12);
  }

  #[test]
  fn test_hexagonal_parameters() {
    let build = params(3.0, 3.0, 5.0, 90.0, 90.0, 120.0).validate().unwrap();
    let [a, b, c] = build.basis;
    assert!((a.angle(&b) - deg_to_rad(120.0)).abs() < 1e-12);
    assert!((b.norm() - 3.0).abs() < 1e-12);
    assert_vec_close(&c, &Vector3::new(0.0, 0.0, 5.0), 1e-12);
  }

  #[test]
  fn test_parameter_check_order() {
    let mut input = params(0.0, 1.0, 1.0, 200.0, 0.0, 90.0);
    input.multipliers = [0.0, 1.0, 1.0];
    assert_eq!(input.validate(), Err(LatticeError::NonPositiveLength));
    input.a = 1.0;
    assert_eq!(input.validate(), Err(LatticeError::AngleOutOfRange));
    input.beta = 90.0;
    input.gamma = 180.0;
    assert_eq!(input.validate(), Err(LatticeError::AngleOutOfRange));
    input.gamma = 60.0;
    assert!(matches!(input.validate(), Err(LatticeError::AlphaOutOfRange { .. })));
    input.alpha = 90.0;
    assert_eq!(input.validate(), Err(LatticeError::InvalidMultipliers));
    input.multipliers = [1.0; 3];
    assert!(input.validate().is_ok());
  }

  #[test]
  fn test_alpha_bounds_message() {
    let input = params(1.0, 1.0, 1.0, 5.0, 60.0, 70.0);
    let (min, max) = input.alpha_bounds();
    assert!((min - 10.0).abs() < 1e-9);
    assert!((max - 130.0).abs() < 1e-9);
    let err = input.validate().unwrap_err();
    assert_eq!(
      err.to_string(),
      "α must be greater than 10.000° and less than 130.000° with the given β and γ values."
    );
  }

  #[test]
  fn test_alpha_bounds_wrap_past_180() {
    let (min, max) = params(1.0, 1.0, 1.0, 90.0, 120.0, 100.0).alpha_bounds();
    assert!((min - 20.0).abs() < 1e-9);
    assert!((max - 140.0).abs() < 1e-9);
  }

  #[test]
  fn test_cell_height_radicand_rejected() {
    // α past the upper bound for β = γ = 60°
    let err = params(1.0, 1.0, 1.0, 150.0, 60.0, 60.0).to_basis().unwrap_err();
    assert_eq!(err, LatticeError::NonRealCellHeight);
    assert_eq!(err.constraint(), Constraint::RealCellHeight);
    assert_eq!(
      err.to_string(),
      "α, β, and γ do not give the cell a real height along z."
    );
  }

  #[test]
  fn test_alpha_at_bound_edge_never_gives_nan() {
    let mut input = params(1.0, 1.0, 1.0, 90.0, 60.0, 60.0);
    let (_, max) = input.alpha_bounds();
    assert!((max - 120.0).abs() < 1e-9);
    for ulps in 1..=64u64 {
      input.alpha = f64::from_bits(max.to_bits() - ulps);
      match input.validate() {
        Ok(build) => assert!(build.basis.iter().all(|v| v.iter().all(|c| c.is_finite()))),
        Err(e) => assert!(
          matches!(e, LatticeError::NonRealCellHeight | LatticeError::AlphaOutOfRange { .. }),
          "unexpected {:?}",
          e
        ),
      }
    }
  }

  #[test]
  fn test_round_trip_basis_to_parameters() {
    let inputs = [
      basis(3.0, 1.0, 2.5, 0.5, 0.4, 4.0),
      basis(1.0, 0.0, 1.0, 0.0, 0.0, 1.0),
      basis(4.2, -2.1, 3.6373, 0.0, 0.0, 6.8),
      basis(2.0, 0.7, 1.9, -0.8, 0.3, 2.2),
    ];
    for input in inputs {
      let first = input.validate().unwrap();
      let p = first.parameters;
      let second = params(p.a, p.b, p.c, p.alpha, p.beta, p.gamma).validate().unwrap();
      for (x, y) in first.basis.iter().zip(second.basis.iter()) {
        assert_vec_close(x, y, 1e-6);
      }
    }
  }

  #[test]
  fn test_deserialize_text_fields() {
    let input: LatticeParameterInput = serde_json::from_str(
      r#"{"a": "2.0", "b": 2, "c": " 2 ", "alpha": 90, "beta": "90", "gamma": 90,
          "multipliers": ["2", 1, 1]}"#,
    )
    .unwrap();
    assert_eq!(input.multipliers, [2.0, 1.0, 1.0]);
    assert!(input.validate().is_ok());

    let bad: BasisVectorInput = serde_json::from_str(
      r#"{"a_x": "one", "b_x": 0, "b_y": 1, "c_x": 0, "c_y": 0, "c_z": 1}"#,
    )
    .unwrap();
    assert_eq!(bad.multipliers, [1.0; 3]);
    assert_eq!(bad.validate(), Err(LatticeError::NonNumeric));
  }
}
