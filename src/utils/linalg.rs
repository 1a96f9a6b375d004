// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

/// Converts degrees to radians.
pub fn deg_to_rad(d: f64) -> f64 {
  d * std::f64::consts::PI / 180.0
}

/// Converts radians to degrees.
pub fn rad_to_deg(r: f64) -> f64 {
  r * 180.0 / std::f64::consts::PI
}

/// Stacks the three basis vectors as the columns of a matrix.
pub fn basis_matrix(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> Matrix3<f64> {
  Matrix3::from_columns(&[*a, *b, *c])
}

/// Convert fractional coordinates to Cartesian using the cell basis vectors
///
/// # Formula
/// ```text
/// Cartesian = x * A + y * B + z * C
/// ```
pub fn frac_to_cart(
  frac: [f64; 3],
  a: &Vector3<f64>,
  b: &Vector3<f64>,
  c: &Vector3<f64>,
) -> Vector3<f64> {
  a * frac[0] + b * frac[1] + c * frac[2]
}

/// Convert Cartesian coordinates to fractional.
///
/// Returns None if the basis is singular.
#[cfg(test)]
pub(crate) fn cart_to_frac(
  cart: &Vector3<f64>,
  a: &Vector3<f64>,
  b: &Vector3<f64>,
  c: &Vector3<f64>,
) -> Option<[f64; 3]> {
  let inv = basis_matrix(a, b, c).try_inverse()?;
  let frac = inv * cart;
  Some([frac.x, frac.y, frac.z])
}

/// Signed volume of the parallelepiped spanned by the basis (`A · (B x C)`).
pub fn cell_volume(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
  basis_matrix(a, b, c).determinant()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cubic_lattice() {
    let a = Vector3::new(5.0, 0.0, 0.0);
    let b = Vector3::new(0.0, 5.0, 0.0);
    let c = Vector3::new(0.0, 0.0, 5.0);

    let cart = frac_to_cart([0.5, 0.5, 0.5], &a, &b, &c);

    assert!((cart.x - 2.5).abs() < 1e-10);
    assert!((cart.y - 2.5).abs() < 1e-10);
    assert!((cart.z - 2.5).abs() < 1e-10);
    assert!((cell_volume(&a, &b, &c) - 125.0).abs() < 1e-9);
  }

  #[test]
  fn test_roundtrip() {
    // Non-orthogonal lattice
    let a = Vector3::new(4.0, 0.0, 0.0);
    let b = Vector3::new(2.0, 3.46, 0.0);
    let c = Vector3::new(0.3, 0.2, 5.0);

    let frac_orig = [0.333, 0.667, 0.25];
    let cart = frac_to_cart(frac_orig, &a, &b, &c);
    let frac_back = cart_to_frac(&cart, &a, &b, &c).unwrap();

    for i in 0..3 {
      assert!((frac_back[i] - frac_orig[i]).abs() < 1e-10);
    }
  }

  #[test]
  fn test_singular_basis() {
    let a = Vector3::new(1.0, 0.0, 0.0);
    let b = Vector3::new(2.0, 0.0, 0.0);
    let c = Vector3::new(0.0, 0.0, 1.0);

    assert!(cart_to_frac(&Vector3::new(1.0, 1.0, 1.0), &a, &b, &c).is_none());
    assert_eq!(cell_volume(&a, &b, &c), 0.0);
  }

  #[test]
  fn test_degree_conversion() {
    assert!((deg_to_rad(180.0) - std::f64::consts::PI).abs() < 1e-15);
    assert!((rad_to_deg(deg_to_rad(37.5)) - 37.5).abs() < 1e-12);
  }
}
