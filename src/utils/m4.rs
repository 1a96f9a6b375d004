// src/utils/m4.rs

//! 4x4 transform kernel.
//!
//! Matrices are flat, 16-element, row-major arrays. Points are row vectors
//! (`transform_vector` computes `p * M`), so `multiply(a, b)` yields a matrix
//! that applies `b` to a point first and `a` second. The convenience wrappers
//! (`translate`, `x_rotate`, ...) are all `multiply(m, op)`.

pub type M4 = [f64; 16];

pub fn identity() -> M4 {
  [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
  ]
}

/// Simplified clip-space mapping. Model z lands on clip y and model y on
/// clip z, so the c axis of a canonical cell points up the screen.
pub fn orthographic(width: f64, height: f64, depth: f64) -> M4 {
  [
    1.0 / width, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0 / depth, 0.0, //
    0.0, 1.0 / height, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
  ]
}

pub fn translation(tx: f64, ty: f64, tz: f64) -> M4 {
  [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    tx, ty, tz, 1.0,
  ]
}

pub fn x_rotation(angle_in_radians: f64) -> M4 {
  let (s, c) = angle_in_radians.sin_cos();
  [
    1.0, 0.0, 0.0, 0.0, //
    0.0, c, s, 0.0, //
    0.0, -s, c, 0.0, //
    0.0, 0.0, 0.0, 1.0,
  ]
}

pub fn y_rotation(angle_in_radians: f64) -> M4 {
  let (s, c) = angle_in_radians.sin_cos();
  [
    c, 0.0, -s, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    s, 0.0, c, 0.0, //
    0.0, 0.0, 0.0, 1.0,
  ]
}

pub fn z_rotation(angle_in_radians: f64) -> M4 {
  let (s, c) = angle_in_radians.sin_cos();
  [
    c, s, 0.0, 0.0, //
    -s, c, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
  ]
}

pub fn scaling(sx: f64, sy: f64, sz: f64) -> M4 {
  [
    sx, 0.0, 0.0, 0.0, //
    0.0, sy, 0.0, 0.0, //
    0.0, 0.0, sz, 0.0, //
    0.0, 0.0, 0.0, 1.0,
  ]
}

pub fn translate(m: &M4, tx: f64, ty: f64, tz: f64) -> M4 {
  multiply(m, &translation(tx, ty, tz))
}

pub fn x_rotate(m: &M4, angle_in_radians: f64) -> M4 {
  multiply(m, &x_rotation(angle_in_radians))
}

pub fn y_rotate(m: &M4, angle_in_radians: f64) -> M4 {
  multiply(m, &y_rotation(angle_in_radians))
}

pub fn z_rotate(m: &M4, angle_in_radians: f64) -> M4 {
  multiply(m, &z_rotation(angle_in_radians))
}

pub fn scale(m: &M4, sx: f64, sy: f64, sz: f64) -> M4 {
  multiply(m, &scaling(sx, sy, sz))
}

/// Homogeneous transform of a single point: `point * matrix`.
pub fn transform_vector(matrix: &M4, point: [f64; 4]) -> [f64; 4] {
  let mut out = [0.0; 4];
  for (col, value) in out.iter_mut().enumerate() {
    *value = point[0] * matrix[col]
      + point[1] * matrix[4 + col]
      + point[2] * matrix[8 + col]
      + point[3] * matrix[12 + col];
  }
  out
}

/// `result[row][col] = sum_k b[row][k] * a[k][col]`, i.e. the product `b * a`.
pub fn multiply(a: &M4, b: &M4) -> M4 {
  let mut out = [0.0; 16];
  for row in 0..4 {
    for col in 0..4 {
      out[row * 4 + col] = b[row * 4] * a[col]
        + b[row * 4 + 1] * a[4 + col]
        + b[row * 4 + 2] * a[8 + col]
        + b[row * 4 + 3] * a[12 + col];
    }
  }
  out
}

pub fn to_f32(m: &M4) -> [f32; 16] {
  let mut out = [0.0f32; 16];
  for (dst, src) in out.iter_mut().zip(m.iter()) {
    *dst = *src as f32;
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::f64::consts::FRAC_PI_2;

  fn assert_close(a: [f64; 4], b: [f64; 4]) {
    for i in 0..4 {
      assert!((a[i] - b[i]).abs() < 1e-12, "component {}: {} vs {}", i, a[i], b[i]);
    }
  }

  #[test]
  fn test_identity_is_neutral() {
    let t = translation(1.0, 2.0, 3.0);
    assert_eq!(multiply(&identity(), &t), t);
    assert_eq!(multiply(&t, &identity()), t);
  }

  #[test]
  fn test_translation_moves_points_not_directions() {
    let t = translation(1.0, -2.0, 0.5);
    assert_close(transform_vector(&t, [1.0, 1.0, 1.0, 1.0]), [2.0, -1.0, 1.5, 1.0]);
    assert_close(transform_vector(&t, [1.0, 1.0, 1.0, 0.0]), [1.0, 1.0, 1.0, 0.0]);
  }

  #[test]
  fn test_rotations_are_right_handed() {
    // x -> y about z, y -> z about x, z -> x about y
    assert_close(
      transform_vector(&z_rotation(FRAC_PI_2), [1.0, 0.0, 0.0, 1.0]),
      [0.0, 1.0, 0.0, 1.0],
    );
    assert_close(
      transform_vector(&x_rotation(FRAC_PI_2), [0.0, 1.0, 0.0, 1.0]),
      [0.0, 0.0, 1.0, 1.0],
    );
    assert_close(
      transform_vector(&y_rotation(FRAC_PI_2), [0.0, 0.0, 1.0, 1.0]),
      [1.0, 0.0, 0.0, 1.0],
    );
  }

  #[test]
  fn test_multiply_applies_second_operand_first() {
    // translate(scaling) moves the point, then scales it
    let m = translate(&scaling(2.0, 2.0, 2.0), 1.0, 0.0, 0.0);
    assert_close(transform_vector(&m, [0.0, 0.0, 0.0, 1.0]), [2.0, 0.0, 0.0, 1.0]);

    // scale(translation) scales, then moves
    let m = scale(&translation(1.0, 0.0, 0.0), 2.0, 2.0, 2.0);
    assert_close(transform_vector(&m, [1.0, 0.0, 0.0, 1.0]), [3.0, 0.0, 0.0, 1.0]);
  }

  #[test]
  fn test_rotation_order_is_not_commutative() {
    let xy = y_rotate(&x_rotation(0.3), 0.7);
    let yx = x_rotate(&y_rotation(0.7), 0.3);
    assert_ne!(xy, yx);
  }

  #[test]
  fn test_orthographic_swaps_y_and_z() {
    let p = orthographic(800.0, 600.0, 100000.0);
    assert_close(
      transform_vector(&p, [400.0, 50000.0, 300.0, 1.0]),
      [0.5, 0.5, 0.5, 1.0],
    );
  }
}
