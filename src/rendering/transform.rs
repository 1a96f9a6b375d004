// src/rendering/transform.rs

//! Camera parameters and the two matrices derived from them.

use crate::config::ViewConfig;
use crate::model::SuperCell;
use crate::utils::linalg::deg_to_rad;
use crate::utils::m4::{self, M4};
use nalgebra::Vector3;

/// One instance lives for the whole session and is mutated by camera input.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformParameters {
  pub translation: Vector3<f64>,
  /// Euler angles in radians, applied X, then Y, then Z.
  pub rotation: Vector3<f64>,
  /// Uniform in practice; every zoom writes all three components.
  pub scale: Vector3<f64>,
}

impl TransformParameters {
  /// Start pose from the config, recentred on `super_cell`.
  pub fn new(view: &ViewConfig, super_cell: &SuperCell) -> Self {
    let [rx, ry, rz] = view.rotation_degrees;
    let mut params = Self {
      translation: Vector3::zeros(),
      rotation: Vector3::new(deg_to_rad(rx), deg_to_rad(ry), deg_to_rad(rz)),
      scale: Vector3::repeat(view.scale),
    };
    params.recenter(super_cell);
    params
  }

  /// translation = -(A + B + C) / 2
  pub fn recenter(&mut self, super_cell: &SuperCell) {
    self.translation = super_cell.diagonal() * -0.5;
  }

  /// Scale so the longest supercell edge spans `fit_size` units.
  pub fn fit(&mut self, super_cell: &SuperCell, fit_size: f64) {
    let longest = super_cell.edge_lengths().into_iter().fold(0.0, f64::max);
    if longest > 0.0 && longest.is_finite() {
      self.set_uniform_scale(fit_size / longest);
    } else {
      log::warn!("Supercell has no extent; keeping scale {:.3}", self.uniform_scale());
    }
  }

  pub fn uniform_scale(&self) -> f64 {
    self.scale.x
  }

  pub fn set_uniform_scale(&mut self, s: f64) {
    self.scale = Vector3::repeat(s);
  }

  /// Horizontal motion turns about Z, vertical about X.
  pub fn drag(&mut self, dx: f64, dy: f64, view: &ViewConfig) {
    self.rotation.z += view.drag_sensitivity * dx;
    self.rotation.x += view.drag_sensitivity * dy;
  }

  /// Positive `delta_y` (scrolling down) zooms out.
  pub fn wheel(&mut self, delta_y: f64, view: &ViewConfig) {
    let s = self.uniform_scale();
    self.set_clamped_scale(s - s * view.wheel_factor * delta_y, view);
  }

  pub fn zoom_in(&mut self, view: &ViewConfig) {
    let s = self.uniform_scale();
    self.set_clamped_scale(s + s * view.zoom_step, view);
  }

  pub fn zoom_out(&mut self, view: &ViewConfig) {
    let s = self.uniform_scale();
    self.set_clamped_scale(s - s * view.zoom_step, view);
  }

  pub fn rotate_right(&mut self, view: &ViewConfig) {
    self.rotation.z += view.rotate_step;
  }

  pub fn rotate_left(&mut self, view: &ViewConfig) {
    self.rotation.z -= view.rotate_step;
  }

  pub fn rotate_up(&mut self, view: &ViewConfig) {
    self.rotation.x -= view.rotate_step;
  }

  pub fn rotate_down(&mut self, view: &ViewConfig) {
    self.rotation.x += view.rotate_step;
  }

  fn set_clamped_scale(&mut self, s: f64, view: &ViewConfig) {
    self.set_uniform_scale(clamp_scale(s, view.min_scale, view.max_scale));
  }
}

pub fn clamp_scale(s: f64, min: f64, max: f64) -> f64 {
  if s <= min {
    min
  } else if s >= max {
    max
  } else {
    s
  }
}

/// identity -> scale -> rotX -> rotY -> rotZ -> translate, each right-multiplied.
pub fn transform_matrix(params: &TransformParameters) -> M4 {
  let mut matrix = m4::identity();
  matrix = m4::scale(&matrix, params.scale.x, params.scale.y, params.scale.z);
  matrix = rotations(&matrix, &params.rotation);
  m4::translate(
    &matrix,
    params.translation.x,
    params.translation.y,
    params.translation.z,
  )
}

/// Rotation part only; used to turn the fixed light into object space.
pub fn lighting_matrix(params: &TransformParameters) -> M4 {
  rotations(&m4::identity(), &params.rotation)
}

fn rotations(matrix: &M4, rotation: &Vector3<f64>) -> M4 {
  let matrix = m4::x_rotate(matrix, rotation.x);
  let matrix = m4::y_rotate(&matrix, rotation.y);
  m4::z_rotate(&matrix, rotation.z)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{build_super_cell, Multipliers, UnitCell};

  fn cube(n: u32) -> SuperCell {
    build_super_cell(&UnitCell::default(), Multipliers::new(n, n, n).unwrap())
  }

  fn apply(m: &M4, p: Vector3<f64>) -> Vector3<f64> {
    let out = m4::transform_vector(m, [p.x, p.y, p.z, 1.0]);
    Vector3::new(out[0], out[1], out[2])
  }

  #[test]
  fn test_initial_pose() {
    let view = ViewConfig::default();
    let params = TransformParameters::new(&view, &cube(1));
    assert_eq!(params.translation, Vector3::new(-0.5, -0.5, -0.5));
    assert_eq!(params.scale, Vector3::repeat(600.0));
    assert!((params.rotation.x - deg_to_rad(30.0)).abs() < 1e-15);
    assert!((params.rotation.z - deg_to_rad(125.0)).abs() < 1e-15);
  }

  #[test]
  fn test_centroid_maps_to_origin() {
    let view = ViewConfig::default();
    let mut params = TransformParameters::new(&view, &cube(2));
    params.drag(37.0, -12.0, &view);
    let m = transform_matrix(&params);
    let centre = apply(&m, Vector3::new(1.0, 1.0, 1.0));
    assert!(centre.norm() < 1e-9);
  }

  #[test]
  fn test_lighting_matrix_has_no_scale_or_translation() {
    let view = ViewConfig::default();
    let params = TransformParameters::new(&view, &cube(3));
    let l = lighting_matrix(&params);
    assert!(apply(&l, Vector3::zeros()).norm() < 1e-12);
    let v = apply(&l, Vector3::new(0.0, 3.0, 4.0));
    assert!((v.norm() - 5.0).abs() < 1e-12);
  }

  #[test]
  fn test_model_rotation_matches_lighting_rotation() {
    let view = ViewConfig::default();
    let params = TransformParameters::new(&view, &cube(1));
    let m = transform_matrix(&params);
    let l = lighting_matrix(&params);
    // A direction through the model matrix is the lit direction times the scale.
    let d = [0.3, -0.2, 0.9, 0.0];
    let through_m = m4::transform_vector(&m, d);
    let through_l = m4::transform_vector(&l, d);
    for i in 0..3 {
      assert!((through_m[i] - 600.0 * through_l[i]).abs() < 1e-9);
    }
  }

  #[test]
  fn test_drag_and_rotate_buttons() {
    let view = ViewConfig::default();
    let mut params = TransformParameters::new(&view, &cube(1));
    let start = params.rotation;
    params.drag(10.0, -5.0, &view);
    assert!((params.rotation.z - start.z - 0.1).abs() < 1e-12);
    assert!((params.rotation.x - start.x + 0.05).abs() < 1e-12);
    assert_eq!(params.rotation.y, start.y);

    let before = params.rotation;
    params.rotate_right(&view);
    params.rotate_up(&view);
    assert!((params.rotation.z - before.z - 0.1).abs() < 1e-12);
    assert!((params.rotation.x - before.x + 0.1).abs() < 1e-12);
    params.rotate_left(&view);
    params.rotate_down(&view);
    assert!((params.rotation - before).norm() < 1e-12);
  }

  #[test]
  fn test_zoom_steps_and_clamp() {
    let view = ViewConfig::default();
    let mut params = TransformParameters::new(&view, &cube(1));
    params.zoom_in(&view);
    assert!((params.uniform_scale() - 660.0).abs() < 1e-9);
    params.zoom_out(&view);
    assert!((params.uniform_scale() - 594.0).abs() < 1e-9);

    params.wheel(100.0, &view);
    assert!((params.uniform_scale() - 534.6).abs() < 1e-9);

    params.wheel(-100000.0, &view);
    assert_eq!(params.scale, Vector3::repeat(1000.0));
    params.wheel(5000.0, &view);
    assert_eq!(params.uniform_scale(), 1.0);
  }

  #[test]
  fn test_clamp_scale_bounds() {
    assert_eq!(clamp_scale(0.5, 1.0, 1000.0), 1.0);
    assert_eq!(clamp_scale(1.0, 1.0, 1000.0), 1.0);
    assert_eq!(clamp_scale(42.0, 1.0, 1000.0), 42.0);
    assert_eq!(clamp_scale(1e6, 1.0, 1000.0), 1000.0);
  }

  #[test]
  fn test_fit_uses_longest_edge() {
    let unit = UnitCell {
      a_hat: Vector3::new(2.0, 0.0, 0.0),
      b_hat: Vector3::new(0.0, 3.0, 0.0),
      ..UnitCell::default()
    };
    let sc = build_super_cell(&unit, Multipliers::new(4, 1, 1).unwrap());
    let mut params = TransformParameters::new(&ViewConfig::default(), &sc);
    params.fit(&sc, 600.0);
    assert!((params.uniform_scale() - 75.0).abs() < 1e-12);

    let flat = UnitCell {
      a_hat: Vector3::zeros(),
      b_hat: Vector3::zeros(),
      c_hat: Vector3::zeros(),
      atoms: vec![],
    };
    let degenerate = build_super_cell(&flat, Multipliers::ONE);
    params.fit(&degenerate, 600.0);
    assert!((params.uniform_scale() - 75.0).abs() < 1e-12);
  }
}
