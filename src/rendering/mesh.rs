// src/rendering/mesh.rs

use crate::model::SuperCell;
use nalgebra::Vector3;
use serde::Serialize;
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
  #[error("sphere needs at least 3 latitudes and 3 longitudes (got {latitude}x{longitude})")]
  TooFewSubdivisions { latitude: usize, longitude: usize },
  #[error("sphere with {0} vertices does not fit 16-bit indices")]
  TooManyVertices(usize),
}

/// Cell wireframe: 8 corners, one colour per corner, 12 edges as a line list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellMesh {
  #[serde(rename = "position_vertices")]
  pub positions: Vec<f32>,
  #[serde(rename = "color_vertices")]
  pub colors: Vec<u8>,
  pub indices: Vec<u16>,
}

/// Unit-sphere template shared by every atom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomMesh {
  #[serde(rename = "position_vertices")]
  pub positions: Vec<f32>,
  pub indices: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshData {
  pub cell: CellMesh,
  pub atom: AtomMesh,
}

// Corner order: 0, a, b, c, b+c, a+c, a+b, a+b+c
const CORNER_COLORS: [u8; 24] = [
  0, 0, 0, //
  1, 0, 0, //
  0, 1, 0, //
  0, 0, 1, //
  0, 1, 1, //
  1, 0, 1, //
  1, 1, 0, //
  1, 1, 1,
];

const CELL_EDGES: [u16; 24] = [
  0, 1, //
  0, 2, //
  0, 3, //
  1, 5, //
  1, 6, //
  2, 4, //
  2, 6, //
  3, 4, //
  3, 5, //
  4, 7, //
  5, 7, //
  6, 7,
];

pub fn generate_mesh_data(
  super_cell: &SuperCell,
  latitude_count: usize,
  longitude_count: usize,
) -> Result<MeshData, MeshError> {
  let data = MeshData {
    cell: cell_mesh(super_cell),
    atom: sphere_mesh(latitude_count, longitude_count)?,
  };
  log::debug!(
    "Meshes regenerated: {} sphere vertices, {} sphere indices",
    data.atom.positions.len() / 3,
    data.atom.indices.len()
  );
  Ok(data)
}

pub fn cell_mesh(super_cell: &SuperCell) -> CellMesh {
  let a = super_cell.a_hat;
  let b = super_cell.b_hat;
  let c = super_cell.c_hat;
  let corners = [
    Vector3::zeros(),
    a,
    b,
    c,
    b + c,
    a + c,
    a + b,
    a + b + c,
  ];

  let positions = corners
    .iter()
    .flat_map(|v| [v.x as f32, v.y as f32, v.z as f32])
    .collect();

  CellMesh {
    positions,
    colors: CORNER_COLORS.to_vec(),
    indices: CELL_EDGES.to_vec(),
  }
}

pub fn sphere_mesh(latitude_count: usize, longitude_count: usize) -> Result<AtomMesh, MeshError> {
  if latitude_count < 3 || longitude_count < 3 {
    return Err(MeshError::TooFewSubdivisions {
      latitude: latitude_count,
      longitude: longitude_count,
    });
  }
  let vertex_count = sphere_vertex_count(latitude_count, longitude_count);
  if vertex_count > u16::MAX as usize + 1 {
    return Err(MeshError::TooManyVertices(vertex_count));
  }

  Ok(AtomMesh {
    positions: sphere_positions(latitude_count, longitude_count),
    indices: sphere_indices(latitude_count, longitude_count),
  })
}

/// Two poles plus `L - 2` rings of `N` vertices.
pub fn sphere_vertex_count(latitude_count: usize, longitude_count: usize) -> usize {
  2 + (latitude_count - 2) * longitude_count
}

fn sphere_positions(latitude_count: usize, longitude_count: usize) -> Vec<f32> {
  let mut vertices = Vec::with_capacity(3 * sphere_vertex_count(latitude_count, longitude_count));
  vertices.extend_from_slice(&[0.0, 0.0, 1.0]);

  for lat in 1..latitude_count - 1 {
    let phi = PI * lat as f64 / (latitude_count - 1) as f64;
    let (sin_phi, cos_phi) = phi.sin_cos();
    for long in 0..longitude_count {
      let theta = 2.0 * PI * long as f64 / longitude_count as f64;
      let (sin_theta, cos_theta) = theta.sin_cos();
      vertices.push((sin_phi * cos_theta) as f32);
      vertices.push((sin_phi * sin_theta) as f32);
      vertices.push(cos_phi as f32);
    }
  }

  vertices.extend_from_slice(&[0.0, 0.0, -1.0]);
  vertices
}

fn sphere_indices(latitude_count: usize, longitude_count: usize) -> Vec<u16> {
  let n = longitude_count;

  // Layer 0 is the north pole, the last layer the south pole.
  let mut layers: Vec<Vec<u16>> = vec![vec![0]];
  for lat in 1..latitude_count - 1 {
    layers.push(((lat - 1) * n + 1..lat * n + 1).map(|i| i as u16).collect());
  }
  let south = (sphere_vertex_count(latitude_count, longitude_count) - 1) as u16;
  layers.push(vec![south]);

  let rings = &layers[1..layers.len() - 1];
  let mut indices = Vec::with_capacity(6 * n * (latitude_count - 2));

  // 1. Top fan
  let top = &rings[0];
  for i in 0..n {
    indices.extend_from_slice(&[0, top[i], top[(i + 1) % n]]);
  }

  // 2. Quad strips between consecutive rings, two triangles per quad
  for pair in rings.windows(2) {
    let (upper, lower) = (&pair[0], &pair[1]);
    for j in 0..n {
      let k = (j + 1) % n;
      indices.extend_from_slice(&[upper[j], lower[j], lower[k]]);
      indices.extend_from_slice(&[upper[j], lower[k], upper[k]]);
    }
  }

  // 3. Bottom fan
  let bottom = &rings[rings.len() - 1];
  for i in 0..n {
    indices.extend_from_slice(&[bottom[i], south, bottom[(i + 1) % n]]);
  }

  indices
}
