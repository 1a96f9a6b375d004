// src/rendering/scene.rs

use super::backend::{BufferData, Label, LineDraw, ProgramKind, RenderBackend, RenderError, TriangleDraw};
use super::mesh::MeshData;
use crate::config::{CanvasConfig, Config};
use crate::model::SuperCell;
use crate::utils::linalg::frac_to_cart;
use crate::utils::m4::{self, M4};
use nalgebra::Vector3;

/// Backend handles for the uploaded meshes.
#[derive(Clone, Debug)]
pub struct MeshBuffers<B> {
  pub cell_positions: B,
  pub cell_colors: B,
  pub cell_indices: B,
  pub atom_positions: B,
  pub atom_indices: B,
  pub cell_index_count: usize,
  pub atom_index_count: usize,
}

#[derive(Clone, Debug)]
pub struct Programs<P> {
  pub line_mesh: P,
  pub triangle_mesh: P,
}

#[derive(Clone, Debug)]
pub struct CellObject<B, P> {
  pub position_buffer: B,
  pub color_buffer: B,
  pub index_buffer: B,
  pub index_count: usize,
  pub program: P,
  pub transform_matrix: M4,
}

#[derive(Clone, Debug)]
pub struct AtomObject<B, P> {
  pub position_buffer: B,
  pub index_buffer: B,
  pub index_count: usize,
  pub program: P,
  pub transform_matrix: M4,
  pub lighting_matrix: M4,
}

/// Everything `draw_scene` needs besides the model itself.
#[derive(Clone, Debug)]
pub struct SceneObjects<B, P> {
  pub cell: CellObject<B, P>,
  pub atom: AtomObject<B, P>,
}

pub fn create_programs<R: RenderBackend>(backend: &mut R) -> Result<Programs<R::Program>, RenderError> {
  Ok(Programs {
    line_mesh: backend.create_program(ProgramKind::LineMesh)?,
    triangle_mesh: backend.create_program(ProgramKind::TriangleMesh)?,
  })
}

pub fn initialize_buffers<R: RenderBackend>(
  backend: &mut R,
  mesh: &MeshData,
) -> Result<MeshBuffers<R::Buffer>, RenderError> {
  let mut buffers = MeshBuffers {
    cell_positions: backend.create_buffer()?,
    cell_colors: backend.create_buffer()?,
    cell_indices: backend.create_buffer()?,
    atom_positions: backend.create_buffer()?,
    atom_indices: backend.create_buffer()?,
    cell_index_count: 0,
    atom_index_count: 0,
  };
  update_buffers(backend, &mut buffers, mesh)?;
  Ok(buffers)
}

/// Re-uploads every mesh into the existing buffers.
pub fn update_buffers<R: RenderBackend>(
  backend: &mut R,
  buffers: &mut MeshBuffers<R::Buffer>,
  mesh: &MeshData,
) -> Result<(), RenderError> {
  backend.upload(&buffers.cell_positions, BufferData::F32(&mesh.cell.positions))?;
  backend.upload(&buffers.cell_colors, BufferData::U8(&mesh.cell.colors))?;
  backend.upload(&buffers.cell_indices, BufferData::U16(&mesh.cell.indices))?;
  backend.upload(&buffers.atom_positions, BufferData::F32(&mesh.atom.positions))?;
  backend.upload(&buffers.atom_indices, BufferData::U16(&mesh.atom.indices))?;
  buffers.cell_index_count = mesh.cell.indices.len();
  buffers.atom_index_count = mesh.atom.indices.len();
  Ok(())
}

pub fn generate_scene_objects<B: Clone, P: Clone>(
  buffers: &MeshBuffers<B>,
  programs: &Programs<P>,
  transform_matrix: &M4,
  lighting_matrix: &M4,
) -> SceneObjects<B, P> {
  SceneObjects {
    cell: CellObject {
      position_buffer: buffers.cell_positions.clone(),
      color_buffer: buffers.cell_colors.clone(),
      index_buffer: buffers.cell_indices.clone(),
      index_count: buffers.cell_index_count,
      program: programs.line_mesh.clone(),
      transform_matrix: *transform_matrix,
    },
    atom: AtomObject {
      position_buffer: buffers.atom_positions.clone(),
      index_buffer: buffers.atom_indices.clone(),
      index_count: buffers.atom_index_count,
      program: programs.triangle_mesh.clone(),
      transform_matrix: *transform_matrix,
      lighting_matrix: *lighting_matrix,
    },
  }
}

pub fn projection_matrix(canvas: &CanvasConfig) -> M4 {
  m4::orthographic(canvas.width, canvas.height, canvas.depth)
}

/// Sphere template -> scaled by `atom_scale` -> moved to `r` -> model transform -> projection.
pub fn atom_matrix(projection: &M4, transform: &M4, r: &Vector3<f64>, atom_scale: f64) -> M4 {
  let placed = m4::translate(transform, r.x, r.y, r.z);
  let projected = m4::multiply(projection, &placed);
  m4::scale(&projected, atom_scale, atom_scale, atom_scale)
}

/// Shading factor in [0, 1] for one template vertex.
pub fn lambert_multiplier(vertex: [f64; 3], lighting: &M4, light_direction: [f64; 3]) -> f64 {
  let rotated = m4::transform_vector(lighting, [vertex[0], vertex[1], vertex[2], 1.0]);
  let normal = Vector3::new(rotated[0], rotated[1], rotated[2]).normalize();
  let light = Vector3::from(light_direction).normalize();
  (light.dot(&normal) + 1.0) / 2.0
}

/// Clip space to integer pixels, y pointing down.
pub fn pixel_position(clip: [f64; 4], width: f64, height: f64) -> (i64, i64) {
  let px = (clip[0] * 0.5 + 0.5) * width;
  let py = (clip[1] * -0.5 + 0.5) * height;
  (px.floor() as i64, py.floor() as i64)
}

/// Origin and a/b/c tip labels, placed with `projection * transform`.
pub fn labels(super_cell: &SuperCell, projection: &M4, transform: &M4, canvas: &CanvasConfig) -> Vec<Label> {
  let matrix = m4::multiply(projection, transform);
  let m = super_cell.multipliers;
  let anchors = [
    ("[0, 0, 0]".to_string(), Vector3::zeros()),
    (axis_label("â", m.a), super_cell.a_hat),
    (axis_label("b̂", m.b), super_cell.b_hat),
    (axis_label("ĉ", m.c), super_cell.c_hat),
  ];

  anchors
    .into_iter()
    .map(|(text, p)| {
      let clip = m4::transform_vector(&matrix, [p.x, p.y, p.z, 1.0]);
      let (x, y) = pixel_position(clip, canvas.width, canvas.height);
      Label { text, x, y }
    })
    .collect()
}

fn axis_label(symbol: &str, multiplier: u32) -> String {
  if multiplier > 1 {
    format!("{}x{}", multiplier, symbol)
  } else {
    symbol.to_string()
  }
}

fn rgba((r, g, b): (f64, f64, f64)) -> [f32; 4] {
  [r as f32, g as f32, b as f32, 1.0]
}

/// One frame: clear, cell wireframe, one sphere per supercell atom, labels.
pub fn draw_scene<R: RenderBackend>(
  backend: &mut R,
  scene: &SceneObjects<R::Buffer, R::Program>,
  super_cell: &SuperCell,
  config: &Config,
) -> Result<(), RenderError> {
  let projection = projection_matrix(&config.canvas);

  backend.clear(rgba(config.style.background))?;

  // 1. Cell
  let cell = &scene.cell;
  backend.draw_lines(LineDraw {
    program: &cell.program,
    positions: &cell.position_buffer,
    colors: &cell.color_buffer,
    indices: &cell.index_buffer,
    count: cell.index_count,
    matrix: m4::to_f32(&m4::multiply(&projection, &cell.transform_matrix)),
  })?;

  // 2. Atoms
  let atom = &scene.atom;
  let lighting = m4::to_f32(&atom.lighting_matrix);
  for a in &super_cell.atoms {
    let r = frac_to_cart(a.position, &super_cell.a_hat, &super_cell.b_hat, &super_cell.c_hat);
    let matrix = atom_matrix(&projection, &atom.transform_matrix, &r, config.sphere.atom_scale);
    backend.draw_triangles(TriangleDraw {
      program: &atom.program,
      positions: &atom.position_buffer,
      indices: &atom.index_buffer,
      count: atom.index_count,
      matrix: m4::to_f32(&matrix),
      lighting,
      color: config.style.element_color(&a.element),
    })?;
  }

  // 3. Labels
  let label_color = rgba(config.style.label_color);
  for label in labels(super_cell, &projection, &cell.transform_matrix, &config.canvas) {
    backend.draw_label(&label, label_color)?;
  }

  Ok(())
}
