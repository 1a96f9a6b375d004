// src/rendering/export.rs

use super::backend::{Label, RenderBackend, RenderError};
use super::mesh::{AtomMesh, CellMesh, MeshData};
use super::scene;
use crate::config::Config;
use crate::model::SuperCell;
use crate::utils::m4::{self, M4};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

/// One placed sphere of the frame.
#[derive(Debug, Clone, Serialize)]
pub struct AtomInstance {
  pub element: String,
  pub color: [f32; 4],
  pub matrix: [f32; 16],
}

/// Everything a renderer needs to draw one frame, as plain arrays.
#[derive(Debug, Serialize)]
pub struct FramePayload<'a> {
  pub cell_mesh: &'a CellMesh,
  pub atom_mesh: &'a AtomMesh,
  pub transform_matrix: [f32; 16],
  pub lighting_matrix: [f32; 16],
  pub projection_matrix: [f32; 16],
  pub atoms: Vec<AtomInstance>,
  pub labels: Vec<Label>,
}

impl<'a> FramePayload<'a> {
  pub fn new(
    mesh: &'a MeshData,
    super_cell: &SuperCell,
    transform: &M4,
    lighting: &M4,
    config: &Config,
  ) -> Self {
    let projection = scene::projection_matrix(&config.canvas);
    let atoms = super_cell
      .atoms
      .iter()
      .map(|atom| {
        let r = crate::utils::linalg::frac_to_cart(
          atom.position,
          &super_cell.a_hat,
          &super_cell.b_hat,
          &super_cell.c_hat,
        );
        AtomInstance {
          element: atom.element.clone(),
          color: config.style.element_color(&atom.element),
          matrix: m4::to_f32(&scene::atom_matrix(
            &projection,
            transform,
            &r,
            config.sphere.atom_scale,
          )),
        }
      })
      .collect();

    Self {
      cell_mesh: &mesh.cell,
      atom_mesh: &mesh.atom,
      transform_matrix: m4::to_f32(transform),
      lighting_matrix: m4::to_f32(lighting),
      projection_matrix: m4::to_f32(&projection),
      atoms,
      labels: scene::labels(super_cell, &projection, transform, &config.canvas),
    }
  }
}

/// Writes the frame payload as pretty JSON.
pub fn write_frame(path: &Path, payload: &FramePayload<'_>) -> io::Result<()> {
  let writer = BufWriter::new(File::create(path)?);
  serde_json::to_writer_pretty(writer, payload).map_err(io::Error::from)?;
  log::info!("Frame written to {:?}", path);
  Ok(())
}

/// Full pipeline on a fresh backend: programs, buffers, scene objects, draw, finish.
pub fn render_frame<R: RenderBackend>(
  backend: &mut R,
  mesh: &MeshData,
  super_cell: &SuperCell,
  transform: &M4,
  lighting: &M4,
  config: &Config,
) -> Result<(), RenderError> {
  let programs = scene::create_programs(backend)?;
  let buffers = scene::initialize_buffers(backend, mesh)?;
  let objects = scene::generate_scene_objects(&buffers, &programs, transform, lighting);
  scene::draw_scene(backend, &objects, super_cell, config)?;
  backend.finish()
}

#[cfg(feature = "cairo")]
pub fn export_image(
  path: &Path,
  mesh: &MeshData,
  super_cell: &SuperCell,
  transform: &M4,
  lighting: &M4,
  config: &Config,
) -> Result<(), RenderError> {
  use super::painter::{CairoBackend, ImageFormat};

  let format = ImageFormat::from_path(path).ok_or_else(|| {
    RenderError::Surface(format!("unsupported image extension: {}", path.display()))
  })?;
  let mut backend = CairoBackend::new(
    path,
    format,
    config.canvas.width,
    config.canvas.height,
    config.style.light_direction,
  );
  render_frame(&mut backend, mesh, super_cell, transform, lighting, config)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{build_super_cell, Atom, Multipliers, UnitCell};
  use crate::rendering::backend::{DrawCall, RecordingBackend};
  use crate::rendering::mesh::generate_mesh_data;
  use crate::rendering::transform::{lighting_matrix, transform_matrix, TransformParameters};

  fn setup() -> (SuperCell, MeshData, M4, M4, Config) {
    let unit = UnitCell {
      atoms: vec![
        Atom::new("Cs", 0.0, 0.0, 0.0).unwrap(),
        Atom::new("Cl", 0.5, 0.5, 0.5).unwrap(),
      ],
      ..UnitCell::default()
    };
    let sc = build_super_cell(&unit, Multipliers::new(2, 1, 1).unwrap());
    let config = Config::default();
    let mesh = generate_mesh_data(&sc, 10, 10).unwrap();
    let params = TransformParameters::new(&config.view, &sc);
    let (m, l) = (transform_matrix(&params), lighting_matrix(&params));
    (sc, mesh, m, l, config)
  }

  #[test]
  fn test_payload_field_names() {
    let (sc, mesh, m, l, config) = setup();
    let payload = FramePayload::new(&mesh, &sc, &m, &l, &config);
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["cell_mesh"]["position_vertices"].as_array().unwrap().len(), 24);
    assert_eq!(json["cell_mesh"]["color_vertices"].as_array().unwrap().len(), 24);
    assert_eq!(json["cell_mesh"]["indices"].as_array().unwrap().len(), 24);
    assert_eq!(json["atom_mesh"]["position_vertices"].as_array().unwrap().len(), 82 * 3);
    assert_eq!(json["transform_matrix"].as_array().unwrap().len(), 16);
    assert_eq!(json["atoms"].as_array().unwrap().len(), 4);
    assert_eq!(json["labels"][1]["text"], "2xâ");
  }

  #[test]
  fn test_render_frame_records_one_full_frame() {
    let (sc, mesh, m, l, config) = setup();
    let mut backend = RecordingBackend::new();
    render_frame(&mut backend, &mesh, &sc, &m, &l, &config).unwrap();
    assert_eq!(backend.programs.len(), 2);
    assert_eq!(backend.count_triangles(), 4);
    assert_eq!(backend.labels().len(), 4);
    assert_eq!(backend.calls.last(), Some(&DrawCall::Finish));
  }

  #[test]
  fn test_write_frame_creates_json_file() {
    let (sc, mesh, m, l, config) = setup();
    let path = std::env::temp_dir().join(format!("cc-frame-{}.json", std::process::id()));
    write_frame(&path, &FramePayload::new(&mesh, &sc, &m, &l, &config)).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(value["lighting_matrix"].is_array());
    let _ = std::fs::remove_file(&path);
  }
}
