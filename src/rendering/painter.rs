// src/rendering/painter.rs
// Software backend: projects the uploaded meshes and paints them with cairo,
// back to front (painter's algorithm) in place of a depth buffer.

use super::backend::{
  BufferContents, BufferData, BufferId, Label, LineDraw, ProgramId, ProgramKind, RenderBackend,
  RenderError, TriangleDraw,
};
use super::scene::lambert_multiplier;
use crate::utils::m4::{self, M4};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
  Png,
  Svg,
  Pdf,
}

impl ImageFormat {
  pub fn from_path(path: &Path) -> Option<Self> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
      "png" => Some(ImageFormat::Png),
      "svg" => Some(ImageFormat::Svg),
      "pdf" => Some(ImageFormat::Pdf),
      _ => None,
    }
  }
}

enum Shape {
  Line {
    from: [f64; 2],
    to: [f64; 2],
    colors: [[f64; 3]; 2],
  },
  Triangle {
    points: [[f64; 2]; 3],
    color: [f64; 4],
  },
}

struct Primitive {
  // clip-space z; larger is further away
  depth: f64,
  shape: Shape,
}

pub struct CairoBackend {
  path: PathBuf,
  format: ImageFormat,
  width: f64,
  height: f64,
  light_direction: [f64; 3],
  label_font_size: f64,
  background: [f32; 4],
  programs: Vec<ProgramKind>,
  buffers: Vec<Option<BufferContents>>,
  primitives: Vec<Primitive>,
  labels: Vec<(Label, [f32; 4])>,
}

impl CairoBackend {
  pub fn new(
    path: impl Into<PathBuf>,
    format: ImageFormat,
    width: f64,
    height: f64,
    light_direction: [f64; 3],
  ) -> Self {
    Self {
      path: path.into(),
      format,
      width,
      height,
      light_direction,
      label_font_size: 14.0,
      background: [0.0, 0.0, 0.0, 1.0],
      programs: Vec::new(),
      buffers: Vec::new(),
      primitives: Vec::new(),
      labels: Vec::new(),
    }
  }

  fn program(&self, id: &ProgramId) -> Result<ProgramKind, RenderError> {
    self.programs.get(id.0).copied().ok_or(RenderError::UnknownHandle {
      kind: "program",
      id: id.0,
    })
  }

  fn contents(&self, id: &BufferId) -> Result<&BufferContents, RenderError> {
    match self.buffers.get(id.0) {
      Some(Some(contents)) => Ok(contents),
      _ => Err(RenderError::UnknownHandle {
        kind: "buffer",
        id: id.0,
      }),
    }
  }

  fn f32_buffer(&self, id: &BufferId) -> Result<&[f32], RenderError> {
    match self.contents(id)? {
      BufferContents::F32(v) => Ok(v),
      other => Err(type_mismatch(id, "f32", other)),
    }
  }

  fn u8_buffer(&self, id: &BufferId) -> Result<&[u8], RenderError> {
    match self.contents(id)? {
      BufferContents::U8(v) => Ok(v),
      other => Err(type_mismatch(id, "u8", other)),
    }
  }

  fn u16_buffer(&self, id: &BufferId) -> Result<&[u16], RenderError> {
    match self.contents(id)? {
      BufferContents::U16(v) => Ok(v),
      other => Err(type_mismatch(id, "u16", other)),
    }
  }

  /// Clip-space position of vertex `index` and its screen point.
  fn project(&self, matrix: &M4, positions: &[f32], index: u16) -> Result<([f64; 2], f64), RenderError> {
    let i = index as usize;
    let count = positions.len() / 3;
    if i >= count {
      return Err(RenderError::IndexOutOfRange { index: i, count });
    }
    let p = &positions[3 * i..3 * i + 3];
    let clip = m4::transform_vector(matrix, [p[0] as f64, p[1] as f64, p[2] as f64, 1.0]);
    let w = if clip[3] != 0.0 { clip[3] } else { 1.0 };
    let ndc = [clip[0] / w, clip[1] / w, clip[2] / w, 1.0];
    let px = (ndc[0] * 0.5 + 0.5) * self.width;
    let py = (ndc[1] * -0.5 + 0.5) * self.height;
    Ok(([px, py], ndc[2]))
  }

  fn paint(&self, cr: &cairo::Context) -> Result<(), cairo::Error> {
    let [r, g, b, a] = self.background;
    cr.set_source_rgba(r as f64, g as f64, b as f64, a as f64);
    cr.paint()?;

    let mut order: Vec<&Primitive> = self.primitives.iter().collect();
    order.sort_by(|x, y| y.depth.total_cmp(&x.depth));

    cr.set_line_width(1.0);
    for primitive in order {
      match &primitive.shape {
        Shape::Line { from, to, colors } => {
          let gradient = cairo::LinearGradient::new(from[0], from[1], to[0], to[1]);
          gradient.add_color_stop_rgb(0.0, colors[0][0], colors[0][1], colors[0][2]);
          gradient.add_color_stop_rgb(1.0, colors[1][0], colors[1][1], colors[1][2]);
          cr.set_source(&gradient)?;
          cr.move_to(from[0], from[1]);
          cr.line_to(to[0], to[1]);
          cr.stroke()?;
        }
        Shape::Triangle { points, color } => {
          cr.set_source_rgba(color[0], color[1], color[2], color[3]);
          cr.move_to(points[0][0], points[0][1]);
          cr.line_to(points[1][0], points[1][1]);
          cr.line_to(points[2][0], points[2][1]);
          cr.close_path();
          // outline in the fill colour against seams
          cr.fill_preserve()?;
          cr.set_line_width(0.5);
          cr.stroke()?;
          cr.set_line_width(1.0);
        }
      }
    }

    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
    cr.set_font_size(self.label_font_size);
    for (label, color) in &self.labels {
      cr.set_source_rgba(color[0] as f64, color[1] as f64, color[2] as f64, color[3] as f64);
      cr.move_to(label.x as f64, label.y as f64 + self.label_font_size);
      cr.show_text(&label.text)?;
    }
    Ok(())
  }

  fn write(&self) -> Result<(), RenderError> {
    match self.format {
      ImageFormat::Png => {
        let surface =
          cairo::ImageSurface::create(cairo::Format::ARgb32, self.width as i32, self.height as i32)
            .map_err(surface_error)?;
        let cr = cairo::Context::new(&surface).map_err(surface_error)?;
        self.paint(&cr).map_err(surface_error)?;
        drop(cr);
        let mut file = std::fs::File::create(&self.path)?;
        surface.write_to_png(&mut file).map_err(surface_error)?;
      }
      ImageFormat::Svg => {
        let surface = cairo::SvgSurface::new(self.width, self.height, Some(&self.path))
          .map_err(surface_error)?;
        let cr = cairo::Context::new(&surface).map_err(surface_error)?;
        self.paint(&cr).map_err(surface_error)?;
        drop(cr);
        surface.finish();
      }
      ImageFormat::Pdf => {
        let surface =
          cairo::PdfSurface::new(self.width, self.height, &self.path).map_err(surface_error)?;
        let cr = cairo::Context::new(&surface).map_err(surface_error)?;
        self.paint(&cr).map_err(surface_error)?;
        drop(cr);
        surface.finish();
      }
    }
    log::info!("Image written to {:?}", self.path);
    Ok(())
  }
}

fn surface_error(e: impl std::fmt::Display) -> RenderError {
  RenderError::Surface(e.to_string())
}

fn type_mismatch(id: &BufferId, expected: &'static str, found: &BufferContents) -> RenderError {
  RenderError::BufferType {
    id: id.0,
    expected,
    found: found.type_name(),
  }
}

fn to_f64(m: &[f32; 16]) -> M4 {
  let mut out = [0.0; 16];
  for (dst, src) in out.iter_mut().zip(m.iter()) {
    *dst = *src as f64;
  }
  out
}

impl RenderBackend for CairoBackend {
  type Program = ProgramId;
  type Buffer = BufferId;

  fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId, RenderError> {
    self.programs.push(kind);
    Ok(ProgramId(self.programs.len() - 1))
  }

  fn create_buffer(&mut self) -> Result<BufferId, RenderError> {
    self.buffers.push(None);
    Ok(BufferId(self.buffers.len() - 1))
  }

  fn upload(&mut self, buffer: &BufferId, data: BufferData<'_>) -> Result<(), RenderError> {
    match self.buffers.get_mut(buffer.0) {
      Some(slot) => {
        *slot = Some(data.into());
        Ok(())
      }
      None => Err(RenderError::UnknownHandle {
        kind: "buffer",
        id: buffer.0,
      }),
    }
  }

  fn clear(&mut self, color: [f32; 4]) -> Result<(), RenderError> {
    self.background = color;
    self.primitives.clear();
    self.labels.clear();
    Ok(())
  }

  fn draw_lines(&mut self, draw: LineDraw<'_, ProgramId, BufferId>) -> Result<(), RenderError> {
    self.program(draw.program)?;
    let matrix = to_f64(&draw.matrix);
    let positions = self.f32_buffer(draw.positions)?;
    let colors = self.u8_buffer(draw.colors)?;
    let indices = self.u16_buffer(draw.indices)?;

    let color_of = |i: u16| -> [f64; 3] {
      let i = i as usize * 3;
      let c = |k: usize| colors.get(i + k).map_or(0.0, |&v| (v as f64).min(1.0));
      [c(0), c(1), c(2)]
    };

    let mut lines = Vec::new();
    for pair in indices[..draw.count.min(indices.len())].chunks_exact(2) {
      let (from, z0) = self.project(&matrix, positions, pair[0])?;
      let (to, z1) = self.project(&matrix, positions, pair[1])?;
      lines.push(Primitive {
        depth: (z0 + z1) / 2.0,
        shape: Shape::Line {
          from,
          to,
          colors: [color_of(pair[0]), color_of(pair[1])],
        },
      });
    }
    self.primitives.extend(lines);
    Ok(())
  }

  fn draw_triangles(&mut self, draw: TriangleDraw<'_, ProgramId, BufferId>) -> Result<(), RenderError> {
    self.program(draw.program)?;
    let matrix = to_f64(&draw.matrix);
    let lighting = to_f64(&draw.lighting);
    let positions = self.f32_buffer(draw.positions)?;
    let indices = self.u16_buffer(draw.indices)?;

    let mut triangles = Vec::new();
    for tri in indices[..draw.count.min(indices.len())].chunks_exact(3) {
      let mut points = [[0.0; 2]; 3];
      let mut depth = 0.0;
      let mut shade = 0.0;
      for (k, &index) in tri.iter().enumerate() {
        let (point, z) = self.project(&matrix, positions, index)?;
        points[k] = point;
        depth += z / 3.0;
        let p = &positions[3 * index as usize..3 * index as usize + 3];
        shade += lambert_multiplier([p[0] as f64, p[1] as f64, p[2] as f64], &lighting, self.light_direction)
          / 3.0;
      }
      let [r, g, b, a] = draw.color;
      triangles.push(Primitive {
        depth,
        shape: Shape::Triangle {
          points,
          color: [r as f64 * shade, g as f64 * shade, b as f64 * shade, a as f64],
        },
      });
    }
    self.primitives.extend(triangles);
    Ok(())
  }

  fn draw_label(&mut self, label: &Label, color: [f32; 4]) -> Result<(), RenderError> {
    self.labels.push((label.clone(), color));
    Ok(())
  }

  fn finish(&mut self) -> Result<(), RenderError> {
    self.write()
  }
}
