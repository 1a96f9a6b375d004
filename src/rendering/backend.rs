// src/rendering/backend.rs

//! Boundary between the scene composer and whatever rasterises it.
//!
//! Handles returned by a backend are opaque to the rest of the crate: they
//! are stored in scene objects and handed back, never inspected.

use serde::Serialize;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
  #[error("unknown {kind} handle {id}")]
  UnknownHandle { kind: &'static str, id: usize },
  #[error("buffer {id} holds {found}, expected {expected}")]
  BufferType {
    id: usize,
    expected: &'static str,
    found: &'static str,
  },
  #[error("vertex index {index} out of range ({count} vertices)")]
  IndexOutOfRange { index: usize, count: usize },
  #[error("surface error: {0}")]
  Surface(String),
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProgramKind {
  /// Per-vertex colour, no lighting.
  LineMesh,
  /// Uniform colour times a Lambert term.
  TriangleMesh,
}

/// Borrowed buffer payload for an upload.
#[derive(Clone, Copy, Debug)]
pub enum BufferData<'a> {
  F32(&'a [f32]),
  U8(&'a [u8]),
  U16(&'a [u16]),
}

/// Owned copy of an uploaded buffer, for backends that keep the data.
#[derive(Clone, Debug, PartialEq)]
pub enum BufferContents {
  F32(Vec<f32>),
  U8(Vec<u8>),
  U16(Vec<u16>),
}

impl BufferContents {
  pub fn type_name(&self) -> &'static str {
    match self {
      BufferContents::F32(_) => "f32",
      BufferContents::U8(_) => "u8",
      BufferContents::U16(_) => "u16",
    }
  }
}

impl From<BufferData<'_>> for BufferContents {
  fn from(data: BufferData<'_>) -> Self {
    match data {
      BufferData::F32(v) => BufferContents::F32(v.to_vec()),
      BufferData::U8(v) => BufferContents::U8(v.to_vec()),
      BufferData::U16(v) => BufferContents::U16(v.to_vec()),
    }
  }
}

/// Screen-space text overlay, top-left anchored at integer pixels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Label {
  pub text: String,
  pub x: i64,
  pub y: i64,
}

/// Indexed line list with one colour per vertex.
pub struct LineDraw<'a, P, B> {
  pub program: &'a P,
  pub positions: &'a B,
  pub colors: &'a B,
  pub indices: &'a B,
  pub count: usize,
  pub matrix: [f32; 16],
}

/// Indexed triangle list in one colour, shaded by the lighting matrix.
pub struct TriangleDraw<'a, P, B> {
  pub program: &'a P,
  pub positions: &'a B,
  pub indices: &'a B,
  pub count: usize,
  pub matrix: [f32; 16],
  pub lighting: [f32; 16],
  pub color: [f32; 4],
}

pub trait RenderBackend {
  type Program: Clone + Debug;
  type Buffer: Clone + Debug;

  fn create_program(&mut self, kind: ProgramKind) -> Result<Self::Program, RenderError>;
  fn create_buffer(&mut self) -> Result<Self::Buffer, RenderError>;
  /// Replaces the whole content of `buffer`.
  fn upload(&mut self, buffer: &Self::Buffer, data: BufferData<'_>) -> Result<(), RenderError>;

  fn clear(&mut self, color: [f32; 4]) -> Result<(), RenderError>;
  fn draw_lines(&mut self, draw: LineDraw<'_, Self::Program, Self::Buffer>) -> Result<(), RenderError>;
  fn draw_triangles(
    &mut self,
    draw: TriangleDraw<'_, Self::Program, Self::Buffer>,
  ) -> Result<(), RenderError>;
  fn draw_label(&mut self, label: &Label, color: [f32; 4]) -> Result<(), RenderError>;
  /// Ends the frame.
  fn finish(&mut self) -> Result<(), RenderError>;
}

// --- Recording backend ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ProgramId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BufferId(pub usize);

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCall {
  Clear {
    color: [f32; 4],
  },
  Lines {
    program: ProgramId,
    count: usize,
    matrix: [f32; 16],
  },
  Triangles {
    program: ProgramId,
    count: usize,
    matrix: [f32; 16],
    lighting: [f32; 16],
    color: [f32; 4],
  },
  Label {
    label: Label,
    color: [f32; 4],
  },
  Finish,
}

/// Keeps every upload and draw call; nothing is rasterised.
#[derive(Debug, Default)]
pub struct RecordingBackend {
  pub programs: Vec<ProgramKind>,
  pub buffers: Vec<Option<BufferContents>>,
  pub calls: Vec<DrawCall>,
}

impl RecordingBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn buffer(&self, id: BufferId) -> Option<&BufferContents> {
    self.buffers.get(id.0).and_then(|b| b.as_ref())
  }

  /// Calls since the last `Clear`.
  pub fn last_frame(&self) -> &[DrawCall] {
    let start = self
      .calls
      .iter()
      .rposition(|c| matches!(c, DrawCall::Clear { .. }))
      .unwrap_or(0);
    &self.calls[start..]
  }

  pub fn count_triangles(&self) -> usize {
    self
      .last_frame()
      .iter()
      .filter(|c| matches!(c, DrawCall::Triangles { .. }))
      .count()
  }

  pub fn labels(&self) -> Vec<&Label> {
    self
      .last_frame()
      .iter()
      .filter_map(|c| match c {
        DrawCall::Label { label, .. } => Some(label),
        _ => None,
      })
      .collect()
  }

  fn check_program(&self, id: &ProgramId) -> Result<(), RenderError> {
    if id.0 < self.programs.len() {
      Ok(())
    } else {
      Err(RenderError::UnknownHandle {
        kind: "program",
        id: id.0,
      })
    }
  }

  fn check_buffer(&self, id: &BufferId) -> Result<(), RenderError> {
    if id.0 < self.buffers.len() {
      Ok(())
    } else {
      Err(RenderError::UnknownHandle {
        kind: "buffer",
        id: id.0,
      })
    }
  }
}

impl RenderBackend for RecordingBackend {
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
    self.check_buffer(buffer)?;
    self.buffers[buffer.0] = Some(data.into());
    Ok(())
  }

  fn clear(&mut self, color: [f32; 4]) -> Result<(), RenderError> {
    self.calls.push(DrawCall::Clear { color });
    Ok(())
  }

  fn draw_lines(&mut self, draw: LineDraw<'_, ProgramId, BufferId>) -> Result<(), RenderError> {
    self.check_program(draw.program)?;
    for b in [draw.positions, draw.colors, draw.indices] {
      self.check_buffer(b)?;
    }
    self.calls.push(DrawCall::Lines {
      program: *draw.program,
      count: draw.count,
      matrix: draw.matrix,
    });
    Ok(())
  }

  fn draw_triangles(&mut self, draw: TriangleDraw<'_, ProgramId, BufferId>) -> Result<(), RenderError> {
    self.check_program(draw.program)?;
    self.check_buffer(draw.positions)?;
    self.check_buffer(draw.indices)?;
    self.calls.push(DrawCall::Triangles {
      program: *draw.program,
      count: draw.count,
      matrix: draw.matrix,
      lighting: draw.lighting,
      color: draw.color,
    });
    Ok(())
  }

  fn draw_label(&mut self, label: &Label, color: [f32; 4]) -> Result<(), RenderError> {
    self.calls.push(DrawCall::Label {
      label: label.clone(),
      color,
    });
    Ok(())
  }

  fn finish(&mut self) -> Result<(), RenderError> {
    self.calls.push(DrawCall::Finish);
    Ok(())
  }
}
