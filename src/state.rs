// src/state.rs

//! Session controller. Every user action is a [`Command`]; applying one
//! mutates the [`ViewState`] in place and reports which [`Effect`]s a front
//! end has to carry out (rebuild lists, re-upload meshes, redraw).

use crate::config::Config;
use crate::model::elements::is_element_symbol;
use crate::model::lattice::numeric_field;
use crate::model::{
  Atom, AtomError, BasisVectorInput, CrystalModel, LatticeBuild, LatticeError,
  LatticeParameterInput, LatticeParameters,
};
use crate::rendering::backend::{RenderBackend, RenderError};
use crate::rendering::export::{render_frame, FramePayload};
use crate::rendering::mesh::{self, MeshData, MeshError};
use crate::rendering::scene::{self, MeshBuffers, Programs};
use crate::rendering::transform::{lighting_matrix, transform_matrix, TransformParameters};
use crate::utils::m4::M4;
use crate::utils::report;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
  SelectElement {
    symbol: String,
  },
  AddAtom {
    #[serde(deserialize_with = "numeric_field")]
    x: f64,
    #[serde(deserialize_with = "numeric_field")]
    y: f64,
    #[serde(deserialize_with = "numeric_field")]
    z: f64,
  },
  SelectAtom {
    index: usize,
  },
  RemoveAtom,
  BuildFromBasis(BasisVectorInput),
  BuildFromParameters(LatticeParameterInput),
  Drag {
    #[serde(deserialize_with = "numeric_field")]
    dx: f64,
    #[serde(deserialize_with = "numeric_field")]
    dy: f64,
  },
  Wheel {
    #[serde(deserialize_with = "numeric_field")]
    delta_y: f64,
  },
  ZoomIn,
  ZoomOut,
  RotateLeft,
  RotateRight,
  RotateUp,
  RotateDown,
  Reset,
}

/// Follow-up work a command asks of the front end, in the order listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
  RebuildSuperCell,
  RegenerateMeshes,
  RecomputeTransforms,
  RefreshAtomList,
  ClearFeedback,
  Redraw,
}

/// Content of one feedback region. A new message replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
  pub text: String,
  pub ok: bool,
}

impl Feedback {
  pub fn success(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      ok: true,
    }
  }

  pub fn error(err: &impl std::fmt::Display) -> Self {
    Self {
      text: err.to_string(),
      ok: false,
    }
  }
}

/// Values written back into the input fields of the other build mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Echo {
  /// After a basis-vector build: the derived lengths and angles.
  Parameters(LatticeParameters),
  /// After a lattice-parameter build: the computed basis components.
  Basis {
    a_x: f64,
    b_x: f64,
    b_y: f64,
    c_x: f64,
    c_y: f64,
    c_z: f64,
  },
}

impl Echo {
  /// Field name and value, 3 decimals.
  pub fn fields(&self) -> Vec<(&'static str, String)> {
    let pairs: Vec<(&'static str, f64)> = match *self {
      Echo::Parameters(p) => vec![
        ("a", p.a),
        ("b", p.b),
        ("c", p.c),
        ("alpha", p.alpha),
        ("beta", p.beta),
        ("gamma", p.gamma),
      ],
      Echo::Basis {
        a_x,
        b_x,
        b_y,
        c_x,
        c_y,
        c_z,
      } => vec![
        ("a_hat_x", a_x),
        ("b_hat_x", b_x),
        ("b_hat_y", b_y),
        ("c_hat_x", c_x),
        ("c_hat_y", c_y),
        ("c_hat_z", c_z),
      ],
    };
    pairs
      .into_iter()
      .map(|(name, v)| (name, format!("{:.3}", v)))
      .collect()
  }
}

/// Matrices derived from the transform parameters, cached between commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
  pub transform: M4,
  pub lighting: M4,
}

impl Frame {
  pub fn from_params(params: &TransformParameters) -> Self {
    Self {
      transform: transform_matrix(params),
      lighting: lighting_matrix(params),
    }
  }
}

pub struct ViewState {
  config: Config,
  model: CrystalModel,
  transform: TransformParameters,
  frame: Frame,
  meshes: MeshData,
  selected_element: Option<String>,
  selected_atom: Option<usize>,
  lattice_feedback: Option<Feedback>,
  atom_feedback: Option<Feedback>,
  echo: Option<Echo>,
  rejection: Option<String>,
}

impl ViewState {
  /// Unit cube, no atoms, start pose from the config.
  pub fn new(config: Config) -> Result<Self, MeshError> {
    let model = CrystalModel::default();
    let meshes = mesh::generate_mesh_data(
      model.super_cell(),
      config.sphere.latitude_count,
      config.sphere.longitude_count,
    )?;
    let transform = TransformParameters::new(&config.view, model.super_cell());
    let frame = Frame::from_params(&transform);
    Ok(Self {
      config,
      model,
      transform,
      frame,
      meshes,
      selected_element: None,
      selected_atom: None,
      lattice_feedback: None,
      atom_feedback: None,
      echo: None,
      rejection: None,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn model(&self) -> &CrystalModel {
    &self.model
  }

  pub fn transform(&self) -> &TransformParameters {
    &self.transform
  }

  pub fn frame(&self) -> &Frame {
    &self.frame
  }

  pub fn meshes(&self) -> &MeshData {
    &self.meshes
  }

  pub fn selected_element(&self) -> Option<&str> {
    self.selected_element.as_deref()
  }

  pub fn selected_atom(&self) -> Option<usize> {
    self.selected_atom
  }

  pub fn lattice_feedback(&self) -> Option<&Feedback> {
    self.lattice_feedback.as_ref()
  }

  pub fn atom_feedback(&self) -> Option<&Feedback> {
    self.atom_feedback.as_ref()
  }

  pub fn echo(&self) -> Option<&Echo> {
    self.echo.as_ref()
  }

  /// Why the last command was refused, if it was.
  pub fn rejection(&self) -> Option<&str> {
    self.rejection.as_deref()
  }

  /// The unit-cell atom list as displayed.
  pub fn atom_list(&self) -> Vec<String> {
    report::atom_list(self.model.unit_cell())
  }

  /// Runs one command to completion.
  pub fn apply(&mut self, command: Command) -> Vec<Effect> {
    log::trace!("apply {:?}", command);
    self.rejection = None;
    match command {
      Command::SelectElement { symbol } => self.select_element(symbol),
      Command::AddAtom { x, y, z } => self.add_atom(x, y, z),
      Command::SelectAtom { index } => self.select_atom(index),
      Command::RemoveAtom => self.remove_atom(),
      Command::BuildFromBasis(input) => {
        let result = input.validate();
        self.build(result, "Lattice basis vectors accepted.", |b| {
          Echo::Parameters(b.parameters)
        })
      }
      Command::BuildFromParameters(input) => {
        let result = input.validate();
        self.build(result, "Lattice parameters accepted.", |b| {
          let [a, bv, c] = b.basis;
          Echo::Basis {
            a_x: a.x,
            b_x: bv.x,
            b_y: bv.y,
            c_x: c.x,
            c_y: c.y,
            c_z: c.z,
          }
        })
      }
      Command::Drag { dx, dy } if !(dx.is_finite() && dy.is_finite()) => self.reject_camera(),
      Command::Drag { dx, dy } => self.camera(|t, view| t.drag(dx, dy, view)),
      Command::Wheel { delta_y } if !delta_y.is_finite() => self.reject_camera(),
      Command::Wheel { delta_y } => self.camera(|t, view| t.wheel(delta_y, view)),
      Command::ZoomIn => self.camera(|t, view| t.zoom_in(view)),
      Command::ZoomOut => self.camera(|t, view| t.zoom_out(view)),
      Command::RotateLeft => self.camera(|t, view| t.rotate_left(view)),
      Command::RotateRight => self.camera(|t, view| t.rotate_right(view)),
      Command::RotateUp => self.camera(|t, view| t.rotate_up(view)),
      Command::RotateDown => self.camera(|t, view| t.rotate_down(view)),
      Command::Reset => self.reset(),
    }
  }

  fn reject_atom(&mut self, err: &impl std::fmt::Display) {
    let feedback = Feedback::error(err);
    self.rejection = Some(feedback.text.clone());
    self.atom_feedback = Some(feedback);
  }

  fn reject_lattice(&mut self, err: &impl std::fmt::Display) {
    let feedback = Feedback::error(err);
    self.rejection = Some(feedback.text.clone());
    self.lattice_feedback = Some(feedback);
  }

  // Camera input has no feedback region; only the rejection is recorded.
  fn reject_camera(&mut self) -> Vec<Effect> {
    self.rejection = Some(LatticeError::NonNumeric.to_string());
    Vec::new()
  }

  fn select_element(&mut self, symbol: String) -> Vec<Effect> {
    if is_element_symbol(&symbol) {
      self.selected_element = Some(symbol);
    } else {
      self.reject_atom(&AtomError::UnknownElement(symbol));
    }
    Vec::new()
  }

  fn add_atom(&mut self, x: f64, y: f64, z: f64) -> Vec<Effect> {
    let Some(element) = self.selected_element.clone() else {
      self.reject_atom(&AtomError::NoElementSelected);
      return Vec::new();
    };
    match Atom::new(element, x, y, z) {
      Ok(atom) => {
        let element = atom.element.clone();
        if let Err(e) = self.model.add_atom(atom) {
          self.reject_atom(&e);
          return Vec::new();
        }
        log::info!("Added {} at ({:.3}, {:.3}, {:.3})", element, x, y, z);
        self.atom_feedback = Some(Feedback::success("Valid atom coordinate."));
        vec![Effect::RebuildSuperCell, Effect::Redraw, Effect::RefreshAtomList]
      }
      Err(e) => {
        self.reject_atom(&e);
        Vec::new()
      }
    }
  }

  fn select_atom(&mut self, index: usize) -> Vec<Effect> {
    let count = self.model.unit_cell().atoms.len();
    if index < count {
      self.selected_atom = Some(index);
    } else {
      self.selected_atom = None;
      self.reject_atom(&AtomError::IndexOutOfRange { index, count });
    }
    Vec::new()
  }

  // Transforms are left as they were: the camera keeps its pose.
  fn remove_atom(&mut self) -> Vec<Effect> {
    let Some(index) = self.selected_atom else {
      self.reject_atom(&AtomError::NoAtomSelected);
      return Vec::new();
    };
    match self.model.remove_atom(index) {
      Ok(atom) => {
        log::info!("Removed {} (list index {})", atom.element, index);
        // The list is rebuilt, so nothing stays selected.
        self.selected_atom = None;
        vec![Effect::RebuildSuperCell, Effect::Redraw, Effect::RefreshAtomList]
      }
      Err(e) => {
        self.selected_atom = None;
        self.reject_atom(&e);
        Vec::new()
      }
    }
  }

  fn build(
    &mut self,
    result: Result<LatticeBuild, LatticeError>,
    accepted: &str,
    echo: impl FnOnce(&LatticeBuild) -> Echo,
  ) -> Vec<Effect> {
    let build = match result {
      Ok(build) => build,
      Err(e) => {
        log::info!("Build rejected ({:?}): {}", e.constraint(), e);
        self.reject_lattice(&e);
        return Vec::new();
      }
    };

    if let Err(e) = self.model.set_basis(build.basis, build.multipliers) {
      log::info!("Build rejected ({:?}): {}", e.constraint(), e);
      self.reject_lattice(&e);
      return Vec::new();
    }
    self.echo = Some(echo(&build));
    self.lattice_feedback = Some(Feedback::success(accepted));
    log::info!("{}", accepted);

    let sc = self.model.super_cell();
    self.transform.recenter(sc);
    self.transform.fit(sc, self.config.view.fit_size);
    self.frame = Frame::from_params(&self.transform);
    self.regenerate_cell_mesh();

    vec![
      Effect::RebuildSuperCell,
      Effect::RecomputeTransforms,
      Effect::RegenerateMeshes,
      Effect::Redraw,
    ]
  }

  fn camera(
    &mut self,
    change: impl FnOnce(&mut TransformParameters, &crate::config::ViewConfig),
  ) -> Vec<Effect> {
    change(&mut self.transform, &self.config.view);
    self.frame = Frame::from_params(&self.transform);
    vec![Effect::RecomputeTransforms, Effect::Redraw]
  }

  fn reset(&mut self) -> Vec<Effect> {
    self.model.reset();
    self.transform = TransformParameters::new(&self.config.view, self.model.super_cell());
    self.frame = Frame::from_params(&self.transform);
    self.regenerate_cell_mesh();
    self.selected_atom = None;
    self.lattice_feedback = None;
    self.atom_feedback = None;
    self.echo = None;
    log::info!("Model reset");

    vec![
      Effect::RebuildSuperCell,
      Effect::RefreshAtomList,
      Effect::RecomputeTransforms,
      Effect::RegenerateMeshes,
      Effect::Redraw,
      Effect::ClearFeedback,
    ]
  }

  // The sphere template never changes; only the wireframe follows the basis.
  fn regenerate_cell_mesh(&mut self) {
    self.meshes.cell = mesh::cell_mesh(self.model.super_cell());
    log::debug!("Cell mesh regenerated");
  }

  pub fn frame_payload(&self) -> FramePayload<'_> {
    FramePayload::new(
      &self.meshes,
      self.model.super_cell(),
      &self.frame.transform,
      &self.frame.lighting,
      &self.config,
    )
  }

  /// Draws the current state on a fresh backend and finishes the frame.
  pub fn render<R: RenderBackend>(&self, backend: &mut R) -> Result<(), RenderError> {
    render_frame(
      backend,
      &self.meshes,
      self.model.super_cell(),
      &self.frame.transform,
      &self.frame.lighting,
      &self.config,
    )
  }
}

/// A backend kept across commands, with its programs and mesh buffers.
pub struct Viewport<R: RenderBackend> {
  backend: R,
  programs: Programs<R::Program>,
  buffers: MeshBuffers<R::Buffer>,
}

impl<R: RenderBackend> Viewport<R> {
  /// Creates programs and uploads the current meshes, then draws once.
  pub fn new(mut backend: R, state: &ViewState) -> Result<Self, RenderError> {
    let programs = scene::create_programs(&mut backend)?;
    let buffers = scene::initialize_buffers(&mut backend, state.meshes())?;
    let mut viewport = Self {
      backend,
      programs,
      buffers,
    };
    viewport.redraw(state)?;
    Ok(viewport)
  }

  pub fn backend(&self) -> &R {
    &self.backend
  }

  pub fn into_backend(self) -> R {
    self.backend
  }

  /// Carries out the rendering side of `effects`.
  pub fn apply_effects(&mut self, state: &ViewState, effects: &[Effect]) -> Result<(), RenderError> {
    if effects.contains(&Effect::RegenerateMeshes) {
      scene::update_buffers(&mut self.backend, &mut self.buffers, state.meshes())?;
    }
    if effects.contains(&Effect::Redraw) {
      self.redraw(state)?;
    }
    Ok(())
  }

  fn redraw(&mut self, state: &ViewState) -> Result<(), RenderError> {
    let frame = state.frame();
    let objects =
      scene::generate_scene_objects(&self.buffers, &self.programs, &frame.transform, &frame.lighting);
    scene::draw_scene(&mut self.backend, &objects, state.model().super_cell(), state.config())?;
    self.backend.finish()
  }
}
