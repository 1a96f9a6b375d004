// src/session.rs

//! Scripted sessions: a JSON list of commands interleaved with exports.
//!
//! ```json
//! [
//!   {"command": "build_from_parameters", "a": 5.64, "b": 5.64, "c": 5.64,
//!    "alpha": 90, "beta": 90, "gamma": 90, "multipliers": [2, 2, 2]},
//!   {"command": "select_element", "symbol": "Na"},
//!   {"command": "add_atom", "x": 0, "y": 0, "z": 0},
//!   {"export": "poscar", "path": "crystal_model.POSCAR"}
//! ]
//! ```

use crate::io;
use crate::rendering::export::write_frame;
use crate::rendering::RenderError;
use crate::state::{Command, ViewState};
use crate::utils::report;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("step {step}: {message}")]
  Rejected { step: usize, message: String },
  #[error("image export needs the `cairo` feature")]
  ImageUnsupported,
  #[error("invalid session file: {0}")]
  Parse(#[from] serde_json::Error),
  #[error(transparent)]
  Render(#[from] RenderError),
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "export", rename_all = "snake_case")]
pub enum Export {
  Poscar { path: PathBuf },
  Frame { path: PathBuf },
  Image { path: PathBuf },
  /// Without a path the summary is returned to the caller.
  Report { path: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
  Export(Export),
  Command(Command),
}

/// What a finished session produced.
#[derive(Debug, Default)]
pub struct Outcome {
  pub written: Vec<PathBuf>,
  pub reports: Vec<String>,
  pub refused: Vec<(usize, String)>,
}

pub fn load_steps(path: &Path) -> Result<Vec<Step>, SessionError> {
  let reader = BufReader::new(File::open(path)?);
  Ok(serde_json::from_reader(reader)?)
}

/// Runs `steps` in order. With `strict`, the first refused command stops
/// the session; otherwise refusals are collected and the session goes on.
pub fn run(state: &mut ViewState, steps: Vec<Step>, strict: bool) -> Result<Outcome, SessionError> {
  let mut outcome = Outcome::default();
  for (i, step) in steps.into_iter().enumerate() {
    let step_no = i + 1;
    match step {
      Step::Command(command) => {
        let effects = state.apply(command);
        log::debug!("step {}: {:?}", step_no, effects);
        if let Some(message) = state.rejection() {
          if strict {
            return Err(SessionError::Rejected {
              step: step_no,
              message: message.to_string(),
            });
          }
          log::warn!("step {}: {}", step_no, message);
          outcome.refused.push((step_no, message.to_string()));
        }
      }
      Step::Export(export) => export_step(state, export, &mut outcome)?,
    }
  }
  Ok(outcome)
}

fn export_step(state: &ViewState, export: Export, outcome: &mut Outcome) -> Result<(), SessionError> {
  match export {
    Export::Poscar { path } => {
      io::save_structure(&path, state.model().super_cell())?;
      outcome.written.push(path);
    }
    Export::Frame { path } => {
      write_frame(&path, &state.frame_payload())?;
      outcome.written.push(path);
    }
    Export::Image { path } => {
      export_image(state, &path)?;
      outcome.written.push(path);
    }
    Export::Report { path } => {
      let text = report::structure_summary(state.model());
      match path {
        Some(path) => {
          std::fs::write(&path, &text)?;
          outcome.written.push(path);
        }
        None => outcome.reports.push(text),
      }
    }
  }
  Ok(())
}

#[cfg(feature = "cairo")]
fn export_image(state: &ViewState, path: &Path) -> Result<(), SessionError> {
  let frame = state.frame();
  crate::rendering::export::export_image(
    path,
    state.meshes(),
    state.model().super_cell(),
    &frame.transform,
    &frame.lighting,
    state.config(),
  )?;
  Ok(())
}

#[cfg(not(feature = "cairo"))]
fn export_image(_state: &ViewState, _path: &Path) -> Result<(), SessionError> {
  Err(SessionError::ImageUnsupported)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;

  fn steps(json: &str) -> Vec<Step> {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn test_steps_parse_both_kinds() {
    let parsed = steps(
      r#"[{"command": "zoom_out"},
          {"export": "report"},
          {"export": "poscar", "path": "out.POSCAR"}]"#,
    );
    assert_eq!(parsed[0], Step::Command(Command::ZoomOut));
    assert_eq!(parsed[1], Step::Export(Export::Report { path: None }));
    assert_eq!(
      parsed[2],
      Step::Export(Export::Poscar {
        path: PathBuf::from("out.POSCAR")
      })
    );
  }

  #[test]
  fn test_strict_stops_at_refusal() {
    let mut state = ViewState::new(Config::default()).unwrap();
    let err = run(
      &mut state,
      steps(r#"[{"command": "zoom_in"}, {"command": "add_atom", "x": 0, "y": 0, "z": 0}]"#),
      true,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "step 2: Please select an atom.");
  }

  #[test]
  fn test_lenient_collects_refusals() {
    let mut state = ViewState::new(Config::default()).unwrap();
    let outcome = run(
      &mut state,
      steps(
        r#"[{"command": "select_element", "symbol": "K"},
            {"command": "add_atom", "x": "abc", "y": 0, "z": 0},
            {"command": "add_atom", "x": 0.5, "y": 0, "z": 0},
            {"export": "report"}]"#,
      ),
      false,
    )
    .unwrap();
    assert_eq!(
      outcome.refused,
      vec![(2, "Input fields must be numeric values.".to_string())]
    );
    assert_eq!(outcome.reports.len(), 1);
    assert!(outcome.reports[0].contains("Formula: K1"));
  }

  #[cfg(not(feature = "cairo"))]
  #[test]
  fn test_image_without_cairo() {
    let mut state = ViewState::new(Config::default()).unwrap();
    let err = run(
      &mut state,
      steps(r#"[{"export": "image", "path": "x.png"}]"#),
      true,
    )
    .unwrap_err();
    assert!(matches!(err, SessionError::ImageUnsupported));
  }
}
