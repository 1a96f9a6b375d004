// src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

// --- Sections ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
  pub width: f64,
  pub height: f64,
  pub depth: f64,
}

impl Default for CanvasConfig {
  fn default() -> Self {
    Self {
      width: 800.0,
      height: 600.0,
      depth: 100000.0,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
  pub latitude_count: usize,
  pub longitude_count: usize,
  /// Sphere radius in model units, applied to the template before placement.
  pub atom_scale: f64,
}

impl Default for SphereConfig {
  fn default() -> Self {
    Self {
      latitude_count: 10,
      longitude_count: 10,
      atom_scale: 0.5,
    }
  }
}

/// Camera behaviour: start pose, zoom limits and interaction step sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
  pub rotation_degrees: [f64; 3],
  pub scale: f64,
  /// On build, scale = fit_size / longest supercell edge.
  pub fit_size: f64,
  pub min_scale: f64,
  pub max_scale: f64,
  pub wheel_factor: f64,
  pub zoom_step: f64,
  pub drag_sensitivity: f64,
  /// Radians per rotate button press.
  pub rotate_step: f64,
}

impl Default for ViewConfig {
  fn default() -> Self {
    Self {
      rotation_degrees: [30.0, 0.0, 125.0],
      scale: 600.0,
      fit_size: 600.0,
      min_scale: 1.0,
      max_scale: 1000.0,
      wheel_factor: 0.001,
      zoom_step: 0.1,
      drag_sensitivity: 0.01,
      rotate_step: 0.1,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
  pub background: (f64, f64, f64),
  pub label_color: (f64, f64, f64),
  pub light_direction: [f64; 3],
  // Per-element overrides of the built-in colour table
  pub element_colors: HashMap<String, (f64, f64, f64)>,
}

impl Default for RenderStyle {
  fn default() -> Self {
    Self {
      background: (0.0, 0.0, 0.0),
      label_color: (1.0, 1.0, 1.0),
      light_direction: [-1.0, -1.0, 1.0],
      element_colors: HashMap::new(),
    }
  }
}

impl RenderStyle {
  /// RGBA colour for an element: the override if present, else the built-in table.
  pub fn element_color(&self, element: &str) -> [f32; 4] {
    match self.element_colors.get(element) {
      Some(&(r, g, b)) => [r as f32, g as f32, b as f32, 1.0],
      None => crate::model::get_element_color(element),
    }
  }
}

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Config {
  #[serde(default)]
  pub canvas: CanvasConfig,
  #[serde(default)]
  pub sphere: SphereConfig,
  #[serde(default)]
  pub view: ViewConfig,
  #[serde(default)]
  pub style: RenderStyle,
}

impl Config {
  /// Loads config from the standard OS location (e.g. ~/.config/crystal-constructor/settings.json).
  /// Never fails; the status line says what happened.
  pub fn load() -> (Self, String) {
    let path = Self::get_path();
    if path.exists() {
      match Self::load_from(&path) {
        Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
        Err(e) => (Self::default(), format!("Error reading config: {}", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  pub fn load_from(path: &Path) -> io::Result<Self> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(io::Error::from)
  }

  /// Saves config to the standard OS location
  pub fn save(&self) -> String {
    let path = Self::get_path();
    match self.save_to(&path) {
      Ok(()) => format!("Config saved to {:?}", path),
      Err(e) => format!("Failed to save config: {}", e),
    }
  }

  pub fn save_to(&self, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, self).map_err(io::Error::from)
  }

  pub fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "crystal-constructor", "crystal-constructor") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}
