// src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crystal_constructor::model::lattice::parse_field;
use crystal_constructor::model::{BasisVectorInput, LatticeParameterInput};
use crystal_constructor::rendering::backend::{DrawCall, RecordingBackend};
use crystal_constructor::session::{self, Export, Step};
use crystal_constructor::utils::logger;
use crystal_constructor::{Command, Config, ViewState};

#[derive(Parser)]
#[command(author, version, about = "Crystal lattice builder and viewer core")]
struct Cli {
  /// Settings file (default: the per-user config location)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// More log output (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Builds one model from flags and writes the requested outputs.
  Build {
    /// Basis components a_x,b_x,b_y,c_x,c_y,c_z
    #[arg(long, conflicts_with = "params", allow_hyphen_values = true)]
    basis: Option<String>,

    /// Lattice parameters a,b,c,alpha,beta,gamma (degrees)
    #[arg(long)]
    params: Option<String>,

    /// Supercell multipliers na,nb,nc
    #[arg(long, default_value = "1,1,1")]
    multipliers: String,

    /// Atom as El:x,y,z in fractional coordinates (repeatable)
    #[arg(long = "atom")]
    atoms: Vec<String>,

    /// Mouse drag in pixels, dx,dy
    #[arg(long, allow_hyphen_values = true)]
    drag: Option<String>,

    /// Zoom button presses; negative zooms out
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    zoom: i32,

    #[command(flatten)]
    outputs: Outputs,
  },

  /// Replays a JSON session file of commands and exports.
  Run {
    session: PathBuf,

    /// Keep going after a refused command
    #[arg(long)]
    lenient: bool,

    #[command(flatten)]
    outputs: Outputs,
  },

  /// Shows or writes the settings file.
  Config {
    #[command(subcommand)]
    action: ConfigAction,
  },
}

#[derive(Subcommand)]
enum ConfigAction {
  /// Prints the effective settings as JSON
  Show,
  /// Writes the default settings to the config location
  Init,
}

#[derive(Args)]
struct Outputs {
  /// Write the supercell as POSCAR
  #[arg(long)]
  poscar: Option<PathBuf>,

  /// Write mesh data and matrices as JSON
  #[arg(long)]
  frame: Option<PathBuf>,

  /// Render to PNG/SVG/PDF (needs the `cairo` feature)
  #[arg(long)]
  image: Option<PathBuf>,

  /// Print the structure summary
  #[arg(long)]
  report: bool,

  /// Render the frame without output and print the draw calls
  #[arg(long)]
  dry_run: bool,
}

impl Outputs {
  fn steps(&self) -> Vec<Step> {
    let mut steps = Vec::new();
    if let Some(path) = &self.poscar {
      steps.push(Step::Export(Export::Poscar { path: path.clone() }));
    }
    if let Some(path) = &self.frame {
      steps.push(Step::Export(Export::Frame { path: path.clone() }));
    }
    if let Some(path) = &self.image {
      steps.push(Step::Export(Export::Image { path: path.clone() }));
    }
    if self.report {
      steps.push(Step::Export(Export::Report { path: None }));
    }
    steps
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logger::init(logger::level_from_verbosity(cli.verbose)).map_err(|e| anyhow::anyhow!("{}", e))?;

  let config = match &cli.config {
    Some(path) => {
      Config::load_from(path).with_context(|| format!("reading config {:?}", path))?
    }
    None => {
      let (cfg, status) = Config::load();
      log::info!("{}", status);
      cfg
    }
  };

  match cli.command {
    Commands::Build {
      basis,
      params,
      multipliers,
      atoms,
      drag,
      zoom,
      outputs,
    } => {
      let mut steps = build_steps(basis, params, &multipliers, &atoms, drag, zoom)?;
      steps.extend(outputs.steps());
      execute(config, steps, true, outputs.dry_run)
    }
    Commands::Run {
      session,
      lenient,
      outputs,
    } => {
      let mut steps = session::load_steps(&session).with_context(|| format!("loading {:?}", session))?;
      steps.extend(outputs.steps());
      execute(config, steps, !lenient, outputs.dry_run)
    }
    Commands::Config { action } => match action {
      ConfigAction::Show => {
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
      }
      ConfigAction::Init => {
        let path = cli.config.unwrap_or_else(Config::get_path);
        Config::default()
          .save_to(&path)
          .with_context(|| format!("writing {:?}", path))?;
        println!("Config written to {:?}", path);
        Ok(())
      }
    },
  }
}

fn execute(config: Config, steps: Vec<Step>, strict: bool, dry_run: bool) -> Result<()> {
  let mut state = ViewState::new(config)?;
  let outcome = session::run(&mut state, steps, strict)?;

  for report in &outcome.reports {
    print!("{}", report);
  }
  for (step, message) in &outcome.refused {
    eprintln!("step {} refused: {}", step, message);
  }
  for path in &outcome.written {
    println!("Wrote {}", path.display());
  }

  if dry_run {
    let mut backend = RecordingBackend::new();
    state.render(&mut backend)?;
    print_draw_calls(&backend);
  }
  Ok(())
}

fn print_draw_calls(backend: &RecordingBackend) {
  for call in backend.last_frame() {
    match call {
      DrawCall::Clear { .. } => println!("clear"),
      DrawCall::Lines { count, .. } => println!("lines    {} indices", count),
      DrawCall::Triangles { count, color, .. } => println!(
        "spheres  {} indices  rgb({:.3}, {:.3}, {:.3})",
        count, color[0], color[1], color[2]
      ),
      DrawCall::Label { label, .. } => println!("label    {:<12} at ({}, {})", label.text, label.x, label.y),
      DrawCall::Finish => println!("finish"),
    }
  }
}

/// Comma-separated text fields; values are checked by the build itself.
fn fields<const N: usize>(text: &str, what: &str) -> Result<[f64; N]> {
  let values: Vec<f64> = text.split(',').map(parse_field).collect();
  match values.try_into() {
    Ok(arr) => Ok(arr),
    Err(v) => bail!("{} needs {} comma-separated values, got {}", what, N, v.len()),
  }
}

fn build_steps(
  basis: Option<String>,
  params: Option<String>,
  multipliers: &str,
  atoms: &[String],
  drag: Option<String>,
  zoom: i32,
) -> Result<Vec<Step>> {
  let multipliers: [f64; 3] = fields(multipliers, "--multipliers")?;
  let mut commands = Vec::new();

  if let Some(text) = params {
    let [a, b, c, alpha, beta, gamma] = fields(&text, "--params")?;
    commands.push(Command::BuildFromParameters(LatticeParameterInput {
      a,
      b,
      c,
      alpha,
      beta,
      gamma,
      multipliers,
    }));
  } else {
    let [a_x, b_x, b_y, c_x, c_y, c_z] = match basis {
      Some(text) => fields(&text, "--basis")?,
      None => [1.0, 0.0, 1.0, 0.0, 0.0, 1.0],
    };
    commands.push(Command::BuildFromBasis(BasisVectorInput {
      a_x,
      b_x,
      b_y,
      c_x,
      c_y,
      c_z,
      multipliers,
    }));
  }

  for entry in atoms {
    let Some((element, coords)) = entry.split_once(':') else {
      bail!("--atom expects El:x,y,z, got {:?}", entry);
    };
    let [x, y, z] = fields(coords, "--atom")?;
    commands.push(Command::SelectElement {
      symbol: element.trim().to_string(),
    });
    commands.push(Command::AddAtom { x, y, z });
  }

  if let Some(text) = drag {
    let [dx, dy] = fields(&text, "--drag")?;
    commands.push(Command::Drag { dx, dy });
  }
  let press = if zoom >= 0 { Command::ZoomIn } else { Command::ZoomOut };
  for _ in 0..zoom.unsigned_abs() {
    commands.push(press.clone());
  }

  Ok(commands.into_iter().map(Step::Command).collect())
}
