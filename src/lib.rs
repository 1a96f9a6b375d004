// src/lib.rs
pub mod config;
pub mod io;
pub mod model;
pub mod rendering;
pub mod session;
pub mod state;
pub mod utils;

pub use config::Config;
pub use state::{Command, Effect, ViewState};
