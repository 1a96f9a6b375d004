// src/rendering/mod.rs
pub mod backend;
pub mod export;
pub mod mesh;
#[cfg(feature = "cairo")]
pub mod painter;
pub mod scene;
pub mod transform;

// Re-export specific functions to keep the API clean for the rest of the app
pub use backend::{RecordingBackend, RenderBackend, RenderError};
pub use export::{render_frame, write_frame, FramePayload};
#[cfg(feature = "cairo")]
pub use export::export_image;
pub use mesh::{generate_mesh_data, MeshData, MeshError};
pub use transform::{lighting_matrix, transform_matrix, TransformParameters};
