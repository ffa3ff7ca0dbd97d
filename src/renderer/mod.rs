//! Rendering module
//!
//! The scene talks to the GPU only through [`RenderBackend`]; [`Renderer`]
//! is the wgpu implementation.

mod backend;
mod camera;
mod constants;
mod context;
mod lights;
mod material;
mod mesh;
mod texture;

pub use backend::{FrameStatus, GpuMesh, RenderBackend, RenderError, TextureIndex};
pub use camera::Camera;
pub use constants::{MaterialTextures, ObjectConstants, PixelConstants, VertexConstants};
pub use context::Renderer;
pub use lights::{
    DirectionalLight, GpuLight, LightBlock, LightType, Lights, MAX_LIGHTS, PointLight,
};
pub use material::Material;
pub use mesh::{Mesh, MeshData, MeshError, MeshSource, Vertex};
pub use texture::{Texture, TextureError, TextureKind, checkerboard};

#[cfg(test)]
pub(crate) use backend::testing;
