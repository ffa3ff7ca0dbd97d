//! A small real-time 3D scene renderer built in Rust
//!
//! This crate provides:
//! - Transforms with lazily cached world matrices
//! - Entities sharing reference-counted meshes and materials
//! - A per-frame update, constant packing and submit loop
//! - 3D rendering with wgpu behind a backend trait
//! - Input handling with winit

pub mod assets;
pub mod core;
pub mod input;
pub mod renderer;
pub mod scene;

// Re-exports for convenience
pub use glam;
pub use wgpu;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::assets::{AssetHandle, Assets};
    pub use crate::core::{
        CameraConfig, Engine, EngineConfig, EngineContext, FrameStats, Game, SceneDescription,
    };
    pub use crate::input::Input;
    pub use crate::renderer::{
        Camera, DirectionalLight, Lights, Material, Mesh, MeshData, MeshSource, PointLight,
        RenderBackend, RenderError, Renderer, TextureIndex, TextureKind,
    };
    pub use crate::scene::{Entity, Scene, TransformNode};
    pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
    pub use winit::keyboard::KeyCode;
}
