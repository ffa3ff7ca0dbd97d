//! Material definitions
//!
//! A material is immutable once shared between entities; build it with the
//! `with_*` methods, then hand it to an asset table.

use glam::{Vec2, Vec3};

use super::backend::TextureIndex;
use super::constants::MaterialTextures;

/// Surface description for a textured PBR-style material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Display name
    pub name: String,
    /// Colour multiplier
    pub tint: Vec3,
    /// UV scale applied before sampling
    pub uv_scale: Vec2,
    /// UV offset applied after scaling
    pub uv_offset: Vec2,
    /// Texture table indices
    pub textures: MaterialTextures,
}

impl Material {
    /// Create an untextured material with a tint
    pub fn new(name: impl Into<String>, tint: Vec3) -> Self {
        Self {
            name: name.into(),
            tint,
            uv_scale: Vec2::ONE,
            uv_offset: Vec2::ZERO,
            textures: MaterialTextures::default(),
        }
    }

    /// Set the albedo (base colour) texture
    #[must_use]
    pub fn with_albedo(mut self, index: TextureIndex) -> Self {
        self.textures.albedo = index;
        self
    }

    /// Set the tangent-space normal map
    #[must_use]
    pub fn with_normal_map(mut self, index: TextureIndex) -> Self {
        self.textures.normal = index;
        self
    }

    /// Set the roughness map
    #[must_use]
    pub fn with_roughness(mut self, index: TextureIndex) -> Self {
        self.textures.roughness = index;
        self
    }

    /// Set the metalness map
    #[must_use]
    pub fn with_metalness(mut self, index: TextureIndex) -> Self {
        self.textures.metalness = index;
        self
    }

    /// Set UV scale and offset
    #[must_use]
    pub fn with_uv(mut self, scale: Vec2, offset: Vec2) -> Self {
        self.uv_scale = scale;
        self.uv_offset = offset;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", Vec3::ONE)
    }
}
