//! Per-object constant payload
//!
//! Layout matches the `ObjectConstants` uniform in `shader.wgsl`: four
//! column-major matrices followed by the material block and the light list.
//! Every vec3 is followed by an explicit padding float or a scalar.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::backend::TextureIndex;
use super::lights::LightBlock;
use super::material::Material;

/// Matrices consumed by the vertex stage
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexConstants {
    pub world: [[f32; 4]; 4],
    pub world_inverse_transpose: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

/// Material, camera and light data consumed by the pixel stage
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PixelConstants {
    pub albedo_index: u32,
    pub normal_index: u32,
    pub roughness_index: u32,
    pub metalness_index: u32,
    pub uv_scale: [f32; 2],
    pub uv_offset: [f32; 2],
    pub camera_position: [f32; 3],
    _padding0: f32,
    pub tint: [f32; 3],
    _padding1: f32,
    pub lights: LightBlock,
}

/// Everything one draw call needs
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub vertex: VertexConstants,
    pub pixel: PixelConstants,
}

/// Texture indices of a material, in shader binding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialTextures {
    pub albedo: TextureIndex,
    pub normal: TextureIndex,
    pub roughness: TextureIndex,
    pub metalness: TextureIndex,
}

impl MaterialTextures {
    /// Raw indices, used as a cache key by backends
    #[must_use]
    pub const fn key(&self) -> [u32; 4] {
        [
            self.albedo.raw(),
            self.normal.raw(),
            self.roughness.raw(),
            self.metalness.raw(),
        ]
    }
}

impl Default for MaterialTextures {
    fn default() -> Self {
        Self {
            albedo: TextureIndex::UNSET,
            normal: TextureIndex::UNSET,
            roughness: TextureIndex::UNSET,
            metalness: TextureIndex::UNSET,
        }
    }
}

impl ObjectConstants {
    /// Pack the matrices, material parameters and lights for one object
    #[must_use]
    pub fn new(
        world: Mat4,
        world_inverse_transpose: Mat4,
        view: Mat4,
        projection: Mat4,
        material: &Material,
        camera_position: Vec3,
        lights: &LightBlock,
    ) -> Self {
        let textures = material.textures;
        Self {
            vertex: VertexConstants {
                world: world.to_cols_array_2d(),
                world_inverse_transpose: world_inverse_transpose.to_cols_array_2d(),
                view: view.to_cols_array_2d(),
                projection: projection.to_cols_array_2d(),
            },
            pixel: PixelConstants {
                albedo_index: textures.albedo.raw(),
                normal_index: textures.normal.raw(),
                roughness_index: textures.roughness.raw(),
                metalness_index: textures.metalness.raw(),
                uv_scale: material.uv_scale.into(),
                uv_offset: material.uv_offset.into(),
                camera_position: camera_position.into(),
                _padding0: 0.0,
                tint: material.tint.into(),
                _padding1: 0.0,
                lights: *lights,
            },
        }
    }

    /// Texture indices carried by this payload
    #[must_use]
    pub fn textures(&self) -> MaterialTextures {
        MaterialTextures {
            albedo: TextureIndex::new(self.pixel.albedo_index),
            normal: TextureIndex::new(self.pixel.normal_index),
            roughness: TextureIndex::new(self.pixel.roughness_index),
            metalness: TextureIndex::new(self.pixel.metalness_index),
        }
    }

    /// World matrix carried by this payload
    #[must_use]
    pub fn world(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.vertex.world)
    }

    /// World-inverse-transpose matrix carried by this payload
    #[must_use]
    pub fn world_inverse_transpose(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.vertex.world_inverse_transpose)
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            &Material::default(),
            Vec3::ZERO,
            &LightBlock::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::renderer::lights::{Lights, PointLight};

    #[test]
    fn test_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<VertexConstants>(), 256);
        assert_eq!(std::mem::size_of::<PixelConstants>(), 64 + 400);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 720);
        assert_eq!(std::mem::offset_of!(PixelConstants, lights), 64);
    }

    #[test]
    fn test_pack_preserves_values() {
        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let material = Material::new("brick", Vec3::new(1.0, 0.5, 0.25))
            .with_albedo(TextureIndex::new(4))
            .with_normal_map(TextureIndex::new(5))
            .with_uv(Vec2::new(2.0, 2.0), Vec2::new(0.5, 0.0));
        let mut lights = Lights::default();
        lights.add_point(PointLight::new(Vec3::Y, Vec3::ONE, 2.0, 6.0));

        let constants = ObjectConstants::new(
            world,
            world.inverse().transpose(),
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            &material,
            Vec3::new(0.0, 0.0, -10.0),
            &lights.build(),
        );

        assert_eq!(constants.world(), world);
        assert_eq!(constants.textures(), material.textures);
        assert_eq!(constants.pixel.roughness_index, u32::MAX);
        assert_eq!(constants.pixel.uv_scale, [2.0, 2.0]);
        assert_eq!(constants.pixel.uv_offset, [0.5, 0.0]);
        assert_eq!(constants.pixel.camera_position, [0.0, 0.0, -10.0]);
        assert_eq!(constants.pixel.tint, [1.0, 0.5, 0.25]);
        assert_eq!(constants.pixel.lights.count, 2);
        assert_eq!(constants.pixel.lights.lights[1].range, 6.0);

        // Translation lives in the fourth column
        let bytes: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&constants));
        assert_eq!(&bytes[12..15], &[1.0, 2.0, 3.0]);
    }
}
