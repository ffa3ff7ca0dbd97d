//! Renderable entities
//!
//! An entity pairs a shared mesh and an optional shared material with a
//! transform it owns outright.

use glam::Vec3;

use super::transform::TransformNode;
use crate::assets::AssetHandle;
use crate::renderer::{Material, Mesh};

/// A drawable object in the scene
#[derive(Debug, Clone)]
pub struct Entity {
    name: Option<String>,
    mesh: AssetHandle<Mesh>,
    material: Option<AssetHandle<Material>>,
    transform: TransformNode,
    /// Angular velocity as (pitch, yaw, roll) radians per second
    spin: Vec3,
}

impl Entity {
    /// Create an entity at the origin with no material and no spin
    pub fn new(mesh: AssetHandle<Mesh>) -> Self {
        Self {
            name: None,
            mesh,
            material: None,
            transform: TransformNode::new(),
            spin: Vec3::ZERO,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: AssetHandle<Material>) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: TransformNode) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_spin(mut self, spin: Vec3) -> Self {
        self.spin = spin;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mesh(&self) -> &AssetHandle<Mesh> {
        &self.mesh
    }

    pub fn material(&self) -> Option<&AssetHandle<Material>> {
        self.material.as_ref()
    }

    /// Swap the material; `None` falls back to the scene default.
    ///
    /// Returns the previous material handle.
    pub fn set_material(
        &mut self,
        material: Option<AssetHandle<Material>>,
    ) -> Option<AssetHandle<Material>> {
        std::mem::replace(&mut self.material, material)
    }

    pub fn transform(&self) -> &TransformNode {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut TransformNode {
        &mut self.transform
    }

    pub fn spin(&self) -> Vec3 {
        self.spin
    }

    pub fn set_spin(&mut self, spin: Vec3) {
        self.spin = spin;
    }

    /// Advance the time-driven rotation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.spin != Vec3::ZERO {
            let step = self.spin * dt;
            self.transform.rotate(step.x, step.y, step.z);
        }
    }
}
