//! Scene lights
//!
//! Directional and point lights, packed into a fixed-size block that rides
//! along in every object's pixel constants.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Maximum number of lights the shader iterates over
pub const MAX_LIGHTS: usize = 8;

/// Type of light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum LightType {
    /// Parallel rays (like the sun)
    #[default]
    Directional = 0,
    /// Emits in all directions from a point, fading out at `range`
    Point = 1,
}

/// GPU-compatible light data, 48 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// Direction the light travels (directional only)
    pub direction: [f32; 3],
    /// `LightType` as u32
    pub light_type: u32,
    /// World position (point only)
    pub position: [f32; 3],
    /// Distance at which a point light reaches zero
    pub range: f32,
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Packed light list: ambient colour, active count and a fixed array
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightBlock {
    pub ambient: [f32; 3],
    pub count: u32,
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl Default for LightBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Directional light (like the sun)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    #[must_use]
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            color,
            intensity,
        }
    }

    #[must_use]
    pub fn to_gpu(&self) -> GpuLight {
        GpuLight {
            direction: self.direction.try_normalize().unwrap_or(Vec3::NEG_Y).into(),
            light_type: LightType::Directional as u32,
            position: [0.0; 3],
            range: 0.0,
            color: self.color.into(),
            intensity: self.intensity,
        }
    }
}

/// Point light with a hard range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
}

impl PointLight {
    #[must_use]
    pub fn new(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            range,
        }
    }

    #[must_use]
    pub fn to_gpu(&self) -> GpuLight {
        GpuLight {
            direction: [0.0; 3],
            light_type: LightType::Point as u32,
            position: self.position.into(),
            range: self.range.max(0.0),
            color: self.color.into(),
            intensity: self.intensity,
        }
    }
}

/// The lights of a scene.
///
/// `Default` is a single white key light with a dim ambient term; use
/// [`Lights::new`] for an empty set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lights {
    pub ambient: Vec3,
    pub directional: Vec<DirectionalLight>,
    pub point: Vec<PointLight>,
}

impl Lights {
    /// No lights, only `ambient`
    #[must_use]
    pub fn new(ambient: Vec3) -> Self {
        Self {
            ambient,
            directional: Vec::new(),
            point: Vec::new(),
        }
    }

    pub fn add_directional(&mut self, light: DirectionalLight) {
        self.directional.push(light);
        self.warn_if_full();
    }

    pub fn add_point(&mut self, light: PointLight) {
        self.point.push(light);
        self.warn_if_full();
    }

    pub fn clear(&mut self) {
        self.directional.clear();
        self.point.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directional.len() + self.point.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn warn_if_full(&self) {
        if self.len() > MAX_LIGHTS {
            log::warn!(
                "{} lights in scene, only the first {MAX_LIGHTS} are drawn",
                self.len()
            );
        }
    }

    /// Pack into the shader block. Directional lights come first; anything
    /// past `MAX_LIGHTS` is dropped.
    #[must_use]
    pub fn build(&self) -> LightBlock {
        let mut block = LightBlock {
            ambient: self.ambient.into(),
            ..LightBlock::default()
        };

        let gpu = self
            .directional
            .iter()
            .map(DirectionalLight::to_gpu)
            .chain(self.point.iter().map(PointLight::to_gpu))
            .take(MAX_LIGHTS);
        for (slot, light) in block.lights.iter_mut().zip(gpu) {
            *slot = light;
            block.count += 1;
        }
        block
    }
}

impl Default for Lights {
    fn default() -> Self {
        let mut lights = Self::new(Vec3::new(0.15, 0.17, 0.2));
        lights.add_directional(DirectionalLight::new(
            Vec3::new(0.4, -1.0, 0.6),
            Vec3::new(1.0, 1.0, 0.95),
            1.0,
        ));
        lights
    }
}
