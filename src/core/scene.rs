//! Scene description files
//!
//! A `SceneDescription` lists materials and entities by value so a scene can
//! be authored by hand in RON or JSON. `Scene::from_description` turns it
//! into live GPU resources.

use std::fs;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::renderer::{Lights, MeshSource, RenderError};
use crate::scene::TransformNode;

/// Placement of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDesc {
    pub position: Vec3,
    /// (pitch, yaw, roll) in radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl TransformDesc {
    /// Create a transform description at a position
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Build the runtime transform
    #[must_use]
    pub fn to_node(&self) -> TransformNode {
        TransformNode::from_parts(self.position, self.rotation, self.scale)
    }
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// A named material and the texture files it samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub name: String,
    pub tint: Vec3,
    pub uv_scale: Vec2,
    pub uv_offset: Vec2,
    pub albedo: Option<PathBuf>,
    pub normal: Option<PathBuf>,
    pub roughness: Option<PathBuf>,
    pub metalness: Option<PathBuf>,
}

impl MaterialDesc {
    /// Create an untextured material description
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            tint: Vec3::ONE,
            uv_scale: Vec2::ONE,
            uv_offset: Vec2::ZERO,
            albedo: None,
            normal: None,
            roughness: None,
            metalness: None,
        }
    }
}

/// One entity: a mesh source, an optional material name and a placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDesc {
    #[serde(default)]
    pub name: Option<String>,
    pub mesh: MeshSource,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub transform: TransformDesc,
    /// Angular velocity as (pitch, yaw, roll) radians per second
    #[serde(default)]
    pub spin: Vec3,
}

impl EntityDesc {
    /// Create an entity description at the origin
    #[must_use]
    pub fn new(mesh: MeshSource) -> Self {
        Self {
            name: None,
            mesh,
            material: None,
            transform: TransformDesc::default(),
            spin: Vec3::ZERO,
        }
    }
}

/// A serializable scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Scene name
    pub name: String,
    /// Scene version for compatibility
    pub version: u32,
    #[serde(default)]
    pub materials: Vec<MaterialDesc>,
    #[serde(default)]
    pub entities: Vec<EntityDesc>,
    /// Omitted means a single default key light
    #[serde(default)]
    pub lights: Lights,
}

impl SceneDescription {
    /// Create a new empty scene description
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            materials: Vec::new(),
            entities: Vec::new(),
            lights: Lights::default(),
        }
    }

    /// Save the scene to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| SceneError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scene from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path).map_err(|e| SceneError::IoError(e.to_string()))?;
        ron::from_str(&content).map_err(|e| SceneError::DeserializeError(e.to_string()))
    }

    /// Save the scene to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| SceneError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| SceneError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scene from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path).map_err(|e| SceneError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SceneError::DeserializeError(e.to_string()))
    }

    /// Load by extension: `.json` as JSON, anything else as RON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }

    /// Get the number of entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Check if the scene is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Errors that can occur during scene operations
#[derive(Debug, Clone)]
pub enum SceneError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// An entity refers to a material that is not defined
    UnknownMaterial(String),
    /// A mesh or texture could not be created
    Render(RenderError),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::UnknownMaterial(name) => write!(f, "Unknown material '{name}'"),
            Self::Render(e) => write!(f, "Render error: {e}"),
        }
    }
}

impl std::error::Error for SceneError {}

impl From<RenderError> for SceneError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CameraConfig;
    use crate::renderer::testing::RecordingBackend;
    use crate::renderer::{Camera, PointLight};
    use crate::scene::Scene;

    fn demo() -> SceneDescription {
        let mut scene = SceneDescription::new("Demo");
        scene.materials.push(MaterialDesc {
            uv_scale: Vec2::splat(2.0),
            ..MaterialDesc::new("wood")
        });

        let mut crate_box = EntityDesc::new(MeshSource::Cube);
        crate_box.name = Some("crate".to_string());
        crate_box.material = Some("wood".to_string());
        crate_box.transform = TransformDesc::at(Vec3::new(-3.0, 0.0, 0.0));
        crate_box.spin = Vec3::new(0.0, 1.0, 0.0);
        scene.entities.push(crate_box);

        let mut ball = EntityDesc::new(MeshSource::Sphere {
            radius: 0.5,
            segments: 16,
            rings: 8,
        });
        ball.transform = TransformDesc::at(Vec3::new(3.0, 0.0, 0.0));
        scene.entities.push(ball.clone());
        scene.entities.push(ball);

        scene
    }

    fn camera() -> Camera {
        Camera::new(&CameraConfig::default(), 1.0)
    }

    #[test]
    fn test_scene_serialization_ron() {
        let scene = demo();

        let ron_str =
            ron::ser::to_string_pretty(&scene, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron_str.contains("crate"));

        let loaded: SceneDescription = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_scene_serialization_json() {
        let scene = demo();

        let json_str = serde_json::to_string(&scene).unwrap();
        assert!(json_str.contains("Sphere"));

        let loaded: SceneDescription = serde_json::from_str(&json_str).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_minimal_ron_uses_defaults() {
        let text = r#"(
            name: "Minimal",
            version: 1,
            entities: [
                (mesh: Cube),
                (mesh: Plane(size: 10.0), transform: (position: (0.0, -1.0, 0.0))),
            ],
        )"#;
        let scene: SceneDescription = ron::from_str(text).unwrap();

        assert!(scene.materials.is_empty());
        assert_eq!(scene.entity_count(), 2);
        assert_eq!(scene.entities[0].transform, TransformDesc::default());
        assert_eq!(scene.entities[1].transform.position, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(scene.entities[1].transform.scale, Vec3::ONE);
        assert_eq!(scene.lights, Lights::default());
    }

    #[test]
    fn test_sample_scene_file_parses() {
        let scene: SceneDescription = ron::from_str(include_str!("../../demos/scene.ron")).unwrap();

        assert!(!scene.is_empty());
        assert_eq!(scene.lights.len(), 2);
        for entity in &scene.entities {
            if let Some(material) = &entity.material {
                assert!(scene.materials.iter().any(|m| &m.name == material));
            }
        }
    }

    #[test]
    fn test_build_shares_meshes() {
        let mut backend = RecordingBackend::default();
        let scene = Scene::from_description(&demo(), camera(), &mut backend).unwrap();

        assert_eq!(scene.entities().len(), 3);
        assert_eq!(backend.meshes.len(), 2);
        assert_eq!(scene.entities()[1].mesh(), scene.entities()[2].mesh());

        let crate_box = scene.find("crate").unwrap();
        assert_eq!(crate_box.transform().position(), Vec3::new(-3.0, 0.0, 0.0));
        assert_eq!(crate_box.spin(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(crate_box.material().unwrap().uv_scale, Vec2::splat(2.0));
        assert!(scene.entities()[1].material().is_none());
        assert_eq!(scene.lights, Lights::default());
    }

    #[test]
    fn test_build_copies_lights() {
        let mut description = demo();
        description.lights = Lights::new(Vec3::splat(0.2));
        description.lights.add_point(PointLight::new(Vec3::Y, Vec3::ONE, 2.0, 5.0));

        let mut backend = RecordingBackend::default();
        let scene = Scene::from_description(&description, camera(), &mut backend).unwrap();
        assert_eq!(scene.lights, description.lights);
        assert_eq!(scene.lights.build().count, 1);
    }

    #[test]
    fn test_build_unknown_material() {
        let mut description = demo();
        description.entities[1].material = Some("marble".to_string());

        let mut backend = RecordingBackend::default();
        let result = Scene::from_description(&description, camera(), &mut backend);
        assert!(matches!(result, Err(SceneError::UnknownMaterial(name)) if name == "marble"));
    }

    #[test]
    fn test_build_missing_texture() {
        let mut description = demo();
        description.materials[0].albedo = Some(PathBuf::from("textures/missing.png"));

        let mut backend = RecordingBackend::default();
        let result = Scene::from_description(&description, camera(), &mut backend);
        assert!(matches!(result, Err(SceneError::Render(RenderError::Texture(_)))));
        assert!(backend.textures.is_empty());
    }
}
