//! Scene context
//!
//! Owns everything a frame needs: the ordered entity list, the camera, and
//! the mesh, material and texture tables the entities draw from. Passed
//! explicitly to update and draw; there is no global scene.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::entity::Entity;
use super::frame;
use crate::assets::{AssetHandle, Assets};
use crate::core::{SceneDescription, SceneError};
use crate::input::Input;
use crate::renderer::{
    Camera, Lights, Material, Mesh, MeshData, MeshSource, RenderBackend, RenderError,
    TextureIndex, TextureKind,
};

/// A renderable scene
#[derive(Debug)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// The viewpoint
    pub camera: Camera,
    /// Lights packed into every draw
    pub lights: Lights,
    entities: Vec<Entity>,
    meshes: Assets<Mesh>,
    materials: Assets<Material>,
    default_material: AssetHandle<Material>,
    textures: FxHashMap<(PathBuf, TextureKind), TextureIndex>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
            lights: Lights::default(),
            entities: Vec::new(),
            meshes: Assets::new(),
            materials: Assets::new(),
            default_material: AssetHandle::new(Material::default()),
            textures: FxHashMap::default(),
        }
    }

    /// Build a scene from a description, uploading each distinct mesh
    /// source and texture file once.
    ///
    /// # Errors
    ///
    /// Returns an error if a resource fails to load or an entity names a
    /// material the description does not define
    pub fn from_description<B>(
        description: &SceneDescription,
        camera: Camera,
        backend: &mut B,
    ) -> Result<Self, SceneError>
    where
        B: RenderBackend + ?Sized,
    {
        let mut scene = Self::new(description.name.clone(), camera);
        scene.lights = description.lights.clone();

        for desc in &description.materials {
            let mut material = Material::new(desc.name.clone(), desc.tint)
                .with_uv(desc.uv_scale, desc.uv_offset);
            let slots = [
                (&desc.albedo, TextureKind::Color, &mut material.textures.albedo),
                (&desc.normal, TextureKind::Data, &mut material.textures.normal),
                (&desc.roughness, TextureKind::Data, &mut material.textures.roughness),
                (&desc.metalness, TextureKind::Data, &mut material.textures.metalness),
            ];
            for (path, kind, slot) in slots {
                if let Some(path) = path {
                    *slot = scene.load_texture(path, kind, backend)?;
                }
            }
            scene.add_material(material);
        }

        for desc in &description.entities {
            let mesh = scene.load_mesh(&desc.mesh, backend)?;
            let mut entity = Entity::new(mesh)
                .with_transform(desc.transform.to_node())
                .with_spin(desc.spin);

            if let Some(name) = &desc.name {
                entity = entity.with_name(name.clone());
            }
            if let Some(material) = &desc.material {
                let handle = scene
                    .material(material)
                    .ok_or_else(|| SceneError::UnknownMaterial(material.clone()))?;
                entity = entity.with_material(handle);
            }
            scene.add_entity(entity);
        }

        log::info!(
            "Built scene {} ({} entities, {} meshes, {} textures)",
            scene.name,
            scene.entities.len(),
            scene.meshes.len(),
            scene.textures.len()
        );

        Ok(scene)
    }

    // -------------------------------------------------------------------------
    // Resources
    // -------------------------------------------------------------------------

    /// Get or upload the mesh for `source`
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry cannot be built or uploaded
    pub fn load_mesh<B>(
        &mut self,
        source: &MeshSource,
        backend: &mut B,
    ) -> Result<AssetHandle<Mesh>, RenderError>
    where
        B: RenderBackend + ?Sized,
    {
        let key = source.key();
        self.meshes.get_or_try_add(&key, || {
            let data = source.build()?;
            upload(&key, &data, backend)
        })
    }

    /// Upload ad-hoc geometry under `name`; later calls with the same name
    /// reuse the first upload. Names never collide with `load_mesh` sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails
    pub fn add_mesh<B>(
        &mut self,
        name: &str,
        data: &MeshData,
        backend: &mut B,
    ) -> Result<AssetHandle<Mesh>, RenderError>
    where
        B: RenderBackend + ?Sized,
    {
        let key = format!("custom:{name}");
        self.meshes.get_or_try_add(&key, || upload(name, data, backend))
    }

    /// Get or load the texture at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded
    pub fn load_texture<B>(
        &mut self,
        path: &Path,
        kind: TextureKind,
        backend: &mut B,
    ) -> Result<TextureIndex, RenderError>
    where
        B: RenderBackend + ?Sized,
    {
        let key = (path.to_path_buf(), kind);
        if let Some(&index) = self.textures.get(&key) {
            return Ok(index);
        }

        let index = backend.load_texture(path, kind)?;
        self.textures.insert(key, index);
        Ok(index)
    }

    /// Register a material under its name. An existing material with the
    /// same name is returned instead.
    pub fn add_material(&mut self, material: Material) -> AssetHandle<Material> {
        let key = material.name.clone();
        self.materials.add_keyed(key, material)
    }

    /// Look up a material by name
    pub fn material(&self, name: &str) -> Option<AssetHandle<Material>> {
        self.materials.get_by_key(name)
    }

    /// Material used by entities that have none
    pub fn default_material(&self) -> &AssetHandle<Material> {
        &self.default_material
    }

    pub fn set_default_material(&mut self, material: AssetHandle<Material>) {
        self.default_material = material;
    }

    /// Drop meshes and materials no entity uses any more.
    ///
    /// Returns the number of assets released.
    pub fn release_unused(&mut self) -> usize {
        self.meshes.release_unused() + self.materials.release_unused()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Append an entity; returns its index
    pub fn add_entity(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Remove the entity at `index`, keeping the order of the rest
    pub fn remove_entity(&mut self, index: usize) -> Option<Entity> {
        (index < self.entities.len()).then(|| self.entities.remove(index))
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Find the first entity with `name`
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == Some(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name() == Some(name))
    }

    // -------------------------------------------------------------------------
    // Frame
    // -------------------------------------------------------------------------

    /// Move the camera from input and advance entity motion
    pub fn update(&mut self, dt: f32, input: &Input) {
        self.camera.update(dt, input);
        frame::update_entities(&mut self.entities, dt);
    }

    /// Draw all entities and present
    ///
    /// # Errors
    ///
    /// Returns the first backend error
    pub fn draw<B>(&self, backend: &mut B) -> Result<usize, RenderError>
    where
        B: RenderBackend + ?Sized,
    {
        frame::draw_entities(self, backend)
    }

    /// Follow a window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }
}

fn upload<B>(name: &str, data: &MeshData, backend: &mut B) -> Result<Mesh, RenderError>
where
    B: RenderBackend + ?Sized,
{
    let gpu = backend.upload_mesh(data, name)?;
    Ok(Mesh::new(name, gpu, data.vertices.len()))
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::core::CameraConfig;
    use crate::renderer::testing::RecordingBackend;

    fn empty_scene() -> Scene {
        Scene::new("test", Camera::new(&CameraConfig::default(), 1.0))
    }

    #[test]
    fn test_mesh_sources_are_uploaded_once() {
        let mut backend = RecordingBackend::default();
        let mut scene = empty_scene();

        let a = scene.load_mesh(&MeshSource::Cube, &mut backend).unwrap();
        let b = scene.load_mesh(&MeshSource::Cube, &mut backend).unwrap();
        let plane = scene
            .load_mesh(&MeshSource::Plane { size: 4.0 }, &mut backend)
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, plane);
        assert_eq!(backend.meshes.len(), 2);
        assert_eq!(scene.mesh_count(), 2);
    }

    #[test]
    fn test_named_mesh_does_not_shadow_source() {
        let mut backend = RecordingBackend::default();
        let mut scene = empty_scene();

        let custom = scene
            .add_mesh("Cube", &MeshData::plane(2.0), &mut backend)
            .unwrap();
        let cube = scene.load_mesh(&MeshSource::Cube, &mut backend).unwrap();

        assert_ne!(custom, cube);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(custom.index_count(), 6);
        assert_eq!(backend.meshes.len(), 2);
    }

    #[test]
    fn test_failed_mesh_is_not_cached() {
        let mut backend = RecordingBackend::default();
        let mut scene = empty_scene();

        let result = scene.add_mesh("empty", &MeshData::default(), &mut backend);
        assert!(matches!(result, Err(RenderError::Mesh(_))));
        assert_eq!(scene.mesh_count(), 0);
    }

    #[test]
    fn test_missing_texture_is_not_cached() {
        let mut backend = RecordingBackend::default();
        let mut scene = empty_scene();
        let path = Path::new("textures/missing.png");

        assert!(scene.load_texture(path, TextureKind::Color, &mut backend).is_err());
        assert!(scene.textures.is_empty());
    }

    #[test]
    fn test_materials_by_name() {
        let mut scene = empty_scene();
        let first = scene.add_material(Material::new("wood", Vec3::ONE));
        let again = scene.add_material(Material::new("wood", Vec3::ZERO));

        assert_eq!(first, again);
        assert_eq!(again.tint, Vec3::ONE);
        assert_eq!(scene.material("wood"), Some(first));
        assert!(scene.material("stone").is_none());
    }

    #[test]
    fn test_release_unused_keeps_live_assets() {
        let mut backend = RecordingBackend::default();
        let mut scene = empty_scene();

        let cube = scene.load_mesh(&MeshSource::Cube, &mut backend).unwrap();
        let sphere = scene
            .load_mesh(
                &MeshSource::Sphere {
                    radius: 1.0,
                    segments: 8,
                    rings: 4,
                },
                &mut backend,
            )
            .unwrap();
        scene.add_entity(Entity::new(cube).with_name("cube"));
        scene.add_entity(Entity::new(sphere).with_name("sphere"));

        let removed = scene.remove_entity(1).unwrap();
        assert_eq!(removed.name(), Some("sphere"));
        drop(removed);

        assert_eq!(scene.release_unused(), 1);
        assert_eq!(scene.mesh_count(), 1);
        assert!(scene.find("cube").is_some());
        assert!(scene.remove_entity(5).is_none());
    }

    #[test]
    fn test_update_moves_camera_and_entities() {
        let mut scene = empty_scene();
        let mut backend = RecordingBackend::default();
        let cube = scene.load_mesh(&MeshSource::Cube, &mut backend).unwrap();
        scene.add_entity(Entity::new(cube).with_spin(Vec3::new(0.0, 2.0, 0.0)));

        let mut input = Input::new();
        input.process_keyboard(
            winit::keyboard::KeyCode::KeyW,
            winit::event::ElementState::Pressed,
        );
        scene.update(0.5, &input);

        assert!((scene.camera.position().z + 5.0).abs() < 1e-5);
        assert!((scene.entities()[0].transform().rotation().y - 1.0).abs() < 1e-6);
    }
}
