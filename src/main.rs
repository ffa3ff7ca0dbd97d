//! Demo: three spinning textured objects and a fly camera
//!
//! `lumen [scene.ron|scene.json]` loads a scene description; without an
//! argument a built-in scene with procedural textures is used. Settings are
//! read from `lumen.ron` in the working directory when present.

use std::error::Error;
use std::path::PathBuf;

use lumen::prelude::*;
use lumen::renderer::checkerboard;

struct DemoGame {
    scene_path: Option<PathBuf>,
    scene: Option<Scene>,
}

impl DemoGame {
    fn new(scene_path: Option<PathBuf>) -> Self {
        Self {
            scene_path,
            scene: None,
        }
    }
}

/// Solid single-colour image for data maps
fn solid(value: [u8; 4]) -> image::RgbaImage {
    image::RgbaImage::from_pixel(4, 4, image::Rgba(value))
}

/// Cylinder, sphere and torus side by side, each with its own material
fn builtin_scene(camera: Camera, renderer: &mut Renderer) -> Result<Scene, RenderError> {
    let mut scene = Scene::new("builtin", camera);

    let wood_albedo = renderer.create_texture(
        &checkerboard(256, 8, [150, 100, 60, 255], [110, 70, 40, 255]),
        TextureKind::Color,
        "wood_albedo",
    )?;
    let wood_roughness =
        renderer.create_texture(&solid([220; 4]), TextureKind::Data, "wood_roughness")?;

    let metal_albedo = renderer.create_texture(
        &checkerboard(256, 16, [200, 200, 210, 255], [150, 150, 160, 255]),
        TextureKind::Color,
        "metal_albedo",
    )?;
    let metal_roughness =
        renderer.create_texture(&solid([70; 4]), TextureKind::Data, "metal_roughness")?;
    let metal_metalness =
        renderer.create_texture(&solid([255; 4]), TextureKind::Data, "metal_metalness")?;

    let diamond_albedo = renderer.create_texture(
        &checkerboard(128, 4, [180, 230, 255, 255], [120, 190, 240, 255]),
        TextureKind::Color,
        "diamond_albedo",
    )?;
    let diamond_roughness =
        renderer.create_texture(&solid([20; 4]), TextureKind::Data, "diamond_roughness")?;

    let wood = scene.add_material(
        Material::new("wood", Vec3::ONE)
            .with_albedo(wood_albedo)
            .with_roughness(wood_roughness)
            .with_uv(Vec2::new(2.0, 1.0), Vec2::ZERO),
    );
    let metal = scene.add_material(
        Material::new("metal", Vec3::ONE)
            .with_albedo(metal_albedo)
            .with_roughness(metal_roughness)
            .with_metalness(metal_metalness),
    );
    let diamond = scene.add_material(
        Material::new("diamond", Vec3::new(0.9, 0.95, 1.0))
            .with_albedo(diamond_albedo)
            .with_roughness(diamond_roughness),
    );

    let cylinder = scene.load_mesh(
        &MeshSource::Cylinder {
            radius: 0.6,
            height: 2.0,
            segments: 32,
        },
        renderer,
    )?;
    let sphere = scene.load_mesh(
        &MeshSource::Sphere {
            radius: 1.0,
            segments: 32,
            rings: 16,
        },
        renderer,
    )?;
    let torus = scene.load_mesh(
        &MeshSource::Torus {
            major_radius: 0.8,
            minor_radius: 0.3,
            segments: 48,
            sides: 24,
        },
        renderer,
    )?;

    scene.lights.add_point(PointLight::new(
        Vec3::new(0.0, 2.0, -2.0),
        Vec3::new(1.0, 0.6, 0.3),
        1.5,
        8.0,
    ));

    let spin = Vec3::new(0.0, 1.0, 0.0);
    for (name, mesh, material, x) in [
        ("cylinder", cylinder, wood, 0.0),
        ("sphere", sphere, metal, -3.0),
        ("torus", torus, diamond, 3.0),
    ] {
        let mut entity = Entity::new(mesh)
            .with_name(name)
            .with_material(material)
            .with_spin(spin);
        entity.transform_mut().set_position(Vec3::new(x, 0.0, 0.0));
        scene.add_entity(entity);
    }

    Ok(scene)
}

impl Game for DemoGame {
    fn init(&mut self, ctx: &mut EngineContext) -> Result<(), Box<dyn Error>> {
        log::info!("Initializing demo");

        let camera = Camera::new(&ctx.config.camera, ctx.aspect_ratio());
        let renderer = ctx.renderer_mut().ok_or("renderer not initialized")?;

        let scene = match &self.scene_path {
            Some(path) => {
                let description = SceneDescription::load(path)?;
                Scene::from_description(&description, camera, renderer)?
            }
            None => builtin_scene(camera, renderer)?,
        };

        log::info!(
            "Scene '{}' ready with {} entities",
            scene.name,
            scene.entities().len()
        );
        self.scene = Some(scene);
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext) {
        if ctx.input.is_key_down(KeyCode::Escape) {
            ctx.quit();
            return;
        }

        if let Some(scene) = &mut self.scene {
            scene.update(ctx.time.delta_seconds(), &ctx.input);
        }
    }

    fn render(&mut self, ctx: &mut EngineContext) -> Result<(), RenderError> {
        let (Some(scene), Some(renderer)) = (&self.scene, ctx.renderer_mut()) else {
            return Ok(());
        };

        let draws = scene.draw(renderer)?;
        ctx.stats.record_draws(draws);
        Ok(())
    }

    fn on_resize(&mut self, _ctx: &mut EngineContext, width: u32, height: u32) {
        if let Some(scene) = &mut self.scene {
            scene.resize(width, height);
        }
    }

    fn shutdown(&mut self, ctx: &mut EngineContext) {
        log::info!(
            "Shutting down after {} frames ({})",
            ctx.stats.total_frames(),
            ctx.stats.format_stats()
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = EngineConfig::load_or_default("lumen.ron")?;
    let scene_path = std::env::args_os().nth(1).map(PathBuf::from);

    Engine::new(config, DemoGame::new(scene_path)).run()
}
