//! Per-frame update and draw
//!
//! Update mutates transforms; draw reads each entity's cached matrices,
//! packs them with the camera, material and scene lights into an
//! `ObjectConstants` payload, and submits in scene order before presenting.

use super::context::Scene;
use super::entity::Entity;
use crate::renderer::{
    Camera, FrameStatus, LightBlock, Material, ObjectConstants, RenderBackend, RenderError,
};

/// Apply time-driven motion to every entity
pub fn update_entities(entities: &mut [Entity], dt: f32) {
    for entity in entities {
        entity.update(dt);
    }
}

/// Build the constant payload for one entity
pub fn build_constants(
    entity: &Entity,
    material: &Material,
    camera: &Camera,
    lights: &LightBlock,
) -> ObjectConstants {
    let transform = entity.transform();
    ObjectConstants::new(
        transform.world_matrix(),
        transform.world_inverse_transpose_matrix(),
        camera.view_matrix(),
        camera.projection_matrix(),
        material,
        camera.position(),
        lights,
    )
}

/// Draw every entity of `scene` and present.
///
/// Returns the number of submitted draws, zero when the backend skipped the
/// frame.
///
/// # Errors
///
/// Returns the first backend error; the rest of the frame is abandoned.
pub fn draw_entities<B>(scene: &Scene, backend: &mut B) -> Result<usize, RenderError>
where
    B: RenderBackend + ?Sized,
{
    if backend.begin_frame()? == FrameStatus::Skipped {
        log::debug!("Frame skipped");
        return Ok(0);
    }

    let lights = scene.lights.build();
    let default_material = scene.default_material();
    for entity in scene.entities() {
        let material = entity.material().unwrap_or(default_material);
        let constants = build_constants(entity, material, &scene.camera, &lights);
        backend.submit(entity.mesh().gpu(), &constants)?;
    }

    backend.present()?;
    Ok(scene.entities().len())
}
