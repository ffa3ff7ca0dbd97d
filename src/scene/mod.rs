//! Scene module
//!
//! Entities with cached transforms, the scene context that owns them, and
//! the per-frame update and draw passes.

mod context;
mod entity;
mod frame;
mod transform;

pub use context::Scene;
pub use entity::Entity;
pub use frame::{build_constants, draw_entities, update_entities};
pub use transform::{TransformNode, orientation_from_euler};
