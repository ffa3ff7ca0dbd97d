//! Core engine module
//!
//! Contains the main Engine struct, configuration, timing and scene files

mod config;
mod debug;
mod engine;
mod scene;
mod time;

pub use config::{CameraConfig, ConfigError, EngineConfig};
pub use debug::FrameStats;
pub use engine::{Engine, EngineContext, Game};
pub use scene::{EntityDesc, MaterialDesc, SceneDescription, SceneError, TransformDesc};
pub use time::Time;
