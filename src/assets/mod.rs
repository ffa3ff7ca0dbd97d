//! Shared resource management
//!
//! Provides reference-counted asset handles and keyed resource tables so
//! meshes and materials can back several entities at once.

mod handle;
mod storage;

pub use handle::AssetHandle;
pub use storage::Assets;
