//! Rendering backend seam
//!
//! The frame loop only knows this trait: it uploads meshes and textures once
//! at scene-build time, then per frame submits one constant payload per
//! object and presents.

use std::path::Path;

use super::constants::ObjectConstants;
use super::mesh::{MeshData, MeshError};
use super::texture::{TextureError, TextureKind};

/// Opaque handle to an uploaded mesh (vertex/index buffer pair)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuMesh {
    id: u32,
    index_count: u32,
}

impl GpuMesh {
    /// Create a handle. Only backends should mint these.
    #[must_use]
    pub const fn new(id: u32, index_count: u32) -> Self {
        Self { id, index_count }
    }

    /// Backend-side mesh slot
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Number of indices drawn for this mesh
    #[must_use]
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Index of a texture in the backend's texture table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureIndex(u32);

impl TextureIndex {
    /// No texture bound; the backend substitutes a neutral default
    pub const UNSET: Self = Self(u32::MAX);

    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for TextureIndex {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Result of trying to start a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame is open and accepts submissions
    Ready,
    /// The surface was unavailable; skip this frame
    Skipped,
}

/// The operations the scene needs from a graphics API.
pub trait RenderBackend {
    /// Upload geometry and return its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is empty or cannot be uploaded
    fn upload_mesh(&mut self, mesh: &MeshData, label: &str) -> Result<GpuMesh, RenderError>;

    /// Create a texture from RGBA8 pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty or cannot be uploaded
    fn create_texture(
        &mut self,
        image: &image::RgbaImage,
        kind: TextureKind,
        label: &str,
    ) -> Result<TextureIndex, RenderError>;

    /// Load a texture from an image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded
    fn load_texture(
        &mut self,
        path: &Path,
        kind: TextureKind,
    ) -> Result<TextureIndex, RenderError> {
        let bytes = std::fs::read(path).map_err(|e| TextureError::IoError(e.to_string()))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| TextureError::DecodeError(e.to_string()))?
            .to_rgba8();
        log::debug!("Loaded texture {}", path.display());
        self.create_texture(&image, kind, &path.to_string_lossy())
    }

    /// Start a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface failed in a way that cannot be recovered
    fn begin_frame(&mut self) -> Result<FrameStatus, RenderError>;

    /// Queue one indexed draw of `mesh` with its constant payload.
    ///
    /// # Errors
    ///
    /// Returns an error if no frame is open or the mesh or a texture is
    /// unknown. A failed submit abandons the open frame; call `begin_frame`
    /// again before drawing.
    fn submit(&mut self, mesh: &GpuMesh, constants: &ObjectConstants) -> Result<(), RenderError>;

    /// Execute the queued draws and present the frame.
    ///
    /// # Errors
    ///
    /// Returns an error if submission to the device fails
    fn present(&mut self) -> Result<(), RenderError>;

    /// Resize the output surface
    fn resize(&mut self, width: u32, height: u32);
}

/// Errors reported by a rendering backend
#[derive(Debug, Clone)]
pub enum RenderError {
    /// Device or adapter creation failed
    Device(String),
    /// Surface acquisition or configuration failed
    Surface(String),
    /// Texture could not be created
    Texture(TextureError),
    /// Mesh could not be uploaded
    Mesh(MeshError),
    /// A draw referenced a mesh the backend does not know
    UnknownMesh(u32),
    /// A material referenced a texture the backend does not know
    UnknownTexture(u32),
    /// `submit` was called with no open frame
    NoFrame,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device(e) => write!(f, "Device error: {e}"),
            Self::Surface(e) => write!(f, "Surface error: {e}"),
            Self::Texture(e) => write!(f, "Texture error: {e}"),
            Self::Mesh(e) => write!(f, "Mesh error: {e}"),
            Self::UnknownMesh(id) => write!(f, "Unknown mesh id {id}"),
            Self::UnknownTexture(index) => write!(f, "Unknown texture index {index}"),
            Self::NoFrame => write!(f, "No frame in progress"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<TextureError> for RenderError {
    fn from(e: TextureError) -> Self {
        Self::Texture(e)
    }
}

impl From<MeshError> for RenderError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

// ============================================================================
// In-memory backend for tests
// ============================================================================


#[cfg(test)]
mod tests {
    use super::testing::RecordingBackend;
    use super::*;

    #[test]
    fn test_texture_index_unset() {
        assert!(!TextureIndex::UNSET.is_set());
        assert!(!TextureIndex::default().is_set());
        assert!(TextureIndex::new(0).is_set());
        assert_eq!(TextureIndex::new(3).raw(), 3);
    }

    #[test]
    fn test_load_texture_missing_file() {
        let mut backend = RecordingBackend::default();
        let result = backend.load_texture(Path::new("does/not/exist.png"), TextureKind::Color);

        assert!(matches!(
            result,
            Err(RenderError::Texture(TextureError::IoError(_)))
        ));
        assert!(backend.textures.is_empty());
    }

    #[test]
    fn test_submit_without_frame_fails() {
        let mut backend = RecordingBackend::default();
        let mesh = backend.upload_mesh(&MeshData::cube(), "cube").unwrap();

        let result = backend.submit(&mesh, &ObjectConstants::default());
        assert!(matches!(result, Err(RenderError::NoFrame)));
    }

    #[test]
    fn test_failed_submit_abandons_frame() {
        let mut backend = RecordingBackend::default();
        let mesh = backend.upload_mesh(&MeshData::cube(), "cube").unwrap();
        let unknown = GpuMesh::new(7, 36);

        assert_eq!(backend.begin_frame().unwrap(), FrameStatus::Ready);
        backend.submit(&mesh, &ObjectConstants::default()).unwrap();
        let result = backend.submit(&unknown, &ObjectConstants::default());
        assert!(matches!(result, Err(RenderError::UnknownMesh(7))));
        assert!(backend.open_frame.is_none());
        assert!(matches!(backend.present(), Err(RenderError::NoFrame)));

        // The next frame starts clean
        assert_eq!(backend.begin_frame().unwrap(), FrameStatus::Ready);
        backend.submit(&mesh, &ObjectConstants::default()).unwrap();
        backend.present().unwrap();
        assert_eq!(backend.frames.len(), 1);
        assert_eq!(backend.frames[0].len(), 1);
    }
}
