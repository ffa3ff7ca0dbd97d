//! GPU textures
//!
//! Images arrive as RGBA8; colour maps are sampled as sRGB, data maps
//! (normals, roughness, metalness) as linear.

use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

/// How texel values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureKind {
    /// Colour data, stored sRGB
    Color,
    /// Non-colour data, stored linear
    Data,
}

impl TextureKind {
    /// Texture format for this kind
    #[must_use]
    pub const fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            Self::Data => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A GPU texture and its default view
#[derive(Debug)]
pub struct Texture {
    /// The GPU texture
    pub texture: wgpu::Texture,
    /// View bound into material bind groups
    pub view: wgpu::TextureView,
    /// Texture dimensions
    pub size: wgpu::Extent3d,
}

impl Texture {
    /// Create a texture from raw RGBA8 pixels
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or do not match the data
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        dimensions: (u32, u32),
        kind: TextureKind,
        label: Option<&str>,
    ) -> Result<Self, TextureError> {
        let (width, height) = dimensions;
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidSize(width, height));
        }
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return Err(TextureError::InvalidSize(width, height));
        }

        Ok(Self::upload(device, queue, rgba, width, height, kind, label))
    }

    /// Create a 1x1 texture of a single texel
    #[must_use]
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texel: [u8; 4],
        kind: TextureKind,
        label: &str,
    ) -> Self {
        Self::upload(device, queue, &texel, 1, 1, kind, Some(label))
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
        kind: TextureKind,
        label: Option<&str>,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label,
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: kind.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            size,
        }
    }

    /// Shared sampler for material textures: trilinear, anisotropic, wrapping
    pub fn material_sampler(device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: 16,
            ..Default::default()
        })
    }
}

/// Build a two-colour checkerboard, handy for procedural materials
#[must_use]
pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> image::RgbaImage {
    let cell = (size / cells.max(1)).max(1);
    image::RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            image::Rgba(a)
        } else {
            image::Rgba(b)
        }
    })
}

/// Errors that can occur during texture creation
#[derive(Debug, Clone, PartialEq)]
pub enum TextureError {
    /// IO error reading file
    IoError(String),
    /// Error decoding image data
    DecodeError(String),
    /// Zero-sized image or pixel data of the wrong length
    InvalidSize(u32, u32),
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::DecodeError(e) => write!(f, "Decode error: {e}"),
            Self::InvalidSize(w, h) => write!(f, "Invalid texture size {w}x{h}"),
        }
    }
}

impl std::error::Error for TextureError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_formats() {
        assert!(TextureKind::Color.format().is_srgb());
        assert!(!TextureKind::Data.format().is_srgb());
    }

    #[test]
    fn test_checkerboard_alternates() {
        let white = [255, 255, 255, 255];
        let black = [0, 0, 0, 255];
        let image = checkerboard(8, 2, white, black);

        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(image.get_pixel(0, 0).0, white);
        assert_eq!(image.get_pixel(4, 0).0, black);
        assert_eq!(image.get_pixel(4, 4).0, white);
    }
}
