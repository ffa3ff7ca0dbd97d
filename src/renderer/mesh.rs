//! Mesh and vertex definitions
//!
//! `MeshData` is CPU-side geometry (procedural or imported from glTF).
//! Once uploaded through a backend it becomes a `Mesh`: a name plus the
//! opaque `GpuMesh` handle that entities share.

use std::f32::consts::{PI, TAU};
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::backend::GpuMesh;

/// Vertex with position, UV, normal and tangent
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x2, // uv
        2 => Float32x3, // normal
        3 => Float32x3, // tangent
    ];

    /// Create a vertex; the tangent is filled in by `MeshData::compute_tangents`
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            uv,
            normal,
            tangent: [0.0; 3],
        }
    }

    /// Get the vertex buffer layout for wgpu
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side triangle list
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create from vertices and indices, computing tangents
    pub fn from_data(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let mut data = Self { vertices, indices };
        data.compute_tangents();
        data
    }

    /// Unit cube centred at the origin
    pub fn cube() -> Self {
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u_axis, v_axis) in faces {
            let base = vertices.len() as u32;
            for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                let position = normal * 0.5 + u_axis * (u - 0.5) + v_axis * (v - 0.5);
                vertices.push(Vertex::new(position.into(), normal.into(), [u, 1.0 - v]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::from_data(vertices, indices)
    }

    /// Square on the XZ plane facing +Y
    pub fn plane(size: f32) -> Self {
        let half = size / 2.0;
        let vertices = vec![
            Vertex::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 1.0]),
        ];

        Self::from_data(vertices, vec![0, 1, 2, 2, 3, 0])
    }

    /// UV sphere
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::new();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            for segment in 0..=segments {
                let theta = TAU * segment as f32 / segments as f32;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                vertices.push(Vertex::new(
                    (normal * radius).into(),
                    normal.into(),
                    [segment as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        Self::from_data(vertices, grid_indices(segments, rings))
    }

    /// Torus around the Y axis
    pub fn torus(
        major_radius: f32,
        minor_radius: f32,
        major_segments: u32,
        minor_segments: u32,
    ) -> Self {
        let major_segments = major_segments.max(3);
        let minor_segments = minor_segments.max(3);
        let mut vertices = Vec::new();

        for minor in 0..=minor_segments {
            let v = TAU * minor as f32 / minor_segments as f32;
            for major in 0..=major_segments {
                let u = TAU * major as f32 / major_segments as f32;
                let ring_centre = Vec3::new(u.cos(), 0.0, u.sin()) * major_radius;
                let normal = Vec3::new(v.cos() * u.cos(), v.sin(), v.cos() * u.sin());
                vertices.push(Vertex::new(
                    (ring_centre + normal * minor_radius).into(),
                    normal.into(),
                    [
                        major as f32 / major_segments as f32,
                        minor as f32 / minor_segments as f32,
                    ],
                ));
            }
        }

        Self::from_data(vertices, grid_indices(major_segments, minor_segments))
    }

    /// Capped cylinder along the Y axis
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = height / 2.0;
        let mut vertices = Vec::new();

        // Side wall: two rows
        for (row, y) in [(0.0, -half), (1.0, half)] {
            for segment in 0..=segments {
                let theta = TAU * segment as f32 / segments as f32;
                let normal = Vec3::new(theta.cos(), 0.0, theta.sin());
                vertices.push(Vertex::new(
                    [normal.x * radius, y, normal.z * radius],
                    normal.into(),
                    [segment as f32 / segments as f32, 1.0 - row],
                ));
            }
        }
        let mut indices = grid_indices(segments, 1);

        // Caps: centre vertex then a ring
        for (y, up) in [(half, 1.0_f32), (-half, -1.0_f32)] {
            let centre = vertices.len() as u32;
            vertices.push(Vertex::new([0.0, y, 0.0], [0.0, up, 0.0], [0.5, 0.5]));
            for segment in 0..=segments {
                let theta = TAU * segment as f32 / segments as f32;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex::new(
                    [cos * radius, y, sin * radius],
                    [0.0, up, 0.0],
                    [0.5 + cos * 0.5, 0.5 + sin * 0.5],
                ));
            }
            for segment in 0..segments {
                let current = centre + 1 + segment;
                if up > 0.0 {
                    indices.extend_from_slice(&[centre, current + 1, current]);
                } else {
                    indices.extend_from_slice(&[centre, current, current + 1]);
                }
            }
        }

        Self::from_data(vertices, indices)
    }

    /// Import every triangle primitive of a glTF file into one mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be imported, a primitive has no
    /// positions, or the file contains no triangles
    pub fn from_gltf(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let path = path.as_ref();
        let (document, buffers, _images) =
            gltf::import(path).map_err(|e| MeshError::Import(e.to_string()))?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    continue;
                }

                let reader = primitive
                    .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or(MeshError::MissingAttribute("POSITION"))?
                    .collect();
                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|normals| normals.collect())
                    .unwrap_or_default();
                let uvs: Vec<[f32; 2]> = reader
                    .read_tex_coords(0)
                    .map(|coords| coords.into_f32().collect())
                    .unwrap_or_default();

                let base = vertices.len() as u32;
                vertices.extend(positions.iter().enumerate().map(|(i, &position)| {
                    Vertex::new(
                        position,
                        normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                        uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                    )
                }));

                match reader.read_indices() {
                    Some(read) => indices.extend(read.into_u32().map(|i| base + i)),
                    None => indices.extend(base..base + positions.len() as u32),
                }
            }
        }

        if indices.is_empty() {
            return Err(MeshError::Empty);
        }

        log::debug!(
            "Imported {} ({} vertices, {} indices)",
            path.display(),
            vertices.len(),
            indices.len()
        );

        Ok(Self::from_data(vertices, indices))
    }

    /// Derive per-vertex tangents from positions and UVs.
    ///
    /// Triangle tangents are accumulated per vertex, then made orthogonal to
    /// the normal. Vertices with no usable UV gradient get any vector
    /// perpendicular to their normal.
    pub fn compute_tangents(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let (Some(v0), Some(v1), Some(v2)) = (
                self.vertices.get(i0),
                self.vertices.get(i1),
                self.vertices.get(i2),
            ) else {
                continue;
            };

            let edge1 = Vec3::from(v1.position) - Vec3::from(v0.position);
            let edge2 = Vec3::from(v2.position) - Vec3::from(v0.position);
            let duv1 = Vec2::from(v1.uv) - Vec2::from(v0.uv);
            let duv2 = Vec2::from(v2.uv) - Vec2::from(v0.uv);

            let determinant = duv1.x * duv2.y - duv2.x * duv1.y;
            if determinant.abs() < f32::EPSILON {
                continue;
            }

            let tangent = (edge1 * duv2.y - edge2 * duv1.y) / determinant;
            for i in [i0, i1, i2] {
                accumulated[i] += tangent;
            }
        }

        for (vertex, tangent) in self.vertices.iter_mut().zip(accumulated) {
            let normal = Vec3::from(vertex.normal).normalize_or(Vec3::Y);
            let orthogonal = tangent - normal * normal.dot(tangent);
            let tangent = orthogonal
                .try_normalize()
                .unwrap_or_else(|| normal.any_orthonormal_vector());
            vertex.tangent = tangent.into();
        }
    }

    /// Get the number of indices
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Indices for a `(columns + 1) x (rows + 1)` vertex grid
fn grid_indices(columns: u32, rows: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
    for row in 0..rows {
        for column in 0..columns {
            let current = row * (columns + 1) + column;
            let next = current + columns + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }
    indices
}

/// Where a mesh comes from; also its deduplication key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MeshSource {
    Cube,
    Plane { size: f32 },
    Sphere { radius: f32, segments: u32, rings: u32 },
    Torus {
        major_radius: f32,
        minor_radius: f32,
        segments: u32,
        sides: u32,
    },
    Cylinder { radius: f32, height: f32, segments: u32 },
    Gltf(PathBuf),
}

impl MeshSource {
    /// Build the geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if a glTF file cannot be imported
    pub fn build(&self) -> Result<MeshData, MeshError> {
        Ok(match self {
            Self::Cube => MeshData::cube(),
            Self::Plane { size } => MeshData::plane(*size),
            Self::Sphere {
                radius,
                segments,
                rings,
            } => MeshData::sphere(*radius, *segments, *rings),
            Self::Torus {
                major_radius,
                minor_radius,
                segments,
                sides,
            } => MeshData::torus(*major_radius, *minor_radius, *segments, *sides),
            Self::Cylinder {
                radius,
                height,
                segments,
            } => MeshData::cylinder(*radius, *height, *segments),
            Self::Gltf(path) => MeshData::from_gltf(path)?,
        })
    }

    /// Key that identifies equal sources in an asset table
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Gltf(path) => format!("gltf:{}", path.display()),
            other => format!("procedural:{other:?}"),
        }
    }
}

/// An uploaded mesh, shared between entities
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    gpu: GpuMesh,
    vertex_count: usize,
}

impl Mesh {
    pub fn new(name: impl Into<String>, gpu: GpuMesh, vertex_count: usize) -> Self {
        Self {
            name: name.into(),
            gpu,
            vertex_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend handle used for drawing
    pub fn gpu(&self) -> &GpuMesh {
        &self.gpu
    }

    pub fn index_count(&self) -> u32 {
        self.gpu.index_count()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// Errors that can occur while building mesh data
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The glTF importer failed
    Import(String),
    /// A primitive lacks a required attribute
    MissingAttribute(&'static str),
    /// No triangles were produced
    Empty,
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import(e) => write!(f, "Import error: {e}"),
            Self::MissingAttribute(name) => write!(f, "Missing vertex attribute {name}"),
            Self::Empty => write!(f, "Mesh has no triangles"),
        }
    }
}

impl std::error::Error for MeshError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(mesh: &MeshData) {
        assert!(!mesh.indices.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));

        for vertex in &mesh.vertices {
            let normal = Vec3::from(vertex.normal);
            let tangent = Vec3::from(vertex.tangent);
            assert!((tangent.length() - 1.0).abs() < 1e-3);
            assert!(normal.dot(tangent).abs() < 1e-3);
        }
    }

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
        assert_eq!(Vertex::layout().array_stride, 44);
    }

    #[test]
    fn test_cube() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_valid(&cube);

        for vertex in &cube.vertices {
            let p = Vec3::from(vertex.position);
            assert!((p.abs().max_element() - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_plane_tangent_follows_u() {
        let plane = MeshData::plane(2.0);
        assert_valid(&plane);
        assert!((Vec3::from(plane.vertices[0].tangent) - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_sphere_radius() {
        let sphere = MeshData::sphere(2.0, 16, 8);
        assert_eq!(sphere.vertices.len(), 17 * 9);
        assert_eq!(sphere.index_count(), 16 * 8 * 6);
        assert_valid(&sphere);

        for vertex in &sphere.vertices {
            assert!((Vec3::from(vertex.position).length() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_torus_and_cylinder() {
        let torus = MeshData::torus(1.0, 0.25, 24, 12);
        assert_eq!(torus.vertices.len(), 25 * 13);
        assert_valid(&torus);

        let cylinder = MeshData::cylinder(0.5, 2.0, 16);
        assert_eq!(cylinder.vertices.len(), 2 * 17 + 2 * 18);
        assert_eq!(cylinder.index_count(), 16 * 6 + 2 * 16 * 3);
        assert_valid(&cylinder);
    }

    #[test]
    fn test_source_keys() {
        let a = MeshSource::Sphere {
            radius: 1.0,
            segments: 32,
            rings: 16,
        };
        let b = MeshSource::Sphere {
            radius: 1.0,
            segments: 16,
            rings: 16,
        };

        assert_eq!(a.key(), a.clone().key());
        assert_ne!(a.key(), b.key());
        assert_eq!(MeshSource::Cube.key(), "procedural:Cube");
        assert_eq!(
            MeshSource::Gltf(PathBuf::from("meshes/helix.glb")).key(),
            "gltf:meshes/helix.glb"
        );
    }

    #[test]
    fn test_missing_gltf() {
        let result = MeshSource::Gltf(PathBuf::from("missing/file.glb")).build();
        assert!(matches!(result, Err(MeshError::Import(_))));
    }
}
