//! wgpu rendering backend
//!
//! One pipeline, one render pass per frame. Per-object constants for the
//! whole frame go into a single uniform buffer addressed with dynamic
//! offsets; material textures are bound through cached bind groups keyed by
//! their four texture indices.

use std::num::NonZeroU64;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::backend::{FrameStatus, GpuMesh, RenderBackend, RenderError, TextureIndex};
use super::constants::{MaterialTextures, ObjectConstants};
use super::mesh::{MeshData, MeshError, Vertex};
use super::texture::{Texture, TextureKind};
use crate::core::EngineConfig;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const OBJECT_SIZE: u64 = std::mem::size_of::<ObjectConstants>() as u64;
const INITIAL_OBJECT_CAPACITY: u64 = 64;

/// Vertex and index buffers of an uploaded mesh
#[derive(Debug)]
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// A queued draw; its constant slot is its position in the frame
#[derive(Debug, Clone, Copy)]
struct Draw {
    mesh: u32,
    textures: [u32; 4],
}

/// A frame in progress
struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    constants: Vec<ObjectConstants>,
    draws: Vec<Draw>,
}

/// Neutral textures substituted for unset material slots
#[derive(Debug)]
struct DefaultTextures {
    albedo: Texture,
    normal: Texture,
    roughness: Texture,
    metalness: Texture,
}

impl DefaultTextures {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            albedo: Texture::solid(device, queue, [255; 4], TextureKind::Color, "default_albedo"),
            normal: Texture::solid(
                device,
                queue,
                [128, 128, 255, 255],
                TextureKind::Data,
                "default_normal",
            ),
            roughness: Texture::solid(
                device,
                queue,
                [255; 4],
                TextureKind::Data,
                "default_roughness",
            ),
            metalness: Texture::solid(
                device,
                queue,
                [0, 0, 0, 255],
                TextureKind::Data,
                "default_metalness",
            ),
        }
    }
}

/// Per-object uniform storage
#[derive(Debug)]
struct ObjectBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Distance between consecutive payloads
    stride: u64,
    /// Number of payloads the buffer holds
    capacity: u64,
}

impl ObjectBuffer {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_constants"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(OBJECT_SIZE),
                }),
            }],
        });

        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

/// Main renderer
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
    pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    objects: ObjectBuffer,
    meshes: Vec<MeshBuffers>,
    textures: Vec<Texture>,
    defaults: DefaultTextures,
    sampler: wgpu::Sampler,
    material_bind_groups: FxHashMap<[u32; 4], wgpu::BindGroup>,
    frame: Option<Frame>,
    /// Clear color
    pub clear_color: wgpu::Color,
}

impl Renderer {
    /// Create a renderer drawing into `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if no surface, adapter or device can be created
    pub async fn new(window: Arc<Window>, engine: &EngineConfig) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let size = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::Device("no compatible GPU adapter".to_string()))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lumen_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".to_string()))?;

        let present_mode = if engine.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = Self::create_depth_view(&device, size.0, size.1);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(OBJECT_SIZE),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &[
                texture_entry(0), // albedo
                texture_entry(1), // normal
                texture_entry(2), // roughness
                texture_entry(3), // metalness
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit_pipeline_layout"),
            bind_group_layouts: &[&object_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lit_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Generated and imported meshes do not agree on winding
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = wgpu::util::align_to(OBJECT_SIZE, alignment);
        let objects = ObjectBuffer::new(&device, &object_layout, stride, INITIAL_OBJECT_CAPACITY);

        let defaults = DefaultTextures::new(&device, &queue);
        let sampler = Texture::material_sampler(&device);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline,
            depth_view,
            object_layout,
            material_layout,
            objects,
            meshes: Vec::new(),
            textures: Vec::new(),
            defaults,
            sampler,
            material_bind_groups: FxHashMap::default(),
            frame: None,
            clear_color: engine.clear_color(surface_format.is_srgb()),
        })
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Resolve a material slot to its texture view, falling back to `default`
    fn texture_view<'a>(
        &'a self,
        index: TextureIndex,
        default: &'a Texture,
    ) -> Result<&'a wgpu::TextureView, RenderError> {
        if !index.is_set() {
            return Ok(&default.view);
        }
        self.textures
            .get(index.raw() as usize)
            .map(|texture| &texture.view)
            .ok_or(RenderError::UnknownTexture(index.raw()))
    }

    fn create_material_bind_group(
        &self,
        textures: MaterialTextures,
    ) -> Result<wgpu::BindGroup, RenderError> {
        let albedo = self.texture_view(textures.albedo, &self.defaults.albedo)?;
        let normal = self.texture_view(textures.normal, &self.defaults.normal)?;
        let roughness = self.texture_view(textures.roughness, &self.defaults.roughness)?;
        let metalness = self.texture_view(textures.metalness, &self.defaults.metalness)?;

        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(albedo),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(normal),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(roughness),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(metalness),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }))
    }

    /// Validate a draw and make sure its material bind group exists
    fn prepare_draw(
        &mut self,
        mesh: &GpuMesh,
        constants: &ObjectConstants,
    ) -> Result<[u32; 4], RenderError> {
        if mesh.id() as usize >= self.meshes.len() {
            return Err(RenderError::UnknownMesh(mesh.id()));
        }

        let textures = constants.textures();
        let key = textures.key();
        if !self.material_bind_groups.contains_key(&key) {
            let bind_group = self.create_material_bind_group(textures)?;
            self.material_bind_groups.insert(key, bind_group);
        }
        Ok(key)
    }

    /// Grow the object buffer to hold at least `count` payloads
    fn reserve_objects(&mut self, count: u64) {
        if count <= self.objects.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        log::debug!("Growing object buffer to {capacity} entries");
        self.objects =
            ObjectBuffer::new(&self.device, &self.object_layout, self.objects.stride, capacity);
    }

    /// Current surface size
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Get the device
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get the queue
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl RenderBackend for Renderer {
    fn upload_mesh(&mut self, mesh: &MeshData, label: &str) -> Result<GpuMesh, RenderError> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(MeshError::Empty.into());
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let id = self.meshes.len() as u32;
        self.meshes.push(MeshBuffers {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        });

        log::debug!(
            "Uploaded mesh {label} ({} vertices, {} indices)",
            mesh.vertices.len(),
            mesh.indices.len()
        );

        Ok(GpuMesh::new(id, mesh.index_count()))
    }

    fn create_texture(
        &mut self,
        image: &image::RgbaImage,
        kind: TextureKind,
        label: &str,
    ) -> Result<TextureIndex, RenderError> {
        let texture = Texture::from_rgba(
            &self.device,
            &self.queue,
            image.as_raw(),
            image.dimensions(),
            kind,
            Some(label),
        )?;

        let index = TextureIndex::new(self.textures.len() as u32);
        self.textures.push(texture);
        Ok(index)
    }

    fn begin_frame(&mut self) -> Result<FrameStatus, RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(RenderError::Surface("out of memory".to_string()));
            }
            Err(e) => {
                log::warn!("Surface error: {e:?}");
                return Ok(FrameStatus::Skipped);
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.frame = Some(Frame {
            output,
            view,
            constants: Vec::new(),
            draws: Vec::new(),
        });
        Ok(FrameStatus::Ready)
    }

    fn submit(&mut self, mesh: &GpuMesh, constants: &ObjectConstants) -> Result<(), RenderError> {
        if self.frame.is_none() {
            return Err(RenderError::NoFrame);
        }

        let key = match self.prepare_draw(mesh, constants) {
            Ok(key) => key,
            Err(e) => {
                // Drop the frame along with its acquired surface texture
                self.frame = None;
                return Err(e);
            }
        };

        let frame = self.frame.as_mut().ok_or(RenderError::NoFrame)?;
        frame.constants.push(*constants);
        frame.draws.push(Draw {
            mesh: mesh.id(),
            textures: key,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let frame = self.frame.take().ok_or(RenderError::NoFrame)?;

        self.reserve_objects(frame.constants.len() as u64);
        let stride = self.objects.stride as usize;
        if !frame.constants.is_empty() {
            let mut staging = vec![0u8; stride * frame.constants.len()];
            for (slot, constants) in staging.chunks_exact_mut(stride).zip(&frame.constants) {
                slot[..OBJECT_SIZE as usize].copy_from_slice(bytemuck::bytes_of(constants));
            }
            self.queue.write_buffer(&self.objects.buffer, 0, &staging);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);

            for (slot, draw) in frame.draws.iter().enumerate() {
                let buffers = self
                    .meshes
                    .get(draw.mesh as usize)
                    .ok_or(RenderError::UnknownMesh(draw.mesh))?;
                let material = self
                    .material_bind_groups
                    .get(&draw.textures)
                    .ok_or(RenderError::UnknownTexture(draw.textures[0]))?;

                let offset = (slot * stride) as wgpu::DynamicOffset;
                render_pass.set_bind_group(0, &self.objects.bind_group, &[offset]);
                render_pass.set_bind_group(1, material, &[]);
                render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = Self::create_depth_view(&self.device, width, height);

            log::debug!("Resized to {}x{}", width, height);
        }
    }
}
