//! wgpu canvas for the boxdrop window.
//!
//! # Architecture
//!
//! Drawing is split in two so the geometry side runs without a GPU:
//!
//! 1. [`FrameBuilder`] implements [`Canvas`]. It maps world points to
//!    display pixels with the current [`ViewTransform`] and collects two
//!    vertex lists: filled polygons as triangle fans, outlines as line
//!    segments.
//! 2. [`DebugRenderer::render`] uploads both lists and issues one render
//!    pass: clear, triangles, then lines on top.
//!
//! Vertices stay in pixels; the shader maps them to clip space from the
//! viewport uniform, so a resize only rewrites that uniform.

use std::borrow::Cow;
use std::sync::Arc;

use rapier2d::prelude::{Point, Real};
use wgpu::util::DeviceExt;

use crate::draw::{Canvas, Color, PolygonStyle};
use crate::view::ViewTransform;

// ---------------------------------------------------------------------------
// Vertex
// ---------------------------------------------------------------------------

/// A single vertex with pixel position and RGBA color, sent to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    fn new(p: Point<Real>, color: Color) -> Self {
        Self {
            position: [p.x, p.y],
            color: color.to_array(),
        }
    }

    /// Vertex buffer layout for the shader.
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// FrameBuilder
// ---------------------------------------------------------------------------

/// CPU-side frame: background color plus pixel-space geometry.
///
/// Polygons drawn before any [`set_transform`](Canvas::set_transform) are
/// taken to be in pixels already.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    background: Color,
    transform: Option<ViewTransform>,
    triangles: Vec<Vertex>,
    lines: Vec<Vertex>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            background: Color::WHITE,
            transform: None,
            triangles: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Triangle-list vertices for filled polygons.
    pub fn triangles(&self) -> &[Vertex] {
        &self.triangles
    }

    /// Line-list vertices for outlines.
    pub fn lines(&self) -> &[Vertex] {
        &self.lines
    }

    fn to_pixels(&self, p: &Point<Real>) -> Point<Real> {
        match &self.transform {
            Some(t) => t.to_display(*p),
            None => *p,
        }
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas for FrameBuilder {
    fn clear(&mut self, color: Color) {
        self.background = color;
        self.triangles.clear();
        self.lines.clear();
    }

    fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = Some(transform);
    }

    fn draw_polygon(&mut self, points: &[Point<Real>], style: PolygonStyle) {
        let pixels: Vec<Point<Real>> = points.iter().map(|p| self.to_pixels(p)).collect();
        match style {
            PolygonStyle::Fill(color) => {
                if pixels.len() < 3 {
                    return;
                }
                // Fan around the first vertex; debug-draw polygons are convex.
                for pair in pixels[1..].windows(2) {
                    self.triangles.push(Vertex::new(pixels[0], color));
                    self.triangles.push(Vertex::new(pair[0], color));
                    self.triangles.push(Vertex::new(pair[1], color));
                }
            }
            PolygonStyle::Stroke(color) => {
                if pixels.len() < 2 {
                    return;
                }
                let n = pixels.len();
                // A two-point polygon is a single segment, not a closed loop.
                let edges = if n > 2 { n } else { 1 };
                for i in 0..edges {
                    self.lines.push(Vertex::new(pixels[i], color));
                    self.lines.push(Vertex::new(pixels[(i + 1) % n], color));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// GPU resources
// ---------------------------------------------------------------------------

/// Vertices allocated up front for each list; buffers grow on demand.
const INITIAL_VERTEX_CAPACITY: usize = 1024;

/// A vertex buffer that grows by doubling when a frame outgrows it.
struct VertexBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    label: &'static str,
}

impl VertexBuffer {
    fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            capacity,
            label,
        }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, vertices: &[Vertex]) {
        if vertices.len() > self.capacity {
            let capacity = vertices.len().next_power_of_two();
            tracing::debug!(
                buffer = self.label,
                from = self.capacity,
                to = capacity,
                "growing vertex buffer"
            );
            *self = Self::new(device, self.label, capacity);
        }
        if !vertices.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(vertices));
        }
    }
}

/// Viewport size in pixels, padded to 16 bytes for the uniform.
fn viewport_uniform(width: u32, height: u32) -> [f32; 4] {
    [width as f32, height as f32, 0.0, 0.0]
}

/// Decode one sRGB-encoded channel to linear light.
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Colors are authored in sRGB. An sRGB surface re-encodes on write, so
/// its inputs must be linear; any other surface takes them as they are.
fn surface_color(color: [f32; 4], srgb_surface: bool) -> [f32; 4] {
    if !srgb_surface {
        return color;
    }
    let [r, g, b, a] = color;
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
}

fn surface_vertices(vertices: &[Vertex], srgb_surface: bool) -> Cow<'_, [Vertex]> {
    if !srgb_surface {
        return Cow::Borrowed(vertices);
    }
    vertices
        .iter()
        .map(|v| Vertex {
            position: v.position,
            color: surface_color(v.color, true),
        })
        .collect()
}

fn to_wgpu_color(color: Color, srgb_surface: bool) -> wgpu::Color {
    let [r, g, b, a] = surface_color(color.to_array(), srgb_surface);
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: f64::from(a),
    }
}

// ---------------------------------------------------------------------------
// DebugRenderer
// ---------------------------------------------------------------------------

/// Presents [`FrameBuilder`] output to a winit window.
///
/// # GPU Initialization
///
/// Call [`DebugRenderer::new`] with an `Arc<winit::window::Window>`. This
/// performs async wgpu device/adapter selection, surface creation, and
/// pipeline setup. If no suitable GPU is available, the error is returned.
pub struct DebugRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    fill_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    triangle_buffer: VertexBuffer,
    line_buffer: VertexBuffer,
    viewport_buffer: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,
    window: Arc<winit::window::Window>,
}

impl DebugRenderer {
    /// Initialize wgpu: surface, device, queue, pipelines.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable GPU adapter or device is available.
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, anyhow::Error> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("boxdrop_renderer"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("boxdrop_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let viewport_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("viewport_uniform"),
            contents: bytemuck::cast_slice(&viewport_uniform(width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let viewport_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("viewport_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("viewport_bind_group"),
            layout: &viewport_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("boxdrop_pipeline_layout"),
            bind_group_layouts: &[&viewport_bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::desc()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };
        let fill_pipeline = make_pipeline("fill_pipeline", wgpu::PrimitiveTopology::TriangleList);
        let line_pipeline = make_pipeline("line_pipeline", wgpu::PrimitiveTopology::LineList);

        let triangle_buffer = VertexBuffer::new(&device, "triangle_buffer", INITIAL_VERTEX_CAPACITY);
        let line_buffer = VertexBuffer::new(&device, "line_buffer", INITIAL_VERTEX_CAPACITY);

        tracing::debug!(format = ?surface_format, width, height, "surface configured");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            fill_pipeline,
            line_pipeline,
            triangle_buffer,
            line_buffer,
            viewport_buffer,
            viewport_bind_group,
            window,
        })
    }

    /// Upload `frame` and present it.
    ///
    /// # Errors
    ///
    /// Returns a [`wgpu::SurfaceError`] if the surface cannot provide an
    /// output texture (e.g., window minimized, surface lost).
    pub fn render(&mut self, frame: &FrameBuilder) -> Result<(), wgpu::SurfaceError> {
        let srgb = self.config.format.is_srgb();
        self.triangle_buffer.upload(
            &self.device,
            &self.queue,
            &surface_vertices(frame.triangles(), srgb),
        );
        self.line_buffer
            .upload(&self.device, &self.queue, &surface_vertices(frame.lines(), srgb));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("boxdrop_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("boxdrop_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_wgpu_color(frame.background(), srgb)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.viewport_bind_group, &[]);

            let triangle_count = frame.triangles().len() as u32;
            if triangle_count > 0 {
                render_pass.set_pipeline(&self.fill_pipeline);
                render_pass.set_vertex_buffer(0, self.triangle_buffer.buffer.slice(..));
                render_pass.draw(0..triangle_count, 0..1);
            }

            let line_count = frame.lines().len() as u32;
            if line_count > 0 {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, self.line_buffer.buffer.slice(..));
                render_pass.draw(0..line_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Resize the surface when the window size changes.
    ///
    /// Zero-sized requests (minimized window) are ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.queue.write_buffer(
                &self.viewport_buffer,
                0,
                bytemuck::cast_slice(&viewport_uniform(new_size.width, new_size.height)),
            );
        }
    }

    /// Get a reference to the window.
    pub fn window(&self) -> &winit::window::Window {
        &self.window
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
