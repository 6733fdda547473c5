//! GPU-backed canvas: the production implementation of [`Canvas`].
//!
//! Draw calls are recorded as instances during the frame cycle, then
//! uploaded and rendered in one pass by [`GpuCanvas::present`]. Two
//! pipelines: instanced quads with a radial discard for discs, and quads
//! expanded along the segment perpendicular for 1-pixel lines. The surface
//! is cleared by the pass load op, so [`Canvas::clear`] only drops the
//! previous frame's instances.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::GpuError;
use crate::particle::PARTICLE_COUNT;
use crate::render::{Canvas, ACCENT_COLOR};

/// Background clear color.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// Worst case for the proximity pass: every candidate pair draws.
const LINE_CAPACITY: u64 = (PARTICLE_COUNT as u64 * (PARTICLE_COUNT as u64 + 1)) / 2;

/// Shared shader uniforms: surface resolution and the accent color.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],
    _pad: [f32; 2],
    accent: [f32; 4],
}

/// One disc, instanced.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CircleInstance {
    center: [f32; 2],
    radius: f32,
    alpha: f32,
}

/// One line segment, instanced.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LineInstance {
    from: [f32; 2],
    to: [f32; 2],
    alpha: f32,
    _pad: f32,
}

const CIRCLE_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x2, // center
    },
    wgpu::VertexAttribute {
        offset: 8,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32, // radius
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32, // alpha
    },
];

const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x2, // endpoint a
    },
    wgpu::VertexAttribute {
        offset: 8,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x2, // endpoint b
    },
    wgpu::VertexAttribute {
        offset: 16,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32, // alpha
    },
];

/// Drawable context over a winit window.
pub struct GpuCanvas {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    circle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    circle_buffer: wgpu::Buffer,
    line_buffer: wgpu::Buffer,
    circles: Vec<CircleInstance>,
    lines: Vec<LineInstance>,
}

impl GpuCanvas {
    /// Acquire the GPU context for `window`.
    ///
    /// This is the engine's single capability check: if it fails, the
    /// caller runs without a backdrop.
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        // An ambient backdrop has no business spinning up a discrete GPU.
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::debug!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let globals = Globals {
            resolution: [config.width as f32, config.height as f32],
            _pad: [0.0; 2],
            accent: [ACCENT_COLOR[0], ACCENT_COLOR[1], ACCENT_COLOR[2], 1.0],
        };

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Globals Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let circle_pipeline = create_pipeline(
            &device,
            &globals_bind_group_layout,
            config.format,
            CIRCLE_SHADER,
            "Circle Pipeline",
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<CircleInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &CIRCLE_ATTRIBUTES,
            },
        );

        let line_pipeline = create_pipeline(
            &device,
            &globals_bind_group_layout,
            config.format,
            LINE_SHADER,
            "Line Pipeline",
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &LINE_ATTRIBUTES,
            },
        );

        let circle_buffer = instance_buffer(
            &device,
            "Circle Instance Buffer",
            PARTICLE_COUNT as u64 * std::mem::size_of::<CircleInstance>() as u64,
        );
        let line_buffer = instance_buffer(
            &device,
            "Line Instance Buffer",
            LINE_CAPACITY * std::mem::size_of::<LineInstance>() as u64,
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            globals_buffer,
            globals_bind_group,
            circle_pipeline,
            line_pipeline,
            circle_buffer,
            line_buffer,
            circles: Vec::new(),
            lines: Vec::new(),
        })
    }

    /// Reconfigure the surface after a resize. Zero-sized surfaces are
    /// rejected by the GPU API, so those notifications only reach the cached
    /// viewport state, not the swapchain.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Upload the recorded frame and draw it to the surface.
    pub fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        let globals = Globals {
            resolution: [self.config.width as f32, self.config.height as f32],
            _pad: [0.0; 2],
            accent: [ACCENT_COLOR[0], ACCENT_COLOR[1], ACCENT_COLOR[2], 1.0],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        if !self.circles.is_empty() {
            let bytes: &[u8] = bytemuck::cast_slice(&self.circles);
            grow_to_fit(&self.device, &mut self.circle_buffer, "Circle Instance Buffer", bytes.len() as u64);
            self.queue.write_buffer(&self.circle_buffer, 0, bytes);
        }
        if !self.lines.is_empty() {
            let bytes: &[u8] = bytemuck::cast_slice(&self.lines);
            grow_to_fit(&self.device, &mut self.line_buffer, "Line Instance Buffer", bytes.len() as u64);
            self.queue.write_buffer(&self.line_buffer, 0, bytes);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Backdrop Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Backdrop Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

            // Discs first, lines over them, matching the frame-cycle order.
            if !self.circles.is_empty() {
                render_pass.set_pipeline(&self.circle_pipeline);
                render_pass.set_vertex_buffer(0, self.circle_buffer.slice(..));
                render_pass.draw(0..6, 0..self.circles.len() as u32);
            }
            if !self.lines.is_empty() {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, self.line_buffer.slice(..));
                render_pass.draw(0..6, 0..self.lines.len() as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl Canvas for GpuCanvas {
    fn clear(&mut self) {
        // The pass clears via its load op; dropping the recorded instances
        // is all that is left to do here.
        self.circles.clear();
        self.lines.clear();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, alpha: f32) {
        self.circles.push(CircleInstance {
            center: center.to_array(),
            radius,
            alpha,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, alpha: f32) {
        self.lines.push(LineInstance {
            from: from.to_array(),
            to: to.to_array(),
            alpha,
            _pad: 0.0,
        });
    }
}

fn instance_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn grow_to_fit(device: &wgpu::Device, buffer: &mut wgpu::Buffer, label: &str, needed: u64) {
    if buffer.size() < needed {
        *buffer = instance_buffer(device, label, needed.next_power_of_two());
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    globals_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
    shader_src: &str,
    label: &str,
    instance_layout: wgpu::VertexBufferLayout<'_>,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(shader_src.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[globals_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[instance_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Instanced disc shader: a quad per particle, discarded outside the unit
/// radius.
pub const CIRCLE_SHADER: &str = r#"
struct Globals {
    resolution: vec2<f32>,
    accent: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) alpha: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) center: vec2<f32>,
    @location(1) radius: f32,
    @location(2) alpha: f32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );

    let quad_pos = quad_vertices[vertex_index];
    let pixel = center + quad_pos * radius;
    let ndc = pixel / globals.resolution * 2.0 - 1.0;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc.x, -ndc.y, 0.0, 1.0);
    out.uv = quad_pos;
    out.alpha = alpha;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if length(in.uv) > 1.0 {
        discard;
    }
    return vec4<f32>(globals.accent.rgb, in.alpha);
}
"#;

/// Instanced line shader: a quad per segment, expanded half a pixel to each
/// side of the segment for a 1-pixel stroke.
pub const LINE_SHADER: &str = r#"
struct Globals {
    resolution: vec2<f32>,
    accent: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) alpha: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) point_a: vec2<f32>,
    @location(1) point_b: vec2<f32>,
    @location(2) alpha: f32,
) -> VertexOutput {
    let dir = point_b - point_a;
    let len = length(dir);
    var unit = vec2<f32>(1.0, 0.0);
    if len > 0.0 {
        unit = dir / len;
    }
    let perp = vec2<f32>(-unit.y, unit.x) * 0.5;

    var pixel: vec2<f32>;
    switch vertex_index {
        case 0u: { pixel = point_a - perp; }
        case 1u: { pixel = point_a + perp; }
        case 2u: { pixel = point_b - perp; }
        case 3u: { pixel = point_a + perp; }
        case 4u: { pixel = point_b - perp; }
        default: { pixel = point_b + perp; }
    }

    let ndc = pixel / globals.resolution * 2.0 - 1.0;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc.x, -ndc.y, 0.0, 1.0);
    out.alpha = alpha;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(globals.accent.rgb, in.alpha);
}
"#;
