//! GPU rendering pipeline using wgpu.
//!
//! This module provides the [`Renderer`] struct which handles:
//! - wgpu device and surface initialization
//! - Shader loading and one triangle-strip pipeline per polygon mode
//! - Mesh upload and strip-by-strip draw sequencing
//! - Camera uniform updates and the egui overlay

pub mod camera;
pub mod shaders;

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::terrain::{TerrainMesh, Vertex};
use crate::ui::{MeshStats, Ui, UiResponse};
use camera::Camera;
use shaders::{ShaderError, ShaderSource};

/// How triangles are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
    Point,
}

impl PolygonMode {
    pub const ALL: [PolygonMode; 3] = [PolygonMode::Fill, PolygonMode::Line, PolygonMode::Point];

    /// Fill → Line → Point → Fill
    pub fn next(self) -> Self {
        match self {
            PolygonMode::Fill => PolygonMode::Line,
            PolygonMode::Line => PolygonMode::Point,
            PolygonMode::Point => PolygonMode::Fill,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PolygonMode::Fill => "fill",
            PolygonMode::Line => "lines",
            PolygonMode::Point => "points",
        }
    }

    /// Device feature needed to use this mode, if any.
    pub fn required_feature(self) -> wgpu::Features {
        match self {
            PolygonMode::Fill => wgpu::Features::empty(),
            PolygonMode::Line => wgpu::Features::POLYGON_MODE_LINE,
            PolygonMode::Point => wgpu::Features::POLYGON_MODE_POINT,
        }
    }

    fn to_wgpu(self) -> wgpu::PolygonMode {
        match self {
            PolygonMode::Fill => wgpu::PolygonMode::Fill,
            PolygonMode::Line => wgpu::PolygonMode::Line,
            PolygonMode::Point => wgpu::PolygonMode::Point,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Uniform data sent to shaders.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

impl Uniforms {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }

    fn update(&mut self, camera: &Camera, aspect: f32) {
        self.view_proj = camera
            .build_view_projection_matrix(aspect)
            .to_cols_array_2d();
    }
}

/// GPU buffers for one uploaded terrain mesh.
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    /// Index range of each draw call, in submission order
    draw_ranges: Vec<Range<u32>>,
}

/// GPU renderer managing wgpu state and rendering.
pub struct Renderer {
    // Core wgpu objects
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// Current window size (for aspect ratio and resize handling)
    pub size: winit::dpi::PhysicalSize<u32>,

    // Depth buffer
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    /// Pipelines indexed by [`PolygonMode`]; `None` when the adapter lacks the feature
    pipelines: [Option<wgpu::RenderPipeline>; 3],
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,

    mesh: Option<MeshBuffers>,
    mesh_stats: MeshStats,

    /// Current polygon mode
    pub polygon_mode: PolygonMode,

    /// Background colour
    pub clear_color: [f32; 3],

    /// Fly camera for viewing the terrain
    pub camera: Camera,

    // egui
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    /// UI state
    pub ui: Ui,

    // FPS counter
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
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
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    mode: PolygonMode,
) -> wgpu::RenderPipeline {
    let label = format!("Terrain Pipeline ({})", mode.label());
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label.as_str()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc(), Vertex::color_desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            // Also enables primitive restart on u32::MAX
            strip_index_format: Some(wgpu::IndexFormat::Uint32),
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: mode.to_wgpu(),
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
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

/// Layout for the single `view_proj` uniform at group 0, binding 0.
fn uniform_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("Uniform Bind Group Layout"),
    })
}

/// Compile `shader_source` and build one pipeline per polygon mode that
/// `features` allows.
///
/// Pipeline creation runs inside a validation error scope, so a shader that
/// compiles but lacks an entry point or disagrees with the vertex buffers
/// comes back as [`ShaderError::Link`] instead of an uncaptured device error.
pub fn build_pipelines(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    shader_source: &ShaderSource,
    format: wgpu::TextureFormat,
    features: wgpu::Features,
) -> Result<[Option<wgpu::RenderPipeline>; 3], ShaderError> {
    let shader = shader_source.compile(device)?;

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Terrain Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipelines = PolygonMode::ALL.map(|mode| {
        features
            .contains(mode.required_feature())
            .then(|| create_pipeline(device, &pipeline_layout, &shader, format, mode))
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(ShaderError::Link {
            label: shader_source.label.clone(),
            message: error.to_string(),
        }),
        None => Ok(pipelines),
    }
}

impl Renderer {
    /// Create a new renderer for the given window.
    ///
    /// # Errors
    ///
    /// Returns an error if GPU initialization fails or the shader does not
    /// compile or link.
    pub async fn new(window: Arc<Window>, shader_source: &ShaderSource) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        // Line and point rasterization are optional; take whatever the adapter offers
        let wanted = wgpu::Features::POLYGON_MODE_LINE | wgpu::Features::POLYGON_MODE_POINT;
        let features = adapter.features() & wanted;
        for mode in PolygonMode::ALL {
            if !features.contains(mode.required_feature()) {
                log::warn!("Adapter cannot draw {}, mode disabled", mode.label());
            }
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: features,
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Init egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: Some(DEPTH_FORMAT),
                ..Default::default()
            },
        );

        let (depth_texture, depth_view) = create_depth_texture(&device, config.width, config.height);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = uniform_bind_group_layout(&device);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("Uniform Bind Group"),
        });

        let pipelines = build_pipelines(
            &device,
            &bind_group_layout,
            shader_source,
            config.format,
            features,
        )?;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth_texture,
            depth_view,
            pipelines,
            uniform_buffer,
            bind_group,
            mesh: None,
            mesh_stats: MeshStats::default(),
            polygon_mode: PolygonMode::default(),
            clear_color: [0.0, 0.0, 0.0],
            camera: Camera::new(),
            egui_state,
            egui_renderer,
            ui: Ui::new(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    /// Forward a window event to egui. Returns true if egui consumed it.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    /// Handle window resize.
    ///
    /// Reconfigures the surface and depth buffer for the new size.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            let (depth_texture, depth_view) =
                create_depth_texture(&self.device, new_size.width, new_size.height);
            self.depth_texture = depth_texture;
            self.depth_view = depth_view;
        }
    }

    pub fn supports(&self, mode: PolygonMode) -> bool {
        self.pipelines[mode.index()].is_some()
    }

    /// Switch to the next polygon mode the adapter supports.
    pub fn cycle_polygon_mode(&mut self) {
        let mut mode = self.polygon_mode.next();
        while !self.supports(mode) {
            mode = mode.next();
        }
        self.polygon_mode = mode;
        log::info!("Polygon mode: {}", mode.label());
    }

    /// Upload a terrain mesh, replacing any previous buffers.
    pub fn upload_mesh(&mut self, mesh: &TerrainMesh) {
        self.mesh_stats = MeshStats::from_mesh(mesh);

        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            self.mesh = None;
            return;
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let color_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Color Buffer"),
                contents: bytemuck::cast_slice(&mesh.colors),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Strip Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        self.mesh = Some(MeshBuffers {
            vertex_buffer,
            color_buffer,
            index_buffer,
            draw_ranges: mesh.draw_ranges(),
        });
        log::debug!(
            "Uploaded mesh: {} draw call(s) per frame",
            self.mesh_stats.draw_calls
        );
    }

    /// Render a frame.
    ///
    /// Returns the actions requested through the UI during this frame.
    ///
    /// # Errors
    ///
    /// Returns [`wgpu::SurfaceError`] if surface acquisition fails.
    pub fn render(&mut self, window: &Window) -> Result<UiResponse, wgpu::SurfaceError> {
        self.frame_count += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.last_frame = now;
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let aspect = self.config.width as f32 / self.config.height as f32;
        let mut uniforms = Uniforms::new();
        uniforms.update(&self.camera, aspect);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        // Begin egui frame
        let raw_input = self.egui_state.take_egui_input(window);
        let egui_ctx = self.egui_state.egui_ctx().clone();
        let supported = PolygonMode::ALL.map(|mode| self.supports(mode));
        let mut response = UiResponse::default();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            response = self.ui.render(
                ctx,
                &mut self.camera,
                &mut self.polygon_mode,
                supported,
                &mut self.clear_color,
                &self.mesh_stats,
                self.fps,
            );
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let [r, g, b] = self.clear_color;
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // Convert to 'static lifetime for egui compatibility
            let mut render_pass = render_pass.forget_lifetime();

            let pipeline = &self.pipelines[self.polygon_mode.index()];
            if let (Some(mesh), Some(pipeline)) = (&self.mesh, pipeline) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, mesh.color_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                for range in &mesh.draw_ranges {
                    render_pass.draw_indexed(range.clone(), 0, 0..1);
                }
            }

            self.egui_renderer
                .render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(response)
    }
}
