use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window, WindowId},
};

use heightmesh::input::{InputAction, InputController};
use heightmesh::renderer::camera::Camera;
use heightmesh::renderer::shaders::ShaderSource;
use heightmesh::renderer::Renderer;
use heightmesh::terrain::{
    load_heightmap, ColorScheme, DrawMode, ElevationMapping, MeshOptions, TerrainMesh,
};

#[derive(Parser, Debug)]
#[command(name = "heightmesh")]
#[command(about = "Build and view triangle-strip terrain meshes from heightmap images")]
struct Args {
    /// Heightmap image (BMP, PNG, JPEG, TGA)
    file: PathBuf,

    /// World units per elevation step
    #[arg(long, default_value = "0.25")]
    y_scale: f32,

    /// Subtracted from every scaled elevation
    #[arg(long, default_value = "16.0")]
    y_shift: f32,

    /// Vertex colouring
    #[arg(long, value_enum, default_value_t = ColorScheme::Monochrome)]
    color_scheme: ColorScheme,

    /// One draw call per strip, or a single call with restart indices
    #[arg(long, value_enum, default_value_t = DrawMode::PerStrip)]
    draw_mode: DrawMode,

    /// WGSL file replacing the built-in shader
    #[arg(long)]
    shader: Option<PathBuf>,

    /// Print mesh statistics and exit without opening a window
    #[arg(long)]
    info: bool,
}

impl Args {
    fn mesh_options(&self) -> MeshOptions {
        MeshOptions {
            mapping: ElevationMapping {
                y_scale: self.y_scale,
                y_shift: self.y_shift,
            },
            color_scheme: self.color_scheme,
            draw_mode: self.draw_mode,
        }
    }
}

fn build_mesh(args: &Args) -> Result<TerrainMesh> {
    let heightmap = load_heightmap(&args.file)
        .with_context(|| format!("Failed to load heightmap {}", args.file.display()))?;
    let mesh = TerrainMesh::from_heightmap(&heightmap, &args.mesh_options())
        .with_context(|| format!("Failed to build mesh from {}", args.file.display()))?;
    Ok(mesh)
}

fn set_mouse_look(window: &Window, enabled: bool) {
    if enabled {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            log::warn!("Cannot grab cursor: {}", e);
        }
    } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
        log::warn!("Cannot release cursor: {}", e);
    }
    window.set_cursor_visible(!enabled);
}

struct App {
    args: Args,
    shader: ShaderSource,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    input: InputController,
    mesh: TerrainMesh,
    last_update: Instant,
}

impl App {
    /// Reload the heightmap from disk and replace the GPU buffers.
    fn rebuild_mesh(&mut self) {
        match build_mesh(&self.args) {
            Ok(mesh) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.upload_mesh(&mesh);
                }
                self.mesh = mesh;
                log::info!("Rebuilt mesh: {} vertices", self.mesh.vertices.len());
            }
            Err(e) => log::error!("Rebuild failed, keeping previous mesh: {:#}", e),
        }
    }

    fn apply_action(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        match action {
            InputAction::None => {}
            InputAction::Quit => event_loop.exit(),
            InputAction::SetMouseLook(enabled) => {
                if let Some(window) = &self.window {
                    set_mouse_look(window, enabled);
                }
            }
            InputAction::CyclePolygonMode => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.cycle_polygon_mode();
                }
            }
            InputAction::ResetCamera => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.camera = Camera::new();
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("heightmesh")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut renderer = match pollster::block_on(Renderer::new(window.clone(), &self.shader)) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Cannot initialize renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        };
        renderer.upload_mesh(&self.mesh);

        set_mouse_look(&window, self.input.state.mouse_look);
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.last_update = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let (Some(window), Some(renderer)) = (self.window.clone(), self.renderer.as_mut()) else {
            return;
        };

        // egui only gets input while the cursor is free
        if !self.input.state.mouse_look && renderer.handle_window_event(&window, &event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let action = self.input.handle_keyboard(key, state);
                self.apply_action(action, event_loop);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.input.handle_scroll(delta, &mut renderer.camera);
            }
            WindowEvent::Resized(physical_size) => renderer.resize(physical_size),
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(self.last_update).as_secs_f32();
                self.last_update = now;
                self.input.update(dt, &mut renderer.camera);

                match renderer.render(&window) {
                    Ok(response) => {
                        if response.reset_camera {
                            renderer.camera = Camera::new();
                        }
                        if response.rebuild_mesh {
                            self.rebuild_mesh();
                        }
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size)
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                    Err(e) => log::error!("Render error: {:?}", e),
                }
                window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let (DeviceEvent::MouseMotion { delta: (dx, dy) }, Some(renderer)) =
            (event, self.renderer.as_mut())
        {
            self.input
                .handle_mouse_motion(dx as f32, dy as f32, &mut renderer.camera);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mesh = build_mesh(&args)?;
    let (min_y, max_y) = mesh.height_bounds();
    log::info!(
        "Generated mesh: {} vertices, {} indices, {} strips of {}, height range {:.2}..{:.2}",
        mesh.vertices.len(),
        mesh.indices.len(),
        mesh.layout.strip_count,
        mesh.layout.verts_per_strip,
        min_y,
        max_y
    );

    if args.info {
        println!("vertices:        {}", mesh.vertices.len());
        println!("indices:         {}", mesh.indices.len());
        println!("strips:          {}", mesh.layout.strip_count);
        println!("verts per strip: {}", mesh.layout.verts_per_strip);
        println!("draw calls:      {}", mesh.draw_ranges().len());
        println!("height range:    {:.2} .. {:.2}", min_y, max_y);
        return Ok(());
    }

    let shader = ShaderSource::resolve(args.shader.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        args,
        shader,
        window: None,
        renderer: None,
        input: InputController::new(),
        mesh,
        last_update: Instant::now(),
    };

    event_loop.run_app(&mut app)?;

    Ok(())
}
