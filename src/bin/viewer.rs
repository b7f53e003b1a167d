use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

use zscan::{
    config::Scene,
    scene::{insert_drawables, Camera, Drawable},
    PixelFormat, RasterError, ZBufferScanLine,
};

const ORBIT_SPEED: f32 = std::f32::consts::PI / 4.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scene_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("scenes/cube.toml"));
    let mut viewer = Viewer::load(&scene_path)?;
    let (width, height) = (viewer.zbuffer.width() as u32, viewer.zbuffer.height() as u32);

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("zscan")
        .with_inner_size(LogicalSize::new(width, height))
        .build(&event_loop)?;

    let mut pixels = {
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        Pixels::new(width, height, surface_texture)?
    };

    let mut start = Instant::now();
    event_loop.run(move |event, _, control_flow| {
        control_flow.set_poll();

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => control_flow.set_exit(),
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(virtual_keycode),
                                ..
                            },
                        is_synthetic: false,
                        ..
                    },
                ..
            } => match virtual_keycode {
                VirtualKeyCode::Space => viewer.toggle_textures(),
                VirtualKeyCode::P => viewer.toggle_pause(),
                VirtualKeyCode::Escape => control_flow.set_exit(),
                _ => (),
            },
            Event::MainEventsCleared => {
                let dt = start.elapsed();
                start = Instant::now();
                if let Err(err) = viewer.render(pixels.frame_mut(), dt) {
                    log::error!("failed to render frame: {err}");
                    control_flow.set_exit();
                    return;
                }
                window.request_redraw()
            }
            Event::RedrawRequested(_) => {
                if let Err(err) = pixels.render() {
                    log::error!("failed to present frame: {err}");
                    control_flow.set_exit();
                }
            }
            _ => (),
        }
    });
}

struct Viewer {
    zbuffer: ZBufferScanLine,
    camera: Camera,
    drawables: Vec<Drawable>,
    textures: bool,
    is_paused: bool,
    frames: u32,
    since_report: Duration,
}

impl Viewer {
    fn load(scene_path: &Path) -> Result<Self> {
        let scene = Scene::load_toml(scene_path)?;
        let drawables = scene.load_drawables(scene_path.parent().unwrap_or(Path::new(".")))?;
        let mut zbuffer = ZBufferScanLine::from_config(&scene.rendering)?;
        // The window surface is RGBA.
        zbuffer.set_pixel_format(PixelFormat::Rgba);
        Ok(Viewer {
            zbuffer,
            camera: scene.camera(),
            drawables,
            textures: scene.rendering.textures,
            is_paused: false,
            frames: 0,
            since_report: Duration::ZERO,
        })
    }

    fn render(&mut self, frame: &mut [u8], dt: Duration) -> Result<(), RasterError> {
        if !self.is_paused {
            self.camera.orbit(dt.as_secs_f32() * ORBIT_SPEED);
        }

        self.zbuffer.reset();
        insert_drawables(&mut self.zbuffer, &self.camera, &self.drawables, self.textures)?;
        self.zbuffer.draw();
        self.zbuffer.write_top_down(frame)?;

        self.frames += 1;
        self.since_report += dt;
        if self.since_report >= Duration::from_secs(1) {
            let fps = self.frames as f32 / self.since_report.as_secs_f32();
            log::info!("{fps:.1} fps, {} polygons", self.zbuffer.num_polygons());
            self.frames = 0;
            self.since_report = Duration::ZERO;
        }
        Ok(())
    }

    fn toggle_textures(&mut self) {
        self.textures = !self.textures;
        log::info!("textures {}", if self.textures { "on" } else { "off" });
    }

    fn toggle_pause(&mut self) {
        self.is_paused = !self.is_paused;
    }
}
