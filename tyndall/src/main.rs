//! Tyndall Effect Visualization
//!
//! Animated scenes showing how colloids scatter a beam of light while true solutions stay
//! clear:
//! - Two cups under a flashlight (solution vs. colloid)
//! - Car headlights in fog, low and high beam
//! - A lab bench of five beakers crossed by a laser
//! - Everyday examples: forest rays, milk, smoke, gelatin, blue sky
//!
//! Controls:
//! - Space: Toggle the light
//! - P: Pause / resume
//! - R: Reset the scene
//! - Tab: Next scene
//! - Esc: Quit

use clap::Parser;
use common::{Camera2D, GraphicsContext};
use tyndall::canvas::{Color, TextLabel};
use tyndall::driver::{AnimationDriver, DriverState, FrameScheduler};
use tyndall::equations_ui::{draw_control_panel, draw_equations_sidebar, equations_for, PanelAction};
use tyndall::renderer::CanvasRenderer;
use tyndall::scenes::{Scene, SceneKind};
use tyndall::{AppConfig, Tessellator};
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// Interactive Tyndall effect visualizations
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Scene to open with
    #[arg(long)]
    scene: Option<SceneKind>,

    /// Seed for reproducible particle fields
    #[arg(long)]
    seed: Option<u64>,
}

/// Schedules the next frame as a window redraw
struct WindowScheduler<'a>(&'a Window);

impl FrameScheduler for WindowScheduler<'_> {
    fn schedule(&mut self) {
        self.0.request_redraw();
    }
}

/// What the event loop does after a failed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Reconfigure the surface, then draw again
    Reconfigure,
    /// Skip this frame and draw again
    Retry,
    Exit,
}

fn recovery(error: &wgpu::SurfaceError) -> Recovery {
    match error {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Recovery::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => Recovery::Exit,
        wgpu::SurfaceError::Timeout => Recovery::Retry,
    }
}

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: CanvasRenderer,
    camera: Camera2D,
    canvas: Tessellator,
    driver: AnimationDriver,
    egui: EguiState,
}

fn color32(color: Color) -> egui::Color32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a),
    )
}

/// Paint scene labels in window space, under the panels
fn paint_labels(ctx: &egui::Context, camera: &Camera2D, labels: &[TextLabel]) {
    let painter = ctx.layer_painter(egui::LayerId::background());
    let screen = ctx.screen_rect();
    let (min, max) = camera.visible_region();
    let scale = screen.height() / (max.y - min.y).max(1.0);

    for label in labels {
        let p = camera.scene_to_viewport(label.position);
        let pos = screen.min + egui::vec2(p.x * screen.width(), p.y * screen.height());
        painter.text(
            pos,
            egui::Align2::CENTER_CENTER,
            &label.text,
            egui::FontId::proportional((label.size * scale).max(6.0)),
            color32(label.color),
        );
    }
}

impl App {
    fn new(ctx: GraphicsContext, config: &AppConfig) -> Self {
        let mut driver = AnimationDriver::new(config.seed);
        driver.mount(config.scene, config.params);
        let scene_size = driver
            .scene()
            .map(Scene::size)
            .unwrap_or(glam::Vec2::new(config.width as f32, config.height as f32));

        let camera = Camera2D::new(scene_size, ctx.aspect_ratio());
        let renderer = CanvasRenderer::new(&ctx, &camera);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            camera,
            canvas: Tessellator::new(scene_size),
            driver,
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        }
    }

    fn kind(&self) -> SceneKind {
        self.driver.scene().map(Scene::kind).unwrap_or(SceneKind::TwoCups)
    }

    fn switch_scene(&mut self, kind: SceneKind) {
        let params = *self.driver.params();
        self.driver.mount(kind, params);
        if let Some(scene) = self.driver.scene() {
            self.camera.set_scene_size(scene.size());
            self.canvas.set_size(scene.size());
        }
        self.ctx.window.request_redraw();
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
        self.ctx.window.request_redraw();
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut scheduler = WindowScheduler(&self.ctx.window);
        self.driver.frame(&mut self.canvas, &mut scheduler);

        self.renderer.update_camera(&self.ctx.queue, &self.camera);
        self.renderer.upload(&self.ctx.device, &self.ctx.queue, &self.canvas);

        // Build egui UI
        let kind = self.kind();
        let mut params = *self.driver.params();
        let stats = self.driver.stats();
        let elapsed = match self.driver.scene() {
            Some(Scene::LabBench(bench)) => Some(bench.elapsed_seconds()),
            _ => None,
        };
        let (equations, variables) = equations_for(kind);
        let mut action = None;

        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            paint_labels(ctx, &self.camera, self.canvas.labels());
            draw_equations_sidebar(ctx, kind.title(), equations, variables);
            action = draw_control_panel(ctx, kind, &mut params, &stats, elapsed);
        });

        self.egui.state.handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self.egui.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui.renderer.update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(&mut encoder, &view);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui.renderer.render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if params != *self.driver.params() {
            self.driver.set_params(params);
            self.ctx.window.request_redraw();
        }
        match action {
            Some(PanelAction::SwitchScene(next)) => self.switch_scene(next),
            Some(PanelAction::Reset) => self.driver.reset(),
            None => {}
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        if state != ElementState::Pressed {
            return false;
        }

        match key {
            KeyCode::Escape => return true,
            KeyCode::Space => {
                let mut params = *self.driver.params();
                params.light_on = !params.light_on;
                self.driver.set_params(params);
            }
            KeyCode::KeyP => match self.driver.state() {
                DriverState::Running => self.driver.pause(),
                DriverState::Stopped => self.driver.resume(),
            },
            KeyCode::KeyR => self.driver.reset(),
            KeyCode::Tab => {
                let current = self.kind();
                let index = SceneKind::ALL.iter().position(|k| *k == current).unwrap_or(0);
                self.switch_scene(SceneKind::ALL[(index + 1) % SceneKind::ALL.len()]);
            }
            _ => {}
        }
        self.ctx.window.request_redraw();
        false
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui.state.on_window_event(&self.ctx.window, event);
        if response.repaint {
            self.ctx.window.request_redraw();
        }
        response.consumed
    }
}

fn main() {
    let args = Args::parse();
    common::init_logging();

    let mut config = match &args.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    if let Some(scene) = args.scene {
        config.scene = scene;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let (ctx, event_loop) = match pollster::block_on(GraphicsContext::new(
        &config.title,
        config.width,
        config.height,
    )) {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    log::info!("Window created: {}x{}", ctx.size.width, ctx.size.height);

    let mut app = App::new(ctx, &config);
    app.ctx.window.request_redraw();

    let result = event_loop.run(move |event, elwt| {
        // Frames are requested by the driver, not polled
        elwt.set_control_flow(ControlFlow::Wait);

        if let Event::WindowEvent { ref event, .. } = event {
            let consumed = app.handle_window_event(event);

            match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => app.resize(*size),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(key),
                            state,
                            ..
                        },
                    ..
                } if !consumed => {
                    if app.handle_key(*key, *state) {
                        elwt.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Err(e) = app.render() {
                        match recovery(&e) {
                            Recovery::Reconfigure => {
                                log::warn!("Surface {:?}, reconfiguring", e);
                                app.resize(app.ctx.size);
                            }
                            Recovery::Retry => {
                                log::warn!("Render error: {:?}, retrying", e);
                                app.ctx.window.request_redraw();
                            }
                            Recovery::Exit => {
                                log::error!("Render error: {:?}", e);
                                elwt.exit();
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    });

    if let Err(e) = result {
        log::error!("Event loop error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_frame_is_redrawn() {
        assert_eq!(recovery(&wgpu::SurfaceError::Timeout), Recovery::Retry);
        assert_eq!(recovery(&wgpu::SurfaceError::Outdated), Recovery::Reconfigure);
        assert_eq!(recovery(&wgpu::SurfaceError::Lost), Recovery::Reconfigure);
    }

    #[test]
    fn test_out_of_memory_exits() {
        assert_eq!(recovery(&wgpu::SurfaceError::OutOfMemory), Recovery::Exit);
    }
}
