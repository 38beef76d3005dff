// main.rs — 事件循环：场景加载、输入、热点编辑与渲染

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

mod renderer;
mod ui;

use clap::Parser;
use parallax_panorama::camera::Camera;
use parallax_panorama::config::Config;
use parallax_panorama::controls::{Control, ViewerState};
use parallax_panorama::displacement::DisplacementUniform;
use parallax_panorama::export::{export_json, write_export};
use parallax_panorama::manifest::Manifest;
use parallax_panorama::mesh::{build_sphere, SphereMesh};
use parallax_panorama::scene::{LoadOutcome, Scene, SceneLoader};
use renderer::Renderer;
use ui::{draw_ui, InfoPopup, UiActions, UiFrame};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use glam::{Vec2, Vec3};
use std::sync::Arc;
use std::time::Instant;

const APP_TITLE: &str = "Parallax Panorama";
/// 按下与抬起之间移动不超过该距离视为点击
const CLICK_SLOP_PX: f64 = 4.0;

fn fatal(message: &str) -> ! {
    log::error!("{}", message);
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(APP_TITLE)
        .set_description(message)
        .show();
    std::process::exit(1);
}

fn camera_for(viewer: &ViewerState, window: &Window) -> Camera {
    let size = window.inner_size();
    Camera {
        yaw_deg: viewer.yaw,
        pitch_deg: viewer.pitch,
        fov_deg: viewer.fov,
        width: size.width as f32,
        height: size.height as f32,
    }
}

/// The event loop's mutable world, apart from the renderer.
struct App {
    viewer: ViewerState,
    loader: SceneLoader,
    scene: Option<Scene>,
    mesh: SphereMesh,
    popup: Option<InfoPopup>,
    status: Option<String>,
}

impl App {
    fn apply_load(&mut self, outcome: LoadOutcome, renderer: &mut Renderer, window: &Window) {
        let LoadOutcome { ticket, name, result } = outcome;
        let assets = match result {
            Ok(assets) => assets,
            Err(e) => {
                let message = format!("failed to load scene `{}`: {}", name, e);
                if self.loader.is_stale(ticket) {
                    log::warn!("{} (superseded)", message);
                    return;
                }
                if self.scene.is_none() && !self.loader.is_loading() {
                    fatal(&message);
                }
                log::error!("{}", message);
                self.status = Some(message);
                return;
            }
        };

        if !self.loader.accept(ticket) {
            return;
        }

        // 旧场景（含热点）整体丢弃，GPU 资源在上传新场景前释放
        self.popup = None;
        self.scene = None;
        let (scene, color) = Scene::from_assets(assets, &self.mesh, &self.viewer.depth);
        renderer.upload_scene(color, &scene.depth);
        window.set_title(&format!("{} — {}", scene.title, APP_TITLE));
        self.status = None;
        self.scene = Some(scene);
    }

    fn apply_control(&mut self, control: Control, window: &Window) {
        let effect = self.viewer.apply(control);
        if effect.reproject {
            if let Some(scene) = self.scene.as_mut() {
                scene.reproject(&self.mesh, &self.viewer.depth);
            }
        }
        if effect.export {
            self.export_hotspots(window);
        }
    }

    fn export_hotspots(&mut self, window: &Window) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        match export_json(&scene.hotspots, &self.viewer.depth) {
            Ok(json) => log::info!("hotspots of `{}`:\n{}", scene.name, json),
            Err(e) => log::error!("hotspot export failed: {}", e),
        }

        let picked = rfd::FileDialog::new()
            .set_title("Export hotspots")
            .set_file_name("hotspots.json")
            .add_filter("JSON", &["json"])
            .set_parent(window)
            .save_file();
        if let Some(path) = picked {
            match write_export(&path, &scene.hotspots, &self.viewer.depth) {
                Ok(()) => self.status = Some(format!("exported to {}", path.display())),
                Err(e) => {
                    log::error!("hotspot export failed: {}", e);
                    self.status = Some(format!("export failed: {}", e));
                }
            }
        }
    }

    fn switch_scene(&mut self, name: &str) {
        if self.scene.as_ref().map(|s| s.name.as_str()) == Some(name) {
            return;
        }
        if let Err(e) = self.loader.request(name) {
            log::error!("{}", e);
            self.status = Some(e.to_string());
        }
    }

    fn place_hotspot(&mut self, cursor: PhysicalPosition<f64>, window: &Window) {
        let camera = camera_for(&self.viewer, window);
        let dir = camera.screen_ray(Vec2::new(cursor.x as f32, cursor.y as f32));
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        match scene.place_hotspot(Vec3::ZERO, dir, &self.viewer.depth) {
            Some(h) => self.status = Some(format!("placed {}", h.id)),
            None => log::debug!("authoring click missed the surface"),
        }
    }

    fn handle_actions(&mut self, actions: UiActions, window: &Window, control_flow: &mut ControlFlow) {
        for control in actions.controls {
            self.apply_control(control, window);
        }
        if let Some(name) = actions.switch_scene {
            self.switch_scene(&name);
        }
        if actions.exit {
            *control_flow = ControlFlow::Exit;
        }
    }
}

fn control_for_key(key: VirtualKeyCode) -> Option<Control> {
    match key {
        VirtualKeyCode::Tab => Some(Control::ToggleAuthoring),
        VirtualKeyCode::G => Some(Control::ToggleDebugDepth),
        VirtualKeyCode::F => Some(Control::ToggleFlip),
        VirtualKeyCode::RBracket => Some(Control::IncreaseScale),
        VirtualKeyCode::LBracket => Some(Control::DecreaseScale),
        VirtualKeyCode::Period => Some(Control::IncreaseExposure),
        VirtualKeyCode::Comma => Some(Control::DecreaseExposure),
        VirtualKeyCode::X => Some(Control::ExportHotspots),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let manifest = match Manifest::load(&config.manifest) {
        Ok(m) => m,
        Err(e) => fatal(&e.to_string()),
    };
    log::info!(
        "manifest {}: {} scenes, start `{}`",
        config.manifest.display(),
        manifest.scenes.len(),
        manifest.start
    );

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(APP_TITLE)
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => fatal(&format!("failed to create window: {}", e)),
    };

    let mesh = build_sphere(config.mesh_lat, config.mesh_lon);
    let mut renderer = match pollster::block_on(Renderer::new(window.clone(), &mesh)) {
        Ok(r) => r,
        Err(e) => fatal(&e.to_string()),
    };

    let mut viewer = ViewerState::new(config.depth_params(), config.exposure());
    viewer.authoring = config.authoring;

    let mut loader = SceneLoader::new(manifest);
    let start = loader.manifest().start.clone();
    if let Err(e) = loader.request(&start) {
        fatal(&e.to_string());
    }

    let mut app = App {
        viewer,
        loader,
        scene: None,
        mesh,
        popup: None,
        status: None,
    };

    // 交互状态
    let mut mouse_pressed = false;
    let mut cursor_pos = PhysicalPosition::new(0.0, 0.0);
    let mut press_pos: Option<PhysicalPosition<f64>> = None;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;

    // FPS 计算
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;
    let mut show_fps = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        // 检查后台加载完成的场景
        while let Some(outcome) = app.loader.poll() {
            app.apply_load(outcome, &mut renderer, &window);
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                    }

                    // 键盘快捷键
                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::F11) => {
                                    ui::toggle_fullscreen(&mut app.viewer, &window);
                                }
                                Some(key) => {
                                    if let Some(control) = control_for_key(key) {
                                        app.apply_control(control, &window);
                                    }
                                }
                                None => {}
                            }
                        }
                    }

                    // 鼠标交互：拖动旋转，编辑模式下单击放置热点
                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                            if mouse_pressed {
                                press_pos = Some(cursor_pos);
                            } else {
                                last_mouse_pos = None;
                                let is_click = press_pos.take().map_or(false, |p| {
                                    let (dx, dy) = (cursor_pos.x - p.x, cursor_pos.y - p.y);
                                    (dx * dx + dy * dy).sqrt() <= CLICK_SLOP_PX
                                });
                                if is_click && app.viewer.authoring {
                                    app.place_hotspot(cursor_pos, &window);
                                }
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor_pos = position;
                        if mouse_pressed {
                            if let Some(last_pos) = last_mouse_pos {
                                let dx = (position.x - last_pos.x) as f32;
                                let dy = (position.y - last_pos.y) as f32;

                                let width = renderer.size.width as f32;
                                let height = renderer.size.height as f32;

                                if width > 0.0 && height > 0.0 {
                                    let viewer = &mut app.viewer;
                                    let v_f = viewer.fov.to_radians();
                                    let aspect = width / height;
                                    let h_f = 2.0 * ((v_f / 2.0).tan() * aspect).atan();

                                    let yaw_per_px_deg = (h_f / width).to_degrees();
                                    let pitch_per_px_deg = (v_f / height).to_degrees();

                                    viewer.yaw -= dx * yaw_per_px_deg * viewer.sensitivity_scale;
                                    viewer.pitch = (viewer.pitch
                                        + dy * pitch_per_px_deg * viewer.sensitivity_scale)
                                        .clamp(-89.9, 89.9);
                                }
                            }
                            last_mouse_pos = Some(position);
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        app.viewer.fov = (app.viewer.fov - scroll * 2.5).clamp(20.0, 120.0);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                // FPS 统计
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                let camera = camera_for(&app.viewer, &window);
                renderer.update_uniforms(&DisplacementUniform::new(
                    camera.view_proj(),
                    &app.viewer.depth,
                    app.viewer.exposure,
                    app.viewer.debug_depth,
                ));

                let mut actions = UiActions::default();
                let is_loading = app.loader.is_loading();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    let frame = UiFrame {
                        viewer: &mut app.viewer,
                        manifest: app.loader.manifest(),
                        scene_title: app.scene.as_ref().map(|s| s.title.as_str()),
                        current_scene: app.scene.as_ref().map(|s| s.name.as_str()),
                        hotspots: app.scene.as_ref().map(|s| &s.hotspots),
                        camera,
                        popup: &mut app.popup,
                        is_loading,
                        fps,
                        show_fps: &mut show_fps,
                        status: app.status.as_deref(),
                    };
                    actions = draw_ui(ctx, frame, &window);
                });

                app.handle_actions(actions, &window, control_flow);

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}
