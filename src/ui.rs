// ui.rs — 菜单栏、状态栏与热点叠加层

use parallax_panorama::camera::Camera;
use parallax_panorama::controls::{Control, ViewerState};
use parallax_panorama::hotspot::{HotspotKind, HotspotSet};
use parallax_panorama::manifest::Manifest;
use winit::window::{Fullscreen, Window};

/// Requests collected while drawing one frame; applied by the event loop.
#[derive(Debug, Default)]
pub struct UiActions {
    pub controls: Vec<Control>,
    pub switch_scene: Option<String>,
    pub exit: bool,
}

/// An info hotspot whose popup is open.
#[derive(Debug, Clone)]
pub struct InfoPopup {
    pub title: String,
    pub content: String,
}

pub struct UiFrame<'a> {
    pub viewer: &'a mut ViewerState,
    pub manifest: &'a Manifest,
    pub scene_title: Option<&'a str>,
    pub current_scene: Option<&'a str>,
    pub hotspots: Option<&'a HotspotSet>,
    pub camera: Camera,
    pub popup: &'a mut Option<InfoPopup>,
    pub is_loading: bool,
    pub fps: f32,
    pub show_fps: &'a mut bool,
    pub status: Option<&'a str>,
}

pub fn draw_ui(ctx: &egui::Context, frame: UiFrame<'_>, window: &Window) -> UiActions {
    let mut actions = UiActions::default();
    let UiFrame {
        viewer,
        manifest,
        scene_title,
        current_scene,
        hotspots,
        camera,
        popup,
        is_loading,
        fps,
        show_fps,
        status,
    } = frame;

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Export hotspots…").clicked() {
                    actions.controls.push(Control::ExportHotspots);
                    ui.close_menu();
                }
                if ui.button("Exit").clicked() {
                    actions.exit = true;
                }
            });

            ui.menu_button("Scenes", |ui| {
                for (name, entry) in &manifest.scenes {
                    let selected = current_scene == Some(name.as_str());
                    if ui.selectable_label(selected, entry.title.as_str()).clicked() {
                        actions.switch_scene = Some(name.clone());
                        ui.close_menu();
                    }
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset view").clicked() {
                    viewer.reset_view();
                    ui.close_menu();
                }

                if ui
                    .button(if viewer.is_fullscreen {
                        "Exit fullscreen"
                    } else {
                        "Fullscreen"
                    })
                    .clicked()
                {
                    toggle_fullscreen(viewer, window);
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button("Input sensitivity", |ui| {
                    ui.add(egui::Slider::new(&mut viewer.sensitivity_scale, 0.1..=5.0).text("×"));
                    if ui.button("Reset to 1.0").clicked() {
                        viewer.sensitivity_scale = 1.0;
                    }
                });

                ui.separator();
                ui.checkbox(show_fps, "Show FPS");
            });

            ui.menu_button("Depth", |ui| {
                let mut flip = viewer.depth.flip;
                if ui.checkbox(&mut flip, "Flip depth (F)").clicked() {
                    actions.controls.push(Control::ToggleFlip);
                }
                let mut debug = viewer.debug_depth;
                if ui.checkbox(&mut debug, "Show depth map (G)").clicked() {
                    actions.controls.push(Control::ToggleDebugDepth);
                }
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(format!("Scale {:.2}", viewer.depth.scale));
                    if ui.button("−").clicked() {
                        actions.controls.push(Control::DecreaseScale);
                    }
                    if ui.button("+").clicked() {
                        actions.controls.push(Control::IncreaseScale);
                    }
                });
                ui.horizontal(|ui| {
                    ui.label(format!("Exposure {:.2}", viewer.exposure));
                    if ui.button("−").clicked() {
                        actions.controls.push(Control::DecreaseExposure);
                    }
                    if ui.button("+").clicked() {
                        actions.controls.push(Control::IncreaseExposure);
                    }
                });
            });

            let mut authoring = viewer.authoring;
            if ui.checkbox(&mut authoring, "Authoring (Tab)").clicked() {
                actions.controls.push(Control::ToggleAuthoring);
            }
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.label(egui::RichText::new("Loading scene…").color(egui::Color32::YELLOW));
                ui.label("|");
            }
            if let Some(title) = scene_title {
                ui.label(title);
                ui.label("|");
            }
            if viewer.authoring {
                ui.label(egui::RichText::new("AUTHORING").color(egui::Color32::LIGHT_RED));
                ui.label("|");
            }
            ui.label(format!(
                "Depth ×{:.2} bias {:.2}{}",
                viewer.depth.scale,
                viewer.depth.bias,
                if viewer.depth.flip { " flipped" } else { "" }
            ));
            ui.label("|");
            ui.label(format!("Exposure {:.2}", viewer.exposure));
            ui.label("|");
            ui.label(format!("FOV: {:.1}°", viewer.fov));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", viewer.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", viewer.pitch));

            if *show_fps {
                ui.label("|");
                ui.label(egui::RichText::new(format!("FPS: {:.1}", fps)).color(egui::Color32::GREEN));
            }
            if let Some(status) = status {
                ui.label("|");
                ui.label(status);
            }
        });
    });

    if let Some(hotspots) = hotspots {
        draw_hotspots(ctx, hotspots, &camera, viewer.authoring, popup, &mut actions);
    }

    if let Some(open_popup) = popup.clone() {
        let mut open = true;
        egui::Window::new(open_popup.title.as_str())
            .id(egui::Id::new("hotspot_popup"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(open_popup.content.as_str());
            });
        if !open {
            *popup = None;
        }
    }

    actions
}

fn draw_hotspots(
    ctx: &egui::Context,
    hotspots: &HotspotSet,
    camera: &Camera,
    authoring: bool,
    popup: &mut Option<InfoPopup>,
    actions: &mut UiActions,
) {
    // 相机为物理像素，egui 为逻辑点
    let pixels_per_point = ctx.pixels_per_point();

    for (index, hotspot) in hotspots.iter().enumerate() {
        let Some(pixel) = camera.world_to_screen(hotspot.position()) else {
            continue;
        };
        let pos = egui::pos2(pixel.x / pixels_per_point, pixel.y / pixels_per_point);

        let label = match &hotspot.kind {
            HotspotKind::Link { .. } => format!("➜ {}", hotspot.title),
            HotspotKind::Info { .. } => format!("ℹ {}", hotspot.title),
        };

        let response = egui::Area::new(egui::Id::new(("hotspot", index)))
            .fixed_pos(pos)
            .pivot(egui::Align2::CENTER_CENTER)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let text = if authoring {
                    format!("{} [{}]", label, hotspot.id)
                } else {
                    label
                };
                ui.button(text)
            })
            .inner;

        if response.clicked() && !authoring {
            match &hotspot.kind {
                HotspotKind::Link { target } => actions.switch_scene = Some(target.clone()),
                HotspotKind::Info { content } => {
                    *popup = Some(InfoPopup {
                        title: hotspot.title.clone(),
                        content: content.clone(),
                    })
                }
            }
        }
    }
}

pub fn toggle_fullscreen(viewer: &mut ViewerState, window: &Window) {
    viewer.is_fullscreen = !viewer.is_fullscreen;
    if viewer.is_fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}
