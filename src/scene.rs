// scene.rs — 场景加载与当前场景状态
//
// 每次请求在后台线程中加载；线程内颜色与深度两条回退链并行执行，
// 两者都完成后才通过 channel 交回主循环。结果带递增的 ticket，
// 只有比当前已应用场景更新的结果才会被应用（last-write-wins）。

use crate::assets::{self, DepthSource};
use crate::depth_map::DepthMap;
use crate::error::{Result, ViewerError};
use crate::export::parse_hotspot_list;
use crate::hotspot::{Anchor, Hotspot, HotspotKind, HotspotSet};
use crate::manifest::Manifest;
use crate::mesh::SphereMesh;
use crate::picking::{placement_uv, DisplacedSurface};
use crate::projection::DepthParams;
use glam::Vec3;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Everything read from disk for one scene, before any GPU upload.
pub struct SceneAssets {
    pub name: String,
    pub title: String,
    pub color_path: PathBuf,
    pub color: image::RgbaImage,
    pub depth_source: DepthSource,
    pub depth: DepthMap,
    pub hotspot_list: Option<String>,
}

pub fn load_scene_assets(manifest: &Manifest, name: &str) -> Result<SceneAssets> {
    let entry = manifest.scene(name)?;
    let dir = manifest.scene_dir(entry);

    let (color, depth) = thread::scope(|s| {
        let color = s.spawn(|| assets::load_color(&dir));
        let depth = s.spawn(|| assets::load_depth(&dir));
        (join_loader(color), join_loader(depth))
    });
    let (color_path, color) = color??;
    let (depth_source, depth) = depth?;

    let hotspot_list = assets::read_hotspot_list(&dir);

    Ok(SceneAssets {
        name: name.to_string(),
        title: entry.title.clone(),
        color_path,
        color,
        depth_source,
        depth,
        hotspot_list,
    })
}

fn join_loader<T>(handle: thread::ScopedJoinHandle<'_, T>) -> Result<T> {
    handle.join().map_err(|_| {
        ViewerError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "asset loader thread panicked",
        ))
    })
}

pub struct LoadOutcome {
    pub ticket: u64,
    pub name: String,
    pub result: Result<SceneAssets>,
}

pub struct SceneLoader {
    manifest: Arc<Manifest>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    next_ticket: u64,
    applied_ticket: u64,
    in_flight: usize,
}

impl SceneLoader {
    pub fn new(manifest: Manifest) -> Self {
        let (tx, rx) = channel();
        Self {
            manifest: Arc::new(manifest),
            tx,
            rx,
            next_ticket: 0,
            applied_ticket: 0,
            in_flight: 0,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Starts loading `name` in the background. Unknown names fail here and
    /// leave everything as it was.
    pub fn request(&mut self, name: &str) -> Result<u64> {
        self.manifest.scene(name)?;

        self.next_ticket += 1;
        self.in_flight += 1;
        let ticket = self.next_ticket;
        let manifest = Arc::clone(&self.manifest);
        let tx = self.tx.clone();
        let name = name.to_string();

        log::info!("loading scene `{}` (ticket {})", name, ticket);
        thread::spawn(move || {
            let result = load_scene_assets(&manifest, &name);
            if tx.send(LoadOutcome { ticket, name, result }).is_err() {
                log::warn!("scene loader channel closed, dropping ticket {}", ticket);
            }
        });
        Ok(ticket)
    }

    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let outcome = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    pub fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// True when a newer load has already been applied.
    pub fn is_stale(&self, ticket: u64) -> bool {
        ticket <= self.applied_ticket
    }

    /// Marks `ticket` as applied if nothing newer already was.
    pub fn accept(&mut self, ticket: u64) -> bool {
        if self.is_stale(ticket) {
            log::info!(
                "discarding stale scene load (ticket {} <= applied {})",
                ticket,
                self.applied_ticket
            );
            return false;
        }
        self.applied_ticket = ticket;
        true
    }
}

/// The current scene on the CPU side.
pub struct Scene {
    pub name: String,
    pub title: String,
    pub depth: DepthMap,
    pub depth_source: DepthSource,
    pub hotspots: HotspotSet,
    surface: DisplacedSurface,
}

impl Scene {
    /// Splits loaded assets into the CPU scene and the color image for upload.
    pub fn from_assets(
        assets: SceneAssets,
        mesh: &SphereMesh,
        params: &DepthParams,
    ) -> (Self, image::RgbaImage) {
        let hotspots = match assets.hotspot_list.as_deref() {
            Some(text) => match parse_hotspot_list(text, params) {
                Ok(parsed) => {
                    if !parsed.skipped.is_empty() {
                        log::warn!(
                            "scene `{}`: {} hotspot records skipped",
                            assets.name,
                            parsed.skipped.len()
                        );
                    }
                    HotspotSet::new(parsed.hotspots)
                }
                Err(e) => {
                    log::warn!("scene `{}`: hotspot list unreadable: {}", assets.name, e);
                    HotspotSet::default()
                }
            },
            None => HotspotSet::default(),
        };

        let surface = DisplacedSurface::build(mesh, &assets.depth, params);
        log::info!(
            "scene `{}` ready: {} hotspots, depth {:?}",
            assets.name,
            hotspots.len(),
            assets.depth_source
        );

        (
            Self {
                name: assets.name,
                title: assets.title,
                depth: assets.depth,
                depth_source: assets.depth_source,
                hotspots,
                surface,
            },
            assets.color,
        )
    }

    /// Follows a depth-parameter change: hotspots and picking surface.
    pub fn reproject(&mut self, mesh: &SphereMesh, params: &DepthParams) {
        self.hotspots.reproject_all(params);
        self.surface.update(mesh, &self.depth, params);
    }

    /// Authoring placement along a camera ray; returns the new hotspot.
    pub fn place_hotspot(&mut self, origin: Vec3, dir: Vec3, params: &DepthParams) -> Option<&Hotspot> {
        let hit = self.surface.pick(origin, dir)?;
        let uv = placement_uv(&hit, &self.depth, params);
        let hotspot = Hotspot {
            id: self.hotspots.next_id(),
            title: "New hotspot".to_string(),
            kind: HotspotKind::Info {
                content: String::new(),
            },
            anchor: Anchor::uv(uv, params),
        };
        log::info!(
            "placed {} at uv ({:.4}, {:.4}) d {:.4}",
            hotspot.id,
            uv.u,
            uv.v,
            uv.d
        );
        self.hotspots.push(hotspot);
        self.hotspots.iter().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_sphere;

    fn manifest() -> Manifest {
        Manifest::from_json(
            r#"{"start":"lobby","scenes":{"lobby":{"title":"Lobby","path":"lobby"}}}"#,
            PathBuf::from("/nonexistent"),
        )
        .unwrap()
    }

    #[test]
    fn unknown_scene_is_rejected_without_starting_a_load() {
        let mut loader = SceneLoader::new(manifest());
        assert!(matches!(loader.request("hall"), Err(ViewerError::SceneNotFound(_))));
        assert!(!loader.is_loading());
    }

    #[test]
    fn stale_tickets_are_rejected() {
        let mut loader = SceneLoader::new(manifest());
        assert!(loader.accept(2));
        assert!(!loader.accept(1));
        assert!(!loader.accept(2));
        assert!(loader.accept(3));
    }

    #[test]
    fn older_outcomes_are_stale_once_a_newer_one_applies() {
        let mut loader = SceneLoader::new(manifest());
        assert!(!loader.is_stale(1));
        assert!(loader.accept(3));
        assert!(loader.is_stale(2));
        assert!(loader.is_stale(3));
        assert!(!loader.is_stale(4));
    }

    #[test]
    fn missing_color_fails_the_load() {
        let mut loader = SceneLoader::new(manifest());
        let ticket = loader.request("lobby").unwrap();
        let outcome = loader.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.ticket, ticket);
        assert!(matches!(
            outcome.result,
            Err(ViewerError::AssetNotFound { kind: "color image", .. })
        ));
        assert!(!loader.is_loading());
    }

    fn scene_with_flat_depth() -> (Scene, SphereMesh) {
        let mesh = build_sphere(16, 32);
        let assets = SceneAssets {
            name: "lobby".into(),
            title: "Lobby".into(),
            color_path: PathBuf::from("pano.png"),
            color: image::RgbaImage::new(4, 2),
            depth_source: DepthSource::Flat,
            depth: DepthMap::flat(),
            hotspot_list: Some(
                r#"[{"id":"hotspot-1","title":"Door","type":"link","target":"hall","uv":[0.5,0.5],"d":0.6}]"#
                    .into(),
            ),
        };
        let (scene, _) = Scene::from_assets(assets, &mesh, &DepthParams::default());
        (scene, mesh)
    }

    #[test]
    fn placement_creates_uv_anchored_hotspot_with_fresh_id() {
        let (mut scene, _) = scene_with_flat_depth();
        let params = DepthParams::default();
        let placed = scene
            .place_hotspot(Vec3::ZERO, Vec3::new(0.3, 0.1, 0.9).normalize(), &params)
            .unwrap()
            .clone();
        assert_eq!(placed.id, "hotspot-2");
        assert!(matches!(placed.anchor, Anchor::Uv { uv, .. } if uv.d == crate::depth_map::NEUTRAL_DEPTH));
        assert_eq!(scene.hotspots.len(), 2);
    }

    #[test]
    fn reprojection_moves_loaded_hotspots() {
        let (mut scene, mesh) = scene_with_flat_depth();
        let before = scene.hotspots.get(0).unwrap().position();
        scene.reproject(&mesh, &DepthParams { scale: 1.0, ..Default::default() });
        let after = scene.hotspots.get(0).unwrap().position();
        assert!(before.distance(Vec3::new(0.0, 0.0, 2.8)) < 1e-5);
        assert!(after.distance(Vec3::new(0.0, 0.0, 1.6)) < 1e-5);
    }
}
