// hotspot.rs — 热点模型与重投影

use crate::projection::{forward_uv, DepthParams, SurfaceUv};
use glam::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub enum HotspotKind {
    /// Switches to the named scene when activated.
    Link { target: String },
    Info { content: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// Fixed in space; depth parameters never move it.
    World { position: Vec3 },
    /// Tied to the surface; `resolved` is recomputed whenever depth parameters change.
    /// `authored` keeps the values as read so export can write them back unchanged.
    Uv {
        uv: SurfaceUv,
        authored: [f64; 3],
        resolved: Vec3,
    },
}

impl Anchor {
    pub fn uv(uv: SurfaceUv, params: &DepthParams) -> Self {
        Anchor::Uv {
            uv,
            authored: [uv.u as f64, uv.v as f64, uv.d as f64],
            resolved: forward_uv(uv, params),
        }
    }

    /// A surface anchor from a hotspot file, keeping the exact decimal values.
    pub fn authored(u: f64, v: f64, d: f64, params: &DepthParams) -> Self {
        let uv = SurfaceUv::new(u as f32, v as f32, d as f32);
        Anchor::Uv {
            uv,
            authored: [u, v, d],
            resolved: forward_uv(uv, params),
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Anchor::World { position } => *position,
            Anchor::Uv { resolved, .. } => *resolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: String,
    pub title: String,
    pub kind: HotspotKind,
    pub anchor: Anchor,
}

impl Hotspot {
    pub fn position(&self) -> Vec3 {
        self.anchor.position()
    }

    pub fn reproject(&mut self, params: &DepthParams) {
        if let Anchor::Uv { uv, resolved, .. } = &mut self.anchor {
            *resolved = forward_uv(*uv, params);
        }
    }
}

/// Hotspots of the current scene.
#[derive(Debug, Clone, Default)]
pub struct HotspotSet {
    items: Vec<Hotspot>,
}

impl HotspotSet {
    pub fn new(items: Vec<Hotspot>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hotspot> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Hotspot> {
        self.items.get(index)
    }

    pub fn push(&mut self, hotspot: Hotspot) {
        self.items.push(hotspot);
    }

    /// Drops every hotspot; used on scene change.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Moves every UV-anchored hotspot onto the surface for `params`.
    pub fn reproject_all(&mut self, params: &DepthParams) {
        for h in &mut self.items {
            h.reproject(params);
        }
    }

    /// `hotspot-N` with the smallest N not already taken.
    pub fn next_id(&self) -> String {
        (1..)
            .map(|n| format!("hotspot-{}", n))
            .find(|id| self.items.iter().all(|h| &h.id != id))
            .unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a HotspotSet {
    type Item = &'a Hotspot;
    type IntoIter = std::slice::Iter<'a, Hotspot>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
