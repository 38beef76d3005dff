// projection.rs — UV + 深度 与 世界坐标之间的映射
//
// forward 是唯一的公式来源；shader_displace.wgsl 的顶点阶段与 displacement.rs
// 都必须逐步复现这里的顺序 (flip -> bias -> scale)。

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Depth displacement parameters shared by the renderer and hotspot re-projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthParams {
    pub scale: f32,
    pub bias: f32,
    pub flip: bool,
    /// Horizontal UV offset used for texture lookups only.
    pub seam_fix: f32,
}

impl Default for DepthParams {
    fn default() -> Self {
        Self {
            scale: 3.0,
            bias: 0.0,
            flip: false,
            seam_fix: 0.0,
        }
    }
}

/// A point in UV + normalized depth form (depth is pre-transform).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceUv {
    pub u: f32,
    pub v: f32,
    pub d: f32,
}

impl SurfaceUv {
    pub const fn new(u: f32, v: f32, d: f32) -> Self {
        Self { u, v, d }
    }
}

/// flip -> bias -> scale
pub fn transformed_depth(d: f32, params: &DepthParams) -> f32 {
    let d = if params.flip { 1.0 - d } else { d };
    (d + params.bias) * params.scale
}

/// Unit-sphere direction for an equirectangular (u, v).
pub fn sphere_point(u: f32, v: f32) -> Vec3 {
    let phi = (u - 0.5) * TAU;
    let theta = (v - 0.5) * PI;
    Vec3::new(theta.cos() * phi.sin(), theta.sin(), theta.cos() * phi.cos())
}

pub fn forward(u: f32, v: f32, d: f32, params: &DepthParams) -> Vec3 {
    let depth = transformed_depth(d, params);
    sphere_point(u, v) * (1.0 + depth)
}

pub fn forward_uv(uv: SurfaceUv, params: &DepthParams) -> Vec3 {
    forward(uv.u, uv.v, uv.d, params)
}

/// Approximate inverse of [`forward`].
///
/// Depth is reconstructed from the radial distance, not resampled from the
/// depth source. Undoing the transform needs the same parameters `forward`
/// used. The returned depth is always clamped to `[0, 1]`.
pub fn inverse(world: Vec3, params: &DepthParams) -> SurfaceUv {
    // 原点没有方向，退化为 (0.5, 0.5)
    let direction = world.try_normalize().unwrap_or(Vec3::Z);

    let phi = direction.x.atan2(direction.z);
    let theta = direction.y.clamp(-1.0, 1.0).asin();

    let u = phi / TAU + 0.5;
    let v = theta / PI + 0.5;

    let distance = world.length();
    let mut d = (distance - 1.0) / params.scale - params.bias;
    if params.flip {
        d = 1.0 - d;
    }

    SurfaceUv::new(u, v, d.clamp(0.0, 1.0))
}
