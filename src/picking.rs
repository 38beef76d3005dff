// picking.rs — 编辑模式下的射线拾取
//
// 射线与“位移后”的网格求交（即用户看到的表面），命中点的 UV 由重心坐标插值，
// 深度直接从 CPU 深度图读取，而不是由到原点的距离反推。

use crate::depth_map::DepthMap;
use crate::displacement::displace_mesh;
use crate::mesh::SphereMesh;
use crate::projection::{DepthParams, SurfaceUv};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub distance: f32,
    pub point: Vec3,
    pub u: f32,
    pub v: f32,
}

/// Returns `(t, b1, b2)` with barycentric weights of `b` and `c`.
pub fn ray_intersect_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<(f32, f32, f32)> {
    let eps = 1.0e-7;
    let edge1 = b - a;
    let edge2 = c - a;
    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < eps {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = origin - a;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(qvec) * inv_det;
    if t > eps {
        Some((t, u, v))
    } else {
        None
    }
}

/// CPU copy of the rendered surface, rebuilt when the depth map or parameters change.
#[derive(Debug, Clone)]
pub struct DisplacedSurface {
    positions: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,
    triangles: Vec<[usize; 3]>,
}

impl DisplacedSurface {
    pub fn build(mesh: &SphereMesh, depth: &DepthMap, params: &DepthParams) -> Self {
        Self {
            positions: displace_mesh(mesh, depth, params),
            uvs: mesh.uvs.clone(),
            triangles: mesh.triangles().collect(),
        }
    }

    pub fn update(&mut self, mesh: &SphereMesh, depth: &DepthMap, params: &DepthParams) {
        self.positions = displace_mesh(mesh, depth, params);
    }

    /// Nearest hit along the ray, if any.
    pub fn pick(&self, origin: Vec3, dir: Vec3) -> Option<PickHit> {
        let mut best: Option<PickHit> = None;
        for [ia, ib, ic] in &self.triangles {
            let (a, b, c) = (self.positions[*ia], self.positions[*ib], self.positions[*ic]);
            let Some((t, b1, b2)) = ray_intersect_triangle(origin, dir, a, b, c) else {
                continue;
            };
            if best.map_or(false, |hit| hit.distance <= t) {
                continue;
            }
            let b0 = 1.0 - b1 - b2;
            let uv = Vec2::from(self.uvs[*ia]) * b0
                + Vec2::from(self.uvs[*ib]) * b1
                + Vec2::from(self.uvs[*ic]) * b2;
            best = Some(PickHit {
                distance: t,
                point: origin + dir * t,
                u: uv.x,
                v: uv.y,
            });
        }
        best
    }
}

/// Surface coordinates for a new hotspot at `hit`, with depth read from the map.
pub fn placement_uv(hit: &PickHit, depth: &DepthMap, params: &DepthParams) -> SurfaceUv {
    let d = depth.sample(hit.u, hit.v, params.seam_fix);
    SurfaceUv::new(hit.u, hit.v, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_sphere;
    use crate::projection::{forward_uv, sphere_point};

    #[test]
    fn triangle_hit_and_miss() {
        let (a, b, c) = (
            Vec3::new(-1.0, -1.0, 2.0),
            Vec3::new(1.0, -1.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        );
        let (t, _, _) = ray_intersect_triangle(Vec3::ZERO, Vec3::Z, a, b, c).unwrap();
        assert!((t - 2.0).abs() < 1e-6);
        assert!(ray_intersect_triangle(Vec3::ZERO, -Vec3::Z, a, b, c).is_none());
        assert!(ray_intersect_triangle(Vec3::ZERO, Vec3::X, a, b, c).is_none());
    }

    #[test]
    fn flat_surface_hit_has_expected_radius_and_uv() {
        let mesh = build_sphere(32, 64);
        let params = DepthParams::default();
        let depth = DepthMap::flat();
        let surface = DisplacedSurface::build(&mesh, &depth, &params);

        let dir = sphere_point(0.3, 0.6);
        let hit = surface.pick(Vec3::ZERO, dir).unwrap();
        let radius = 1.0 + crate::projection::transformed_depth(crate::depth_map::NEUTRAL_DEPTH, &params);
        // 三角形弦面略在球面内侧
        assert!(hit.distance <= radius + 1e-4 && hit.distance > radius * 0.99);
        assert!((hit.u - 0.3).abs() < 0.01 && (hit.v - 0.6).abs() < 0.01);
    }

    #[test]
    fn placement_lands_on_rendered_surface() {
        let mesh = build_sphere(32, 64);
        let params = DepthParams::default();
        let depth = DepthMap::new(4, 2, vec![0.2, 0.2, 0.8, 0.8, 0.2, 0.2, 0.8, 0.8]).unwrap();
        let surface = DisplacedSurface::build(&mesh, &depth, &params);

        // 远离纹素边界的方向，深度在邻域内恒定
        let dir = sphere_point(0.125, 0.7);
        let hit = surface.pick(Vec3::ZERO, dir).unwrap();
        let uv = placement_uv(&hit, &depth, &params);
        assert_eq!(uv.d, 0.2);
        let placed = forward_uv(uv, &params);
        assert!(placed.distance(hit.point) < 0.05 * placed.length());
    }
}
