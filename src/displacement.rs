// displacement.rs — 顶点位移（CPU 版本）
//
// 与 shader_displace.wgsl 的 vs_main 逐行对应。修改任一边时另一边必须同步，
// tests 中会在 UV 网格上与 projection::forward 交叉验证。

use crate::depth_map::DepthMap;
use crate::mesh::SphereMesh;
use crate::projection::{transformed_depth, DepthParams};
use glam::{Mat4, Vec3};

/// Texture lookups stay this far from the [0, 1] edges (poles and seam).
pub const UV_EPSILON: f32 = 0.001;

/// Surface UV -> texture coordinate: seam offset, epsilon clamp, rows top-down.
pub fn texture_coords(u: f32, v: f32, seam_fix: f32) -> [f32; 2] {
    let su = (u + seam_fix).clamp(UV_EPSILON, 1.0 - UV_EPSILON);
    let sv = v.clamp(UV_EPSILON, 1.0 - UV_EPSILON);
    [su, 1.0 - sv]
}

/// One vertex of the displacement program.
pub fn displace_vertex(position: Vec3, uv: [f32; 2], depth: &DepthMap, params: &DepthParams) -> Vec3 {
    let sampled = depth.sample(uv[0], uv[1], params.seam_fix);
    let d = transformed_depth(sampled, params);
    let direction = position.normalize_or_zero();
    position + direction * d
}

/// Displaced positions for every vertex of `mesh`, index-aligned with it.
pub fn displace_mesh(mesh: &SphereMesh, depth: &DepthMap, params: &DepthParams) -> Vec<Vec3> {
    mesh.positions
        .iter()
        .zip(&mesh.uvs)
        .map(|(p, uv)| displace_vertex(Vec3::from_array(*p), *uv, depth, params))
        .collect()
}

/// Uniform block of `shader_displace.wgsl` (group 0, binding 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DisplacementUniform {
    pub view_proj: [[f32; 4]; 4],
    pub depth_scale: f32,
    pub depth_bias: f32,
    pub depth_flip: u32,
    pub seam_fix: f32,
    pub exposure: f32,
    pub debug_depth: u32,
    pad0: f32,
    pad1: f32,
}

impl DisplacementUniform {
    pub fn new(view_proj: Mat4, params: &DepthParams, exposure: f32, debug_depth: bool) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            depth_scale: params.scale,
            depth_bias: params.bias,
            depth_flip: params.flip as u32,
            seam_fix: params.seam_fix,
            exposure,
            debug_depth: debug_depth as u32,
            pad0: 0.0,
            pad1: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_sphere;
    use crate::projection::forward;

    fn noisy_depth(width: u32, height: u32) -> DepthMap {
        let samples = (0..width * height)
            .map(|i| ((i * 37 + 11) % 101) as f32 / 100.0)
            .collect();
        DepthMap::new(width, height, samples).unwrap()
    }

    fn check_against_forward(params: DepthParams) {
        let mesh = build_sphere(32, 64);
        let depth = noisy_depth(64, 32);
        let displaced = displace_mesh(&mesh, &depth, &params);

        for (pos, uv) in displaced.iter().zip(&mesh.uvs) {
            let d = depth.sample(uv[0], uv[1], params.seam_fix);
            let expected = forward(uv[0], uv[1], d, &params);
            assert!(
                pos.distance(expected) < 1e-4,
                "uv {:?}: vertex path {pos}, forward {expected}",
                uv
            );
        }
    }

    #[test]
    fn vertex_path_matches_forward_on_grid() {
        check_against_forward(DepthParams::default());
    }

    #[test]
    fn vertex_path_matches_forward_with_flip_bias_and_seam_fix() {
        check_against_forward(DepthParams {
            scale: 1.5,
            bias: -0.2,
            flip: true,
            seam_fix: 0.003,
        });
    }

    #[test]
    fn texture_coords_clamp_and_flip_rows() {
        assert_eq!(texture_coords(0.0, 0.0, 0.0), [UV_EPSILON, 1.0 - UV_EPSILON]);
        let [tu, tv] = texture_coords(0.9995, 1.0, 0.01);
        assert_eq!(tu, 1.0 - UV_EPSILON);
        assert!((tv - UV_EPSILON).abs() < 1e-7);
    }

    #[test]
    fn flat_depth_gives_sphere_of_constant_radius() {
        let mesh = build_sphere(8, 16);
        let params = DepthParams::default();
        let radius = 1.0 + transformed_depth(crate::depth_map::NEUTRAL_DEPTH, &params);
        for p in displace_mesh(&mesh, &DepthMap::flat(), &params) {
            assert!((p.length() - radius).abs() < 1e-4);
        }
    }

    #[test]
    fn uniform_layout_matches_shader_block() {
        assert_eq!(std::mem::size_of::<DisplacementUniform>(), 96);
        let u = DisplacementUniform::new(Mat4::IDENTITY, &DepthParams { flip: true, ..Default::default() }, 1.0, false);
        assert_eq!(u.depth_flip, 1);
        assert_eq!(u.debug_depth, 0);
    }
}
