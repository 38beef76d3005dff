// mesh.rs — 单位球网格
// 顶点位置与 UV 满足 position == projection::sphere_point(u, v)，
// 位移由 shader 逐顶点完成，CPU 拾取使用同一拓扑。

use crate::projection::sphere_point;

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// `lat` rows from the south pole (v = 0) to the north pole (v = 1), `lon`
/// columns; the seam column is duplicated so u runs 0..=1 without wrapping.
pub fn build_sphere(lat: usize, lon: usize) -> SphereMesh {
    let lat = lat.max(2);
    let lon = lon.max(3);

    let mut positions = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut uvs = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut indices = Vec::with_capacity(lat * lon * 6);

    for i in 0..=lat {
        let v = i as f32 / lat as f32;
        for j in 0..=lon {
            let u = j as f32 / lon as f32;
            positions.push(sphere_point(u, v).to_array());
            uvs.push([u, v]);
        }
    }

    for i in 0..lat {
        for j in 0..lon {
            let a = (i * (lon + 1) + j) as u32;
            let b = a + (lon + 1) as u32;

            indices.extend_from_slice(&[
                a, b, a + 1,
                b, b + 1, a + 1,
            ]);
        }
    }

    SphereMesh {
        positions,
        uvs,
        indices,
    }
}

impl SphereMesh {
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .zip(&self.uvs)
            .map(|(position, uv)| Vertex {
                position: *position,
                uv: *uv,
            })
            .collect()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_and_index_counts() {
        let mesh = build_sphere(4, 8);
        assert_eq!(mesh.positions.len(), 5 * 9);
        assert_eq!(mesh.uvs.len(), mesh.positions.len());
        assert_eq!(mesh.indices.len(), 4 * 8 * 6);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.positions.len()));
    }

    #[test]
    fn positions_lie_on_unit_sphere_at_their_uv() {
        let mesh = build_sphere(6, 12);
        for (p, uv) in mesh.positions.iter().zip(&mesh.uvs) {
            let expected = sphere_point(uv[0], uv[1]);
            assert_eq!(glam::Vec3::from_array(*p), expected);
            assert!((expected.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn seam_columns_coincide() {
        let mesh = build_sphere(4, 8);
        for row in 0..=4 {
            let first = glam::Vec3::from_array(mesh.positions[row * 9]);
            let last = glam::Vec3::from_array(mesh.positions[row * 9 + 8]);
            assert!(first.distance(last) < 1e-5);
        }
    }

    #[test]
    fn vertex_stride_matches_layout() {
        assert_eq!(Vertex::layout().array_stride, 20);
    }
}
