//! 线性混合蒙皮（rayon 并行）

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use super::{SkinningInput, SkinningOutput};
use crate::model::Vertex;

/// 计算蒙皮
///
/// 三个输入数组长度必须相同；以最短者为准。
pub fn compute_skinning(input: &SkinningInput) -> SkinningOutput {
    let (positions, normals): (Vec<Vec3>, Vec<Vec3>) = input
        .positions
        .par_iter()
        .zip(input.normals.par_iter())
        .zip(input.vertices.par_iter())
        .map(|((position, normal), vertex)| {
            compute_single_vertex(*position, *normal, vertex, input.bone_matrices)
        })
        .unzip();

    SkinningOutput { positions, normals }
}

/// 计算单个顶点的蒙皮
fn compute_single_vertex(
    position: Vec3,
    normal: Vec3,
    vertex: &Vertex,
    matrices: &[Mat4],
) -> (Vec3, Vec3) {
    let mut pos = Vec3::ZERO;
    let mut norm = Vec3::ZERO;

    for (&bone, &weight) in vertex.skin_indices.iter().zip(&vertex.skin_weights) {
        if weight <= 0.0 {
            continue;
        }
        let m = get_matrix(matrices, bone);
        pos += m.transform_point3(position) * weight;
        norm += m.transform_vector3(normal) * weight;
    }

    (pos, norm.normalize_or_zero())
}

fn get_matrix(matrices: &[Mat4], index: u32) -> Mat4 {
    matrices.get(index as usize).copied().unwrap_or(Mat4::IDENTITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec2};

    fn vertex(indices: [u32; 4], weights: [f32; 4]) -> Vertex {
        Vertex {
            position: Vec3::new(1.0, 0.0, 0.0),
            normal: Vec3::Y,
            uv: Vec2::ZERO,
            skin_indices: indices,
            skin_weights: weights,
            edge_scale: 1.0,
        }
    }

    #[test]
    fn test_identity_matrices_keep_vertices() {
        let vertices = vec![vertex([0, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])];
        let positions = vec![Vec3::new(1.0, 0.0, 0.0)];
        let normals = vec![Vec3::Y];
        let matrices = vec![Mat4::IDENTITY];
        let output = compute_skinning(&SkinningInput {
            positions: &positions,
            normals: &normals,
            vertices: &vertices,
            bone_matrices: &matrices,
        });
        assert_eq!(output.positions, positions);
        assert_eq!(output.normals, normals);
        assert_eq!(output.positions_raw(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_blends_two_bones() {
        let vertices = vec![vertex([0, 1, 0, 0], [0.5, 0.5, 0.0, 0.0])];
        let positions = vec![Vec3::new(1.0, 0.0, 0.0)];
        let normals = vec![Vec3::Y];
        let matrices = vec![
            Mat4::IDENTITY,
            Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
        ];
        let output = compute_skinning(&SkinningInput {
            positions: &positions,
            normals: &normals,
            vertices: &vertices,
            bone_matrices: &matrices,
        });
        assert!((output.positions[0] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_rotates_normal() {
        let vertices = vec![vertex([0, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])];
        let positions = vec![Vec3::new(1.0, 0.0, 0.0)];
        let normals = vec![Vec3::Y];
        let matrices = vec![Mat4::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2))];
        let output = compute_skinning(&SkinningInput {
            positions: &positions,
            normals: &normals,
            vertices: &vertices,
            bone_matrices: &matrices,
        });
        assert!((output.normals[0] - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((output.positions[0] - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    }
}
