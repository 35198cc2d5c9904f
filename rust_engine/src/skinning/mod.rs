//! 顶点蒙皮计算

mod skinning;

pub use skinning::compute_skinning;

use glam::{Mat4, Vec3};

use crate::model::Vertex;

/// 蒙皮输入数据
pub struct SkinningInput<'a> {
    /// 顶点位置（已叠加 Morph）
    pub positions: &'a [Vec3],
    /// 原始顶点法线
    pub normals: &'a [Vec3],
    /// 顶点（提供骨骼索引和权重）
    pub vertices: &'a [Vertex],
    /// 骨骼变换矩阵（已乘以逆绑定矩阵）
    pub bone_matrices: &'a [Mat4],
}

/// 蒙皮输出数据
#[derive(Clone, Debug, Default)]
pub struct SkinningOutput {
    /// 变换后的顶点位置
    pub positions: Vec<Vec3>,
    /// 变换后的顶点法线
    pub normals: Vec<Vec3>,
}

impl SkinningOutput {
    /// 展开为 xyz 连续排列的 f32 数组（渲染端上传用）
    pub fn positions_raw(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }

    pub fn normals_raw(&self) -> Vec<f32> {
        self.normals.iter().flat_map(|n| n.to_array()).collect()
    }
}
