//! 刚体变换（平移 + 旋转 + 统一缩放）

use glam::{Mat4, Quat, Vec3};

use super::normalize_quat;

/// 变换数据
///
/// 只支持统一缩放，不支持非均匀缩放。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: 1.0,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: f32) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.translation,
        )
    }

    /// 变换一个点：先缩放旋转，再平移
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (point * self.scale)
    }
}

/// 由父级世界变换和子级局部位姿计算子级世界变换
///
/// 先旋转后平移：`t = parent.t + parent.r * (parent.s * p)`，`r = parent.r * q`。
pub fn compose_transform(
    parent: &Transform,
    local_position: Vec3,
    local_rotation: Quat,
) -> Transform {
    Transform {
        translation: parent.transform_point(local_position),
        rotation: normalize_quat(parent.rotation * local_rotation),
        scale: parent.scale,
    }
}
