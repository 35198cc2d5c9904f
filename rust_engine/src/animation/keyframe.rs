//! 动画关键帧

use glam::{Quat, Vec3};

use super::BezierCurve;

/// 骨骼关键帧
///
/// 插值曲线描述从上一关键帧到本关键帧的过渡。
#[derive(Clone, Debug, PartialEq)]
pub struct BoneKeyframe {
    pub frame: u32,
    pub translation: Vec3,
    pub rotation: Quat,
    pub interp_x: BezierCurve,
    pub interp_y: BezierCurve,
    pub interp_z: BezierCurve,
    pub interp_rotation: BezierCurve,
}

impl BoneKeyframe {
    pub fn new(frame: u32) -> Self {
        Self {
            frame,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            interp_x: BezierCurve::linear(),
            interp_y: BezierCurve::linear(),
            interp_z: BezierCurve::linear(),
            interp_rotation: BezierCurve::linear(),
        }
    }

    pub fn with_pose(frame: u32, translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            ..Self::new(frame)
        }
    }

    /// 三个平移轴都是直线插值
    pub fn has_linear_translation(&self) -> bool {
        self.interp_x.is_linear() && self.interp_y.is_linear() && self.interp_z.is_linear()
    }
}

/// Morph 关键帧
#[derive(Clone, Debug, PartialEq)]
pub struct MorphKeyframe {
    pub frame: u32,
    pub weight: f32,
}

impl MorphKeyframe {
    pub fn new(frame: u32, weight: f32) -> Self {
        Self { frame, weight }
    }
}
