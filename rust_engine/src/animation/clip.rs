//! 动画片段与姿态生成

use std::sync::Arc;

use super::motion::Motion;
use super::pose::FramePose;
use super::procedural::{self, MotionType};

/// 片段的姿态来源
#[derive(Clone, Debug)]
pub enum ClipKind {
    /// 相位的闭式函数
    Procedural(MotionType),
    /// 关键帧数据（VMD 等）
    Sampled(Arc<Motion>),
}

/// 动画片段
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub id: String,
    pub name: String,
    pub category: String,
    /// 总帧数，至少为 1
    pub frame_count: u32,
    pub kind: ClipKind,
}

impl AnimationClip {
    pub fn procedural(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        frame_count: u32,
        motion_type: MotionType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            frame_count: frame_count.max(1),
            kind: ClipKind::Procedural(motion_type),
        }
    }

    /// 采样片段的帧数 = 最后一个关键帧 + 1
    pub fn sampled(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        motion: Motion,
    ) -> Self {
        let frame_count = motion.duration().saturating_add(1);
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            frame_count,
            kind: ClipKind::Sampled(Arc::new(motion)),
        }
    }

    pub fn is_procedural(&self) -> bool {
        matches!(self.kind, ClipKind::Procedural(_))
    }
}

/// 按帧生成姿态
pub trait PoseGenerator {
    fn frame_count(&self) -> u32;

    /// `frame_index` 先对 `frame_count` 取模
    fn generate_pose(&self, frame_index: u32) -> FramePose;
}

impl PoseGenerator for AnimationClip {
    fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn generate_pose(&self, frame_index: u32) -> FramePose {
        let frame_count = self.frame_count.max(1);
        let frame = frame_index % frame_count;
        match &self.kind {
            ClipKind::Procedural(motion_type) => {
                procedural::generate(*motion_type, frame, frame_count)
            }
            ClipKind::Sampled(motion) => motion.sample(frame),
        }
    }
}

pub fn generate_pose(clip: &AnimationClip, frame_index: u32) -> FramePose {
    clip.generate_pose(frame_index)
}
