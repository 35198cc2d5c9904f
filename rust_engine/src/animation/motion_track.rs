//! 动画轨道
//!
//! 存储单个骨骼或 Morph 的所有关键帧，并提供查找和插值功能

use std::collections::BTreeMap;

use glam::Vec3;

use super::keyframe::{BoneKeyframe, MorphKeyframe};
use super::pose::BonePose;
use crate::math::{lerp, lerp_vec3, slerp};

/// 动画轨道 trait
pub trait MotionTrack {
    type Frame;

    /// 求值指定帧；轨道为空时返回 None
    fn seek(&self, frame_index: u32) -> Option<Self::Frame>;

    /// 获取轨道长度
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取最大帧索引
    fn max_frame_index(&self) -> u32;
}

/// 查找最近的前后关键帧（前一帧包含 frame_index 本身）
fn search_closest<K>(keyframes: &BTreeMap<u32, K>, frame_index: u32) -> (Option<&K>, Option<&K>) {
    let prev = keyframes.range(..=frame_index).next_back().map(|(_, k)| k);
    let next = match frame_index.checked_add(1) {
        Some(after) => keyframes.range(after..).next().map(|(_, k)| k),
        None => None,
    };
    (prev, next)
}

/// 两个关键帧之间的进度
fn progress(prev_frame: u32, next_frame: u32, frame_index: u32) -> f32 {
    let span = (next_frame - prev_frame) as f32;
    (frame_index - prev_frame) as f32 / span
}

/// 骨骼动画轨道
#[derive(Debug, Clone, Default)]
pub struct BoneMotionTrack {
    /// 关键帧映射（帧索引 -> 关键帧）
    pub keyframes: BTreeMap<u32, BoneKeyframe>,
}

impl BoneMotionTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入关键帧，同一帧已存在时替换
    pub fn insert_keyframe(&mut self, keyframe: BoneKeyframe) -> Option<BoneKeyframe> {
        self.keyframes.insert(keyframe.frame, keyframe)
    }
}

impl MotionTrack for BoneMotionTrack {
    type Frame = BonePose;

    fn seek(&self, frame_index: u32) -> Option<BonePose> {
        match search_closest(&self.keyframes, frame_index) {
            (Some(prev), Some(next)) => {
                let t = progress(prev.frame, next.frame, frame_index);
                let a = prev.translation;
                let b = next.translation;
                let position = if next.has_linear_translation() {
                    lerp_vec3(a, b, t)
                } else {
                    Vec3::new(
                        lerp(a.x, b.x, next.interp_x.evaluate(t)),
                        lerp(a.y, b.y, next.interp_y.evaluate(t)),
                        lerp(a.z, b.z, next.interp_z.evaluate(t)),
                    )
                };
                let rotation_t = next.interp_rotation.evaluate(t);
                let rotation = slerp(prev.rotation, next.rotation, rotation_t);
                Some(BonePose { position, rotation })
            }
            // 最后一帧之后保持末帧，第一帧之前保持首帧
            (Some(edge), None) | (None, Some(edge)) => Some(BonePose {
                position: edge.translation,
                rotation: edge.rotation,
            }),
            (None, None) => None,
        }
    }

    fn len(&self) -> usize {
        self.keyframes.len()
    }

    fn max_frame_index(&self) -> u32 {
        self.keyframes.keys().next_back().copied().unwrap_or(0)
    }
}

/// Morph 动画轨道
#[derive(Debug, Clone, Default)]
pub struct MorphMotionTrack {
    pub keyframes: BTreeMap<u32, MorphKeyframe>,
}

impl MorphMotionTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_keyframe(&mut self, keyframe: MorphKeyframe) -> Option<MorphKeyframe> {
        self.keyframes.insert(keyframe.frame, keyframe)
    }
}

impl MotionTrack for MorphMotionTrack {
    type Frame = f32;

    fn seek(&self, frame_index: u32) -> Option<f32> {
        match search_closest(&self.keyframes, frame_index) {
            (Some(prev), Some(next)) => {
                let t = progress(prev.frame, next.frame, frame_index);
                Some(lerp(prev.weight, next.weight, t))
            }
            (Some(edge), None) | (None, Some(edge)) => Some(edge.weight),
            (None, None) => None,
        }
    }

    fn len(&self) -> usize {
        self.keyframes.len()
    }

    fn max_frame_index(&self) -> u32 {
        self.keyframes.keys().next_back().copied().unwrap_or(0)
    }
}
