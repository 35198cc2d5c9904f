//! 采样动画数据
//!
//! 按骨骼名 / Morph 名保存关键帧轨道，任意帧都可求值成 `FramePose`。

use std::collections::HashMap;

use super::keyframe::{BoneKeyframe, MorphKeyframe};
use super::motion_track::{BoneMotionTrack, MorphMotionTrack, MotionTrack};
use super::pose::FramePose;

/// 动画数据
#[derive(Debug, Clone, Default)]
pub struct Motion {
    /// 骨骼动画轨道（骨骼名称 -> 轨道）
    pub bone_tracks: HashMap<String, BoneMotionTrack>,
    /// Morph 动画轨道（Morph 名称 -> 轨道）
    pub morph_tracks: HashMap<String, MorphMotionTrack>,
}

impl Motion {
    /// 创建空的 Motion
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取动画持续时间（最大帧索引）
    pub fn duration(&self) -> u32 {
        let bone_max = self
            .bone_tracks
            .values()
            .map(|t| t.max_frame_index())
            .max()
            .unwrap_or(0);

        let morph_max = self
            .morph_tracks
            .values()
            .map(|t| t.max_frame_index())
            .max()
            .unwrap_or(0);

        bone_max.max(morph_max)
    }

    pub fn is_empty(&self) -> bool {
        self.bone_tracks.values().all(|t| t.is_empty())
            && self.morph_tracks.values().all(|t| t.is_empty())
    }

    /// 插入骨骼关键帧
    pub fn insert_bone_keyframe(&mut self, name: &str, keyframe: BoneKeyframe) {
        self.bone_tracks
            .entry(name.to_string())
            .or_default()
            .insert_keyframe(keyframe);
    }

    /// 插入 Morph 关键帧
    pub fn insert_morph_keyframe(&mut self, name: &str, keyframe: MorphKeyframe) {
        self.morph_tracks
            .entry(name.to_string())
            .or_default()
            .insert_keyframe(keyframe);
    }

    /// 求值指定帧
    pub fn sample(&self, frame_index: u32) -> FramePose {
        let mut pose = FramePose::new();
        for (name, track) in &self.bone_tracks {
            if let Some(bone) = track.seek(frame_index) {
                pose.bones.insert(name.clone(), bone);
            }
        }
        for (name, track) in &self.morph_tracks {
            if let Some(weight) = track.seek(frame_index) {
                pose.morphs.insert(name.clone(), weight);
            }
        }
        pose
    }
}
