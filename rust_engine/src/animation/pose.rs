//! 帧姿态与姿态接收端

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::LookupError;

/// 单根骨骼的动画位姿（平移相对初始偏移）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonePose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// 一帧的骨骼位姿和 Morph 权重，每次 tick 生成，不保留
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePose {
    pub bones: HashMap<String, BonePose>,
    pub morphs: HashMap<String, f32>,
}

impl FramePose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bone(&mut self, name: &str, position: Vec3, rotation: Quat) {
        self.bones.insert(name.to_string(), BonePose { position, rotation });
    }

    pub fn set_morph(&mut self, name: &str, weight: f32) {
        self.morphs.insert(name.to_string(), weight);
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty() && self.morphs.is_empty()
    }

    /// 写入接收端，接收端没有的名称跳过，返回实际写入的条目数
    pub fn apply_to<S: PoseSink + ?Sized>(&self, sink: &mut S) -> usize {
        let mut applied = 0;
        for (name, pose) in &self.bones {
            match sink.set_bone_pose(name, Some(pose.position), Some(pose.rotation)) {
                Ok(()) => applied += 1,
                Err(e) => log::trace!("跳过骨骼位姿: {}", e),
            }
        }
        for (name, weight) in &self.morphs {
            match sink.set_morph_weight(name, *weight) {
                Ok(()) => applied += 1,
                Err(e) => log::trace!("跳过 Morph 权重: {}", e),
            }
        }
        applied
    }
}

/// 姿态接收端（播放控制器通过它驱动模型实例）
pub trait PoseSink {
    /// 设置骨骼动画位姿，None 的分量保持不变
    fn set_bone_pose(
        &mut self,
        name: &str,
        position: Option<Vec3>,
        rotation: Option<Quat>,
    ) -> Result<(), LookupError>;

    /// 设置 Morph 权重（限制在 [0, 1]）
    fn set_morph_weight(&mut self, name: &str, weight: f32) -> Result<(), LookupError>;
}
