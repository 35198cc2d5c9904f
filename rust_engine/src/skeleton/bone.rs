//! 骨骼定义与骨骼节点

use glam::{Quat, Vec3};

/// 骨骼标志位（PMX u16）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoneFlags(pub u16);

impl BoneFlags {
    pub const TAIL_IS_BONE: u16 = 0x0001;
    pub const ROTATABLE: u16 = 0x0002;
    pub const MOVABLE: u16 = 0x0004;
    pub const VISIBLE: u16 = 0x0008;
    pub const ENABLED: u16 = 0x0010;
    pub const IK: u16 = 0x0020;
    pub const INHERIT_ROTATION: u16 = 0x0100;
    pub const INHERIT_TRANSLATION: u16 = 0x0200;
    pub const FIXED_AXIS: u16 = 0x0400;
    pub const LOCAL_AXIS: u16 = 0x0800;
    pub const PHYSICS_AFTER_DEFORM: u16 = 0x1000;
    pub const EXTERNAL_PARENT: u16 = 0x2000;

    pub fn contains(self, bit: u16) -> bool {
        (self.0 & bit) != 0
    }

    pub fn is_rotatable(self) -> bool {
        self.contains(Self::ROTATABLE)
    }

    pub fn is_movable(self) -> bool {
        self.contains(Self::MOVABLE)
    }

    pub fn is_ik(self) -> bool {
        self.contains(Self::IK)
    }
}

/// IK 链接信息
#[derive(Clone, Debug, PartialEq)]
pub struct IkLink {
    pub bone_index: i32,
    /// 角度限制（弧度，文件坐标系）
    pub limits: Option<(Vec3, Vec3)>,
}

/// IK 配置（仅保存，不求解）
#[derive(Clone, Debug, PartialEq)]
pub struct IkConfig {
    pub target_bone: i32,
    pub iterations: u32,
    pub limit_angle: f32,
    pub links: Vec<IkLink>,
}

/// 骨骼定义（解码结果，不可变）
#[derive(Clone, Debug, PartialEq)]
pub struct BoneDef {
    pub name: String,
    pub name_en: String,
    /// 初始位置（模型空间）
    pub rest_position: Vec3,
    /// 父骨骼索引，-1 为根
    pub parent_index: i32,
    pub transform_level: i32,
    pub flags: BoneFlags,
    pub ik: Option<IkConfig>,
}

impl BoneDef {
    pub fn new(name: impl Into<String>, rest_position: Vec3, parent_index: i32) -> Self {
        Self {
            name: name.into(),
            name_en: String::new(),
            rest_position,
            parent_index,
            transform_level: 0,
            flags: BoneFlags(BoneFlags::ROTATABLE | BoneFlags::VISIBLE | BoneFlags::ENABLED),
            ik: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }
}

/// 骨骼节点（每个实例独占）
///
/// 本地位置 = 相对父骨骼的初始偏移 + 动画平移。
#[derive(Clone, Debug, PartialEq)]
pub struct BoneNode {
    pub bone_index: usize,
    pub rest_offset: Vec3,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl BoneNode {
    pub fn new(bone_index: usize, rest_offset: Vec3) -> Self {
        Self {
            bone_index,
            rest_offset,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn local_position(&self) -> Vec3 {
        self.rest_offset + self.translation
    }

    pub fn local_rotation(&self) -> Quat {
        self.rotation
    }

    /// 设置动画位姿，None 的分量保持不变
    pub fn set_pose(&mut self, translation: Option<Vec3>, rotation: Option<Quat>) {
        if let Some(t) = translation {
            self.translation = t;
        }
        if let Some(r) = rotation {
            self.rotation = crate::math::normalize_quat(r);
        }
    }

    /// 重置动画状态
    pub fn reset_animation(&mut self) {
        self.translation = Vec3::ZERO;
        self.rotation = Quat::IDENTITY;
    }
}
