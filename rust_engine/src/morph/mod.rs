//! Morph 变形系统

mod morph;
mod manager;

pub use morph::MorphDef;
pub use manager::MorphManager;

use glam::Vec3;

/// Morph 类型（PMX 类型标签）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphType {
    Group,
    Vertex,
    Bone,
    Uv,
    AdditionalUv1,
    AdditionalUv2,
    AdditionalUv3,
    AdditionalUv4,
    Material,
    Flip,
    Impulse,
}

impl MorphType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MorphType::Group),
            1 => Some(MorphType::Vertex),
            2 => Some(MorphType::Bone),
            3 => Some(MorphType::Uv),
            4 => Some(MorphType::AdditionalUv1),
            5 => Some(MorphType::AdditionalUv2),
            6 => Some(MorphType::AdditionalUv3),
            7 => Some(MorphType::AdditionalUv4),
            8 => Some(MorphType::Material),
            9 => Some(MorphType::Flip),
            10 => Some(MorphType::Impulse),
            _ => None,
        }
    }
}

/// Morph 分类（编辑器面板）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MorphCategory {
    Base,
    Eyebrow,
    Eye,
    Lip,
    Other,
}

impl MorphCategory {
    pub fn from_panel(value: u8) -> Option<Self> {
        match value {
            0 => Some(MorphCategory::Base),
            1 => Some(MorphCategory::Eyebrow),
            2 => Some(MorphCategory::Eye),
            3 => Some(MorphCategory::Lip),
            4 => Some(MorphCategory::Other),
            _ => None,
        }
    }
}

/// 顶点 Morph 偏移
#[derive(Clone, Debug, PartialEq)]
pub struct VertexMorphOffset {
    pub vertex_index: u32,
    pub offset: Vec3,
}

/// 组 Morph 成员
#[derive(Clone, Debug, PartialEq)]
pub struct GroupMorphEntry {
    pub morph_index: u32,
    pub influence: f32,
}
