//! Morph 定义

use super::{GroupMorphEntry, MorphCategory, MorphType, VertexMorphOffset};

/// Morph 定义（解码结果，不可变）
///
/// 权重属于实例，由 `MorphManager` 保存。
#[derive(Clone, Debug, PartialEq)]
pub struct MorphDef {
    pub name: String,
    pub name_en: String,
    pub category: MorphCategory,
    pub morph_type: MorphType,

    // 顶点 Morph
    pub vertex_offsets: Vec<VertexMorphOffset>,

    // 组 Morph（引用其他 Morph）
    pub group_entries: Vec<GroupMorphEntry>,
}

impl MorphDef {
    pub fn new(name: impl Into<String>, category: MorphCategory, morph_type: MorphType) -> Self {
        Self {
            name: name.into(),
            name_en: String::new(),
            category,
            morph_type,
            vertex_offsets: Vec::new(),
            group_entries: Vec::new(),
        }
    }

    /// 是否会改变顶点位置
    pub fn deforms_vertices(&self) -> bool {
        match self.morph_type {
            MorphType::Vertex => !self.vertex_offsets.is_empty(),
            MorphType::Group => !self.group_entries.is_empty(),
            _ => false,
        }
    }
}
