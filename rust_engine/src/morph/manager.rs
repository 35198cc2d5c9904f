//! Morph 权重管理器

use glam::Vec3;

use super::{MorphDef, MorphType};

/// Morph 管理器（每个实例一份权重）
#[derive(Clone, Debug, Default)]
pub struct MorphManager {
    weights: Vec<f32>,
}

impl MorphManager {
    pub fn new(morph_count: usize) -> Self {
        Self {
            weights: vec![0.0; morph_count],
        }
    }

    /// 获取 Morph 数量
    pub fn morph_count(&self) -> usize {
        self.weights.len()
    }

    pub fn weight(&self, index: usize) -> Option<f32> {
        self.weights.get(index).copied()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// 设置 Morph 权重，限制在 [0, 1]，NaN 视为 0
    pub fn set_morph_weight(&mut self, index: usize, weight: f32) -> bool {
        match self.weights.get_mut(index) {
            Some(slot) => {
                *slot = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
                true
            }
            None => false,
        }
    }

    /// 重置所有 Morph 权重
    pub fn reset_all_weights(&mut self) {
        self.weights.iter_mut().for_each(|w| *w = 0.0);
    }

    /// 把顶点 Morph 和组 Morph 叠加到顶点位置
    pub fn apply_morphs(&self, morphs: &[MorphDef], positions: &mut [Vec3]) {
        for (morph, &weight) in morphs.iter().zip(&self.weights) {
            if weight > 0.0 {
                apply_morph(morphs, morph, weight, positions, 0);
            }
        }
    }
}

/// 组 Morph 嵌套的最大深度（超过视为自引用环）
const MAX_GROUP_DEPTH: usize = 8;

fn apply_morph(
    morphs: &[MorphDef],
    morph: &MorphDef,
    weight: f32,
    positions: &mut [Vec3],
    depth: usize,
) {
    if !morph.deforms_vertices() {
        // 骨骼、UV 和材质 Morph 不参与顶点变形
        return;
    }
    match morph.morph_type {
        MorphType::Vertex => apply_vertex_morph(morph, weight, positions),
        MorphType::Group => {
            if depth >= MAX_GROUP_DEPTH {
                log::trace!("组 Morph 嵌套过深，跳过: {}", morph.name);
                return;
            }
            for entry in &morph.group_entries {
                if let Some(target) = morphs.get(entry.morph_index as usize) {
                    apply_morph(morphs, target, weight * entry.influence, positions, depth + 1);
                }
            }
        }
        _ => {}
    }
}

/// 应用顶点 Morph
fn apply_vertex_morph(morph: &MorphDef, weight: f32, positions: &mut [Vec3]) {
    for offset in &morph.vertex_offsets {
        if let Some(position) = positions.get_mut(offset.vertex_index as usize) {
            *position += offset.offset * weight;
        }
    }
}
