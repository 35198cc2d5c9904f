//! 模型数据与解码
//!
//! `Model` 解码后不可变，多个 `ModelInstance` 通过 `Arc<Model>` 共享。

mod instance;
mod loader;
mod material;
pub(crate) mod reader;
#[cfg(test)]
pub(crate) mod test_support;

pub use instance::ModelInstance;
pub use loader::{decode, decode_with_config, load_model, load_pmx, PMX_SIGNATURE};
pub use material::{Material, SphereMode, ToonRef};
pub use reader::{IndexSize, TextEncoding};

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::config::EngineConfig;
use crate::morph::MorphDef;
use crate::skeleton::{BoneDef, BoneHierarchy};
use crate::DecodeError;

/// 三角形（顶点索引）
pub type Face = [u32; 3];

/// 文件头
#[derive(Clone, Debug, PartialEq)]
pub struct ModelHeader {
    pub signature: [u8; 4],
    pub version: f32,
    pub encoding: TextEncoding,
    pub additional_vec4_count: u8,
    pub vertex_index_size: IndexSize,
    pub texture_index_size: IndexSize,
    pub material_index_size: IndexSize,
    pub bone_index_size: IndexSize,
    pub morph_index_size: IndexSize,
    pub rigid_body_index_size: IndexSize,
}

/// 模型名称与说明
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub name_en: String,
    pub comment: String,
    pub comment_en: String,
}

/// 顶点
///
/// 未使用的蒙皮槽位权重为 0；解码完成后权重之和为 1。
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub skin_indices: [u32; 4],
    pub skin_weights: [f32; 4],
    pub edge_scale: f32,
}

/// 解码得到的各数据表，校验前
pub(crate) struct ModelParts {
    pub header: ModelHeader,
    pub info: ModelInfo,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub textures: Vec<String>,
    pub materials: Vec<Material>,
    pub bones: Vec<BoneDef>,
    pub morphs: Vec<MorphDef>,
}

/// 解码后的模型
#[derive(Clone, Debug)]
pub struct Model {
    header: ModelHeader,
    info: ModelInfo,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    textures: Vec<String>,
    materials: Vec<Material>,
    bones: Vec<BoneDef>,
    morphs: Vec<MorphDef>,
    hierarchy: BoneHierarchy,
    morph_name_to_index: HashMap<String, usize>,
}

impl Model {
    /// 校验各表之间的引用并构建骨骼层级
    pub(crate) fn assemble(parts: ModelParts, config: &EngineConfig) -> Result<Self, DecodeError> {
        let ModelParts {
            header,
            info,
            mut vertices,
            faces,
            textures,
            materials,
            bones,
            morphs,
        } = parts;

        validate_faces(&faces, vertices.len())?;
        let hierarchy = BoneHierarchy::build(&bones)?;
        normalize_skin_weights(&mut vertices, bones.len(), config.skin_weight_tolerance)?;
        validate_morphs(&morphs, vertices.len())?;

        let mut morph_name_to_index = HashMap::with_capacity(morphs.len());
        for (i, morph) in morphs.iter().enumerate() {
            morph_name_to_index.entry(morph.name.clone()).or_insert(i);
        }

        Ok(Self {
            header,
            info,
            vertices,
            faces,
            textures,
            materials,
            bones,
            morphs,
            hierarchy,
            morph_name_to_index,
        })
    }

    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn textures(&self) -> &[String] {
        &self.textures
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn bones(&self) -> &[BoneDef] {
        &self.bones
    }

    pub fn morphs(&self) -> &[MorphDef] {
        &self.morphs
    }

    pub fn hierarchy(&self) -> &BoneHierarchy {
        &self.hierarchy
    }

    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.hierarchy.find_bone_by_name(name)
    }

    pub fn find_morph_by_name(&self, name: &str) -> Option<usize> {
        self.morph_name_to_index.get(name).copied()
    }

    /// 扁平化的三角形索引（渲染用）
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flat_map(|f| f.iter().copied()).collect()
    }
}

fn validate_faces(faces: &[Face], vertex_count: usize) -> Result<(), DecodeError> {
    for face in faces {
        for &index in face {
            if index as usize >= vertex_count {
                return Err(DecodeError::IndexOutOfRange {
                    kind: "face vertex",
                    index: index as i64,
                    len: vertex_count,
                });
            }
        }
    }
    Ok(())
}

/// 检查蒙皮骨骼索引，并把权重归一化
fn normalize_skin_weights(
    vertices: &mut [Vertex],
    bone_count: usize,
    tolerance: f32,
) -> Result<(), DecodeError> {
    for (i, vertex) in vertices.iter_mut().enumerate() {
        for slot in 0..4 {
            let weight = vertex.skin_weights[slot];
            if !weight.is_finite() || weight < 0.0 {
                return Err(DecodeError::InvalidSkinWeights { vertex: i, sum: weight });
            }
            if weight > 0.0 && vertex.skin_indices[slot] as usize >= bone_count {
                return Err(DecodeError::IndexOutOfRange {
                    kind: "skin bone",
                    index: vertex.skin_indices[slot] as i64,
                    len: bone_count,
                });
            }
        }

        let sum: f32 = vertex.skin_weights.iter().sum();
        if (sum - 1.0).abs() > tolerance {
            return Err(DecodeError::InvalidSkinWeights { vertex: i, sum });
        }
        for weight in &mut vertex.skin_weights {
            *weight /= sum;
        }
    }
    Ok(())
}

fn validate_morphs(morphs: &[MorphDef], vertex_count: usize) -> Result<(), DecodeError> {
    for morph in morphs {
        for offset in &morph.vertex_offsets {
            if offset.vertex_index as usize >= vertex_count {
                return Err(DecodeError::IndexOutOfRange {
                    kind: "morph vertex",
                    index: offset.vertex_index as i64,
                    len: vertex_count,
                });
            }
        }
        for entry in &morph.group_entries {
            if entry.morph_index as usize >= morphs.len() {
                return Err(DecodeError::IndexOutOfRange {
                    kind: "group morph",
                    index: entry.morph_index as i64,
                    len: morphs.len(),
                });
            }
        }
    }
    Ok(())
}
