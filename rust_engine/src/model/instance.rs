//! 模型实例
//!
//! 共享只读的 `Model`，独占骨骼节点和 Morph 权重。世界变换按需解析，
//! 设置骨骼位姿时不会向子骨骼传播。

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use super::Model;
use crate::animation::{BonePose, PoseSink};
use crate::math::Transform;
use crate::morph::MorphManager;
use crate::skeleton::BoneNode;
use crate::skinning::{compute_skinning, SkinningInput, SkinningOutput};
use crate::LookupError;

/// 模型实例
#[derive(Clone, Debug)]
pub struct ModelInstance {
    model: Arc<Model>,
    nodes: Vec<BoneNode>,
    morphs: MorphManager,
    // 实例变换（根骨骼相对于它解析）
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub visible: bool,
}

impl ModelInstance {
    pub fn new(model: Arc<Model>) -> Self {
        let nodes = model.hierarchy().create_nodes();
        let morphs = MorphManager::new(model.morphs().len());
        Self {
            model,
            nodes,
            morphs,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            visible: true,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn bone_nodes(&self) -> &[BoneNode] {
        &self.nodes
    }

    pub fn morph_manager(&self) -> &MorphManager {
        &self.morphs
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation, self.scale)
    }

    fn bone_index(&self, name: &str) -> Result<usize, LookupError> {
        self.model.find_bone_by_name(name).ok_or_else(|| LookupError::bone(name))
    }

    fn morph_index(&self, name: &str) -> Result<usize, LookupError> {
        self.model.find_morph_by_name(name).ok_or_else(|| LookupError::morph(name))
    }

    // ========== 骨骼 ==========

    /// 设置骨骼动画位姿（平移相对初始偏移），None 的分量保持不变
    pub fn set_bone_pose(
        &mut self,
        name: &str,
        position: Option<Vec3>,
        rotation: Option<Quat>,
    ) -> Result<(), LookupError> {
        let index = self.bone_index(name)?;
        self.nodes[index].set_pose(position, rotation);
        Ok(())
    }

    pub fn bone_pose(&self, name: &str) -> Result<BonePose, LookupError> {
        let node = &self.nodes[self.bone_index(name)?];
        Ok(BonePose {
            position: node.translation,
            rotation: node.rotation,
        })
    }

    /// 所有骨骼回到初始姿态
    pub fn reset_pose(&mut self) {
        self.nodes.iter_mut().for_each(BoneNode::reset_animation);
    }

    // ========== Morph ==========

    /// 权重限制在 [0, 1]
    pub fn set_morph_weight(&mut self, name: &str, weight: f32) -> Result<(), LookupError> {
        let index = self.morph_index(name)?;
        self.morphs.set_morph_weight(index, weight);
        Ok(())
    }

    pub fn morph_weight(&self, name: &str) -> Result<f32, LookupError> {
        let index = self.morph_index(name)?;
        Ok(self.morphs.weight(index).unwrap_or(0.0))
    }

    pub fn reset_morphs(&mut self) {
        self.morphs.reset_all_weights();
    }

    // ========== 世界变换 ==========

    /// 按骨骼索引排列的世界变换
    pub fn world_transforms(&self) -> Vec<Transform> {
        self.model.hierarchy().resolve(&self.transform(), &self.nodes)
    }

    /// 骨骼名 -> 世界变换（重名骨骼取第一个）
    pub fn resolve_world_transforms(&self) -> HashMap<String, Transform> {
        let world = self.world_transforms();
        let mut result = HashMap::with_capacity(world.len());
        for (bone, transform) in self.model.bones().iter().zip(world) {
            result.entry(bone.name.clone()).or_insert(transform);
        }
        result
    }

    /// 只解析该骨骼的祖先链
    pub fn bone_world_transform(&self, name: &str) -> Result<Transform, LookupError> {
        let index = self.bone_index(name)?;
        self.model
            .hierarchy()
            .resolve_one(&self.transform(), &self.nodes, index)
            .ok_or_else(|| LookupError::bone(name))
    }

    // ========== 网格 ==========

    /// 叠加当前 Morph 权重后的顶点位置（模型空间）
    pub fn morphed_positions(&self) -> Vec<Vec3> {
        let mut positions: Vec<Vec3> = self.model.vertices().iter().map(|v| v.position).collect();
        self.morphs.apply_morphs(self.model.morphs(), &mut positions);
        positions
    }

    pub fn skinning_matrices(&self) -> Vec<Mat4> {
        let world = self.world_transforms();
        self.model.hierarchy().skinning_matrices(&world)
    }

    /// CPU 蒙皮后的顶点（渲染端读取）
    pub fn skinned_vertices(&self) -> SkinningOutput {
        let positions = self.morphed_positions();
        let normals: Vec<Vec3> = self.model.vertices().iter().map(|v| v.normal).collect();
        let bone_matrices = self.skinning_matrices();
        compute_skinning(&SkinningInput {
            positions: &positions,
            normals: &normals,
            vertices: self.model.vertices(),
            bone_matrices: &bone_matrices,
        })
    }
}

impl PoseSink for ModelInstance {
    fn set_bone_pose(
        &mut self,
        name: &str,
        position: Option<Vec3>,
        rotation: Option<Quat>,
    ) -> Result<(), LookupError> {
        ModelInstance::set_bone_pose(self, name, position, rotation)
    }

    fn set_morph_weight(&mut self, name: &str, weight: f32) -> Result<(), LookupError> {
        ModelInstance::set_morph_weight(self, name, weight)
    }
}
