//! 骨骼层级
//!
//! 每个模型只构建一次：父索引、初始偏移、拓扑求值顺序和名称索引。
//! 子骨骼列表不单独存储，由父索引按需计算。

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use super::{BoneDef, BoneNode};
use crate::math::{compose_transform, Transform};
use crate::DecodeError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// 骨骼层级
#[derive(Clone, Debug, Default)]
pub struct BoneHierarchy {
    parents: Vec<Option<usize>>,
    rest_positions: Vec<Vec3>,
    rest_offsets: Vec<Vec3>,
    /// 父骨骼总是先于子骨骼
    order: Vec<usize>,
    name_to_index: HashMap<String, usize>,
}

impl BoneHierarchy {
    /// 由骨骼定义构建层级，检查父索引越界和环
    pub fn build(bones: &[BoneDef]) -> Result<Self, DecodeError> {
        let len = bones.len();

        let mut parents = Vec::with_capacity(len);
        for bone in bones {
            let parent = match bone.parent_index {
                -1 => None,
                p if p < -1 || p as usize >= len => {
                    return Err(DecodeError::IndexOutOfRange {
                        kind: "bone parent",
                        index: p as i64,
                        len,
                    })
                }
                p => Some(p as usize),
            };
            parents.push(parent);
        }

        // 沿父链向上走，先记录祖先再记录自身
        let mut marks = vec![Mark::Unvisited; len];
        let mut order = Vec::with_capacity(len);
        let mut chain = Vec::new();
        for start in 0..len {
            chain.clear();
            let mut current = Some(start);
            while let Some(i) = current {
                match marks[i] {
                    Mark::Done => break,
                    Mark::InProgress => return Err(DecodeError::CyclicBoneGraph { bone: i }),
                    Mark::Unvisited => {
                        marks[i] = Mark::InProgress;
                        chain.push(i);
                        current = parents[i];
                    }
                }
            }
            for &i in chain.iter().rev() {
                marks[i] = Mark::Done;
                order.push(i);
            }
        }

        let rest_positions: Vec<Vec3> = bones.iter().map(|b| b.rest_position).collect();
        let rest_offsets = parents
            .iter()
            .enumerate()
            .map(|(i, parent)| match parent {
                Some(p) => rest_positions[i] - rest_positions[*p],
                None => rest_positions[i],
            })
            .collect();

        // 重名骨骼以第一个为准
        let mut name_to_index = HashMap::with_capacity(len);
        for (i, bone) in bones.iter().enumerate() {
            name_to_index.entry(bone.name.clone()).or_insert(i);
        }

        Ok(Self {
            parents,
            rest_positions,
            rest_offsets,
            order,
            name_to_index,
        })
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    /// 子骨骼（计算视图）
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(move |(_, parent)| **parent == Some(index))
            .map(|(i, _)| i)
    }

    /// 拓扑求值顺序
    pub fn evaluation_order(&self) -> &[usize] {
        &self.order
    }

    pub fn rest_offset(&self, index: usize) -> Option<Vec3> {
        self.rest_offsets.get(index).copied()
    }

    pub fn rest_position(&self, index: usize) -> Option<Vec3> {
        self.rest_positions.get(index).copied()
    }

    /// 创建初始姿态的骨骼节点
    pub fn create_nodes(&self) -> Vec<BoneNode> {
        self.rest_offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| BoneNode::new(i, *offset))
            .collect()
    }

    /// 按拓扑顺序解析所有骨骼的世界变换
    ///
    /// `nodes` 必须与层级一一对应（由 `create_nodes` 创建）。
    pub fn resolve(&self, root: &Transform, nodes: &[BoneNode]) -> Vec<Transform> {
        let mut world = vec![Transform::IDENTITY; self.len()];
        for &i in &self.order {
            let parent = match self.parents[i] {
                Some(p) => world[p],
                None => *root,
            };
            let node = &nodes[i];
            world[i] = compose_transform(&parent, node.local_position(), node.local_rotation());
        }
        world
    }

    /// 只解析一根骨骼（沿祖先链）
    pub fn resolve_one(
        &self,
        root: &Transform,
        nodes: &[BoneNode],
        index: usize,
    ) -> Option<Transform> {
        if index >= self.len() {
            return None;
        }
        let mut chain = vec![index];
        let mut current = self.parents[index];
        while let Some(p) = current {
            chain.push(p);
            current = self.parents[p];
        }
        let mut world = *root;
        for &i in chain.iter().rev() {
            let node = &nodes[i];
            world = compose_transform(&world, node.local_position(), node.local_rotation());
        }
        Some(world)
    }

    /// 蒙皮矩阵 = 世界变换 * 逆绑定矩阵（逆初始平移）
    pub fn skinning_matrices(&self, world: &[Transform]) -> Vec<Mat4> {
        world
            .iter()
            .zip(&self.rest_positions)
            .map(|(w, rest)| w.to_matrix() * Mat4::from_translation(-*rest))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<BoneDef> {
        vec![
            BoneDef::new("root", Vec3::ZERO, -1),
            BoneDef::new("mid", Vec3::new(0.0, 1.0, 0.0), 0),
            BoneDef::new("leaf", Vec3::new(0.0, 2.0, 0.0), 1),
        ]
    }

    #[test]
    fn test_chain_resolves_leaf_position() {
        let hierarchy = BoneHierarchy::build(&chain()).unwrap();
        let nodes = hierarchy.create_nodes();
        let world = hierarchy.resolve(&Transform::IDENTITY, &nodes);
        assert!((world[2].translation - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);

        let leaf = hierarchy.resolve_one(&Transform::IDENTITY, &nodes, 2).unwrap();
        assert!((leaf.translation - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_parent_after_child_in_file_order() {
        let bones = vec![
            BoneDef::new("child", Vec3::new(0.0, 3.0, 0.0), 1),
            BoneDef::new("parent", Vec3::new(0.0, 1.0, 0.0), -1),
        ];
        let hierarchy = BoneHierarchy::build(&bones).unwrap();
        assert_eq!(hierarchy.evaluation_order(), &[1, 0]);
        assert_eq!(hierarchy.rest_offset(0), Some(Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_cycle_rejected() {
        let bones = vec![
            BoneDef::new("a", Vec3::ZERO, 1),
            BoneDef::new("b", Vec3::ZERO, 0),
        ];
        assert!(matches!(
            BoneHierarchy::build(&bones),
            Err(DecodeError::CyclicBoneGraph { .. })
        ));
    }

    #[test]
    fn test_self_parent_rejected() {
        let bones = vec![BoneDef::new("a", Vec3::ZERO, 0)];
        assert_eq!(
            BoneHierarchy::build(&bones).unwrap_err(),
            DecodeError::CyclicBoneGraph { bone: 0 }
        );
    }

    #[test]
    fn test_parent_out_of_range() {
        let bones = vec![BoneDef::new("a", Vec3::ZERO, 5)];
        assert!(matches!(
            BoneHierarchy::build(&bones),
            Err(DecodeError::IndexOutOfRange { kind: "bone parent", index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_children_view_and_duplicate_names() {
        let mut bones = chain();
        bones.push(BoneDef::new("mid", Vec3::new(1.0, 1.0, 0.0), 0));
        let hierarchy = BoneHierarchy::build(&bones).unwrap();
        assert_eq!(hierarchy.children(0).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(hierarchy.find_bone_by_name("mid"), Some(1));
    }

    #[test]
    fn test_rest_pose_skinning_is_identity() {
        let hierarchy = BoneHierarchy::build(&chain()).unwrap();
        let world = hierarchy.resolve(&Transform::IDENTITY, &hierarchy.create_nodes());
        for m in hierarchy.skinning_matrices(&world) {
            assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn test_root_composes_with_instance_transform() {
        let hierarchy = BoneHierarchy::build(&chain()).unwrap();
        let root = Transform::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let world = hierarchy.resolve(&root, &hierarchy.create_nodes());
        assert!((world[2].translation - Vec3::new(5.0, 2.0, 0.0)).length() < 1e-6);
    }
}
