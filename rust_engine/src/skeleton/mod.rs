//! 骨骼系统
//!
//! 骨骼以扁平数组存储，只保存父索引；子骨骼关系是计算视图，不构成所有权。

mod bone;
mod hierarchy;

pub use bone::{BoneDef, BoneFlags, BoneNode, IkConfig, IkLink};
pub use hierarchy::BoneHierarchy;
