//! 动画片段库

use std::collections::HashMap;
use std::sync::Arc;

use super::clip::AnimationClip;
use super::procedural::MotionType;

/// 片段摘要（供 UI 列表使用）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipInfo {
    pub id: String,
    pub name: String,
    pub category: String,
    pub frame_count: u32,
}

/// 片段库，保持注册顺序
#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: Vec<Arc<AnimationClip>>,
    id_to_index: HashMap<String, usize>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置的五个演示舞蹈
    pub fn with_demo_dances() -> Self {
        let mut library = Self::new();
        let dances = [
            ("wave_dance", "ウェーブダンス", "ポップ", 120, MotionType::Wave),
            ("twist_dance", "ツイストダンス", "ポップ", 90, MotionType::Twist),
            ("hop_dance", "ホップダンス", "アップテンポ", 60, MotionType::Hop),
            ("spin_dance", "スピンダンス", "アクロバット", 180, MotionType::Spin),
            ("default_dance", "デフォルトダンス", "基本", 120, MotionType::Default),
        ];
        for (id, name, category, frames, motion_type) in dances {
            library.insert(AnimationClip::procedural(id, name, category, frames, motion_type));
        }
        library
    }

    /// 注册片段，同 id 的旧片段被替换并返回
    pub fn insert(&mut self, clip: AnimationClip) -> Option<Arc<AnimationClip>> {
        let clip = Arc::new(clip);
        match self.id_to_index.get(&clip.id) {
            Some(&index) => Some(std::mem::replace(&mut self.clips[index], clip)),
            None => {
                self.id_to_index.insert(clip.id.clone(), self.clips.len());
                self.clips.push(clip);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<AnimationClip>> {
        self.id_to_index.get(id).map(|&i| Arc::clone(&self.clips[i]))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn list(&self) -> Vec<ClipInfo> {
        self.clips
            .iter()
            .map(|clip| ClipInfo {
                id: clip.id.clone(),
                name: clip.name.clone(),
                category: clip.category.clone(),
                frame_count: clip.frame_count,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
