//! MMD 舞蹈引擎 - 角色模型解码与骨骼动画运行时
//!
//! 提供：
//! - PMX 模型二进制解码
//! - 骨骼层级与世界变换解析
//! - 程序化 / 采样动画片段与 VMD 解析
//! - 播放状态机（播放/暂停/停止/跳帧）
//! - Morph 表情混合与 CPU 蒙皮

pub mod animation;
pub mod config;
pub mod math;
pub mod model;
pub mod morph;
pub mod skeleton;
pub mod skinning;

pub use animation::{
    generate_pose, AnimationClip, BonePose, ClipInfo, ClipKind, ClipLibrary, FramePose,
    MotionType, PlaybackController, PlaybackState, PlaybackStatus, PoseGenerator, PoseSink,
    VmdFile,
};
pub use config::EngineConfig;
pub use math::Transform;
pub use model::{decode, load_model, load_pmx, Model, ModelInstance};
pub use morph::{MorphCategory, MorphManager};
pub use skeleton::{BoneHierarchy, BoneNode};

use thiserror::Error;

/// 二进制解码错误（PMX / VMD）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("invalid signature: {found:?}")]
    InvalidSignature { found: [u8; 4] },

    #[error("unsupported version: {0}")]
    UnsupportedVersion(f32),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("undecodable text at offset {offset}")]
    InvalidText { offset: usize },

    #[error("truncated data at offset {offset} (need {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("skin weights of vertex {vertex} sum to {sum}")]
    InvalidSkinWeights { vertex: usize, sum: f32 },

    #[error("bone {bone} is part of a parent cycle")]
    CyclicBoneGraph { bone: usize },

    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        len: usize,
    },

    #[error("invalid {kind} value {value} at offset {offset}")]
    InvalidRecord {
        kind: &'static str,
        value: i64,
        offset: usize,
    },
}

/// 名称查找错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

impl LookupError {
    pub(crate) fn bone(name: &str) -> Self {
        LookupError::NotFound {
            kind: "bone",
            name: name.to_string(),
        }
    }

    pub(crate) fn morph(name: &str) -> Self {
        LookupError::NotFound {
            kind: "morph",
            name: name.to_string(),
        }
    }

    pub(crate) fn clip(name: &str) -> Self {
        LookupError::NotFound {
            kind: "clip",
            name: name.to_string(),
        }
    }
}

/// 播放控制错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("no animation set")]
    NoAnimationSet,

    #[error("invalid frame rate: {0}")]
    InvalidFrameRate(f32),
}

#[derive(Error, Debug)]
pub enum MmdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),
}

pub type Result<T> = std::result::Result<T, MmdError>;
