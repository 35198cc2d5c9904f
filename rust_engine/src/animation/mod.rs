//! 动画系统
//!
//! 程序化舞蹈与 VMD 关键帧两类片段，统一通过 `PoseGenerator` 生成 `FramePose`，
//! 由 `PlaybackController` 驱动写入模型实例。

mod bezier;
mod clip;
mod keyframe;
mod library;
mod motion;
mod motion_track;
mod playback;
pub(crate) mod pose;
mod procedural;
mod vmd_file;

pub use bezier::BezierCurve;
pub use clip::{generate_pose, AnimationClip, ClipKind, PoseGenerator};
pub use keyframe::{BoneKeyframe, MorphKeyframe};
pub use library::{ClipInfo, ClipLibrary};
pub use motion::Motion;
pub use motion_track::{BoneMotionTrack, MorphMotionTrack, MotionTrack};
pub use playback::{PlaybackController, PlaybackState, PlaybackStatus};
pub use pose::{BonePose, FramePose, PoseSink};
pub use procedural::{generate as generate_procedural, MotionType};
pub use vmd_file::VmdFile;
