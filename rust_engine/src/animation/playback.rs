//! 播放控制器
//!
//! 状态机 `Stopped → Playing ⇄ Paused`，任意状态都可回到 `Stopped`。
//! 由外部渲染循环每帧调用 `tick`，控制器把生成的姿态写入自己持有的 `PoseSink`。

use std::sync::Arc;

use super::clip::{AnimationClip, PoseGenerator};
use super::library::{ClipInfo, ClipLibrary};
use crate::config::{get_config, EngineConfig};
use crate::{LookupError, PlaybackError};

use super::pose::PoseSink;

/// 播放状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// 播放状态快照
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub clip_id: Option<String>,
    pub frame_count: u32,
    pub current_frame: u32,
    pub frame_accumulator_ms: f32,
    pub status: PlaybackStatus,
    pub loop_playback: bool,
    pub frame_rate_hz: f32,
}

/// 播放控制器
pub struct PlaybackController<S: PoseSink> {
    sink: S,
    library: ClipLibrary,
    current_clip: Option<Arc<AnimationClip>>,
    current_frame: u32,
    frame_accumulator_ms: f32,
    status: PlaybackStatus,
    loop_playback: bool,
    frame_rate_hz: f32,
    debug_log: bool,
}

impl<S: PoseSink> PlaybackController<S> {
    /// 使用全局配置创建
    pub fn new(sink: S, library: ClipLibrary) -> Self {
        Self::with_config(sink, library, &get_config())
    }

    pub fn with_config(sink: S, library: ClipLibrary, config: &EngineConfig) -> Self {
        let frame_rate_hz = if config.frame_rate_hz.is_finite() && config.frame_rate_hz > 0.0 {
            config.frame_rate_hz
        } else {
            log::warn!("无效的帧率配置 {}，使用 30.0", config.frame_rate_hz);
            30.0
        };
        Self {
            sink,
            library,
            current_clip: None,
            current_frame: 0,
            frame_accumulator_ms: 0.0,
            status: PlaybackStatus::Stopped,
            loop_playback: config.loop_playback,
            frame_rate_hz,
            debug_log: config.debug_log,
        }
    }

    /// 切换片段：帧归零，状态不变，不立即应用姿态
    pub fn set_animation(&mut self, clip_id: &str) -> Result<(), LookupError> {
        let clip = self.library.get(clip_id).ok_or_else(|| LookupError::clip(clip_id))?;
        if self.debug_log {
            log::debug!("切换动画: {} ({} 帧)", clip.id, clip.frame_count);
        }
        self.current_clip = Some(clip);
        self.current_frame = 0;
        self.frame_accumulator_ms = 0.0;
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.current_clip.is_none() {
            return Err(PlaybackError::NoAnimationSet);
        }
        if self.debug_log && self.status != PlaybackStatus::Playing {
            log::debug!("{:?} -> Playing (帧 {})", self.status, self.current_frame);
        }
        self.status = PlaybackStatus::Playing;
        self.frame_accumulator_ms = 0.0;
        Ok(())
    }

    /// 只在播放中生效
    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            if self.debug_log {
                log::debug!("Playing -> Paused (帧 {})", self.current_frame);
            }
            self.status = PlaybackStatus::Paused;
        }
    }

    /// 回到第 0 帧并立即应用该帧姿态
    pub fn stop(&mut self) {
        if self.debug_log && self.status != PlaybackStatus::Stopped {
            log::debug!("{:?} -> Stopped", self.status);
        }
        self.status = PlaybackStatus::Stopped;
        self.current_frame = 0;
        self.frame_accumulator_ms = 0.0;
        self.apply_current_frame();
    }

    /// 推进时间，返回前进的帧数
    ///
    /// 一次可以前进多帧（卡顿后追帧）。非循环播放到达最后一帧时停止。
    pub fn tick(&mut self, delta_time_ms: f32) -> u32 {
        if self.status != PlaybackStatus::Playing {
            return 0;
        }
        let frame_count = match &self.current_clip {
            Some(clip) => clip.frame_count.max(1),
            None => return 0,
        };
        if !delta_time_ms.is_finite() || delta_time_ms < 0.0 {
            log::trace!("忽略无效的时间增量: {}", delta_time_ms);
            return 0;
        }

        self.frame_accumulator_ms += delta_time_ms;
        let frames = (self.frame_accumulator_ms * self.frame_rate_hz / 1000.0).floor();
        if frames < 1.0 {
            return 0;
        }
        self.frame_accumulator_ms =
            (self.frame_accumulator_ms - frames * 1000.0 / self.frame_rate_hz).max(0.0);
        let frames = frames.min(u32::MAX as f32) as u32;

        if self.loop_playback {
            let advanced = (self.current_frame as u64 + frames as u64) % frame_count as u64;
            self.current_frame = advanced as u32;
        } else {
            let last = frame_count - 1;
            let advanced = self.current_frame.saturating_add(frames);
            if advanced >= last {
                self.current_frame = last;
                self.status = PlaybackStatus::Stopped;
                self.frame_accumulator_ms = 0.0;
                if self.debug_log {
                    log::debug!("播放结束 (帧 {}) -> Stopped", last);
                }
            } else {
                self.current_frame = advanced;
            }
        }

        self.apply_current_frame();
        frames
    }

    /// 跳到指定帧（限制在片段范围内）并立即应用，任何状态都可调用
    pub fn set_current_frame(&mut self, frame: u32) -> Result<u32, PlaybackError> {
        let clip = self.current_clip.as_ref().ok_or(PlaybackError::NoAnimationSet)?;
        self.current_frame = frame.min(clip.frame_count.max(1) - 1);
        self.frame_accumulator_ms = 0.0;
        self.apply_current_frame();
        Ok(self.current_frame)
    }

    pub fn set_loop(&mut self, loop_playback: bool) {
        self.loop_playback = loop_playback;
    }

    pub fn set_frame_rate(&mut self, frame_rate_hz: f32) -> Result<(), PlaybackError> {
        if !frame_rate_hz.is_finite() || frame_rate_hz <= 0.0 {
            return Err(PlaybackError::InvalidFrameRate(frame_rate_hz));
        }
        self.frame_rate_hz = frame_rate_hz;
        Ok(())
    }

    fn apply_current_frame(&mut self) {
        if let Some(clip) = &self.current_clip {
            let pose = clip.generate_pose(self.current_frame);
            pose.apply_to(&mut self.sink);
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn current_clip(&self) -> Option<&AnimationClip> {
        self.current_clip.as_deref()
    }

    pub fn is_looping(&self) -> bool {
        self.loop_playback
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate_hz
    }

    /// 状态切换日志开关（默认取自 `EngineConfig::debug_log`）
    pub fn set_debug_log(&mut self, enabled: bool) {
        self.debug_log = enabled;
    }

    pub fn debug_log(&self) -> bool {
        self.debug_log
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            clip_id: self.current_clip.as_ref().map(|c| c.id.clone()),
            frame_count: self.current_clip.as_ref().map_or(0, |c| c.frame_count()),
            current_frame: self.current_frame,
            frame_accumulator_ms: self.frame_accumulator_ms,
            status: self.status,
            loop_playback: self.loop_playback,
            frame_rate_hz: self.frame_rate_hz,
        }
    }

    pub fn available_clips(&self) -> Vec<ClipInfo> {
        self.library.list()
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    /// 已选中的片段不受影响，直到再次 `set_animation`
    pub fn library_mut(&mut self) -> &mut ClipLibrary {
        &mut self.library
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
