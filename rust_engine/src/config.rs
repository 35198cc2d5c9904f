//! 引擎配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    // ========== 播放 ==========
    /// 播放帧率（Hz），默认 30.0（MMD 标准）
    pub frame_rate_hz: f32,
    /// 新建控制器是否循环播放，默认 true
    pub loop_playback: bool,

    // ========== 解码 ==========
    /// 蒙皮权重之和与 1.0 的最大允许偏差，默认 0.01
    /// 偏差以内的权重会被归一化，超出则解码失败
    pub skin_weight_tolerance: f32,
    /// 单个数据表允许的最大记录数，默认 2^24
    /// 用于拒绝声明了荒谬数量的损坏文件
    pub max_table_len: usize,

    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 30.0,
            loop_playback: true,

            // 导出工具写出的 BDEF4 权重常有 1e-3 级别的误差
            skin_weight_tolerance: 0.01,
            max_table_len: 1 << 24,

            debug_log: false,
        }
    }
}

/// 全局配置实例
static ENGINE_CONFIG: Lazy<RwLock<EngineConfig>> =
    Lazy::new(|| RwLock::new(EngineConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> EngineConfig {
    ENGINE_CONFIG
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: EngineConfig) {
    *ENGINE_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(EngineConfig::default());
}
