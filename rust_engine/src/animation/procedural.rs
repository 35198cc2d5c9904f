//! 程序化舞蹈动作
//!
//! 每种动作是相位 `phase = 2π · frame / frame_count` 的固定三角函数组合。
//! 骨骼旋转以 XYZ 欧拉角（弧度）给出，センター 额外带平移。
//! 平移与其他动画一样相对骨骼的初始偏移，不含站立高度。

use std::f32::consts::PI;

use glam::Vec3;

use super::pose::FramePose;
use crate::math::quat_from_euler;

/// 程序化动作类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionType {
    Wave,
    Twist,
    Hop,
    Spin,
    Default,
}

impl MotionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionType::Wave => "wave",
            MotionType::Twist => "twist",
            MotionType::Hop => "hop",
            MotionType::Spin => "spin",
            MotionType::Default => "default",
        }
    }

    /// 未知标签按 Default 处理
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "wave" => MotionType::Wave,
            "twist" => MotionType::Twist,
            "hop" => MotionType::Hop,
            "spin" => MotionType::Spin,
            _ => MotionType::Default,
        }
    }
}

/// 生成一帧（frame_index 应已对 frame_count 取模）
pub fn generate(motion_type: MotionType, frame_index: u32, frame_count: u32) -> FramePose {
    let t = frame_index as f32 / frame_count.max(1) as f32;
    let phase = t * PI * 2.0;

    let mut pose = FramePose::new();
    match motion_type {
        MotionType::Wave => wave_dance(&mut pose, phase),
        MotionType::Twist => twist_dance(&mut pose, phase),
        MotionType::Hop => hop_dance(&mut pose, phase),
        MotionType::Spin => spin_dance(&mut pose, phase),
        MotionType::Default => default_dance(&mut pose, phase),
    }
    pose
}

fn bone(pose: &mut FramePose, name: &str, position: [f32; 3], euler: [f32; 3]) {
    pose.set_bone(name, Vec3::from(position), quat_from_euler(Vec3::from(euler)));
}

/// 只旋转的骨骼
fn rotate(pose: &mut FramePose, name: &str, euler: [f32; 3]) {
    bone(pose, name, [0.0; 3], euler);
}

fn sin(x: f32) -> f32 {
    x.sin()
}

fn wave_dance(pose: &mut FramePose, phase: f32) {
    bone(
        pose,
        "センター",
        [sin(phase) * 2.0, sin(phase * 0.5).abs(), 0.0],
        [0.0, sin(phase * 0.5) * 0.1, 0.0],
    );
    rotate(pose, "上半身", [sin(phase) * 0.1, sin(phase * 0.7) * 0.1, sin(phase * 1.3) * 0.1]);
    rotate(pose, "頭", [sin(phase * 0.8) * 0.15, sin(phase * 0.6) * 0.1, 0.0]);

    rotate(
        pose,
        "左腕",
        [sin(phase) * 0.2 + 0.3, sin(phase * 1.2) * 0.2, sin(phase * 0.8) * 0.5 + 0.2],
    );
    rotate(
        pose,
        "右腕",
        [
            sin(phase + PI) * 0.2 + 0.3,
            sin(phase * 1.2 + PI) * 0.2,
            sin(phase * 0.8 + PI) * 0.5 - 0.2,
        ],
    );

    rotate(pose, "左足", [sin(phase) * 0.1, 0.0, sin(phase * 0.9) * 0.1]);
    rotate(pose, "右足", [sin(phase + PI) * 0.1, 0.0, sin(phase * 0.9 + PI) * 0.1]);

    pose.set_morph("笑顔", sin(phase * 0.5) * 0.5 + 0.5);
    pose.set_morph("まばたき", sin(phase * 0.1 + 1.0).powi(12));
}

fn twist_dance(pose: &mut FramePose, phase: f32) {
    bone(
        pose,
        "センター",
        [sin(phase * 2.0), sin(phase).abs() * 0.5, 0.0],
        [0.0, sin(phase) * 0.3, 0.0],
    );
    rotate(pose, "上半身", [0.0, sin(phase) * 0.2, sin(phase * 2.0) * 0.05]);
    rotate(pose, "下半身", [0.0, sin(phase + PI) * 0.15, 0.0]);
    rotate(
        pose,
        "頭",
        [sin(phase * 0.7) * 0.1, sin(phase * 1.5) * 0.1, sin(phase * 0.5) * 0.05],
    );

    rotate(
        pose,
        "左腕",
        [sin(phase) * 0.3 + 0.4, sin(phase * 0.8) * 0.2, sin(phase * 1.2) * 0.4 + 0.3],
    );
    rotate(
        pose,
        "右腕",
        [
            sin(phase + PI) * 0.3 + 0.4,
            sin(phase * 0.8 + PI) * 0.2,
            sin(phase * 1.2 + PI) * 0.4 - 0.3,
        ],
    );

    rotate(pose, "左ひざ", [sin(phase).max(0.0) * 0.3, 0.0, 0.0]);
    rotate(pose, "右ひざ", [sin(phase + PI).max(0.0) * 0.3, 0.0, 0.0]);

    pose.set_morph("笑顔", 0.8);
    pose.set_morph("ウィンク", sin(phase * 0.2 + 2.0).powi(20));
}

fn hop_dance(pose: &mut FramePose, phase: f32) {
    let jump = sin(phase).max(0.0);

    bone(pose, "センター", [0.0, jump * 3.0, 0.0], [0.0, sin(phase * 0.7) * 0.1, 0.0]);
    // 上半身略微前倾
    rotate(pose, "上半身", [sin(phase * 0.5) * 0.05 + 0.05, 0.0, 0.0]);
    rotate(pose, "頭", [-sin(phase) * 0.05, sin(phase * 2.0) * 0.1, 0.0]);

    rotate(pose, "左腕", [-sin(phase) * 0.2 - 0.1, 0.0, sin(phase) * 0.3 + 0.3]);
    rotate(pose, "右腕", [-sin(phase) * 0.2 - 0.1, 0.0, sin(phase) * 0.3 - 0.3]);

    let knee = sin(phase + PI * 1.5) * 0.4;
    rotate(pose, "左ひざ", [knee.max(0.0), 0.0, 0.0]);
    rotate(pose, "右ひざ", [knee.max(0.0), 0.0, 0.0]);

    pose.set_morph("笑顔", 1.0);
    pose.set_morph("まばたき", sin(phase * 0.1 + 3.0).powi(12));
}

fn spin_dance(pose: &mut FramePose, phase: f32) {
    let spin_phase = phase * 4.0;
    let spin_amount = sin(spin_phase) * 2.0 * PI;

    bone(
        pose,
        "センター",
        [
            sin(spin_phase) * 3.0,
            sin(phase * 0.5).abs(),
            spin_phase.cos() * 3.0,
        ],
        [0.0, spin_amount, 0.0],
    );
    // 离心力带来的倾斜
    rotate(pose, "上半身", [0.0, 0.0, -sin(spin_phase) * 0.2]);
    rotate(pose, "頭", [sin(phase * 0.5) * 0.1, 0.0, -sin(spin_phase) * 0.1]);

    rotate(pose, "左腕", [0.0, 0.0, sin(phase * 0.5) * 0.2 + 0.8]);
    rotate(pose, "右腕", [0.0, 0.0, sin(phase * 0.5) * 0.2 - 0.8]);

    rotate(pose, "左足", [sin(phase) * 0.2, 0.0, 0.0]);
    rotate(pose, "右足", [sin(phase + PI) * 0.2, 0.0, 0.0]);

    pose.set_morph("驚き", sin(spin_phase) * 0.3 + 0.3);
    pose.set_morph("笑顔", spin_phase.cos() * 0.3 + 0.3);
    pose.set_morph("まばたき", sin(phase * 0.05 + 5.0).powi(20));
}

fn default_dance(pose: &mut FramePose, phase: f32) {
    bone(
        pose,
        "センター",
        [sin(phase), sin(phase * 2.0) * 0.5, 0.0],
        [0.0, sin(phase) * 0.05, 0.0],
    );
    rotate(
        pose,
        "上半身",
        [sin(phase * 0.5) * 0.05, sin(phase) * 0.05, sin(phase * 0.7) * 0.03],
    );
    rotate(pose, "頭", [sin(phase * 0.6) * 0.1, sin(phase * 0.5) * 0.1, 0.0]);

    rotate(pose, "左腕", [sin(phase) * 0.2, 0.0, sin(phase) * 0.1 + 0.2]);
    rotate(pose, "右腕", [sin(phase + PI) * 0.2, 0.0, sin(phase + PI) * 0.1 - 0.2]);

    // 踏步
    rotate(pose, "左足", [sin(phase).max(0.0) * 0.1, 0.0, 0.0]);
    rotate(pose, "右足", [sin(phase + PI).max(0.0) * 0.1, 0.0, 0.0]);

    pose.set_morph("笑顔", sin(phase * 0.25) * 0.3 + 0.7);
    pose.set_morph("まばたき", sin(phase * 0.1).powi(12));
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_wave_frame_zero() {
        let pose = generate(MotionType::Wave, 0, 120);
        let center = pose.bones["センター"];
        assert!(center.position.length() < 1e-6);
        assert!(center.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert!((pose.morphs["笑顔"] - 0.5).abs() < 1e-6);
        assert!((pose.morphs["まばたき"] - 1f32.sin().powi(12)).abs() < 1e-6);
        assert_eq!(pose.bones.len(), 7);
    }

    #[test]
    fn test_hop_quarter_cycle_is_jump_peak() {
        // frame 15 / 60 → phase = π/2
        let pose = generate(MotionType::Hop, 15, 60);
        assert!((pose.bones["センター"].position.y - 3.0).abs() < 1e-5);
        assert_eq!(pose.morphs["笑顔"], 1.0);
        assert!(!pose.bones.contains_key("左足"));
    }

    #[test]
    fn test_twist_uses_lower_body_and_knees() {
        let pose = generate(MotionType::Twist, 10, 90);
        assert!(pose.bones.contains_key("下半身"));
        assert!(pose.bones.contains_key("右ひざ"));
        assert_eq!(pose.morphs["笑顔"], 0.8);
        assert!(pose.morphs.contains_key("ウィンク"));
    }

    #[test]
    fn test_spin_moves_in_circle() {
        let pose = generate(MotionType::Spin, 0, 180);
        let center = pose.bones["センター"].position;
        assert!((center - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
        assert!(pose.morphs.contains_key("驚き"));
    }

    #[test]
    fn test_deterministic() {
        for motion in [
            MotionType::Wave,
            MotionType::Twist,
            MotionType::Hop,
            MotionType::Spin,
            MotionType::Default,
        ] {
            assert_eq!(generate(motion, 37, 120), generate(motion, 37, 120));
        }
    }

    #[test]
    fn test_morph_weights_in_range() {
        for frame in 0..120 {
            let pose = generate(MotionType::Default, frame, 120);
            for weight in pose.morphs.values() {
                assert!((0.0..=1.0).contains(weight));
            }
        }
    }

    #[test]
    fn test_tag_round_trip() {
        assert_eq!(MotionType::from_tag("spin"), MotionType::Spin);
        assert_eq!(MotionType::from_tag("unknown"), MotionType::Default);
        assert_eq!(MotionType::Hop.as_str(), "hop");
    }
}
