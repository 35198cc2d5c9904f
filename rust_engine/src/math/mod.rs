//! 数学工具 - 向量/四元数插值与数值稳定性处理
//!
//! 所有函数均为纯函数，无内部状态。

mod transform;

pub use transform::{compose_transform, Transform};

use glam::{EulerRot, Quat, Vec3};

/// 浮点比较容差
pub const EPSILON: f32 = 1e-6;

/// 归一化向量，长度小于 EPSILON 时原样返回（不除以近零值）
pub fn normalize(v: Vec3) -> Vec3 {
    let len = v.length();
    if len < EPSILON {
        return v;
    }
    v / len
}

/// 归一化四元数，长度近零时退化为单位四元数
pub fn normalize_quat(q: Quat) -> Quat {
    let len = q.length();
    if len < EPSILON {
        return Quat::IDENTITY;
    }
    q * (1.0 / len)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// 球面线性插值
///
/// 数值边界策略：
/// - `|dot(qa, qb)| >= 1 - EPSILON` 时直接返回 `qa`
/// - `sin(halfTheta) < EPSILON` 时返回两者的分量中点
///
/// 点积为负时取 `-qb`，沿最短弧插值。
pub fn slerp(qa: Quat, qb: Quat, t: f32) -> Quat {
    let mut cos_half_theta = qa.dot(qb);
    if cos_half_theta.abs() >= 1.0 - EPSILON {
        return qa;
    }

    let mut qb = qb;
    if cos_half_theta < 0.0 {
        qb = -qb;
        cos_half_theta = -cos_half_theta;
    }

    let half_theta = cos_half_theta.acos();
    let sin_half_theta = half_theta.sin();

    if sin_half_theta < EPSILON {
        return Quat::from_xyzw(
            qa.x * 0.5 + qb.x * 0.5,
            qa.y * 0.5 + qb.y * 0.5,
            qa.z * 0.5 + qb.z * 0.5,
            qa.w * 0.5 + qb.w * 0.5,
        );
    }

    let ratio_a = ((1.0 - t) * half_theta).sin() / sin_half_theta;
    let ratio_b = (t * half_theta).sin() / sin_half_theta;

    Quat::from_xyzw(
        qa.x * ratio_a + qb.x * ratio_b,
        qa.y * ratio_a + qb.y * ratio_b,
        qa.z * ratio_a + qb.z * ratio_b,
        qa.w * ratio_a + qb.w * ratio_b,
    )
}

/// 欧拉角（弧度，XYZ 顺序）转四元数
pub fn quat_from_euler(angles: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z)
}

/// 两个四元数是否表示同一旋转（忽略符号）
pub fn same_rotation(a: Quat, b: Quat, tolerance: f32) -> bool {
    a.dot(b).abs() >= 1.0 - tolerance
}
