//! 贝塞尔曲线插值（VMD 关键帧曲线）
//!
//! 曲线端点固定为 (0,0) 和 (1,1)，控制点来自 VMD 的 0..=127 字节。

use glam::Vec2;

/// 三次贝塞尔插值曲线
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self::linear()
    }
}

impl BezierCurve {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            p1: Vec2::new(x1, y1),
            p2: Vec2::new(x2, y2),
        }
    }

    /// 线性插值（MMD 默认 20,20,107,107 的近似）
    pub fn linear() -> Self {
        Self::new(0.25, 0.25, 0.75, 0.75)
    }

    /// 从 VMD 插值字节创建（x1, y1, x2, y2）
    pub fn from_vmd_data(data: [u8; 4]) -> Self {
        let v = |b: u8| b.min(127) as f32 / 127.0;
        Self::new(v(data[0]), v(data[1]), v(data[2]), v(data[3]))
    }

    /// 控制点都在对角线上时曲线退化为直线
    pub fn is_linear(&self) -> bool {
        (self.p1.x - self.p1.y).abs() < 1e-6 && (self.p2.x - self.p2.y).abs() < 1e-6
    }

    /// 给定进度 x ∈ [0,1]，返回插值系数 y
    pub fn evaluate(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        if self.is_linear() {
            return x;
        }

        let s = self.solve_parameter(x);
        cubic(self.p1.y, self.p2.y, s)
    }

    /// 求曲线参数 s 使 x(s) = x：先牛顿迭代，不收敛时二分
    fn solve_parameter(&self, x: f32) -> f32 {
        let mut s = x;
        for _ in 0..8 {
            let err = cubic(self.p1.x, self.p2.x, s) - x;
            if err.abs() < 1e-6 {
                return s;
            }
            let slope = cubic_derivative(self.p1.x, self.p2.x, s);
            if slope.abs() < 1e-6 {
                break;
            }
            s -= err / slope;
            if !(0.0..=1.0).contains(&s) {
                break;
            }
        }

        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        s = x;
        for _ in 0..32 {
            let value = cubic(self.p1.x, self.p2.x, s);
            if (value - x).abs() < 1e-6 {
                break;
            }
            if value < x {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        s
    }
}

/// 端点为 0 和 1 的一维三次贝塞尔
fn cubic(c1: f32, c2: f32, s: f32) -> f32 {
    let t = 1.0 - s;
    3.0 * t * t * s * c1 + 3.0 * t * s * s * c2 + s * s * s
}

fn cubic_derivative(c1: f32, c2: f32, s: f32) -> f32 {
    let t = 1.0 - s;
    3.0 * t * t * c1 + 6.0 * t * s * (c2 - c1) + 3.0 * s * s * (1.0 - c2)
}
