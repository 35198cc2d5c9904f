//! 材质定义

use glam::{Vec3, Vec4};

/// 球面贴图模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SphereMode {
    Disabled,
    Multiply,
    Add,
    /// 使用附加 UV1 的子纹理
    SubTexture,
}

impl SphereMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SphereMode::Disabled),
            1 => Some(SphereMode::Multiply),
            2 => Some(SphereMode::Add),
            3 => Some(SphereMode::SubTexture),
            _ => None,
        }
    }
}

/// Toon 纹理引用
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToonRef {
    /// 纹理表索引（-1 表示无）
    Texture(i32),
    /// 内置 toon01.bmp ~ toon10.bmp（0 起）
    Shared(u8),
}

/// 材质
///
/// 面索引区间为 `[index_offset, index_offset + index_count)`，按材质顺序连续排列。
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub name_en: String,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_strength: f32,
    pub ambient: Vec3,
    pub draw_flags: u8,
    pub edge_color: Vec4,
    pub edge_scale: f32,
    pub texture_index: i32,
    pub sphere_index: i32,
    pub sphere_mode: SphereMode,
    pub toon: ToonRef,
    pub memo: String,
    pub index_offset: u32,
    pub index_count: u32,
}

impl Material {
    /// 是否双面渲染
    pub fn is_double_sided(&self) -> bool {
        (self.draw_flags & 0x01) != 0
    }

    /// 是否投射地面阴影
    pub fn casts_ground_shadow(&self) -> bool {
        (self.draw_flags & 0x02) != 0
    }

    /// 是否投射阴影
    pub fn casts_shadow(&self) -> bool {
        (self.draw_flags & 0x04) != 0
    }

    /// 是否接收阴影
    pub fn receives_shadow(&self) -> bool {
        (self.draw_flags & 0x08) != 0
    }

    /// 是否绘制边缘
    pub fn has_edge(&self) -> bool {
        (self.draw_flags & 0x10) != 0
    }

    /// 三角形数量
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            name_en: String::new(),
            diffuse: Vec4::ONE,
            specular: Vec3::ZERO,
            specular_strength: 0.0,
            ambient: Vec3::splat(0.5),
            draw_flags: 0,
            edge_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            edge_scale: 1.0,
            texture_index: -1,
            sphere_index: -1,
            sphere_mode: SphereMode::Disabled,
            toon: ToonRef::Texture(-1),
            memo: String::new(),
            index_offset: 0,
            index_count: 0,
        }
    }
}
