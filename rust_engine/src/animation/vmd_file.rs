//! VMD 文件解析
//!
//! 只读取骨骼和 Morph 关键帧；之后的相机、光照、阴影、IK 开关表忽略。
//! 与模型一样不做坐标系转换。

use std::path::Path;

use glam::{Quat, Vec3};

use super::bezier::BezierCurve;
use super::clip::AnimationClip;
use super::keyframe::{BoneKeyframe, MorphKeyframe};
use super::motion::Motion;
use crate::config::get_config;
use crate::model::reader::{decode_shift_jis_fixed, BinaryReader};
use crate::DecodeError;

const MAGIC_LEN: usize = 30;
const MAGIC_PREFIX: &[u8] = b"Vocaloid Motion Data ";
const NAME_LEN: usize = 15;
/// 名称 15 + 帧号 4 + 平移 12 + 旋转 16 + 插值 64
const BONE_RECORD_SIZE: usize = 111;
/// 名称 15 + 帧号 4 + 权重 4
const MORPH_RECORD_SIZE: usize = 23;

/// VMD 文件数据
#[derive(Clone, Debug, Default)]
pub struct VmdFile {
    pub model_name: String,
    pub bone_keyframes: Vec<(String, BoneKeyframe)>,
    pub morph_keyframes: Vec<(String, MorphKeyframe)>,
}

impl VmdFile {
    /// 从文件加载 VMD
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::parse(&bytes)?)
    }

    /// 解析 VMD 数据
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let config = get_config();
        let max_len = config.max_table_len;
        let mut reader: BinaryReader = BinaryReader::new(bytes);

        let magic = reader.read_bytes(MAGIC_LEN)?;
        if !magic.starts_with(MAGIC_PREFIX) {
            let mut found = [0u8; 4];
            found.copy_from_slice(&magic[..4]);
            return Err(DecodeError::InvalidSignature { found });
        }
        // "0002" 之后模型名为 20 字节，旧的 "file" 格式为 10 字节
        let name_len = match &magic[MAGIC_PREFIX.len()..MAGIC_PREFIX.len() + 4] {
            b"0002" => 20,
            b"file" => 10,
            other => {
                return Err(DecodeError::InvalidHeader(format!(
                    "unknown VMD version tag {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        let model_name = decode_shift_jis_fixed(reader.read_bytes(name_len)?);

        let bone_count = reader.read_count("bone keyframe count", BONE_RECORD_SIZE, max_len)?;
        let mut bone_keyframes = Vec::with_capacity(bone_count);
        for _ in 0..bone_count {
            bone_keyframes.push(read_bone_keyframe(&mut reader)?);
        }

        // 只有骨骼表的旧文件在此结束
        let mut morph_keyframes = Vec::new();
        if reader.remaining() > 0 {
            let morph_count =
                reader.read_count("morph keyframe count", MORPH_RECORD_SIZE, max_len)?;
            morph_keyframes.reserve(morph_count);
            for _ in 0..morph_count {
                let name = decode_shift_jis_fixed(reader.read_bytes(NAME_LEN)?);
                let frame = reader.read_u32()?;
                let weight = reader.read_f32()?;
                morph_keyframes.push((name, MorphKeyframe::new(frame, weight)));
            }
        }

        if config.debug_log {
            log::info!(
                "VMD 解析完成: model={}, bone_keys={}, morph_keys={}",
                model_name,
                bone_keyframes.len(),
                morph_keyframes.len()
            );
        }

        Ok(Self {
            model_name,
            bone_keyframes,
            morph_keyframes,
        })
    }

    /// 按名称整理成关键帧轨道（同帧重复的关键帧后者生效）
    pub fn to_motion(&self) -> Motion {
        let mut motion = Motion::new();
        for (name, keyframe) in &self.bone_keyframes {
            motion.insert_bone_keyframe(name, keyframe.clone());
        }
        for (name, keyframe) in &self.morph_keyframes {
            motion.insert_morph_keyframe(name, keyframe.clone());
        }
        motion
    }

    pub fn to_clip(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> AnimationClip {
        AnimationClip::sampled(id, name, category, self.to_motion())
    }
}

fn read_bone_keyframe(reader: &mut BinaryReader) -> Result<(String, BoneKeyframe), DecodeError> {
    let name = decode_shift_jis_fixed(reader.read_bytes(NAME_LEN)?);
    let frame = reader.read_u32()?;
    let translation: Vec3 = reader.read_vec3()?;
    let rotation = Quat::from_vec4(reader.read_vec4()?);
    let interp = reader.read_bytes(64)?;

    let curve = |axis: usize| {
        BezierCurve::from_vmd_data([
            interp[axis],
            interp[axis + 4],
            interp[axis + 8],
            interp[axis + 12],
        ])
    };

    let rotation = crate::math::normalize_quat(rotation);
    let mut keyframe = BoneKeyframe::with_pose(frame, translation, rotation);
    keyframe.interp_x = curve(0);
    keyframe.interp_y = curve(1);
    keyframe.interp_z = curve(2);
    keyframe.interp_rotation = curve(3);
    Ok((name, keyframe))
}
