//! PMX 模型解码器
//!
//! 支持 PMX 2.0 / 2.1，按顺序读取头部、模型信息、顶点、面、纹理、材质、骨骼和 Morph。
//! Morph 之后的显示帧、刚体和关节不解码。坐标保持文件空间，不做 Z 轴翻转。

use std::path::Path;

use glam::Vec3;

use crate::config::{get_config, EngineConfig};
use crate::morph::{GroupMorphEntry, MorphCategory, MorphDef, MorphType, VertexMorphOffset};
use crate::skeleton::{BoneDef, BoneFlags, IkConfig, IkLink};
use crate::{DecodeError, Result};

use super::material::{Material, SphereMode, ToonRef};
use super::reader::{BinaryReader, IndexSize, TextEncoding};
use super::{Face, Model, ModelHeader, ModelInfo, ModelParts, Vertex};

/// 文件签名
pub const PMX_SIGNATURE: &[u8; 4] = b"PMX ";

/// 支持的版本
const SUPPORTED_VERSIONS: [f32; 2] = [2.0, 2.1];

type PmxReader<'a> = BinaryReader<'a>;

/// 从内存解码 PMX（使用全局配置）
pub fn decode(bytes: &[u8]) -> std::result::Result<Model, DecodeError> {
    decode_with_config(bytes, &get_config())
}

/// 从内存加载模型
pub fn load_model(bytes: &[u8]) -> std::result::Result<Model, DecodeError> {
    decode(bytes)
}

/// 从文件加载 PMX 模型
pub fn load_pmx<P: AsRef<Path>>(path: P) -> Result<Model> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(decode(&bytes)?)
}

/// 从内存解码 PMX（显式配置）
pub fn decode_with_config(
    bytes: &[u8],
    config: &EngineConfig,
) -> std::result::Result<Model, DecodeError> {
    check_signature(bytes)?;

    let mut reader = PmxReader::new(bytes);
    reader.skip(PMX_SIGNATURE.len())?;
    let header = read_header(&mut reader)?;
    let encoding = header.encoding;

    let info = ModelInfo {
        name: reader.read_text(encoding)?,
        name_en: reader.read_text(encoding)?,
        comment: reader.read_text(encoding)?,
        comment_en: reader.read_text(encoding)?,
    };

    let vertices = read_vertices(&mut reader, &header, config)?;
    let faces = read_faces(&mut reader, &header, config)?;
    let textures = read_textures(&mut reader, &header, config)?;
    let materials = read_materials(&mut reader, &header, config)?;
    let bones = read_bones(&mut reader, &header, config)?;
    let morphs = read_morphs(&mut reader, &header, config)?;

    let model = Model::assemble(
        ModelParts {
            header,
            info,
            vertices,
            faces,
            textures,
            materials,
            bones,
            morphs,
        },
        config,
    )?;

    if config.debug_log {
        log::info!(
            "PMX 解码完成: {} (顶点 {}, 面 {}, 材质 {}, 骨骼 {}, Morph {})",
            model.name(),
            model.vertices().len(),
            model.faces().len(),
            model.materials().len(),
            model.bones().len(),
            model.morphs().len()
        );
    }

    Ok(model)
}

/// 签名不符一律报错；缓冲区是签名的真前缀时报告截断
fn check_signature(bytes: &[u8]) -> std::result::Result<(), DecodeError> {
    let len = bytes.len().min(4);
    if bytes[..len] != PMX_SIGNATURE[..len] {
        let mut found = [0u8; 4];
        found[..len].copy_from_slice(&bytes[..len]);
        return Err(DecodeError::InvalidSignature { found });
    }
    if len < 4 {
        return Err(DecodeError::Truncated {
            offset: len,
            needed: 4 - len,
        });
    }
    Ok(())
}

fn read_header(r: &mut PmxReader) -> std::result::Result<ModelHeader, DecodeError> {
    let version = r.read_f32()?;
    if !SUPPORTED_VERSIONS.iter().any(|v| (version - v).abs() < 1e-3) {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let globals_count = r.read_u8()? as usize;
    if globals_count < 8 {
        return Err(DecodeError::InvalidHeader(format!(
            "globals count {} (expected at least 8)",
            globals_count
        )));
    }
    let globals = r.read_bytes(globals_count)?;

    let encoding = TextEncoding::from_u8(globals[0])
        .ok_or_else(|| DecodeError::InvalidHeader(format!("text encoding {}", globals[0])))?;
    let additional_vec4_count = globals[1];
    if additional_vec4_count > 4 {
        return Err(DecodeError::InvalidHeader(format!(
            "additional vec4 count {}",
            additional_vec4_count
        )));
    }
    let index_size = |slot: usize, kind: &str| {
        IndexSize::from_u8(globals[slot]).ok_or_else(|| {
            DecodeError::InvalidHeader(format!("{} index size {}", kind, globals[slot]))
        })
    };

    Ok(ModelHeader {
        signature: *PMX_SIGNATURE,
        version,
        encoding,
        additional_vec4_count,
        vertex_index_size: index_size(2, "vertex")?,
        texture_index_size: index_size(3, "texture")?,
        material_index_size: index_size(4, "material")?,
        bone_index_size: index_size(5, "bone")?,
        morph_index_size: index_size(6, "morph")?,
        rigid_body_index_size: index_size(7, "rigid body")?,
    })
}

/// 读取有符号索引并转成 i32（-1 表示无）
fn read_signed_index(r: &mut PmxReader, size: IndexSize) -> std::result::Result<i32, DecodeError> {
    Ok(r.read_index(size)?.map_or(-1, |i| i as i32))
}

// ========== 顶点 ==========

fn read_vertices(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<Vec<Vertex>, DecodeError> {
    // position + normal + uv + deform tag + edge scale
    let min_size = 12 + 12 + 8 + 1 + 4;
    let count = r.read_count("vertex count", min_size, config.max_table_len)?;
    let mut vertices = Vec::with_capacity(count);
    for _ in 0..count {
        vertices.push(read_vertex(r, header)?);
    }
    Ok(vertices)
}

fn read_vertex(
    r: &mut PmxReader,
    header: &ModelHeader,
) -> std::result::Result<Vertex, DecodeError> {
    let position = r.read_vec3()?;
    let normal = r.read_vec3()?;
    let uv = r.read_vec2()?;
    r.skip(16 * header.additional_vec4_count as usize)?;

    let bone_size = header.bone_index_size;
    let deform_offset = r.offset();
    let deform = r.read_u8()?;
    let (bones, weights) = match deform {
        // BDEF1
        0 => {
            let b0 = r.read_index(bone_size)?;
            ([b0, None, None, None], [1.0, 0.0, 0.0, 0.0])
        }
        // BDEF2
        1 => {
            let b0 = r.read_index(bone_size)?;
            let b1 = r.read_index(bone_size)?;
            let w0 = r.read_f32()?;
            ([b0, b1, None, None], [w0, 1.0 - w0, 0.0, 0.0])
        }
        // BDEF4 / QDEF
        2 | 4 => {
            let b = [
                r.read_index(bone_size)?,
                r.read_index(bone_size)?,
                r.read_index(bone_size)?,
                r.read_index(bone_size)?,
            ];
            let w = [r.read_f32()?, r.read_f32()?, r.read_f32()?, r.read_f32()?];
            (b, w)
        }
        // SDEF：C / R0 / R1 不参与线性蒙皮
        3 => {
            let b0 = r.read_index(bone_size)?;
            let b1 = r.read_index(bone_size)?;
            let w0 = r.read_f32()?;
            r.skip(12 * 3)?;
            ([b0, b1, None, None], [w0, 1.0 - w0, 0.0, 0.0])
        }
        other => {
            return Err(DecodeError::InvalidRecord {
                kind: "weight deform",
                value: other as i64,
                offset: deform_offset,
            })
        }
    };
    let edge_scale = r.read_f32()?;

    // 无骨骼的槽位权重清零
    let mut skin_indices = [0u32; 4];
    let mut skin_weights = [0.0f32; 4];
    for slot in 0..4 {
        if let Some(bone) = bones[slot] {
            skin_indices[slot] = bone as u32;
            skin_weights[slot] = weights[slot];
        }
    }

    Ok(Vertex {
        position,
        normal,
        uv,
        skin_indices,
        skin_weights,
        edge_scale,
    })
}

// ========== 面 / 纹理 ==========

fn read_faces(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<Vec<Face>, DecodeError> {
    let size = header.vertex_index_size;
    let offset = r.offset();
    let index_count = r.read_count("face index count", size.bytes(), config.max_table_len)?;
    if index_count % 3 != 0 {
        return Err(DecodeError::InvalidRecord {
            kind: "face index count",
            value: index_count as i64,
            offset,
        });
    }
    let mut faces = Vec::with_capacity(index_count / 3);
    for _ in 0..index_count / 3 {
        faces.push([
            r.read_vertex_index(size)?,
            r.read_vertex_index(size)?,
            r.read_vertex_index(size)?,
        ]);
    }
    Ok(faces)
}

fn read_textures(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<Vec<String>, DecodeError> {
    let count = r.read_count("texture count", 4, config.max_table_len)?;
    let mut textures = Vec::with_capacity(count);
    for _ in 0..count {
        textures.push(normalize_path(&r.read_text(header.encoding)?));
    }
    Ok(textures)
}

/// 统一路径分隔符
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

// ========== 材质 ==========

fn read_materials(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<Vec<Material>, DecodeError> {
    let count = r.read_count("material count", 4, config.max_table_len)?;
    let mut materials = Vec::with_capacity(count);
    let mut index_offset = 0u32;
    for _ in 0..count {
        let mut material = read_material(r, header)?;
        material.index_offset = index_offset;
        index_offset = index_offset.saturating_add(material.index_count);
        materials.push(material);
    }
    Ok(materials)
}

fn read_material(
    r: &mut PmxReader,
    header: &ModelHeader,
) -> std::result::Result<Material, DecodeError> {
    let encoding = header.encoding;
    let name = r.read_text(encoding)?;
    let name_en = r.read_text(encoding)?;
    let diffuse = r.read_vec4()?;
    let specular = r.read_vec3()?;
    let specular_strength = r.read_f32()?;
    let ambient = r.read_vec3()?;
    let draw_flags = r.read_u8()?;
    let edge_color = r.read_vec4()?;
    let edge_scale = r.read_f32()?;
    let texture_index = read_signed_index(r, header.texture_index_size)?;
    let sphere_index = read_signed_index(r, header.texture_index_size)?;

    let sphere_offset = r.offset();
    let sphere_value = r.read_u8()?;
    let sphere_mode = SphereMode::from_u8(sphere_value).ok_or(DecodeError::InvalidRecord {
        kind: "sphere mode",
        value: sphere_value as i64,
        offset: sphere_offset,
    })?;

    let toon_offset = r.offset();
    let toon = match r.read_u8()? {
        0 => ToonRef::Texture(read_signed_index(r, header.texture_index_size)?),
        1 => ToonRef::Shared(r.read_u8()?),
        other => {
            return Err(DecodeError::InvalidRecord {
                kind: "toon flag",
                value: other as i64,
                offset: toon_offset,
            })
        }
    };
    let memo = r.read_text(encoding)?;

    let count_offset = r.offset();
    let index_count = r.read_i32()?;
    if index_count < 0 {
        return Err(DecodeError::InvalidRecord {
            kind: "material index count",
            value: index_count as i64,
            offset: count_offset,
        });
    }

    Ok(Material {
        name,
        name_en,
        diffuse,
        specular,
        specular_strength,
        ambient,
        draw_flags,
        edge_color,
        edge_scale,
        texture_index,
        sphere_index,
        sphere_mode,
        toon,
        memo,
        index_offset: 0,
        index_count: index_count as u32,
    })
}

// ========== 骨骼 ==========

fn read_bones(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<Vec<BoneDef>, DecodeError> {
    let count = r.read_count("bone count", 8, config.max_table_len)?;
    let mut bones = Vec::with_capacity(count);
    for _ in 0..count {
        bones.push(read_bone(r, header, config)?);
    }
    Ok(bones)
}

fn read_bone(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<BoneDef, DecodeError> {
    let bone_size = header.bone_index_size;
    let name = r.read_text(header.encoding)?;
    let name_en = r.read_text(header.encoding)?;
    let rest_position = r.read_vec3()?;
    let parent_index = read_signed_index(r, bone_size)?;
    let transform_level = r.read_i32()?;
    let flags = BoneFlags(r.read_u16()?);

    // 尾端：骨骼索引或偏移
    if flags.contains(BoneFlags::TAIL_IS_BONE) {
        r.read_index(bone_size)?;
    } else {
        r.skip(12)?;
    }
    // 付与（继承）父骨骼 + 比率
    if flags.contains(BoneFlags::INHERIT_ROTATION)
        || flags.contains(BoneFlags::INHERIT_TRANSLATION)
    {
        r.read_index(bone_size)?;
        r.skip(4)?;
    }
    if flags.contains(BoneFlags::FIXED_AXIS) {
        r.skip(12)?;
    }
    if flags.contains(BoneFlags::LOCAL_AXIS) {
        r.skip(24)?;
    }
    if flags.contains(BoneFlags::EXTERNAL_PARENT) {
        r.skip(4)?;
    }

    let ik = if flags.is_ik() {
        Some(read_ik(r, bone_size, config)?)
    } else {
        None
    };

    Ok(BoneDef {
        name,
        name_en,
        rest_position,
        parent_index,
        transform_level,
        flags,
        ik,
    })
}

fn read_ik(
    r: &mut PmxReader,
    bone_size: IndexSize,
    config: &EngineConfig,
) -> std::result::Result<IkConfig, DecodeError> {
    let target_bone = read_signed_index(r, bone_size)?;
    let loop_offset = r.offset();
    let iterations = r.read_i32()?;
    if iterations < 0 {
        return Err(DecodeError::InvalidRecord {
            kind: "ik loop count",
            value: iterations as i64,
            offset: loop_offset,
        });
    }
    let limit_angle = r.read_f32()?;
    let link_count = r.read_count("ik link count", bone_size.bytes() + 1, config.max_table_len)?;
    let mut links = Vec::with_capacity(link_count);
    for _ in 0..link_count {
        let bone_index = read_signed_index(r, bone_size)?;
        let flag_offset = r.offset();
        let limits = match r.read_u8()? {
            0 => None,
            1 => Some((r.read_vec3()?, r.read_vec3()?)),
            other => {
                return Err(DecodeError::InvalidRecord {
                    kind: "ik limit flag",
                    value: other as i64,
                    offset: flag_offset,
                })
            }
        };
        links.push(IkLink { bone_index, limits });
    }

    Ok(IkConfig {
        target_bone,
        iterations: iterations as u32,
        limit_angle,
        links,
    })
}

// ========== Morph ==========

fn read_morphs(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<Vec<MorphDef>, DecodeError> {
    let count = r.read_count("morph count", 4 + 4 + 1 + 1 + 4, config.max_table_len)?;
    let mut morphs = Vec::with_capacity(count);
    for _ in 0..count {
        morphs.push(read_morph(r, header, config)?);
    }
    Ok(morphs)
}

fn read_morph(
    r: &mut PmxReader,
    header: &ModelHeader,
    config: &EngineConfig,
) -> std::result::Result<MorphDef, DecodeError> {
    let name = r.read_text(header.encoding)?;
    let name_en = r.read_text(header.encoding)?;

    let panel_offset = r.offset();
    let panel = r.read_u8()?;
    let category = MorphCategory::from_panel(panel).ok_or(DecodeError::InvalidRecord {
        kind: "morph panel",
        value: panel as i64,
        offset: panel_offset,
    })?;

    let type_offset = r.offset();
    let type_value = r.read_u8()?;
    let morph_type = MorphType::from_u8(type_value).ok_or(DecodeError::InvalidRecord {
        kind: "morph type",
        value: type_value as i64,
        offset: type_offset,
    })?;

    let mut morph = MorphDef::new(name, category, morph_type);
    morph.name_en = name_en;

    let count = r.read_count("morph offset count", 1, config.max_table_len)?;
    match morph_type {
        MorphType::Group => {
            morph.group_entries.reserve(count);
            for _ in 0..count {
                let entry_offset = r.offset();
                let morph_index = r.read_index(header.morph_index_size)?.ok_or(
                    DecodeError::InvalidRecord {
                        kind: "group morph index",
                        value: -1,
                        offset: entry_offset,
                    },
                )?;
                let influence = r.read_f32()?;
                morph.group_entries.push(GroupMorphEntry {
                    morph_index: morph_index as u32,
                    influence,
                });
            }
        }
        MorphType::Vertex => {
            morph.vertex_offsets.reserve(count);
            for _ in 0..count {
                let vertex_index = r.read_vertex_index(header.vertex_index_size)?;
                let offset: Vec3 = r.read_vec3()?;
                morph.vertex_offsets.push(VertexMorphOffset {
                    vertex_index,
                    offset,
                });
            }
        }
        // 其余类型只跳过
        _ => {
            let record_size = skipped_offset_size(morph_type, header);
            r.skip(count.saturating_mul(record_size))?;
        }
    }

    Ok(morph)
}

/// 不解码的 Morph 偏移记录大小
fn skipped_offset_size(morph_type: MorphType, header: &ModelHeader) -> usize {
    match morph_type {
        // 骨骼索引 + 平移 + 旋转
        MorphType::Bone => header.bone_index_size.bytes() + 12 + 16,
        MorphType::Uv
        | MorphType::AdditionalUv1
        | MorphType::AdditionalUv2
        | MorphType::AdditionalUv3
        | MorphType::AdditionalUv4 => header.vertex_index_size.bytes() + 16,
        // 材质索引 + 运算方式 + 28 个 f32
        MorphType::Material => header.material_index_size.bytes() + 1 + 28 * 4,
        MorphType::Flip => header.morph_index_size.bytes() + 4,
        // 刚体索引 + 局部标志 + 速度 + 扭矩
        MorphType::Impulse => header.rigid_body_index_size.bytes() + 1 + 24,
        MorphType::Group => header.morph_index_size.bytes() + 4,
        MorphType::Vertex => header.vertex_index_size.bytes() + 12,
    }
}
