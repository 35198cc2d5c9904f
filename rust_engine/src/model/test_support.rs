//! 测试用 PMX 字节构建器

use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};

use super::{decode, Model};
use crate::skeleton::BoneFlags;

type Le = LittleEndian;

#[derive(Clone, Debug)]
pub(crate) enum TestDeform {
    Bdef1(i32),
    Bdef2(i32, i32, f32),
    Bdef4([i32; 4], [f32; 4]),
    Sdef(i32, i32, f32),
}

#[derive(Clone, Debug)]
pub(crate) struct TestVertex {
    pub position: [f32; 3],
    pub deform: TestDeform,
}

impl TestVertex {
    pub fn new(position: [f32; 3], deform: TestDeform) -> Self {
        Self { position, deform }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct TestMaterial {
    pub name: String,
    pub index_count: i32,
}

#[derive(Clone, Debug)]
pub(crate) struct TestBone {
    pub name: String,
    pub position: [f32; 3],
    pub parent: i32,
    pub flags: u16,
    pub ik_links: Vec<(i32, Option<([f32; 3], [f32; 3])>)>,
}

impl TestBone {
    pub fn new(name: &str, position: [f32; 3], parent: i32) -> Self {
        Self {
            name: name.to_string(),
            position,
            parent,
            flags: BoneFlags::ROTATABLE | BoneFlags::VISIBLE | BoneFlags::ENABLED,
            ik_links: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum TestMorphKind {
    Vertex(Vec<(u32, [f32; 3])>),
    Group(Vec<(i32, f32)>),
    Bone(i32),
    Material(i32),
}

#[derive(Clone, Debug)]
pub(crate) struct TestMorph {
    pub name: String,
    pub panel: u8,
    pub kind: TestMorphKind,
}

impl TestMorph {
    pub fn vertex(name: &str, panel: u8, offsets: Vec<(u32, [f32; 3])>) -> Self {
        Self {
            name: name.to_string(),
            panel,
            kind: TestMorphKind::Vertex(offsets),
        }
    }

    pub fn group(name: &str, entries: Vec<(i32, f32)>) -> Self {
        Self {
            name: name.to_string(),
            panel: 4,
            kind: TestMorphKind::Group(entries),
        }
    }

    pub fn bone(name: &str, bone: i32) -> Self {
        Self {
            name: name.to_string(),
            panel: 4,
            kind: TestMorphKind::Bone(bone),
        }
    }

    pub fn material(name: &str, material: i32) -> Self {
        Self {
            name: name.to_string(),
            panel: 4,
            kind: TestMorphKind::Material(material),
        }
    }
}

/// 按 PMX 2.0 布局写出字节
#[derive(Clone, Debug)]
pub(crate) struct PmxBuilder {
    pub version: f32,
    pub encoding: u8,
    pub vertex_index_size: u8,
    pub texture_index_size: u8,
    pub material_index_size: u8,
    pub bone_index_size: u8,
    pub morph_index_size: u8,
    pub rigid_body_index_size: u8,
    pub name: String,
    /// 直接写入的名称字节（用于构造非法文本）
    pub raw_name: Option<Vec<u8>>,
    pub vertex_count_override: Option<i32>,
    pub vertices: Vec<TestVertex>,
    pub faces: Vec<[u32; 3]>,
    pub textures: Vec<String>,
    pub materials: Vec<TestMaterial>,
    pub bones: Vec<TestBone>,
    pub morphs: Vec<TestMorph>,
}

impl PmxBuilder {
    /// 一个四边形、三根骨骼（センター → 上半身 → 頭）和三个 Morph
    pub fn sample() -> Self {
        Self {
            version: 2.0,
            encoding: 0,
            vertex_index_size: 2,
            texture_index_size: 1,
            material_index_size: 1,
            bone_index_size: 2,
            morph_index_size: 2,
            rigid_body_index_size: 1,
            name: "テストモデル".to_string(),
            raw_name: None,
            vertex_count_override: None,
            vertices: vec![
                TestVertex::new([0.0, 0.0, 0.0], TestDeform::Bdef1(0)),
                TestVertex::new([1.0, 0.0, 0.0], TestDeform::Bdef2(0, 1, 0.5)),
                TestVertex::new([1.0, 1.0, 0.0], TestDeform::Bdef1(1)),
                TestVertex::new(
                    [0.0, 2.0, 0.0],
                    TestDeform::Bdef4([2, 1, -1, -1], [0.75, 0.25, 0.0, 0.0]),
                ),
            ],
            faces: vec![[0, 1, 2], [0, 2, 3]],
            textures: vec!["tex\\body.png".to_string()],
            materials: vec![TestMaterial {
                name: "body".to_string(),
                index_count: 6,
            }],
            bones: vec![
                TestBone::new("センター", [0.0, 0.0, 0.0], -1),
                TestBone::new("上半身", [0.0, 1.0, 0.0], 0),
                TestBone::new("頭", [0.0, 2.0, 0.0], 1),
            ],
            morphs: vec![
                TestMorph::vertex("笑顔", 2, vec![(3, [0.0, 0.5, 0.0])]),
                TestMorph::vertex("まばたき", 2, vec![(2, [0.0, -0.25, 0.0]), (3, [0.0, -0.25, 0.0])]),
                TestMorph::group("表情", vec![(0, 1.0), (1, 0.5)]),
            ],
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"PMX ");
        out.write_f32::<Le>(self.version).unwrap();
        out.push(8);
        out.extend_from_slice(&[
            self.encoding,
            0,
            self.vertex_index_size,
            self.texture_index_size,
            self.material_index_size,
            self.bone_index_size,
            self.morph_index_size,
            self.rigid_body_index_size,
        ]);

        match &self.raw_name {
            Some(raw) => {
                out.write_i32::<Le>(raw.len() as i32).unwrap();
                out.extend_from_slice(raw);
            }
            None => self.text(&mut out, &self.name),
        }
        self.text(&mut out, "test model");
        self.text(&mut out, "コメント");
        self.text(&mut out, "comment");

        // 顶点
        let vertex_count = self
            .vertex_count_override
            .unwrap_or(self.vertices.len() as i32);
        out.write_i32::<Le>(vertex_count).unwrap();
        for v in &self.vertices {
            for c in v.position {
                out.write_f32::<Le>(c).unwrap();
            }
            for c in [0.0, 1.0, 0.0] {
                out.write_f32::<Le>(c).unwrap();
            }
            out.write_f32::<Le>(0.0).unwrap();
            out.write_f32::<Le>(0.0).unwrap();
            match &v.deform {
                TestDeform::Bdef1(b) => {
                    out.push(0);
                    self.index(&mut out, self.bone_index_size, *b);
                }
                TestDeform::Bdef2(b0, b1, w) => {
                    out.push(1);
                    self.index(&mut out, self.bone_index_size, *b0);
                    self.index(&mut out, self.bone_index_size, *b1);
                    out.write_f32::<Le>(*w).unwrap();
                }
                TestDeform::Bdef4(bones, weights) => {
                    out.push(2);
                    for b in bones {
                        self.index(&mut out, self.bone_index_size, *b);
                    }
                    for w in weights {
                        out.write_f32::<Le>(*w).unwrap();
                    }
                }
                TestDeform::Sdef(b0, b1, w) => {
                    out.push(3);
                    self.index(&mut out, self.bone_index_size, *b0);
                    self.index(&mut out, self.bone_index_size, *b1);
                    out.write_f32::<Le>(*w).unwrap();
                    for _ in 0..9 {
                        out.write_f32::<Le>(0.0).unwrap();
                    }
                }
            }
            out.write_f32::<Le>(1.0).unwrap();
        }

        // 面
        out.write_i32::<Le>((self.faces.len() * 3) as i32).unwrap();
        for face in &self.faces {
            for &i in face {
                self.vertex_index(&mut out, i);
            }
        }

        // 纹理
        out.write_i32::<Le>(self.textures.len() as i32).unwrap();
        for path in &self.textures {
            self.text(&mut out, path);
        }

        // 材质
        out.write_i32::<Le>(self.materials.len() as i32).unwrap();
        for m in &self.materials {
            self.text(&mut out, &m.name);
            self.text(&mut out, "");
            for c in [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 5.0, 0.5, 0.5, 0.5] {
                out.write_f32::<Le>(c).unwrap();
            }
            out.push(0x01 | 0x10);
            for c in [0.0, 0.0, 0.0, 1.0, 1.0] {
                out.write_f32::<Le>(c).unwrap();
            }
            self.index(&mut out, self.texture_index_size, 0);
            self.index(&mut out, self.texture_index_size, -1);
            out.push(0);
            out.push(1);
            out.push(0);
            self.text(&mut out, "");
            out.write_i32::<Le>(m.index_count).unwrap();
        }

        // 骨骼
        out.write_i32::<Le>(self.bones.len() as i32).unwrap();
        for b in &self.bones {
            self.text(&mut out, &b.name);
            self.text(&mut out, "");
            for c in b.position {
                out.write_f32::<Le>(c).unwrap();
            }
            self.index(&mut out, self.bone_index_size, b.parent);
            out.write_i32::<Le>(0).unwrap();
            out.write_u16::<Le>(b.flags).unwrap();
            if b.flags & BoneFlags::TAIL_IS_BONE != 0 {
                self.index(&mut out, self.bone_index_size, -1);
            } else {
                for _ in 0..3 {
                    out.write_f32::<Le>(0.0).unwrap();
                }
            }
            if b.flags & (BoneFlags::INHERIT_ROTATION | BoneFlags::INHERIT_TRANSLATION) != 0 {
                self.index(&mut out, self.bone_index_size, 0);
                out.write_f32::<Le>(0.5).unwrap();
            }
            if b.flags & BoneFlags::FIXED_AXIS != 0 {
                for _ in 0..3 {
                    out.write_f32::<Le>(0.0).unwrap();
                }
            }
            if b.flags & BoneFlags::LOCAL_AXIS != 0 {
                for _ in 0..6 {
                    out.write_f32::<Le>(0.0).unwrap();
                }
            }
            if b.flags & BoneFlags::EXTERNAL_PARENT != 0 {
                out.write_i32::<Le>(0).unwrap();
            }
            if b.flags & BoneFlags::IK != 0 {
                self.index(&mut out, self.bone_index_size, 0);
                out.write_i32::<Le>(40).unwrap();
                out.write_f32::<Le>(2.0).unwrap();
                out.write_i32::<Le>(b.ik_links.len() as i32).unwrap();
                for (bone, limits) in &b.ik_links {
                    self.index(&mut out, self.bone_index_size, *bone);
                    match limits {
                        Some((min, max)) => {
                            out.push(1);
                            for c in min.iter().chain(max.iter()) {
                                out.write_f32::<Le>(*c).unwrap();
                            }
                        }
                        None => out.push(0),
                    }
                }
            }
        }

        // Morph
        out.write_i32::<Le>(self.morphs.len() as i32).unwrap();
        for m in &self.morphs {
            self.text(&mut out, &m.name);
            self.text(&mut out, "");
            out.push(m.panel);
            match &m.kind {
                TestMorphKind::Vertex(offsets) => {
                    out.push(1);
                    out.write_i32::<Le>(offsets.len() as i32).unwrap();
                    for (vertex, delta) in offsets {
                        self.vertex_index(&mut out, *vertex);
                        for c in delta {
                            out.write_f32::<Le>(*c).unwrap();
                        }
                    }
                }
                TestMorphKind::Group(entries) => {
                    out.push(0);
                    out.write_i32::<Le>(entries.len() as i32).unwrap();
                    for (morph, influence) in entries {
                        self.index(&mut out, self.morph_index_size, *morph);
                        out.write_f32::<Le>(*influence).unwrap();
                    }
                }
                TestMorphKind::Bone(bone) => {
                    out.push(2);
                    out.write_i32::<Le>(1).unwrap();
                    self.index(&mut out, self.bone_index_size, *bone);
                    for c in [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0] {
                        out.write_f32::<Le>(c).unwrap();
                    }
                }
                TestMorphKind::Material(material) => {
                    out.push(8);
                    out.write_i32::<Le>(1).unwrap();
                    self.index(&mut out, self.material_index_size, *material);
                    out.push(0);
                    for _ in 0..28 {
                        out.write_f32::<Le>(0.0).unwrap();
                    }
                }
            }
        }

        // 显示帧 / 刚体 / 关节（解码器不读取）
        for _ in 0..3 {
            out.write_i32::<Le>(0).unwrap();
        }
        out
    }

    /// 解码成共享模型
    pub fn model(&self) -> Arc<Model> {
        Arc::new(decode(&self.build()).unwrap())
    }

    fn text(&self, out: &mut Vec<u8>, text: &str) {
        let bytes: Vec<u8> = if self.encoding == 0 {
            text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
        } else {
            text.as_bytes().to_vec()
        };
        out.write_i32::<Le>(bytes.len() as i32).unwrap();
        out.extend_from_slice(&bytes);
    }

    fn index(&self, out: &mut Vec<u8>, size: u8, value: i32) {
        match size {
            1 => out.write_i8(value as i8).unwrap(),
            2 => out.write_i16::<Le>(value as i16).unwrap(),
            _ => out.write_i32::<Le>(value).unwrap(),
        }
    }

    fn vertex_index(&self, out: &mut Vec<u8>, value: u32) {
        match self.vertex_index_size {
            1 => out.write_u8(value as u8).unwrap(),
            2 => out.write_u16::<Le>(value as u16).unwrap(),
            _ => out.write_i32::<Le>(value as i32).unwrap(),
        }
    }
}
