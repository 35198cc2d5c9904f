//! 二进制读取器
//!
//! 在内存缓冲区上按显式字节序读取字段，越界统一报告为 `Truncated`。

use std::io::Cursor;
use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use glam::{Vec2, Vec3, Vec4};

use crate::DecodeError;

/// 文本编码（PMX 头部 globals[0]）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEncoding {
    Utf16Le,
    /// UTF-8，旧工具写出的 Shift-JIS 文本也按此标志存储
    Utf8,
}

impl TextEncoding {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TextEncoding::Utf16Le),
            1 => Some(TextEncoding::Utf8),
            _ => None,
        }
    }
}

/// 索引字节宽度
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexSize {
    Byte,
    Short,
    Int,
}

impl IndexSize {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(IndexSize::Byte),
            2 => Some(IndexSize::Short),
            4 => Some(IndexSize::Int),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            IndexSize::Byte => 1,
            IndexSize::Short => 2,
            IndexSize::Int => 4,
        }
    }
}

/// 缓冲区读取器
pub(crate) struct BinaryReader<'a, E: ByteOrder = LittleEndian> {
    cursor: Cursor<&'a [u8]>,
    _order: PhantomData<E>,
}

impl<'a, E: ByteOrder> BinaryReader<'a, E> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            _order: PhantomData,
        }
    }

    pub fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.offset())
    }

    /// 确认剩余字节足够
    pub fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(DecodeError::Truncated {
                offset: self.offset(),
                needed: needed - remaining,
            });
        }
        Ok(())
    }

    fn checked<T>(&self, value: std::io::Result<T>, needed: usize) -> Result<T, DecodeError> {
        value.map_err(|_| DecodeError::Truncated {
            offset: self.offset(),
            needed,
        })
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.ensure(len)?;
        self.cursor.set_position((self.offset() + len) as u64);
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(len)?;
        let start = self.offset();
        let bytes: &'a [u8] = self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&bytes[start..start + len])
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        let value = self.cursor.read_u8();
        self.checked(value, 1)
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        self.ensure(1)?;
        let value = self.cursor.read_i8();
        self.checked(value, 1)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        let value = self.cursor.read_u16::<E>();
        self.checked(value, 2)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        self.ensure(2)?;
        let value = self.cursor.read_i16::<E>();
        self.checked(value, 2)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        let value = self.cursor.read_u32::<E>();
        self.checked(value, 4)
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.ensure(4)?;
        let value = self.cursor.read_i32::<E>();
        self.checked(value, 4)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.ensure(4)?;
        let value = self.cursor.read_f32::<E>();
        self.checked(value, 4)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2, DecodeError> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, DecodeError> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4, DecodeError> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    /// 读取表长度（i32），并按最小记录尺寸检查剩余数据是否足够
    pub fn read_count(
        &mut self,
        kind: &'static str,
        min_record_size: usize,
        max_len: usize,
    ) -> Result<usize, DecodeError> {
        let offset = self.offset();
        let count = self.read_i32()?;
        if count < 0 || count as usize > max_len {
            return Err(DecodeError::InvalidRecord {
                kind,
                value: count as i64,
                offset,
            });
        }
        let count = count as usize;
        self.ensure(count.saturating_mul(min_record_size))?;
        Ok(count)
    }

    /// 读取有符号索引，-1 表示"无"
    pub fn read_index(&mut self, size: IndexSize) -> Result<Option<usize>, DecodeError> {
        let offset = self.offset();
        let value = match size {
            IndexSize::Byte => self.read_i8()? as i32,
            IndexSize::Short => self.read_i16()? as i32,
            IndexSize::Int => self.read_i32()?,
        };
        match value {
            -1 => Ok(None),
            v if v < 0 => Err(DecodeError::InvalidRecord {
                kind: "index",
                value: v as i64,
                offset,
            }),
            v => Ok(Some(v as usize)),
        }
    }

    /// 读取顶点索引（1/2 字节为无符号，4 字节为有符号）
    pub fn read_vertex_index(&mut self, size: IndexSize) -> Result<u32, DecodeError> {
        let offset = self.offset();
        match size {
            IndexSize::Byte => Ok(self.read_u8()? as u32),
            IndexSize::Short => Ok(self.read_u16()? as u32),
            IndexSize::Int => {
                let value = self.read_i32()?;
                if value < 0 {
                    return Err(DecodeError::InvalidRecord {
                        kind: "vertex index",
                        value: value as i64,
                        offset,
                    });
                }
                Ok(value as u32)
            }
        }
    }

    /// 读取长度前缀文本
    pub fn read_text(&mut self, encoding: TextEncoding) -> Result<String, DecodeError> {
        let offset = self.offset();
        let len = self.read_i32()?;
        if len < 0 {
            return Err(DecodeError::InvalidRecord {
                kind: "text length",
                value: len as i64,
                offset,
            });
        }
        let bytes = self.read_bytes(len as usize)?;
        decode_text(bytes, encoding).ok_or(DecodeError::InvalidText { offset })
    }
}

/// 按编码解码文本，无法解码时返回 None
pub(crate) fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf16Le => {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = bytes.chunks_exact(2).map(LittleEndian::read_u16).collect();
            String::from_utf16(&units).ok()
        }
        TextEncoding::Utf8 => match std::str::from_utf8(bytes) {
            Ok(text) => Some(text.to_owned()),
            Err(_) => {
                let decoded = encoding_rs::SHIFT_JIS
                    .decode_without_bom_handling_and_without_replacement(bytes)?;
                log::warn!("文本不是 UTF-8，按 Shift-JIS 解码: {}", decoded);
                Some(decoded.into_owned())
            }
        },
    }
}

/// 解码定长 Shift-JIS 字段（以 NUL 结尾，截断的末尾字符按替换字符处理）
pub(crate) fn decode_shift_jis_fixed(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes[..end]);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian_fields() {
        let bytes = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3f];
        let mut reader: BinaryReader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let bytes = [0x01, 0x02];
        let mut reader: BinaryReader = BinaryReader::new(&bytes);
        reader.read_u8().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert_eq!(err, DecodeError::Truncated { offset: 1, needed: 3 });
    }

    #[test]
    fn test_read_index_none_and_negative() {
        let bytes = [0xff, 0xfe];
        let mut reader: BinaryReader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_index(IndexSize::Byte).unwrap(), None);
        assert!(matches!(
            reader.read_index(IndexSize::Byte),
            Err(DecodeError::InvalidRecord { value: -2, .. })
        ));
    }

    #[test]
    fn test_vertex_index_short_is_unsigned() {
        let bytes = [0xff, 0xff];
        let mut reader: BinaryReader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_vertex_index(IndexSize::Short).unwrap(), 65535);
    }

    #[test]
    fn test_decode_utf16le() {
        let bytes: Vec<u8> = "笑顔".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(decode_text(&bytes, TextEncoding::Utf16Le).as_deref(), Some("笑顔"));
        assert_eq!(decode_text(&bytes[..3], TextEncoding::Utf16Le), None);
    }

    #[test]
    fn test_decode_shift_jis_fallback() {
        // "センター" in Shift-JIS
        let bytes = [0x83, 0x5a, 0x83, 0x93, 0x83, 0x5e, 0x81, 0x5b];
        assert_eq!(decode_text(&bytes, TextEncoding::Utf8).as_deref(), Some("センター"));
    }

    #[test]
    fn test_decode_invalid_text() {
        // 既不是 UTF-8 也不是合法 Shift-JIS
        let bytes = [0xff, 0xff, 0xff];
        assert_eq!(decode_text(&bytes, TextEncoding::Utf8), None);
    }

    #[test]
    fn test_fixed_shift_jis_stops_at_nul() {
        let mut bytes = [0u8; 15];
        bytes[..8].copy_from_slice(&[0x83, 0x5a, 0x83, 0x93, 0x83, 0x5e, 0x81, 0x5b]);
        assert_eq!(decode_shift_jis_fixed(&bytes), "センター");
    }
}
