use glam::{Mat3, Vec3};

use crate::error::FormatError;
use crate::level::Color;

pub type DecodeResult<T> = Result<T, FormatError>;

/// Forward-only reader over a little-endian byte buffer.
///
/// Every read names what it is reading so truncation errors point at the
/// field that ran out of data.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    fn take(&mut self, len: usize, what: &'static str) -> DecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(FormatError::UnexpectedEof {
                offset: self.pos,
                what,
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, what: &'static str) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    pub fn skip(&mut self, len: usize, what: &'static str) -> DecodeResult<()> {
        self.take(len, what).map(|_| ())
    }

    pub fn read_u8(&mut self, what: &'static str) -> DecodeResult<u8> {
        Ok(self.take_array::<1>(what)?[0])
    }

    pub fn read_bool(&mut self, what: &'static str) -> DecodeResult<bool> {
        Ok(self.read_u8(what)? != 0)
    }

    pub fn read_u16(&mut self, what: &'static str) -> DecodeResult<u16> {
        self.take_array(what).map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self, what: &'static str) -> DecodeResult<u32> {
        self.take_array(what).map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self, what: &'static str) -> DecodeResult<i32> {
        self.take_array(what).map(i32::from_le_bytes)
    }

    pub fn read_f32(&mut self, what: &'static str) -> DecodeResult<f32> {
        self.take_array(what).map(f32::from_le_bytes)
    }

    /// Reads the next four bytes as a `u32` without consuming them.
    pub fn peek_u32(&self) -> Option<u32> {
        let end = self.pos.checked_add(4)?;
        let bytes = self.data.get(self.pos..end)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_vec3(&mut self, what: &'static str) -> DecodeResult<Vec3> {
        let x = self.read_f32(what)?;
        let y = self.read_f32(what)?;
        let z = self.read_f32(what)?;
        Ok(Vec3::new(x, y, z))
    }

    /// Reads a rotation stored as its right, up and forward axes.
    pub fn read_mat3(&mut self, what: &'static str) -> DecodeResult<Mat3> {
        let right = self.read_vec3(what)?;
        let up = self.read_vec3(what)?;
        let forward = self.read_vec3(what)?;
        Ok(Mat3::from_cols(right, up, forward))
    }

    pub fn read_color(&mut self, what: &'static str) -> DecodeResult<Color> {
        let [r, g, b, a] = self.take_array(what)?;
        Ok(Color { r, g, b, a })
    }

    pub fn read_str16(&mut self, what: &'static str) -> DecodeResult<String> {
        let len = self.read_u16(what)? as usize;
        let bytes = self.take(len, what)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Reads bytes up to (and consumes) the next zero byte.
    pub fn read_cstr(&mut self, what: &'static str) -> DecodeResult<String> {
        let start = self.pos;
        let nul = self.data[start..]
            .iter()
            .position(|byte| *byte == 0)
            .ok_or(FormatError::UnterminatedString {
                what,
                offset: start,
            })?;
        let bytes = self.take(nul, what)?;
        self.pos += 1;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Reads a list count and rejects counts that cannot possibly fit in the
    /// remaining bytes given the smallest encoding of one element.
    pub fn read_count(&mut self, what: &'static str, min_element_size: usize) -> DecodeResult<usize> {
        let offset = self.pos;
        let count = self.read_u32(what)?;
        let needed = (count as usize).saturating_mul(min_element_size);
        if needed > self.remaining() {
            return Err(FormatError::ImplausibleCount {
                what,
                count,
                offset,
                remaining: self.remaining(),
            });
        }
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields_in_order() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0xD4BA_DA55u32.to_le_bytes());
        bytes.extend_from_slice(&(-2i32).to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.push(1);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_u32("magic").unwrap(), 0xD4BA_DA55);
        assert_eq!(cursor.read_i32("id").unwrap(), -2);
        assert_eq!(cursor.read_f32("delay").unwrap(), 1.5);
        assert!(cursor.read_bool("flag").unwrap());
        assert!(cursor.is_at_end());
    }

    #[test]
    fn strings_are_length_prefixed_or_null_terminated() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"Level One\0");
        bytes.extend_from_slice(&5u16.to_le_bytes());
        bytes.extend_from_slice(b"hello");
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(cursor.read_cstr("name").unwrap(), "Level One");
        assert_eq!(cursor.read_str16("script").unwrap(), "hello");
        assert!(cursor.is_at_end());
    }

    #[test]
    fn truncated_read_reports_offset_and_field() {
        let bytes = [1u8, 2];
        let mut cursor = Cursor::new(&bytes);
        let err = cursor.read_u32("section length").unwrap_err();
        assert_eq!(
            err,
            FormatError::UnexpectedEof {
                offset: 0,
                what: "section length"
            }
        );
    }

    #[test]
    fn missing_nul_is_an_error() {
        let mut cursor = Cursor::new(b"abc");
        assert!(matches!(
            cursor.read_cstr("name"),
            Err(FormatError::UnterminatedString { offset: 0, .. })
        ));
    }

    #[test]
    fn peek_does_not_consume() {
        let bytes = 7u32.to_le_bytes();
        let cursor = Cursor::new(&bytes);
        assert_eq!(cursor.peek_u32(), Some(7));
        assert_eq!(cursor.position(), 0);
        assert_eq!(Cursor::new(&bytes[..3]).peek_u32(), None);
    }

    #[test]
    fn implausible_count_is_rejected_before_allocation() {
        let bytes = 1_000_000u32.to_le_bytes();
        let mut cursor = Cursor::new(&bytes);
        assert!(matches!(
            cursor.read_count("vertex", 12),
            Err(FormatError::ImplausibleCount { count: 1_000_000, .. })
        ));
    }
}
