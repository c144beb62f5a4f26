//! # Packet Serialization
//!
//! Little-endian primitive encoding shared by every record.
//!
//! ## Layout
//!
//! | Type     | Encoding                          |
//! |----------|-----------------------------------|
//! | integers | little-endian, fixed width        |
//! | `bool`   | one byte, 0 or 1                  |
//! | string   | `u16` byte length + UTF-8         |
//! | array    | `u16` count + records             |
//! | `Vec2`   | `f32` x, `f32` z                  |

use lanewar_core::Vec2;

use crate::error::{ProtocolError, ProtocolResult};

/// Packet writer. Reuse across packets with [`PacketWriter::reset`].
#[derive(Debug, Default)]
pub struct PacketWriter {
    buffer: Vec<u8>,
}

impl PacketWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Clears the buffer, keeping its allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing was written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a boolean as one byte.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Writes a u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a position.
    #[inline]
    pub fn write_vec2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.z);
    }

    /// Writes a length-prefixed string.
    ///
    /// # Errors
    ///
    /// `TooLong` past `u16::MAX` bytes; nothing is written.
    pub fn write_str(&mut self, field: &'static str, value: &str) -> ProtocolResult<()> {
        self.write_len(field, value.len())?;
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes an array count.
    ///
    /// # Errors
    ///
    /// `TooLong` past `u16::MAX` entries.
    pub fn write_len(&mut self, field: &'static str, len: usize) -> ProtocolResult<()> {
        let len = u16::try_from(len).map_err(|_| ProtocolError::TooLong { field, len })?;
        self.write_u16(len);
        Ok(())
    }

    /// Writes a count-prefixed array with `write_item` per element.
    ///
    /// # Errors
    ///
    /// `TooLong` for the count, or the first item error.
    pub fn write_array<T>(
        &mut self,
        field: &'static str,
        items: &[T],
        mut write_item: impl FnMut(&mut Self, &T) -> ProtocolResult<()>,
    ) -> ProtocolResult<()> {
        self.write_len(field, items.len())?;
        items.iter().try_for_each(|item| write_item(self, item))
    }
}

/// Packet reader over a borrowed buffer.
#[derive(Debug)]
pub struct PacketReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PacketReader<'a> {
    /// Creates a reader at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Bytes not yet read.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Fails unless every byte was consumed.
    ///
    /// # Errors
    ///
    /// `TrailingBytes` with the leftover count.
    pub fn finish(&self) -> ProtocolResult<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(ProtocolError::TrailingBytes { count }),
        }
    }

    fn take(&mut self, needed: usize) -> ProtocolResult<&'a [u8]> {
        if self.remaining() < needed {
            return Err(ProtocolError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buffer[self.position..self.position + needed];
        self.position += needed;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer.
    #[inline]
    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Reads a boolean; any non-zero byte is true.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer.
    #[inline]
    pub fn read_bool(&mut self) -> ProtocolResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a u16.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer.
    #[inline]
    pub fn read_u16(&mut self) -> ProtocolResult<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    /// Reads a u32.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer.
    #[inline]
    pub fn read_u32(&mut self) -> ProtocolResult<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    /// Reads an i32.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer.
    #[inline]
    pub fn read_i32(&mut self) -> ProtocolResult<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    /// Reads an f32.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer.
    #[inline]
    pub fn read_f32(&mut self) -> ProtocolResult<f32> {
        self.take_array().map(f32::from_le_bytes)
    }

    /// Reads an f32 that must be finite.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer, `NonFinite` for NaN or an infinity.
    pub fn read_finite_f32(&mut self, field: &'static str) -> ProtocolResult<f32> {
        let value = self.read_f32()?;
        if !value.is_finite() {
            return Err(ProtocolError::NonFinite { field });
        }
        Ok(value)
    }

    /// Reads a position. Both components must be finite.
    ///
    /// # Errors
    ///
    /// `Truncated` at end of buffer, `NonFinite` naming `field`.
    pub fn read_vec2(&mut self, field: &'static str) -> ProtocolResult<Vec2> {
        Ok(Vec2::new(
            self.read_finite_f32(field)?,
            self.read_finite_f32(field)?,
        ))
    }

    /// Reads a length-prefixed string.
    ///
    /// # Errors
    ///
    /// `Truncated` or `InvalidUtf8`.
    pub fn read_string(&mut self, field: &'static str) -> ProtocolResult<String> {
        let len = usize::from(self.read_u16()?);
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::InvalidUtf8 { field })
    }

    /// Reads a string that must not be empty.
    ///
    /// # Errors
    ///
    /// As [`Self::read_string`], plus `EmptyId` naming `record`.
    pub fn read_id(&mut self, record: &'static str) -> ProtocolResult<String> {
        let id = self.read_string(record)?;
        if id.is_empty() {
            return Err(ProtocolError::EmptyId { record });
        }
        Ok(id)
    }

    /// Reads a count-prefixed array with `read_item` per element.
    ///
    /// # Errors
    ///
    /// `Truncated`, or the first item error.
    pub fn read_array<T>(
        &mut self,
        mut read_item: impl FnMut(&mut Self) -> ProtocolResult<T>,
    ) -> ProtocolResult<Vec<T>> {
        let count = usize::from(self.read_u16()?);
        // Cap the preallocation by what the buffer could possibly hold
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(read_item(self)?);
        }
        Ok(items)
    }

    /// Reads a `u8` enum discriminant through `convert`.
    ///
    /// # Errors
    ///
    /// `Truncated`, or `InvalidEnum` when `convert` rejects the value.
    pub fn read_enum<T>(
        &mut self,
        field: &'static str,
        convert: impl FnOnce(u8) -> Option<T>,
    ) -> ProtocolResult<T> {
        let value = self.read_u8()?;
        convert(value).ok_or(ProtocolError::InvalidEnum {
            field,
            value: u32::from(value),
        })
    }
}
