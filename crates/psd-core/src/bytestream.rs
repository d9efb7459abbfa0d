/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A bounded big-endian byte cursor.
//!
//! Documents in this family are fully buffered before decoding, so the
//! cursor reads from a borrowed slice and tracks an absolute position.
//! Every section of the format is framed by its own length field, hence
//! [`ByteCursor::set_position`] exists so a parser can jump to a section
//! end it trusts even when the inner grammar under-consumed.

use core::fmt::{Debug, Formatter};

/// Errors the cursor can return.
///
/// Every variant carries the absolute offset at which the
/// failure was detected.
pub enum CursorError {
    /// A read wanted more bytes than the source still holds.
    NotEnoughBytes {
        requested: usize,
        available: usize,
        offset:    u64
    },
    /// A seek target lies beyond the end of the source.
    SeekOutOfBounds { requested: u64, length: usize }
}

impl Debug for CursorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            CursorError::NotEnoughBytes {
                requested,
                available,
                offset
            } => {
                writeln!(
                    f,
                    "Not enough bytes at offset {offset}, requested {requested} but only {available} are left"
                )
            }
            CursorError::SeekOutOfBounds { requested, length } => {
                writeln!(
                    f,
                    "Seek to offset {requested} is out of bounds, source is {length} bytes long"
                )
            }
        }
    }
}

/// A big-endian reader over an in-memory byte source.
#[derive(Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize
}

impl<'a> ByteCursor<'a> {
    /// Create a new cursor positioned at the start of `buf`.
    pub const fn new(buf: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor { buf, pos: 0 }
    }

    /// Absolute offset of the next byte to be read.
    pub const fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Total length of the underlying source.
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the underlying source is empty.
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes between the current position and the end.
    pub const fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Whether the cursor is at the end of the source.
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Jump to an absolute offset.
    ///
    /// The end of the source is a valid target, one past it is not.
    pub fn set_position(&mut self, position: u64) -> Result<(), CursorError> {
        if position > self.buf.len() as u64 {
            return Err(CursorError::SeekOutOfBounds {
                requested: position,
                length:    self.buf.len()
            });
        }
        self.pos = position as usize;
        Ok(())
    }

    /// Advance the cursor by `num` bytes.
    pub fn skip(&mut self, num: usize) -> Result<(), CursorError> {
        self.set_position(self.pos as u64 + num as u64)
    }

    /// Absolute end offset of a block declared to be `length` bytes long
    /// and starting at the current position.
    ///
    /// Length fields come straight from the file, so a block running
    /// past the end of the source fails here, before any arithmetic is
    /// done on the end offset.
    pub fn bounded_end(&self, length: u64) -> Result<u64, CursorError> {
        if length > self.remaining() as u64 {
            return Err(CursorError::NotEnoughBytes {
                requested: length as usize,
                available: self.remaining(),
                offset:    self.pos as u64
            });
        }
        Ok(self.pos as u64 + length)
    }

    fn not_enough(&self, requested: usize) -> CursorError {
        CursorError::NotEnoughBytes {
            requested,
            available: self.remaining(),
            offset: self.pos as u64
        }
    }

    /// Borrow the next `num` bytes and advance past them.
    pub fn read_bytes(&mut self, num: usize) -> Result<&'a [u8], CursorError> {
        if num > self.remaining() {
            return Err(self.not_enough(num));
        }
        let out = &self.buf[self.pos..self.pos + num];
        self.pos += num;
        Ok(out)
    }

    /// Borrow the next `num` bytes without consuming them.
    pub fn peek_bytes(&self, num: usize) -> Result<&'a [u8], CursorError> {
        if num > self.remaining() {
            return Err(self.not_enough(num));
        }
        Ok(&self.buf[self.pos..self.pos + num])
    }

    /// Fill `out` from the source or fail without consuming anything.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<(), CursorError> {
        let bytes = self.read_bytes(out.len())?;
        out.copy_from_slice(bytes);
        Ok(())
    }

    /// Read a fixed number of bytes into an array.
    pub fn read_fixed_bytes<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0_u8; N];
        self.read_exact(&mut out)?;
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let bytes = self.read_fixed_bytes::<1>()?;
        Ok(bytes[0])
    }
}

macro_rules! read_be_type {
    ($name:tt, $int_type:tt) => {
        impl ByteCursor<'_> {
            #[doc = concat!("Read a big-endian `", stringify!($int_type), "`.")]
            #[inline]
            pub fn $name(&mut self) -> Result<$int_type, CursorError> {
                const SIZE: usize = core::mem::size_of::<$int_type>();
                let bytes = self.read_fixed_bytes::<SIZE>()?;
                Ok($int_type::from_be_bytes(bytes))
            }
        }
    };
}

read_be_type!(read_u16_be, u16);
read_be_type!(read_u32_be, u32);
read_be_type!(read_u64_be, u64);
read_be_type!(read_i16_be, i16);
read_be_type!(read_i32_be, i32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_positions() {
        let data = [0x38, 0x42, 0x50, 0x53, 0x00, 0x01];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u32_be().unwrap(), 0x38425053);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.read_u16_be().unwrap(), 1);
        assert!(cursor.is_eof());
    }

    #[test]
    fn peek_does_not_consume() {
        let data = [1, 2, 3];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.peek_bytes(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_u8().unwrap(), 1);
    }

    #[test]
    fn short_read_reports_offset() {
        let data = [0_u8; 3];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(2).unwrap();

        let err = cursor.read_u32_be().unwrap_err();
        match err {
            CursorError::NotEnoughBytes {
                requested,
                available,
                offset
            } => {
                assert_eq!((requested, available, offset), (4, 1, 2));
            }
            _ => panic!("wrong error kind")
        }
    }

    #[test]
    fn bounded_end_rejects_overlong_blocks() {
        let data = [0_u8; 8];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(2).unwrap();

        assert_eq!(cursor.bounded_end(6).unwrap(), 8);
        assert!(cursor.bounded_end(7).is_err());
        // a hostile length must not overflow into a wrapped end offset
        assert!(cursor.bounded_end(u64::MAX).is_err());
    }

    #[test]
    fn seek_past_end_fails() {
        let data = [0_u8; 4];
        let mut cursor = ByteCursor::new(&data);

        assert!(cursor.set_position(4).is_ok());
        assert!(cursor.set_position(5).is_err());
    }
}
