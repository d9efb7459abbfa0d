/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Image bit depth information

/// The depth of a single decoded sample.
///
/// Documents declare one depth for every channel in the file,
/// one of 1, 8, 16 or 32 bits.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BitDepth {
    /// 1 bit per sample, bit packed per row.
    One,
    /// 8 bits per sample.
    Eight,
    /// 16 bits per sample.
    Sixteen,
    /// 32 bits per sample, IEEE-754 float.
    ThirtyTwo
}

impl BitDepth {
    /// Convert the on-disk depth field to an enum,
    /// returning `None` for depths the format does not define.
    pub const fn from_int(depth: u16) -> Option<BitDepth> {
        match depth {
            1 => Some(BitDepth::One),
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            32 => Some(BitDepth::ThirtyTwo),
            _ => None
        }
    }

    /// Number of bits in a single sample.
    pub const fn bits(self) -> u16 {
        match self {
            BitDepth::One => 1,
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::ThirtyTwo => 32
        }
    }

    /// Number of bytes a single decoded sample occupies.
    ///
    /// 1-bit samples are expanded to whole bytes during decoding,
    /// so they report one byte here.
    pub const fn size_of(self) -> usize {
        match self {
            BitDepth::One | BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
            BitDepth::ThirtyTwo => 4
        }
    }
}
