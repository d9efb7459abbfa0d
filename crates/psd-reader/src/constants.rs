/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![allow(clippy::upper_case_acronyms)]

/// `8BPS`, the file magic.
pub const PSD_IDENTIFIER_BE: u32 = 0x38425053;

/// `8BIM`, the signature on resource blocks, blend info and most
/// additional layer information blocks.
pub const BIM_SIGNATURE: [u8; 4] = *b"8BIM";

/// `8B64`, the alternate signature some writers put on additional
/// layer information blocks in large documents.
pub const B64_SIGNATURE: [u8; 4] = *b"8B64";

/// Resource id for the resolution info block.
pub const RES_RESOLUTION_INFO: u16 = 1005;
/// Resource id for the global light angle.
pub const RES_GLOBAL_ANGLE: u16 = 1037;
/// Resource id for the global light altitude.
pub const RES_GLOBAL_ALTITUDE: u16 = 1049;
/// Resource id for embedded XMP metadata.
pub const RES_XMP_METADATA: u16 = 1060;

/// Layer flags bit 0, the transparency-protected lock.
pub const FLAG_TRANSPARENCY_PROTECTED: u8 = 1;
/// Layer flags bit 1, set when the layer is hidden.
pub const FLAG_HIDDEN: u8 = 1 << 1;
/// Layer flags bit 3, set when the pixel data is irrelevant to the
/// appearance of the document.
pub const FLAG_IRRELEVANT: u8 = 1 << 3;

/// Format revision, read from the header.
///
/// The variant picked here decides whether downstream section length
/// fields are 4 or 8 bytes wide, so it is threaded explicitly through
/// every section parser.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PsdVersion {
    /// Version 1, dimensions up to 30 000.
    Standard,
    /// Version 2 ("PSB"), 64-bit section lengths, dimensions up to 300 000.
    Large
}

impl PsdVersion {
    pub const fn from_int(int: u16) -> Option<PsdVersion> {
        match int {
            1 => Some(PsdVersion::Standard),
            2 => Some(PsdVersion::Large),
            _ => None
        }
    }

    /// The largest width/height the format itself permits for this revision.
    pub const fn max_dimension(self) -> usize {
        match self {
            PsdVersion::Standard => 30_000,
            PsdVersion::Large => 300_000
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorMode {
    Bitmap = 0,
    Grayscale = 1,
    Indexed = 2,
    RGB = 3,
    CMYK = 4,
    Multichannel = 7,
    Duotone = 8,
    Lab = 9
}

impl ColorMode {
    pub const fn from_int(int: u16) -> Option<ColorMode> {
        match int {
            0 => Some(ColorMode::Bitmap),
            1 => Some(ColorMode::Grayscale),
            2 => Some(ColorMode::Indexed),
            3 => Some(ColorMode::RGB),
            4 => Some(ColorMode::CMYK),
            7 => Some(ColorMode::Multichannel),
            8 => Some(ColorMode::Duotone),
            9 => Some(ColorMode::Lab),
            _ => None
        }
    }

    /// Number of color channels the mode implies, alpha excluded.
    ///
    /// Multichannel documents have no fixed count; callers fall back to
    /// the header's channel count for those.
    pub const fn color_channels(self) -> Option<usize> {
        match self {
            ColorMode::Bitmap
            | ColorMode::Grayscale
            | ColorMode::Indexed
            | ColorMode::Duotone => Some(1),
            ColorMode::RGB | ColorMode::Lab => Some(3),
            ColorMode::CMYK => Some(4),
            ColorMode::Multichannel => None
        }
    }
}

/// Per-channel compression code.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompressionMethod {
    NoCompression = 0,
    Rle = 1,
    Zip = 2,
    ZipPrediction = 3
}

impl CompressionMethod {
    pub const fn from_int(int: u16) -> Option<CompressionMethod> {
        match int {
            0 => Some(Self::NoCompression),
            1 => Some(Self::Rle),
            2 => Some(Self::Zip),
            3 => Some(Self::ZipPrediction),
            _ => None
        }
    }
}

/// Blend mode, stored in the file as a four byte key.
///
/// Keys without a dedicated combine function are retained verbatim and
/// degrade to [`BlendMode::Normal`] arithmetic when compositing, per the
/// forward-compatibility policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendMode {
    /// `pass`, the group pass-through mode.
    PassThrough,
    /// `norm`
    Normal,
    /// `mul `
    Multiply,
    /// Any other key, kept as found.
    Other([u8; 4])
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::Normal
    }
}

impl BlendMode {
    pub const fn from_key(key: [u8; 4]) -> BlendMode {
        match &key {
            b"pass" => BlendMode::PassThrough,
            b"norm" => BlendMode::Normal,
            b"mul " => BlendMode::Multiply,
            _ => BlendMode::Other(key)
        }
    }

    pub const fn key(self) -> [u8; 4] {
        match self {
            BlendMode::PassThrough => *b"pass",
            BlendMode::Normal => *b"norm",
            BlendMode::Multiply => *b"mul ",
            BlendMode::Other(key) => key
        }
    }
}

/// The divider type carried in an `lsct` block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DividerKind {
    /// Type 0, an ordinary layer that happens to carry an `lsct` block.
    Other = 0,
    /// Type 1, an expanded group opener.
    OpenFolder = 1,
    /// Type 2, a collapsed group opener.
    ClosedFolder = 2,
    /// Type 3, the synthetic record closing a group from below.
    BoundingSection = 3
}

impl DividerKind {
    pub const fn from_int(int: u32) -> Option<DividerKind> {
        match int {
            0 => Some(DividerKind::Other),
            1 => Some(DividerKind::OpenFolder),
            2 => Some(DividerKind::ClosedFolder),
            3 => Some(DividerKind::BoundingSection),
            _ => None
        }
    }
}
