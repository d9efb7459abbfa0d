/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors possible during decode operations.

use core::fmt::{Debug, Formatter};

use psd_core::bytestream::CursorError;
use zune_inflate::errors::InflateDecodeErrors;

use crate::constants::PSD_IDENTIFIER_BE;

/// Errors that can occur while decoding a document.
///
/// Any of these aborts the whole document: section lengths gate all
/// subsequent offsets, so there is no safe resynchronization point after
/// a framing inconsistency. Unknown resource ids, unknown additional
/// layer information keys and unsupported blend modes are deliberately
/// *not* represented here; those degrade gracefully.
pub enum PsdDecodeErrors {
    WrongMagicBytes(u32),
    UnsupportedVersion(u16),
    UnsupportedChannelCount(u16),
    UnsupportedBitDepth(u16),
    UnknownColorMode(u16),
    /// (limit, found)
    LargeDimensions(usize, usize),
    ZeroDimensions,
    /// A signature tag inside `section` did not match its fixed value.
    InvalidSignature {
        section: &'static str,
        offset:  u64
    },
    /// A declared section length disagrees with the bytes actually consumed.
    SectionLengthMismatch {
        section:  &'static str,
        declared: u64,
        consumed: u64,
        offset:   u64
    },
    /// Scanline counts, declared channel lengths and decoded row widths
    /// did not line up.
    ChannelFraming {
        reason: &'static str,
        offset: u64
    },
    /// Group open/close divider records do not nest.
    UnbalancedGroupMarkers,
    /// Compression code with no decoder for it in this position.
    UnsupportedCompression(u16),
    IoErrors(CursorError),
    Inflate(InflateDecodeErrors),
    Generic(&'static str)
}

impl Debug for PsdDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            PsdDecodeErrors::WrongMagicBytes(bytes) => {
                writeln!(
                    f,
                    "Expected {:?} but found {:?}, not a PSD image",
                    PSD_IDENTIFIER_BE.to_be_bytes(),
                    bytes.to_be_bytes()
                )
            }
            PsdDecodeErrors::UnsupportedVersion(version) => {
                writeln!(
                    f,
                    "Unsupported file version {version}, known versions are 1 (PSD) and 2 (PSB)"
                )
            }
            PsdDecodeErrors::UnsupportedChannelCount(channels) => {
                writeln!(f, "Unsupported channel count {channels}")
            }
            PsdDecodeErrors::UnsupportedBitDepth(depth) => {
                writeln!(
                    f,
                    "Unsupported bit depth {depth}, supported depths are 1, 8, 16 and 32"
                )
            }
            PsdDecodeErrors::UnknownColorMode(mode) => {
                writeln!(f, "Unknown color mode {mode}")
            }
            PsdDecodeErrors::LargeDimensions(supported, found) => {
                writeln!(
                    f,
                    "Too large dimensions, supported {supported} but found {found}"
                )
            }
            PsdDecodeErrors::ZeroDimensions => {
                writeln!(f, "Zero found where not expected")
            }
            PsdDecodeErrors::InvalidSignature { section, offset } => {
                writeln!(f, "Invalid signature in {section} at offset {offset}")
            }
            PsdDecodeErrors::SectionLengthMismatch {
                section,
                declared,
                consumed,
                offset
            } => {
                writeln!(
                    f,
                    "Length mismatch in {section}: declared {declared} bytes but consumed {consumed}, detected at offset {offset}"
                )
            }
            PsdDecodeErrors::ChannelFraming { reason, offset } => {
                writeln!(f, "Channel framing error at offset {offset}: {reason}")
            }
            PsdDecodeErrors::UnbalancedGroupMarkers => {
                writeln!(f, "Group divider markers do not balance")
            }
            PsdDecodeErrors::UnsupportedCompression(code) => {
                writeln!(f, "Compression code {code} is not supported here")
            }
            PsdDecodeErrors::IoErrors(err) => {
                writeln!(f, "I/O error: {err:?}")
            }
            PsdDecodeErrors::Inflate(err) => {
                writeln!(f, "Inflate error: {err:?}")
            }
            PsdDecodeErrors::Generic(reason) => {
                writeln!(f, "{reason}")
            }
        }
    }
}

impl From<CursorError> for PsdDecodeErrors {
    fn from(err: CursorError) -> Self {
        Self::IoErrors(err)
    }
}

impl From<InflateDecodeErrors> for PsdDecodeErrors {
    fn from(err: InflateDecodeErrors) -> Self {
        Self::Inflate(err)
    }
}

impl From<&'static str> for PsdDecodeErrors {
    fn from(reason: &'static str) -> Self {
        Self::Generic(reason)
    }
}
