/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The fixed 26-byte file header.

use log::trace;
use psd_core::bit_depth::BitDepth;
use psd_core::bytestream::ByteCursor;
use psd_core::options::DecoderOptions;

use crate::constants::{ColorMode, PsdVersion, PSD_IDENTIFIER_BE};
use crate::errors::PsdDecodeErrors;

/// The maximum channel count the format defines.
const MAX_CHANNELS: u16 = 56;

/// Parsed file header. Immutable once parsed.
///
/// The version field is the single value that forks the binary format:
/// it decides whether later section length fields are 4 or 8 bytes wide.
#[derive(Debug, Copy, Clone)]
pub struct FileHeader {
    pub version:       PsdVersion,
    pub channel_count: usize,
    pub width:         usize,
    pub height:        usize,
    pub depth:         BitDepth,
    pub color_mode:    ColorMode
}

impl FileHeader {
    /// Parse the header from the start of a document.
    ///
    /// Reserved bytes are skipped without validation; nonstandard writers
    /// are known to leave garbage there.
    pub fn decode(
        cursor: &mut ByteCursor, options: &DecoderOptions
    ) -> Result<FileHeader, PsdDecodeErrors> {
        let magic = cursor.read_u32_be()?;
        if magic != PSD_IDENTIFIER_BE {
            return Err(PsdDecodeErrors::WrongMagicBytes(magic));
        }

        let version_int = cursor.read_u16_be()?;
        let Some(version) = PsdVersion::from_int(version_int) else {
            return Err(PsdDecodeErrors::UnsupportedVersion(version_int));
        };

        // 6 reserved bytes
        cursor.skip(6)?;

        let channel_count = cursor.read_u16_be()?;
        if channel_count == 0 || channel_count > MAX_CHANNELS {
            return Err(PsdDecodeErrors::UnsupportedChannelCount(channel_count));
        }

        let height = cursor.read_u32_be()? as usize;
        let width = cursor.read_u32_be()? as usize;

        if width == 0 || height == 0 {
            return Err(PsdDecodeErrors::ZeroDimensions);
        }

        let format_limit = version.max_dimension();
        for dim in [width, height] {
            if dim > format_limit {
                return Err(PsdDecodeErrors::LargeDimensions(format_limit, dim));
            }
        }
        if width > options.max_width() {
            return Err(PsdDecodeErrors::LargeDimensions(options.max_width(), width));
        }
        if height > options.max_height() {
            return Err(PsdDecodeErrors::LargeDimensions(
                options.max_height(),
                height
            ));
        }

        let depth_int = cursor.read_u16_be()?;
        let Some(depth) = BitDepth::from_int(depth_int) else {
            return Err(PsdDecodeErrors::UnsupportedBitDepth(depth_int));
        };

        let mode_int = cursor.read_u16_be()?;
        let Some(color_mode) = ColorMode::from_int(mode_int) else {
            return Err(PsdDecodeErrors::UnknownColorMode(mode_int));
        };

        trace!("Version: {version:?}");
        trace!("Image width: {width}");
        trace!("Image height: {height}");
        trace!("Channels: {channel_count}");
        trace!("Bit depth: {depth:?}");
        trace!("Color mode: {color_mode:?}");

        Ok(FileHeader {
            version,
            channel_count: usize::from(channel_count),
            width,
            height,
            depth,
            color_mode
        })
    }

    /// Read a section length field, whose width this header's version controls.
    pub(crate) fn read_section_length(
        &self, cursor: &mut ByteCursor
    ) -> Result<u64, PsdDecodeErrors> {
        let length = match self.version {
            PsdVersion::Standard => u64::from(cursor.read_u32_be()?),
            PsdVersion::Large => cursor.read_u64_be()?
        };
        Ok(length)
    }
}
