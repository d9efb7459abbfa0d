/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The layer and mask information section.
//!
//! Layers are stored as a flat, bottom-to-top list of records. Group
//! structure is not a tree on disk; it is encoded by synthetic divider
//! records (`lsct` blocks) interleaved with the real layers, which
//! [`crate::tree`] later folds back into a tree.
//!
//! 16- and 32-bit documents usually leave the layer-info block empty and
//! carry the whole record list inside a document-level `Lr16`/`Lr32`
//! block instead; both encodings funnel into the same record grammar.

use log::{trace, warn};
use psd_core::bytestream::ByteCursor;

use crate::channels::{decode_channel, ChannelPlane};
use crate::constants::{
    BlendMode, DividerKind, B64_SIGNATURE, BIM_SIGNATURE, FLAG_HIDDEN
};
use crate::errors::PsdDecodeErrors;
use crate::header::FileHeader;
use crate::utils::{read_pascal_string, read_unicode_string};

/// Layer bounds in document pixel space.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Bounds {
    pub top:    i32,
    pub left:   i32,
    pub bottom: i32,
    pub right:  i32
}

impl Bounds {
    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left).max(0) as usize
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top).max(0) as usize
    }
}

/// One entry of a layer's channel-info table.
///
/// `id` of −1 is the transparency channel, −2 a user mask, 0 and up the
/// color channels in color-mode order. `length` is the declared byte
/// length of the channel's data block, compression code included.
#[derive(Copy, Clone, Debug)]
pub struct ChannelInfo {
    pub id:     i16,
    pub length: u64
}

/// Decoded `lsct` section divider data.
#[derive(Copy, Clone, Debug)]
pub struct SectionDivider {
    pub kind:     DividerKind,
    pub sub_type: Option<u32>
}

/// An additional layer information block kept as found.
#[derive(Clone, Debug)]
pub struct AliBlock {
    pub key:  [u8; 4],
    pub data: Vec<u8>
}

/// One flat layer record, as stored.
#[derive(Clone, Debug, Default)]
pub struct LayerRecord {
    pub bounds:     Bounds,
    pub channels:   Vec<ChannelInfo>,
    pub blend_mode: BlendMode,
    pub opacity:    u8,
    pub clipping:   u8,
    pub flags:      u8,
    /// Effective name: the `luni` Unicode name when the record carries
    /// one, otherwise the legacy Pascal string.
    pub name:       String,
    pub divider:    Option<SectionDivider>,
    /// ALI blocks with no structural decoder, retained opaque.
    pub extra:      Vec<AliBlock>,
    /// Decoded pixel planes, `(channel id, plane)`, filled by the
    /// channel-data pass.
    pub planes:     Vec<(i16, ChannelPlane)>
}

impl LayerRecord {
    pub fn visible(&self) -> bool {
        self.flags & FLAG_HIDDEN == 0
    }
}

/// Everything decoded out of the layer and mask section.
#[derive(Clone, Debug, Default)]
pub struct LayerSection {
    /// Set when the stored layer count was negative: the first alpha
    /// channel of the merged image is the document transparency.
    pub merged_alpha: bool,
    /// Flat record list in stored (bottom-to-top) order.
    pub records:      Vec<LayerRecord>
}

fn read_ali_signature(
    cursor: &mut ByteCursor, section: &'static str
) -> Result<(), PsdDecodeErrors> {
    let offset = cursor.position();
    let signature = cursor.read_fixed_bytes::<4>()?;
    if signature != BIM_SIGNATURE && signature != B64_SIGNATURE {
        return Err(PsdDecodeErrors::InvalidSignature { section, offset });
    }
    Ok(())
}

/// Parse one layer record, minus its pixel data.
fn decode_layer_record(
    cursor: &mut ByteCursor, header: &FileHeader
) -> Result<LayerRecord, PsdDecodeErrors> {
    let bounds = Bounds {
        top:    cursor.read_i32_be()?,
        left:   cursor.read_i32_be()?,
        bottom: cursor.read_i32_be()?,
        right:  cursor.read_i32_be()?
    };

    let channel_count = cursor.read_u16_be()?;
    let mut channels = Vec::with_capacity(usize::from(channel_count));
    for _ in 0..channel_count {
        let id = cursor.read_i16_be()?;
        // channel lengths widen to 8 bytes in large documents
        let length = header.read_section_length(cursor)?;
        channels.push(ChannelInfo { id, length });
    }

    read_ali_signature(cursor, "layer blend info")?;
    let blend_mode = BlendMode::from_key(cursor.read_fixed_bytes::<4>()?);

    let opacity = cursor.read_u8()?;
    let clipping = cursor.read_u8()?;
    let flags = cursor.read_u8()?;
    cursor.skip(1)?; // filler

    let extra_length = u64::from(cursor.read_u32_be()?);
    let extra_start = cursor.position();
    let extra_end = cursor.bounded_end(extra_length)?;

    // layer mask data, framed and skipped as opaque
    let mask_length = cursor.read_u32_be()? as usize;
    cursor.skip(mask_length)?;

    // blending ranges, likewise
    let ranges_length = cursor.read_u32_be()? as usize;
    cursor.skip(ranges_length)?;

    // the legacy name pads to 4 bytes, unlike resource names
    let mut name = read_pascal_string(cursor, 4)?;

    let mut divider = None;
    let mut extra = Vec::new();

    if cursor.position() > extra_end {
        return Err(PsdDecodeErrors::SectionLengthMismatch {
            section:  "layer extra data",
            declared: extra_length,
            consumed: cursor.position() - extra_start,
            offset:   cursor.position()
        });
    }

    while extra_end.saturating_sub(cursor.position()) >= 12 {
        read_ali_signature(cursor, "additional layer information")?;
        let key = cursor.read_fixed_bytes::<4>()?;
        let length = u64::from(cursor.read_u32_be()?);
        // payloads are padded to even length
        let padded = length + (length & 1);
        let block_start = cursor.position();
        let block_end = (block_start + padded).min(extra_end);

        match &key {
            b"lsct" => {
                let raw_kind = cursor.read_u32_be()?;
                if let Some(kind) = DividerKind::from_int(raw_kind) {
                    // kind, then an optional blend signature + key,
                    // then an optional sub-type
                    let sub_type = if length >= 16 {
                        cursor.skip(8)?;
                        Some(cursor.read_u32_be()?)
                    } else {
                        None
                    };
                    divider = Some(SectionDivider { kind, sub_type });
                } else {
                    warn!("Unknown section divider type {raw_kind}, treating as a plain layer");
                }
            }
            b"luni" => {
                // authoritative over the Pascal name when present
                let unicode = read_unicode_string(cursor)?;
                if !unicode.is_empty() {
                    name = unicode;
                }
            }
            _ => {
                let data = cursor.read_bytes(length as usize)?.to_vec();
                extra.push(AliBlock { key, data });
            }
        }
        cursor.set_position(block_end)?;
    }

    // anything shorter than a block header can only be padding
    if extra_end.saturating_sub(cursor.position()) >= 4 {
        return Err(PsdDecodeErrors::SectionLengthMismatch {
            section:  "layer extra data",
            declared: extra_length,
            consumed: cursor.position() - extra_start,
            offset:   cursor.position()
        });
    }
    cursor.set_position(extra_end)?;

    trace!("Layer record {name:?}, {channel_count} channels");

    Ok(LayerRecord {
        bounds,
        channels,
        blend_mode,
        opacity,
        clipping,
        flags,
        name,
        divider,
        extra,
        planes: Vec::new()
    })
}

/// Parse a layer record list: signed count, the records, then the pixel
/// data for every record's channels in the same order (a second pass over
/// the same list, not interleaved with the records).
fn decode_layer_records(
    cursor: &mut ByteCursor, header: &FileHeader
) -> Result<LayerSection, PsdDecodeErrors> {
    let stored_count = cursor.read_i16_be()?;
    let merged_alpha = stored_count < 0;
    let count = stored_count.unsigned_abs();

    trace!("Layer count: {count}, merged alpha: {merged_alpha}");

    let mut records = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        records.push(decode_layer_record(cursor, header)?);
    }

    for record in &mut records {
        let (width, height) = (record.bounds.width(), record.bounds.height());
        for channel in &record.channels {
            let plane = decode_channel(cursor, header, width, height, channel.length)?;
            record.planes.push((channel.id, plane));
        }
    }

    Ok(LayerSection {
        merged_alpha,
        records
    })
}

/// Parse the whole layer and mask information section.
pub(crate) fn decode_layer_mask_section(
    cursor: &mut ByteCursor, header: &FileHeader
) -> Result<LayerSection, PsdDecodeErrors> {
    let section_length = header.read_section_length(cursor)?;
    if section_length == 0 {
        return Ok(LayerSection::default());
    }

    let section_end = cursor.bounded_end(section_length)?;

    let info_length = header.read_section_length(cursor)?;
    let info_start = cursor.position();
    let info_end = cursor.bounded_end(info_length)?;

    let mut section = if info_length == 0 {
        LayerSection::default()
    } else {
        let section = decode_layer_records(cursor, header)?;
        let consumed = cursor.position() - info_start;
        // the block is padded to even length
        if consumed > info_length || info_length - consumed > 3 {
            return Err(PsdDecodeErrors::SectionLengthMismatch {
                section: "layer info",
                declared: info_length,
                consumed,
                offset: cursor.position()
            });
        }
        cursor.set_position(info_end)?;
        section
    };

    // global layer mask info, skipped as opaque
    if section_end.saturating_sub(cursor.position()) >= 4 {
        let global_mask_length = cursor.read_u32_be()? as usize;
        cursor.skip(global_mask_length)?;
    }

    // document-level additional layer information
    while section_end.saturating_sub(cursor.position()) >= 12 {
        read_ali_signature(cursor, "document additional layer information")?;
        let key = cursor.read_fixed_bytes::<4>()?;
        let length = u64::from(cursor.read_u32_be()?);
        let padded = length + (length & 1);
        let block_end = (cursor.position() + padded).min(section_end);

        match &key {
            // high bit depth documents store their real layer list here
            b"Lr16" | b"Lr32" if section.records.is_empty() => {
                trace!("Layer list held in a {} block", String::from_utf8_lossy(&key));
                section = decode_layer_records(cursor, header)?;
            }
            _ => {}
        }
        cursor.set_position(block_end)?;
    }

    cursor.set_position(section_end)?;
    Ok(section)
}
