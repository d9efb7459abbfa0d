/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The image resource section.
//!
//! A sequence of self-describing blocks. A handful of well-known ids get
//! structural decoding; everything else is retained as an opaque blob so
//! that ids this crate has never heard of round-trip instead of failing.

use log::trace;
use psd_core::bytestream::ByteCursor;

use crate::constants::{
    BIM_SIGNATURE, RES_GLOBAL_ALTITUDE, RES_GLOBAL_ANGLE, RES_RESOLUTION_INFO, RES_XMP_METADATA
};
use crate::errors::PsdDecodeErrors;
use crate::utils::{fixed_point_to_f32, read_pascal_string};

/// One resource block, exactly as stored.
#[derive(Clone, Debug)]
pub struct ResourceBlock {
    pub id:   u16,
    pub name: String,
    pub data: Vec<u8>
}

/// Decoded resolution info resource (id 1005).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolutionInfo {
    /// Horizontal resolution in pixels per inch.
    pub horizontal_res:  f32,
    /// Display unit for the horizontal resolution (1 = px/inch, 2 = px/cm).
    pub horizontal_unit: u16,
    /// Display unit for width.
    pub width_unit:      u16,
    /// Vertical resolution in pixels per inch.
    pub vertical_res:    f32,
    /// Display unit for the vertical resolution.
    pub vertical_unit:   u16,
    /// Display unit for height.
    pub height_unit:     u16
}

/// Parse the whole resource section, returning blocks in stored order.
pub(crate) fn decode_resource_section(
    cursor: &mut ByteCursor
) -> Result<Vec<ResourceBlock>, PsdDecodeErrors> {
    let section_length = u64::from(cursor.read_u32_be()?);
    let section_start = cursor.position();
    let section_end = section_start + section_length;

    let mut blocks = Vec::new();

    while cursor.position() < section_end {
        let offset = cursor.position();
        let signature = cursor.read_fixed_bytes::<4>()?;
        if signature != BIM_SIGNATURE {
            return Err(PsdDecodeErrors::InvalidSignature {
                section: "image resources",
                offset
            });
        }

        let id = cursor.read_u16_be()?;
        let name = read_pascal_string(cursor, 2)?;

        let data_length = cursor.read_u32_be()? as usize;
        let data = cursor.read_bytes(data_length)?.to_vec();
        // data is padded to even length
        if data_length % 2 != 0 {
            cursor.skip(1)?;
        }

        trace!("Resource block id {id}, {data_length} bytes");
        blocks.push(ResourceBlock { id, name, data });
    }

    if cursor.position() != section_end {
        return Err(PsdDecodeErrors::SectionLengthMismatch {
            section:  "image resources",
            declared: section_length,
            consumed: cursor.position() - section_start,
            offset:   cursor.position()
        });
    }

    Ok(blocks)
}

/// The format permits repeated ids for some resources; last one wins.
fn find_last<'a>(blocks: &'a [ResourceBlock], id: u16) -> Option<&'a ResourceBlock> {
    blocks.iter().rev().find(|block| block.id == id)
}

/// Decode the resolution info resource, if present.
pub(crate) fn resolution_info(blocks: &[ResourceBlock]) -> Option<ResolutionInfo> {
    let block = find_last(blocks, RES_RESOLUTION_INFO)?;
    if block.data.len() < 16 {
        return None;
    }
    let mut cursor = ByteCursor::new(&block.data);
    // fixed layout, length checked above
    let horizontal_res = fixed_point_to_f32(cursor.read_u32_be().ok()?);
    let horizontal_unit = cursor.read_u16_be().ok()?;
    let width_unit = cursor.read_u16_be().ok()?;
    let vertical_res = fixed_point_to_f32(cursor.read_u32_be().ok()?);
    let vertical_unit = cursor.read_u16_be().ok()?;
    let height_unit = cursor.read_u16_be().ok()?;

    Some(ResolutionInfo {
        horizontal_res,
        horizontal_unit,
        width_unit,
        vertical_res,
        vertical_unit,
        height_unit
    })
}

fn signed_scalar(blocks: &[ResourceBlock], id: u16) -> Option<i32> {
    let block = find_last(blocks, id)?;
    let bytes: [u8; 4] = block.data.get(..4)?.try_into().ok()?;
    Some(i32::from_be_bytes(bytes))
}

/// Global light angle resource (id 1037).
pub(crate) fn global_angle(blocks: &[ResourceBlock]) -> Option<i32> {
    signed_scalar(blocks, RES_GLOBAL_ANGLE)
}

/// Global light altitude resource (id 1049).
pub(crate) fn global_altitude(blocks: &[ResourceBlock]) -> Option<i32> {
    signed_scalar(blocks, RES_GLOBAL_ALTITUDE)
}

/// Embedded XMP metadata (id 1060), returned as the raw byte string.
pub(crate) fn xmp_metadata(blocks: &[ResourceBlock]) -> Option<&[u8]> {
    find_last(blocks, RES_XMP_METADATA).map(|block| block.data.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: u16, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"8BIM");
        out.extend_from_slice(&id.to_be_bytes());
        out.extend_from_slice(&[0, 0]); // empty Pascal name, even padded
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(data);
        if data.len() % 2 != 0 {
            out.push(0);
        }
        out
    }

    fn section(blocks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = blocks.concat();
        let mut out = Vec::new();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn unknown_ids_are_retained() {
        let data = section(&[block(60_000, &[1, 2, 3])]);
        let mut cursor = ByteCursor::new(&data);
        let blocks = decode_resource_section(&mut cursor).unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, 60_000);
        assert_eq!(blocks[0].data, vec![1, 2, 3]);
        // odd payload is even padded
        assert_eq!(cursor.position(), data.len() as u64);
    }

    #[test]
    fn duplicate_ids_are_last_wins() {
        let data = section(&[
            block(RES_GLOBAL_ANGLE, &30_i32.to_be_bytes()),
            block(RES_GLOBAL_ANGLE, &120_i32.to_be_bytes())
        ]);
        let mut cursor = ByteCursor::new(&data);
        let blocks = decode_resource_section(&mut cursor).unwrap();

        assert_eq!(global_angle(&blocks), Some(120));
    }

    #[test]
    fn bad_signature_is_fatal() {
        let mut data = section(&[block(1000, &[])]);
        data[4] = b'X';
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            decode_resource_section(&mut cursor),
            Err(PsdDecodeErrors::InvalidSignature { .. })
        ));
    }

    #[test]
    fn resolution_info_decodes_fixed_point() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0x0048_0000_u32.to_be_bytes()); // 72.0
        payload.extend_from_slice(&1_u16.to_be_bytes());
        payload.extend_from_slice(&1_u16.to_be_bytes());
        payload.extend_from_slice(&0x0030_8000_u32.to_be_bytes()); // 48.5
        payload.extend_from_slice(&2_u16.to_be_bytes());
        payload.extend_from_slice(&1_u16.to_be_bytes());

        let data = section(&[block(RES_RESOLUTION_INFO, &payload)]);
        let mut cursor = ByteCursor::new(&data);
        let blocks = decode_resource_section(&mut cursor).unwrap();

        let info = resolution_info(&blocks).unwrap();
        assert_eq!(info.horizontal_res, 72.0);
        assert_eq!(info.vertical_res, 48.5);
        assert_eq!(info.vertical_unit, 2);
    }
}
