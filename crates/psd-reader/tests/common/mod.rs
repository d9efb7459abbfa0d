#![allow(dead_code)]

//! Hand-rolled document builders for the integration tests.
//!
//! These produce the same byte layouts real writers do, small enough to
//! reason about by hand.

use psd_reader::packbits;

pub const RGB: u16 = 3;
pub const GRAYSCALE: u16 = 1;

/// The fixed 26-byte header.
pub fn header(version: u16, channels: u16, width: u32, height: u32, depth: u16, mode: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"8BPS");
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&[0; 6]);
    out.extend_from_slice(&channels.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&depth.to_be_bytes());
    out.extend_from_slice(&mode.to_be_bytes());
    out
}

pub fn empty_color_mode_data() -> Vec<u8> {
    0_u32.to_be_bytes().to_vec()
}

pub fn empty_resources() -> Vec<u8> {
    0_u32.to_be_bytes().to_vec()
}

pub fn resource_block(id: u16, data: &[u8]) -> Vec<u8> {
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

pub fn resource_section(blocks: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = blocks.concat();
    let mut out = (body.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(&body);
    out
}

/// An empty layer and mask section.
pub fn empty_layer_section(psb: bool) -> Vec<u8> {
    if psb {
        0_u64.to_be_bytes().to_vec()
    } else {
        0_u32.to_be_bytes().to_vec()
    }
}

/// A raw (compression 0) channel block.
pub fn raw_channel(data: &[u8]) -> Vec<u8> {
    let mut out = 0_u16.to_be_bytes().to_vec();
    out.extend_from_slice(data);
    out
}

/// An RLE (compression 1) channel block. `wide_counts` selects the
/// 4-byte scanline counts of version 2 documents.
pub fn rle_channel(rows: &[&[u8]], wide_counts: bool) -> Vec<u8> {
    let mut out = 1_u16.to_be_bytes().to_vec();
    let encoded: Vec<Vec<u8>> = rows.iter().map(|row| packbits::encode(row)).collect();
    for row in &encoded {
        if wide_counts {
            out.extend_from_slice(&(row.len() as u32).to_be_bytes());
        } else {
            out.extend_from_slice(&(row.len() as u16).to_be_bytes());
        }
    }
    for row in &encoded {
        out.extend_from_slice(row);
    }
    out
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A ZIP channel block; `code` is 2 (plain) or 3 (with prediction), and
/// `raw` must already be delta coded for code 3.
pub fn zip_channel(code: u16, raw: &[u8]) -> Vec<u8> {
    let mut out = code.to_be_bytes().to_vec();
    out.extend_from_slice(&zlib(raw));
    out
}

/// An `lsct` additional-info block carrying a divider type.
pub fn lsct(kind: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"8BIM");
    out.extend_from_slice(b"lsct");
    out.extend_from_slice(&4_u32.to_be_bytes());
    out.extend_from_slice(&kind.to_be_bytes());
    out
}

/// A `luni` additional-info block with a UTF-16BE layer name.
pub fn luni(name: &str) -> Vec<u8> {
    let units: Vec<u16> = name.encode_utf16().collect();
    let mut payload = (units.len() as u32).to_be_bytes().to_vec();
    for unit in units {
        payload.extend_from_slice(&unit.to_be_bytes());
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"8BIM");
    out.extend_from_slice(b"luni");
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    if payload.len() % 2 != 0 {
        out.push(0);
    }
    out
}

pub struct LayerSpec {
    /// top, left, bottom, right
    pub bounds:   [i32; 4],
    /// `(channel id, full channel block including its compression code)`
    pub channels: Vec<(i16, Vec<u8>)>,
    pub blend:    [u8; 4],
    pub opacity:  u8,
    pub flags:    u8,
    pub name:     String,
    /// Extra additional-info blocks (`lsct`, `luni`, ...).
    pub ali:      Vec<u8>
}

impl LayerSpec {
    pub fn new(name: &str) -> LayerSpec {
        LayerSpec {
            bounds:   [0; 4],
            channels: Vec::new(),
            blend:    *b"norm",
            opacity:  255,
            flags:    0,
            name:     name.to_string(),
            ali:      Vec::new()
        }
    }
}

/// A zero-area divider record with an `lsct` block.
pub fn divider(name: &str, kind: u32) -> LayerSpec {
    LayerSpec {
        ali: lsct(kind),
        ..LayerSpec::new(name)
    }
}

fn pascal_name_4(name: &str) -> Vec<u8> {
    let bytes = name.as_bytes();
    let mut out = vec![bytes.len() as u8];
    out.extend_from_slice(bytes);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

fn record_bytes(spec: &LayerSpec, psb: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for value in spec.bounds {
        out.extend_from_slice(&value.to_be_bytes());
    }

    out.extend_from_slice(&(spec.channels.len() as u16).to_be_bytes());
    for (id, block) in &spec.channels {
        out.extend_from_slice(&id.to_be_bytes());
        if psb {
            out.extend_from_slice(&(block.len() as u64).to_be_bytes());
        } else {
            out.extend_from_slice(&(block.len() as u32).to_be_bytes());
        }
    }

    out.extend_from_slice(b"8BIM");
    out.extend_from_slice(&spec.blend);
    out.push(spec.opacity);
    out.push(0); // clipping
    out.push(spec.flags);
    out.push(0); // filler

    let mut extra = Vec::new();
    extra.extend_from_slice(&0_u32.to_be_bytes()); // no mask data
    extra.extend_from_slice(&0_u32.to_be_bytes()); // no blending ranges
    extra.extend_from_slice(&pascal_name_4(&spec.name));
    extra.extend_from_slice(&spec.ali);

    out.extend_from_slice(&(extra.len() as u32).to_be_bytes());
    out.extend_from_slice(&extra);
    out
}

/// Record list plus the channel data pass, the body of a layer info block.
fn layer_info(specs: &[LayerSpec], psb: bool, merged_alpha: bool) -> Vec<u8> {
    let mut info = Vec::new();
    let mut count = specs.len() as i16;
    if merged_alpha {
        count = -count;
    }
    info.extend_from_slice(&count.to_be_bytes());
    for spec in specs {
        info.extend_from_slice(&record_bytes(spec, psb));
    }
    for spec in specs {
        for (_, block) in &spec.channels {
            info.extend_from_slice(block);
        }
    }
    if info.len() % 2 != 0 {
        info.push(0);
    }
    info
}

/// A complete layer and mask section holding the given records.
pub fn layer_section(specs: &[LayerSpec], psb: bool, merged_alpha: bool) -> Vec<u8> {
    let info = layer_info(specs, psb, merged_alpha);
    let length_field = if psb { 8 } else { 4 };
    let body_len = length_field + info.len() + 4;

    let mut out = Vec::new();
    if psb {
        out.extend_from_slice(&(body_len as u64).to_be_bytes());
        out.extend_from_slice(&(info.len() as u64).to_be_bytes());
    } else {
        out.extend_from_slice(&(body_len as u32).to_be_bytes());
        out.extend_from_slice(&(info.len() as u32).to_be_bytes());
    }
    out.extend_from_slice(&info);
    out.extend_from_slice(&0_u32.to_be_bytes()); // global layer mask info
    out
}

/// A layer and mask section whose record list lives in a document-level
/// `Lr16`/`Lr32` block, the way high bit depth writers store it.
pub fn deep_layer_section(key: &[u8; 4], specs: &[LayerSpec]) -> Vec<u8> {
    let info = layer_info(specs, false, false);

    let mut ali = Vec::new();
    ali.extend_from_slice(b"8BIM");
    ali.extend_from_slice(key);
    ali.extend_from_slice(&(info.len() as u32).to_be_bytes());
    ali.extend_from_slice(&info);

    let body_len = 4 + 4 + ali.len();
    let mut out = Vec::new();
    out.extend_from_slice(&(body_len as u32).to_be_bytes());
    out.extend_from_slice(&0_u32.to_be_bytes()); // empty layer info
    out.extend_from_slice(&0_u32.to_be_bytes()); // global layer mask info
    out.extend_from_slice(&ali);
    out
}

/// A raw (compression 0) merged image section.
pub fn merged_raw(planes: &[&[u8]]) -> Vec<u8> {
    let mut out = 0_u16.to_be_bytes().to_vec();
    for plane in planes {
        out.extend_from_slice(plane);
    }
    out
}

/// An RLE merged image section: one count table for every row of every
/// channel, then the rows channel after channel.
pub fn merged_rle(planes: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let mut out = 1_u16.to_be_bytes().to_vec();
    let encoded: Vec<Vec<Vec<u8>>> = planes
        .iter()
        .map(|rows| rows.iter().map(|row| packbits::encode(row)).collect())
        .collect();
    for rows in &encoded {
        for row in rows {
            out.extend_from_slice(&(row.len() as u16).to_be_bytes());
        }
    }
    for rows in &encoded {
        for row in rows {
            out.extend_from_slice(row);
        }
    }
    out
}

/// Big-endian bytes of a 16-bit plane.
pub fn u16_plane(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_be_bytes()).collect()
}

/// Big-endian bytes of a 32-bit float plane.
pub fn f32_plane(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_be_bytes()).collect()
}
