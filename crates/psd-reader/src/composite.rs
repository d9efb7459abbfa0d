/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Flattening the layer tree into a single raster.
//!
//! Compositing runs in f32 regardless of the document depth and
//! quantizes once at the end. Every non-pass-through group is isolated:
//! its children render into a fresh document-sized transparent canvas
//! which is then blended over the parent as a single unit, so a blend
//! mode inside a group never sees pixels from outside it.

use psd_core::bit_depth::BitDepth;

use crate::channels::ChannelPlane;
use crate::constants::BlendMode;
use crate::header::FileHeader;
use crate::tree::{LayerNode, NodeKind};

/// A flattened document: planar, color channels first, alpha last.
#[derive(Clone, Debug)]
pub struct Raster {
    pub width:  usize,
    pub height: usize,
    pub depth:  BitDepth,
    pub planes: Vec<ChannelPlane>
}

impl Raster {
    pub fn channel_count(&self) -> usize {
        self.planes.len()
    }
}

/// Interleaved f32 working canvas, alpha in the last slot of each pixel.
struct Canvas {
    width:  usize,
    height: usize,
    colors: usize,
    data:   Vec<f32>
}

impl Canvas {
    fn new(width: usize, height: usize, colors: usize) -> Canvas {
        Canvas {
            width,
            height,
            colors,
            data: vec![0.0; width * height * (colors + 1)]
        }
    }

    fn stride(&self) -> usize {
        self.colors + 1
    }

    fn into_raster(self, depth: BitDepth) -> Raster {
        let stride = self.stride();
        let pixels = self.width * self.height;
        let mut planes = Vec::with_capacity(stride);

        for channel in 0..stride {
            let samples = (0..pixels).map(|i| self.data[i * stride + channel]);
            let plane = match depth {
                BitDepth::One | BitDepth::Eight => ChannelPlane::U8(
                    samples
                        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                        .collect()
                ),
                BitDepth::Sixteen => ChannelPlane::U16(
                    samples
                        .map(|v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
                        .collect()
                ),
                BitDepth::ThirtyTwo => ChannelPlane::F32(samples.collect())
            };
            planes.push(plane);
        }

        Raster {
            width: self.width,
            height: self.height,
            depth,
            planes
        }
    }
}

/// Combine one source sample with what is already on the canvas.
///
/// Keys without a dedicated arithmetic, and pass-through groups being
/// blended as a unit, fall back to normal.
fn combine(mode: BlendMode, src: f32, dst: f32) -> f32 {
    match mode {
        BlendMode::Multiply => src * dst,
        _ => src
    }
}

/// Blend one leaf's planes over the canvas, clipped to the document.
fn blend_layer(canvas: &mut Canvas, node: &LayerNode, planes: &[(i16, ChannelPlane)]) {
    let bounds = node.bounds;
    let layer_width = bounds.width();
    if layer_width == 0 || bounds.height() == 0 {
        return;
    }

    let opacity = f32::from(node.opacity) / 255.0;
    if opacity == 0.0 {
        return;
    }

    let alpha = planes.iter().find(|(id, _)| *id == -1).map(|(_, p)| p);
    // missing color channels read as zero
    let color: Vec<Option<&ChannelPlane>> = (0..canvas.colors)
        .map(|c| {
            planes
                .iter()
                .find(|(id, _)| *id == c as i16)
                .map(|(_, p)| p)
        })
        .collect();

    let y_start = bounds.top.max(0);
    let y_end = bounds.bottom.min(canvas.height as i32);
    let x_start = bounds.left.max(0);
    let x_end = bounds.right.min(canvas.width as i32);
    let stride = canvas.stride();

    for y in y_start..y_end {
        for x in x_start..x_end {
            let layer_idx =
                (y - bounds.top) as usize * layer_width + (x - bounds.left) as usize;
            let sample_alpha = alpha.map_or(1.0, |p| p.sample_f32(layer_idx));
            let ea = sample_alpha * opacity;
            if ea == 0.0 {
                continue;
            }

            let base = (y as usize * canvas.width + x as usize) * stride;
            for (c, plane) in color.iter().enumerate() {
                let src = plane.map_or(0.0, |p| p.sample_f32(layer_idx));
                let dst = canvas.data[base + c];
                let blended = combine(node.blend_mode, src, dst);
                canvas.data[base + c] = blended * ea + dst * (1.0 - ea);
            }
            let dst_alpha = canvas.data[base + canvas.colors];
            canvas.data[base + canvas.colors] = 1.0 - (1.0 - ea) * (1.0 - dst_alpha);
        }
    }
}

/// Blend a finished group canvas over its parent as a single unit.
fn blend_canvas(canvas: &mut Canvas, group: &Canvas, mode: BlendMode, opacity: u8) {
    let opacity = f32::from(opacity) / 255.0;
    let stride = canvas.stride();

    for pixel in 0..canvas.width * canvas.height {
        let base = pixel * stride;
        let ea = group.data[base + canvas.colors] * opacity;
        if ea == 0.0 {
            continue;
        }

        for c in 0..canvas.colors {
            let src = group.data[base + c];
            let dst = canvas.data[base + c];
            let blended = combine(mode, src, dst);
            canvas.data[base + c] = blended * ea + dst * (1.0 - ea);
        }
        let dst_alpha = canvas.data[base + canvas.colors];
        canvas.data[base + canvas.colors] = 1.0 - (1.0 - ea) * (1.0 - dst_alpha);
    }
}

fn render_nodes(canvas: &mut Canvas, nodes: &[LayerNode]) {
    for node in nodes {
        // a hidden group suppresses all of its descendants
        if !node.visible {
            continue;
        }
        match &node.kind {
            NodeKind::Layer(planes) => blend_layer(canvas, node, planes),
            NodeKind::Group(children) => {
                let mut isolated = Canvas::new(canvas.width, canvas.height, canvas.colors);
                render_nodes(&mut isolated, children);
                blend_canvas(canvas, &isolated, node.blend_mode, node.opacity);
            }
        }
    }
}

/// Flatten the layer tree into a document-sized raster.
pub(crate) fn composite_document(header: &FileHeader, nodes: &[LayerNode]) -> Raster {
    let colors = header
        .color_mode
        .color_channels()
        .unwrap_or(header.channel_count);
    let mut canvas = Canvas::new(header.width, header.height, colors);
    render_nodes(&mut canvas, nodes);
    canvas.into_raster(header.depth)
}
