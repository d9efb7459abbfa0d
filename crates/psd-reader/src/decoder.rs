/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A Photoshop document decoder.

use log::{trace, warn};
use psd_core::bit_depth::BitDepth;
use psd_core::bytestream::ByteCursor;
use psd_core::options::DecoderOptions;

use crate::channels::{decode_merged_image, ChannelPlane};
use crate::composite::{composite_document, Raster};
use crate::constants::{ColorMode, PsdVersion};
use crate::errors::PsdDecodeErrors;
use crate::header::FileHeader;
use crate::layers::decode_layer_mask_section;
use crate::resources::{
    decode_resource_section, global_altitude, global_angle, resolution_info, xmp_metadata,
    ResolutionInfo, ResourceBlock
};
use crate::tree::{build_tree, LayerNode};

/// A PSD/PSB decoder.
///
/// Drives the five document sections in stored order: header, color mode
/// data, image resources, the layer and mask section, and finally the
/// pre-flattened merged image.
pub struct PsdDecoder<'a> {
    stream:          ByteCursor<'a>,
    options:         DecoderOptions,
    header:          Option<FileHeader>,
    color_mode_data: Vec<u8>,
    resources:       Vec<ResourceBlock>,
    merged_alpha:    bool,
    tree:            Vec<LayerNode>,
    merged:          Option<Vec<ChannelPlane>>,
    decoded_headers: bool,
    decoded:         bool
}

impl<'a> PsdDecoder<'a> {
    /// Create a new decoder that reads `data`.
    pub fn new(data: &'a [u8]) -> PsdDecoder<'a> {
        Self::new_with_options(data, DecoderOptions::default())
    }

    /// Create a new decoder with non-default options.
    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> PsdDecoder<'a> {
        PsdDecoder {
            stream: ByteCursor::new(data),
            options,
            header: None,
            color_mode_data: Vec::new(),
            resources: Vec::new(),
            merged_alpha: false,
            tree: Vec::new(),
            merged: None,
            decoded_headers: false,
            decoded: false
        }
    }

    /// Decode the header, color mode data and image resources, leaving
    /// the stream positioned at the layer and mask section.
    ///
    /// Calling it more than once is a no-op.
    pub fn decode_headers(&mut self) -> Result<(), PsdDecodeErrors> {
        if self.decoded_headers {
            return Ok(());
        }

        let header = FileHeader::decode(&mut self.stream, &self.options)?;

        // indexed palettes and duotone specs live here, kept opaque
        let color_data_length = self.stream.read_u32_be()? as usize;
        self.color_mode_data = self.stream.read_bytes(color_data_length)?.to_vec();

        self.resources = decode_resource_section(&mut self.stream)?;

        trace!("Decoded {} resource blocks", self.resources.len());

        self.header = Some(header);
        self.decoded_headers = true;
        Ok(())
    }

    /// Decode the whole document.
    ///
    /// After this returns the layer tree, the merged image and the
    /// resource accessors are all available.
    pub fn decode(&mut self) -> Result<(), PsdDecodeErrors> {
        if self.decoded {
            return Ok(());
        }
        self.decode_headers()?;

        let Some(header) = self.header else {
            return Err(PsdDecodeErrors::Generic("header disappeared between passes"));
        };

        let section = decode_layer_mask_section(&mut self.stream, &header)?;
        self.merged_alpha = section.merged_alpha;
        self.tree = build_tree(section.records)?;

        // the merged image runs to end of file; some minimal writers
        // omit it entirely
        if self.stream.is_eof() {
            if self.options.strict_mode() {
                return Err(PsdDecodeErrors::Generic(
                    "document ends before the merged image section"
                ));
            }
            warn!("Document ends before the merged image section");
        } else {
            self.merged = Some(decode_merged_image(&mut self.stream, &header)?);
        }

        self.decoded = true;
        Ok(())
    }

    /// `(width, height)` once the headers are decoded.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.header.map(|h| (h.width, h.height))
    }

    pub fn bit_depth(&self) -> Option<BitDepth> {
        self.header.map(|h| h.depth)
    }

    pub fn color_mode(&self) -> Option<ColorMode> {
        self.header.map(|h| h.color_mode)
    }

    pub fn version(&self) -> Option<PsdVersion> {
        self.header.map(|h| h.version)
    }

    /// Raw color mode data, non-empty for indexed and duotone documents.
    pub fn color_mode_data(&self) -> &[u8] {
        &self.color_mode_data
    }

    /// All image resource blocks in stored order.
    pub fn resources(&self) -> &[ResourceBlock] {
        &self.resources
    }

    pub fn resolution_info(&self) -> Option<ResolutionInfo> {
        resolution_info(&self.resources)
    }

    pub fn global_angle(&self) -> Option<i32> {
        global_angle(&self.resources)
    }

    pub fn global_altitude(&self) -> Option<i32> {
        global_altitude(&self.resources)
    }

    pub fn xmp_metadata(&self) -> Option<&[u8]> {
        xmp_metadata(&self.resources)
    }

    /// True when the merged image's first alpha channel holds document
    /// transparency rather than a plain alpha channel.
    pub fn has_merged_alpha(&self) -> bool {
        self.merged_alpha
    }

    /// The layer tree, bottom-to-top at every level. Empty for documents
    /// with no layer section (or before [`Self::decode`]).
    pub fn layer_tree(&self) -> &[LayerNode] {
        &self.tree
    }

    /// The pre-flattened merged image planes, as stored.
    pub fn merged_image(&self) -> Option<&[ChannelPlane]> {
        self.merged.as_deref()
    }

    /// Composite the layer tree into a single document-sized raster.
    ///
    /// Documents without layers fall back to the stored merged image.
    pub fn flatten(&self) -> Result<Raster, PsdDecodeErrors> {
        let Some(header) = self.header.filter(|_| self.decoded) else {
            return Err(PsdDecodeErrors::Generic("decode must be called before flatten"));
        };

        if !self.tree.is_empty() {
            return Ok(composite_document(&header, &self.tree));
        }

        let Some(planes) = &self.merged else {
            return Err(PsdDecodeErrors::Generic(
                "document has neither layers nor a merged image"
            ));
        };
        Ok(Raster {
            width:  header.width,
            height: header.height,
            depth:  header.depth,
            planes: planes.clone()
        })
    }
}
