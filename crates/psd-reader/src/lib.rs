//! A layered PSD/PSB decoder
//!
//! This crate reads Photoshop documents the layered way: it parses the
//! layer and mask section into a group tree, decodes every layer's
//! channel planes, and can composite that tree back into a single raster
//! instead of trusting the pre-flattened merged image at the end of the
//! file.
//!
//! Both format revisions are handled, version 1 (`.psd`) and version 2
//! (`.psb`, 64-bit section lengths). Pixel data may be raw, PackBits
//! RLE or ZIP compressed at 1, 8, 16 or 32 bits per channel.
//!
//! # Example
//! - Reading a file and flattening its layers
//! ```no_run
//! use psd_reader::errors::PsdDecodeErrors;
//! use psd_reader::PsdDecoder;
//!
//! fn main() -> Result<(), PsdDecodeErrors> {
//!     let data = std::fs::read("image.psd").unwrap();
//!     let mut decoder = PsdDecoder::new(&data);
//!     decoder.decode()?;
//!
//!     for layer in decoder.layer_tree() {
//!         println!("{} (group: {})", layer.name, layer.is_group());
//!     }
//!     let raster = decoder.flatten()?;
//!     println!("{}x{}", raster.width, raster.height);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
pub extern crate psd_core;
pub use decoder::PsdDecoder;

mod constants;
mod utils;

pub mod channels;
pub mod composite;
pub mod decoder;
pub mod errors;
pub mod header;
pub mod layers;
pub mod packbits;
pub mod resources;
pub mod tree;

pub use constants::{
    BlendMode, ColorMode, CompressionMethod, DividerKind, PsdVersion, FLAG_HIDDEN,
    FLAG_IRRELEVANT, FLAG_TRANSPARENCY_PROTECTED
};
