/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core routines shared by the psd family of crates
//!
//! This crate provides the pieces the decoder crates build on
//!
//! - A bounded big-endian byte cursor over an in-memory source
//! - Bit depth information shared by planes and rasters
//! - Decoder options

pub mod bit_depth;
pub mod bytestream;
pub mod options;
