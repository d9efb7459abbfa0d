/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Decoder options
//!
//! This module exposes a struct whose options influence
//! decoding routines, mainly as a guard against absurdly
//! sized or subtly corrupt documents.

/// Decoder options.
///
/// The same options value can be reused across documents.
#[derive(Debug, Copy, Clone)]
pub struct DecoderOptions {
    max_width:   usize,
    max_height:  usize,
    strict_mode: bool
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_width:   1 << 14,
            max_height:  1 << 14,
            strict_mode: false
        }
    }
}

impl DecoderOptions {
    /// Maximum width the decoder accepts.
    ///
    /// Documents wider than this fail before any pixel data is touched.
    ///
    /// Default is 16384.
    pub const fn max_width(&self) -> usize {
        self.max_width
    }

    /// Maximum height the decoder accepts.
    ///
    /// Default is 16384.
    pub const fn max_height(&self) -> usize {
        self.max_height
    }

    /// Whether recoverable oddities should be treated as hard errors.
    ///
    /// Default is false.
    pub const fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Return a new options value with the width limit changed.
    pub fn set_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    /// Return a new options value with the height limit changed.
    pub fn set_max_height(mut self, height: usize) -> Self {
        self.max_height = height;
        self
    }

    /// Return a new options value with strict mode toggled.
    pub fn set_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }
}
