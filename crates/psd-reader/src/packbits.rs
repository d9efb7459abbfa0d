/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! PackBits, the byte oriented run length coding used by RLE scanlines.
//!
//! Grammar: a signed control byte `n`; `0..=127` copies the next `n + 1`
//! bytes literally, `-127..=-1` repeats the next byte `1 - n` times and
//! `-128` is a no-op.
//!
//! Decoding is what the decoder itself needs; encoding exists for fixture
//! producers and tests.

/// Decode PackBits data from `src`, filling `dst` exactly.
///
/// Returns the number of bytes consumed from `src`. Trailing no-op bytes
/// after `dst` is full are consumed as well, so a fully decoded scanline
/// consumes its whole compressed run.
///
/// Errors if a run would overflow `dst` or if `src` ends before `dst`
/// is full. A scanline that decodes to the wrong width is a corruption
/// signal the caller must treat as fatal.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<usize, &'static str> {
    let mut in_pos = 0;
    let mut out_pos = 0;

    while out_pos < dst.len() {
        let Some(&control) = src.get(in_pos) else {
            return Err("compressed scanline ended before the row was full");
        };
        in_pos += 1;
        let control = control as i8;

        if control >= 0 {
            let run = control as usize + 1;
            if out_pos + run > dst.len() {
                return Err("literal run overflows the row");
            }
            let Some(literals) = src.get(in_pos..in_pos + run) else {
                return Err("compressed scanline ended inside a literal run");
            };
            dst[out_pos..out_pos + run].copy_from_slice(literals);
            in_pos += run;
            out_pos += run;
        } else if control != -128 {
            let run = 1 - control as isize;
            let run = run as usize;
            if out_pos + run > dst.len() {
                return Err("repeat run overflows the row");
            }
            let Some(&value) = src.get(in_pos) else {
                return Err("compressed scanline ended inside a repeat run");
            };
            in_pos += 1;
            dst[out_pos..out_pos + run].fill(value);
            out_pos += run;
        }
    }

    // writers may pad a row with no-op controls
    while src.get(in_pos) == Some(&0x80) {
        in_pos += 1;
    }

    Ok(in_pos)
}

/// Encode `src` with PackBits.
///
/// Runs of three or more identical bytes become repeat runs, everything
/// else is emitted as literals. The output always round-trips through
/// [`decode_into`]; it is not guaranteed to be minimal.
pub fn encode(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() / 2 + 2);
    let mut i = 0;

    while i < src.len() {
        let value = src[i];
        let mut run = 1;
        while i + run < src.len() && src[i + run] == value && run < 128 {
            run += 1;
        }

        if run >= 3 {
            out.push((257 - run) as u8);
            out.push(value);
            i += run;
            continue;
        }

        // literal run, stopping early when a 3-byte repeat shows up
        let start = i;
        let mut len = 0;
        while i + len < src.len() && len < 128 {
            if len > 0 && i + len + 2 < src.len() {
                let c = src[i + len];
                if src[i + len + 1] == c && src[i + len + 2] == c {
                    break;
                }
            }
            len += 1;
        }
        out.push((len - 1) as u8);
        out.extend_from_slice(&src[start..start + len]);
        i = start + len;
    }

    out
}
