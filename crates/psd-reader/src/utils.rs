/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use psd_core::bytestream::ByteCursor;

use crate::errors::PsdDecodeErrors;

/// Read a Pascal string: a one byte length prefix followed by that many
/// bytes, with the whole thing (prefix included) padded to a multiple of
/// `pad_to` bytes.
///
/// Resource names pad to 2, layer names pad to 4.
pub(crate) fn read_pascal_string(
    cursor: &mut ByteCursor, pad_to: usize
) -> Result<String, PsdDecodeErrors> {
    let len = usize::from(cursor.read_u8()?);
    let bytes = cursor.read_bytes(len)?;
    let name = String::from_utf8_lossy(bytes).into_owned();

    let consumed = 1 + len;
    let padding = (pad_to - consumed % pad_to) % pad_to;
    cursor.skip(padding)?;

    Ok(name)
}

/// Read a UTF-16BE string prefixed by a u32 character count.
pub(crate) fn read_unicode_string(cursor: &mut ByteCursor) -> Result<String, PsdDecodeErrors> {
    let count = cursor.read_u32_be()? as usize;
    let mut units = Vec::with_capacity(count);
    for _ in 0..count {
        units.push(cursor.read_u16_be()?);
    }
    Ok(String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string())
}

/// Convert a 16.16 fixed point value to a float.
pub(crate) fn fixed_point_to_f32(value: u32) -> f32 {
    value as f32 / 65536.0
}

/// Downsample a 16-bit sample to 8 bits, `round(v / 257)`.
///
/// 257 because `255 * 257 == 65535`, so full range maps to full range.
pub fn sixteen_to_eight(value: u16) -> u8 {
    ((u32::from(value) * 2 + 257) / 514) as u8
}

#[cfg(test)]
mod tests {
    use super::sixteen_to_eight;

    #[test]
    fn downsample_is_round_of_division() {
        for v in [0_u16, 1, 128, 256, 257, 500, 32768, 65534, 65535] {
            let expected = (f64::from(v) / 257.0).round() as u8;
            assert_eq!(sixteen_to_eight(v), expected, "value {v}");
        }
        // the scaling used by 16-bit writers is exactly invertible
        for k in 0..=255_u16 {
            assert_eq!(sixteen_to_eight(k * 257), k as u8);
        }
    }
}
