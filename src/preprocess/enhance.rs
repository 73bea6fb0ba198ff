//! Coarse brightness/contrast normalization.
//!
//! Three-bucket brightness correction followed by a fixed contrast boost around
//! the midpoint, both per channel and each clamped on its own:
//!
//! | Average luma | Brightness multiplier |
//! |--------------|-----------------------|
//! | `< 100`      | 1.3                   |
//! | `> 200`      | 0.9                   |
//! | otherwise    | 1.0                   |
//!
//! then `c' = clamp((c - 128) * 1.1 + 128)`.
//!
//! Because the mapping of a channel value depends only on the value and the
//! chosen multiplier, the pass builds a 256-entry table once and applies it to
//! every R, G and B byte. Alpha is left untouched.

pub const DARK_LUMA: f64 = 100.0;
pub const BRIGHT_LUMA: f64 = 200.0;
pub const DARK_MULTIPLIER: f64 = 1.3;
pub const BRIGHT_MULTIPLIER: f64 = 0.9;
pub const CONTRAST_FACTOR: f64 = 1.1;
pub const CONTRAST_MIDPOINT: f64 = 128.0;

/// What the enhancement pass measured and applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceStats {
    pub average_luma: f64,
    pub brightness: f64,
}

/// Mean of `(R + G + B) / 3` over all RGBA pixels. Zero for an empty buffer.
pub fn average_luma(rgba: &[u8]) -> f64 {
    let pixels = rgba.len() / 4;
    if pixels == 0 {
        return 0.0;
    }
    let total: f64 = rgba
        .chunks_exact(4)
        .map(|px| (f64::from(px[0]) + f64::from(px[1]) + f64::from(px[2])) / 3.0)
        .sum();
    total / pixels as f64
}

pub fn brightness_multiplier(average_luma: f64) -> f64 {
    if average_luma < DARK_LUMA {
        DARK_MULTIPLIER
    } else if average_luma > BRIGHT_LUMA {
        BRIGHT_MULTIPLIER
    } else {
        1.0
    }
}

#[inline]
fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Brightness multiply, then contrast remap, for one channel value.
#[inline]
pub fn adjust_channel(value: u8, brightness: f64) -> u8 {
    let brightened = clamp_channel(f64::from(value) * brightness);
    clamp_channel((f64::from(brightened) - CONTRAST_MIDPOINT) * CONTRAST_FACTOR + CONTRAST_MIDPOINT)
}

fn build_lut(brightness: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        *slot = adjust_channel(value as u8, brightness);
    }
    lut
}

/// Normalizes brightness and contrast of an RGBA8 buffer in place.
pub fn apply_auto_enhance(rgba: &mut [u8]) -> EnhanceStats {
    let average_luma = average_luma(rgba);
    let brightness = brightness_multiplier(average_luma);
    let lut = build_lut(brightness);

    for px in rgba.chunks_exact_mut(4) {
        px[0] = lut[px[0] as usize];
        px[1] = lut[px[1] as usize];
        px[2] = lut[px[2] as usize];
    }

    EnhanceStats {
        average_luma,
        brightness,
    }
}
