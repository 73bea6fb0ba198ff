//! JPEG encoding and the payload size search.
//!
//! ## Quality Search
//!
//! The first encode uses the starting quality. While the base64 payload is
//! larger than the target and quality is above the floor, quality drops by 10
//! points (never below the floor) and the surface is re-encoded. Quality is
//! tracked in integer percent so the steps land exactly on
//! 85, 75, 65, 55, 45, 35, 30 for the default start. That is at most six
//! re-encodes; missing the target at the floor returns the floor result.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

use crate::config::{QUALITY_FLOOR_PERCENT, QUALITY_STEP_PERCENT};
use crate::core::CancelToken;
use crate::error::PrepResult;

/// Outcome of [`search_quality`].
#[derive(Debug, Clone, PartialEq)]
pub struct QualitySearch {
    pub base64: String,
    pub size_kb: u32,
    pub quality_percent: u8,
    pub iterations: u32,
}

/// Size of a base64 payload in KB: `round(len * 3 / 4 / 1024)`.
pub fn payload_size_kb(base64_len: usize) -> u32 {
    (base64_len as f64 * 3.0 / 4.0 / 1024.0).round() as u32
}

/// Flattens an RGBA8 buffer onto opaque black, `round(c * a / 255)` per channel.
pub fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| {
            let a = u16::from(px[3]);
            let over_black = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
            [over_black(px[0]), over_black(px[1]), over_black(px[2])]
        })
        .collect()
}

/// Encodes RGB8 pixels as a base64 JPEG at `quality` percent.
pub fn encode_jpeg_base64(
    rgb: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<String, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).write_image(
        rgb,
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(general_purpose::STANDARD.encode(out.into_inner()))
}

/// Quality one step below `quality`, clamped to the floor.
pub fn next_quality(quality: u8) -> u8 {
    quality
        .saturating_sub(QUALITY_STEP_PERCENT)
        .max(QUALITY_FLOOR_PERCENT)
}

/// Runs the bounded re-encode loop.
///
/// `encode` is called with a quality percentage and returns a base64 payload.
/// Cancellation is checked before each re-encode.
pub fn search_quality<F>(
    start_percent: u8,
    target_kb: u32,
    cancel: &CancelToken,
    mut encode: F,
) -> PrepResult<QualitySearch>
where
    F: FnMut(u8) -> PrepResult<String>,
{
    let mut quality = start_percent;
    let mut base64 = encode(quality)?;
    let mut size_kb = payload_size_kb(base64.len());
    let mut iterations = 0;
    debug!(quality, size_kb, "Initial encode");

    while size_kb > target_kb && quality > QUALITY_FLOOR_PERCENT {
        cancel.check("quality search")?;
        quality = next_quality(quality);
        base64 = encode(quality)?;
        size_kb = payload_size_kb(base64.len());
        iterations += 1;
        debug!(quality, size_kb, iterations, "Re-encoded");
    }

    Ok(QualitySearch {
        base64,
        size_kb,
        quality_percent: quality,
        iterations,
    })
}
