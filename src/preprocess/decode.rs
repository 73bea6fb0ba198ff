//! Decoding of source photos into RGBA8 pixels.

use std::io::Cursor;

use image::ImageReader;
use tracing::debug;

use super::types::SourceImage;
use crate::config::DecodeLimits;
use crate::error::{PrepError, PrepResult};

/// Tightly packed RGBA8 pixels of a decoded source.
///
/// Owns the decode buffer; it is freed when this value goes out of scope.
#[derive(Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Decodes `source`, guessing the format from its bytes.
///
/// Any decoder failure, a limit violation, or a zero-sized image is a
/// [`PrepError::Decode`].
pub fn decode(source: &SourceImage, limits: &DecodeLimits) -> PrepResult<DecodedImage> {
    let label = source.label();
    let mut reader = ImageReader::new(Cursor::new(source.bytes()))
        .with_guessed_format()
        .map_err(|e| PrepError::decode(label, e.to_string()))?;
    let format = reader.format();
    reader.limits(limits.to_image_limits());

    let image = reader
        .decode()
        .map_err(|e| PrepError::decode(label, e.to_string()))?;
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PrepError::decode(label, "image has no pixels"));
    }
    debug!(?format, width, height, "Decoded source image");

    Ok(DecodedImage {
        width,
        height,
        pixels: image.into_rgba8().into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(w, h, Rgb([10, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_to_rgba() {
        let source = SourceImage::from_bytes("a.png", png(3, 2));
        let decoded = decode(&source, &DecodeLimits::default()).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixels().len(), 3 * 2 * 4);
        assert_eq!(&decoded.pixels()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let source = SourceImage::from_bytes("notes.txt", b"not an image".to_vec());
        let err = decode(&source, &DecodeLimits::default()).unwrap_err();
        assert_eq!(err.category(), "decode");
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn test_truncated_image_is_a_decode_error() {
        let mut bytes = png(16, 16);
        bytes.truncate(bytes.len() / 2);
        let source = SourceImage::from_bytes("cut.png", bytes);
        assert!(decode(&source, &DecodeLimits::default()).is_err());
    }

    #[test]
    fn test_limits_reject_oversized_source() {
        let source = SourceImage::from_bytes("wide.png", png(64, 8));
        let limits = DecodeLimits {
            max_source_width: 32,
            ..DecodeLimits::default()
        };
        let err = decode(&source, &limits).unwrap_err();
        assert_eq!(err.category(), "decode");
    }
}
