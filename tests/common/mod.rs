//! Common test utilities for the fridge-scan integration tests
//!
//! Photos are generated in memory so the tests need no fixture files.

#![allow(dead_code)]

/// In-memory source photos
pub mod photos {
    use fridge_scan::SourceImage;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    /// Uniformly coloured PNG
    pub fn solid_png(label: &str, width: u32, height: u32, rgb: [u8; 3]) -> SourceImage {
        let img = RgbImage::from_pixel(width, height, Rgb(rgb));
        SourceImage::from_bytes(label, encode(&img, ImageFormat::Png))
    }

    /// Horizontal/vertical gradient encoded as JPEG
    pub fn gradient_jpeg(label: &str, width: u32, height: u32) -> SourceImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        });
        SourceImage::from_bytes(label, encode(&img, ImageFormat::Jpeg))
    }

    /// High-entropy PNG that compresses badly at any JPEG quality
    pub fn noisy_png(label: &str, width: u32, height: u32) -> SourceImage {
        let mut state = 0x2545_f491_u32;
        let img = RgbImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            };
            Rgb([next(), next(), next()])
        });
        SourceImage::from_bytes(label, encode(&img, ImageFormat::Png))
    }

    /// Uniform RGBA PNG with the given alpha
    pub fn translucent_png(label: &str, width: u32, height: u32, rgba: [u8; 4]) -> SourceImage {
        let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        SourceImage::from_bytes(label, out.into_inner())
    }

    /// Bytes no decoder accepts
    pub fn garbage(label: &str) -> SourceImage {
        SourceImage::from_bytes(label, b"definitely not an image".to_vec())
    }
}

/// Custom assertions for processed images
pub mod assertions {
    use fridge_scan::ProcessedImage;

    /// Decodes the payload and checks it matches the reported dimensions
    pub fn assert_valid_jpeg(processed: &ProcessedImage) {
        assert!(
            !processed.base64.starts_with("data:"),
            "payload must not carry a data URL prefix"
        );
        let bytes = processed.jpeg_bytes().expect("payload is valid base64");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "payload is not a JPEG");
        let decoded = image::load_from_memory(&bytes).expect("payload decodes");
        assert_eq!(
            (decoded.width(), decoded.height()),
            (processed.width, processed.height),
            "decoded size differs from reported size"
        );
    }

    /// Average of the RGB channels at the image centre
    pub fn centre_level(processed: &ProcessedImage) -> u8 {
        let bytes = processed.jpeg_bytes().unwrap();
        let rgb = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let px = rgb.get_pixel(processed.width / 2, processed.height / 2);
        ((u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2])) / 3) as u8
    }
}
