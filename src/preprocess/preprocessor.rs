//! The preprocessing pipeline: decode, scale-to-fit, enhance, size search.

use std::sync::Arc;
use std::time::Instant;

use fast_image_resize::Resizer;
use scan_scale::cpu::scale_rgba_cpu;
use scan_scale::presets::{Bounds, Size, build_plan};
use tracing::{debug, info, info_span, warn};

use super::decode::decode;
use super::encode::{encode_jpeg_base64, rgba_to_rgb, search_quality};
use super::enhance::apply_auto_enhance;
use super::types::{ProcessedImage, SourceImage};
use crate::config::{DecodeLimits, PreprocessOptions};
use crate::core::{CancelToken, SurfaceLease, SurfacePool};
use crate::error::{PrepError, PrepResult};

/// Turns source photos into upload-ready JPEG payloads.
///
/// A `Preprocessor` holds only immutable configuration plus an optional
/// surface pool, so one instance can serve concurrent calls; every call gets
/// its own decode buffer, render surface and resampler.
///
/// # Example
///
/// ```rust,no_run
/// use fridge_scan::config::PreprocessOptions;
/// use fridge_scan::core::CancelToken;
/// use fridge_scan::preprocess::{Preprocessor, SourceImage};
///
/// # fn main() -> Result<(), fridge_scan::error::PrepError> {
/// let preprocessor = Preprocessor::new(PreprocessOptions::new().max_width(1500))?;
/// let source = SourceImage::from_path("fridge.jpg")?;
/// let processed = preprocessor.process(&source, &CancelToken::new())?;
/// println!("{}x{} {} KB", processed.width, processed.height, processed.size_kb);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Preprocessor {
    options: PreprocessOptions,
    limits: DecodeLimits,
    pool: Option<Arc<SurfacePool>>,
}

impl Preprocessor {
    /// Creates a preprocessor after validating `options`.
    pub fn new(options: PreprocessOptions) -> PrepResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            limits: DecodeLimits::default(),
            pool: None,
        })
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Draws render surfaces from `pool` instead of allocating per call.
    pub fn with_pool(mut self, pool: Arc<SurfacePool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Runs the full pipeline on one source.
    ///
    /// # Errors
    ///
    /// - [`PrepError::Decode`] if the bytes are not a supported image or break the decode limits
    /// - [`PrepError::Render`] if the render surface cannot be allocated or resampling fails
    /// - [`PrepError::Encode`] if the JPEG encoder rejects the surface
    /// - [`PrepError::Cancelled`] if `cancel` fires between stages
    ///
    /// Missing the size target at the quality floor is not an error.
    pub fn process(&self, source: &SourceImage, cancel: &CancelToken) -> PrepResult<ProcessedImage> {
        let label = source.label();
        let _span = info_span!("preprocess", image = %label).entered();
        let started = Instant::now();

        cancel.check("decode")?;
        let decoded = decode(source, &self.limits)?;

        let plan = build_plan(
            Size {
                w: decoded.width,
                h: decoded.height,
            },
            Bounds::new(self.options.max_width, self.options.max_height),
        );
        debug!(
            from = ?(plan.input.w, plan.input.h),
            to = ?(plan.out.w, plan.out.h),
            ratio = plan.ratio,
            "Planned scale-to-fit"
        );

        cancel.check("render")?;
        let mut surface = self.acquire_surface(plan.out_len(), label)?;
        scale_rgba_cpu(&mut Resizer::new(), decoded.pixels(), &plan, &mut surface)
            .map_err(|e| PrepError::render(label, e.to_string()))?;
        drop(decoded);

        cancel.check("enhance")?;
        if self.options.auto_enhance {
            let stats = apply_auto_enhance(&mut surface);
            debug!(
                average_luma = stats.average_luma,
                brightness = stats.brightness,
                "Applied auto-enhance"
            );
        }

        let rgb = rgba_to_rgb(&surface);
        drop(surface);

        cancel.check("encode")?;
        let (width, height) = (plan.out.w, plan.out.h);
        let search = search_quality(
            self.options.quality_percent(),
            self.options.target_size_kb,
            cancel,
            |quality| {
                encode_jpeg_base64(&rgb, width, height, quality)
                    .map_err(|e| PrepError::encode(label, e.to_string()))
            },
        )?;

        if search.size_kb > self.options.target_size_kb {
            warn!(
                size_kb = search.size_kb,
                target_kb = self.options.target_size_kb,
                "Size target missed at the quality floor"
            );
        }
        info!(
            width,
            height,
            size_kb = search.size_kb,
            quality = search.quality_percent,
            iterations = search.iterations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Preprocessed image"
        );

        Ok(ProcessedImage {
            base64: search.base64,
            width,
            height,
            size_kb: search.size_kb,
            quality: f32::from(search.quality_percent) / 100.0,
            iterations: search.iterations,
        })
    }

    fn acquire_surface(&self, len: usize, label: &str) -> PrepResult<SurfaceLease> {
        let lease = match &self.pool {
            Some(pool) => SurfacePool::checkout(pool, len),
            None => SurfaceLease::unpooled(len),
        };
        lease.map_err(|e| PrepError::render(label, e.to_string()))
    }
}
