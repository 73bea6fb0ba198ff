// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in → RGBA8 out, direct write into a caller-provided surface.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use thiserror::Error;

use crate::presets::ScalePlan;

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("Source buffer holds {got} bytes, plan needs {want}")]
    SourceTooSmall { got: usize, want: usize },
    #[error("Output surface holds {got} bytes, plan needs {want}")]
    SurfaceTooSmall { got: usize, want: usize },
    #[error("Fast image resize error: {0}")]
    Fir(#[from] fir::ResizeError),
    #[error("Image buffer error: {0}")]
    ImageBuf(#[from] fir::ImageBufferError),
}

/// Resample a tightly packed RGBA8 source into `dst` following `plan`.
///
/// `src` must hold `plan.input.w * plan.input.h * 4` bytes and `dst` at least
/// `plan.out_len()` bytes. Identity plans are a plain copy. Everything else
/// uses bilinear convolution, which downsamples the whole frame (no crop).
pub fn scale_rgba_cpu(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    plan: &ScalePlan,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    let src_len = plan.input.area() * 4;
    if src_rgba.len() < src_len {
        return Err(ScaleError::SourceTooSmall {
            got: src_rgba.len(),
            want: src_len,
        });
    }
    let dst_len = plan.out_len();
    if dst.len() < dst_len {
        return Err(ScaleError::SurfaceTooSmall {
            got: dst.len(),
            want: dst_len,
        });
    }

    if plan.is_identity() {
        dst[..dst_len].copy_from_slice(&src_rgba[..src_len]);
        return Ok(());
    }

    let src_view =
        TypedImageRef::<U8x4>::from_buffer(plan.input.w, plan.input.h, &src_rgba[..src_len])?;
    let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out.w, plan.out.h, &mut dst[..dst_len])?;

    let opts = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Bilinear))
        .use_alpha(false);
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(())
}
