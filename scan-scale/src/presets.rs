// SPDX-License-Identifier: MIT
//! # Scale Plan Computation
//!
//! This module decides the output size of a photo before upload. It implements
//! aspect-ratio preserving scale-to-fit within a bounding box.
//!
//! ## Design Philosophy
//!
//! The plan is computed once per image and carries everything the resampler
//! needs:
//! 1. **Bounds**: the maximum output width and height
//! 2. **ScalePlan**: the uniform ratio and the rounded output dimensions
//!
//! ## Rounding
//!
//! - Ratios are computed in `f64` and output sides are rounded to the nearest integer
//! - No upscaling: images already inside the bounds keep their size
//! - Each output side is clamped to at least 1px

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Number of pixels covered by this size.
    pub fn area(&self) -> usize {
        (self.w as usize) * (self.h as usize)
    }
}

/// Upper bounds on the output dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub max_w: u32,
    pub max_h: u32,
}

impl Bounds {
    pub fn new(max_w: u32, max_h: u32) -> Self {
        Self { max_w, max_h }
    }
}

/// Complete scaling plan computed from the source size and bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Bounds used for planning
    pub bounds: Bounds,
    /// Uniform scale factor applied to both sides, never above 1.0
    pub ratio: f64,
    /// Final computed output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when the plan keeps the source dimensions.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }

    /// Byte length of an RGBA8 surface holding the output.
    pub fn out_len(&self) -> usize {
        self.out.area() * 4
    }
}

/// Compute a scaling plan that fits `input` inside `bounds`.
///
/// The binding constraint is whichever of `max_w / w` and `max_h / h` is
/// smaller. The ratio is clamped to 1.0 so small images pass through
/// unchanged, which also makes the computation idempotent: planning an
/// already-planned output against the same bounds yields ratio 1.0.
///
/// # Arguments
/// * `input` - Source image dimensions, both sides non-zero
/// * `bounds` - Maximum output dimensions, both sides non-zero
///
/// # Performance
/// O(1) computation with a handful of floating-point operations
pub fn build_plan(input: Size, bounds: Bounds) -> ScalePlan {
    let ratio = fit_ratio(input, bounds);
    let (w, h) = (f64::from(input.w), f64::from(input.h));
    let out = Size {
        w: ((w * ratio).round() as u32).clamp(1, bounds.max_w.max(1)),
        h: ((h * ratio).round() as u32).clamp(1, bounds.max_h.max(1)),
    };
    ScalePlan {
        input,
        bounds,
        ratio,
        out,
    }
}

/// Uniform ratio that fits `input` in `bounds` without upscaling.
fn fit_ratio(input: Size, bounds: Bounds) -> f64 {
    let rw = f64::from(bounds.max_w) / f64::from(input.w.max(1));
    let rh = f64::from(bounds.max_h) / f64::from(input.h.max(1));
    rw.min(rh).min(1.0)
}
