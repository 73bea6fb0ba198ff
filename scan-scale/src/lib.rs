// SPDX-License-Identifier: MIT
//! # scan-scale: Scale-to-Fit for Vision Model Uploads
//!
//! This crate computes how a captured photo should be downscaled before it is
//! sent to a vision-language model, and performs the resampling on the CPU.
//!
//! ## Architecture Overview
//!
//! The crate is split along the same line as the pipeline that uses it:
//! 1. **Planning**: a pure, O(1) computation of the output size from the source
//!    size and a bounding box
//! 2. **Resampling**: a SIMD-accelerated RGBA resize into a caller-provided
//!    surface, built on `fast_image_resize`
//!
//! ## Key Components
//!
//! - [`presets`]: [`presets::Bounds`], [`presets::ScalePlan`] and [`presets::build_plan`]
//! - [`cpu`]: [`cpu::scale_rgba_cpu`], the CPU resampler
//!
//! ## Scale-to-Fit Rules
//!
//! - A single uniform ratio `r = min(max_w / w, max_h / h, 1.0)` is applied to both sides
//! - Images are never upscaled
//! - Both bounds hold at the same time; the smaller of the two ratios binds
//!
//! ## Usage Example
//!
//! ```rust
//! use scan_scale::cpu::scale_rgba_cpu;
//! use scan_scale::presets::{build_plan, Bounds, Size};
//!
//! let input = Size { w: 4000, h: 3000 };
//! let plan = build_plan(input, Bounds::new(1920, 1080));
//! assert_eq!((plan.out.w, plan.out.h), (1440, 1080));
//!
//! let src = vec![0u8; 8 * 6 * 4];
//! let small = build_plan(Size { w: 8, h: 6 }, Bounds::new(4, 4));
//! let mut dst = vec![0u8; small.out_len()];
//! let mut resizer = fast_image_resize::Resizer::new();
//! scale_rgba_cpu(&mut resizer, &src, &small, &mut dst).unwrap();
//! ```

pub mod cpu;
pub mod presets;
