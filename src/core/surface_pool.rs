//! # Render Surface Pool
//!
//! Off-screen RGBA surfaces for the preprocessing pipeline. A surface is never
//! shared between concurrent calls: [`SurfacePool::checkout`] hands out a
//! [`SurfaceLease`] with exclusive ownership of a buffer, and dropping the
//! lease returns the buffer on every exit path, including errors and panics.
//!
//! ## Overview
//!
//! A multi-photo scan decodes and renders several large images at once. The
//! pool keeps a bounded number of returned buffers around so a batch reuses
//! the allocations of the previous one.
//!
//! ```text
//! ┌─────────────┐ checkout  ┌──────────────┐  drop   ┌─────────────┐
//! │ Preprocessor│──────────▶│ SurfaceLease │────────▶│ SurfacePool │
//! └─────────────┘           └──────────────┘         └─────────────┘
//! ```
//!
//! ## Allocation Failures
//!
//! Surfaces are reserved with `try_reserve_exact`, so a surface that cannot be
//! allocated is reported as a render error instead of aborting the process.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fridge_scan::core::SurfacePool;
//!
//! let pool = Arc::new(SurfacePool::new(2));
//! {
//!     let surface = SurfacePool::checkout(&pool, 16).unwrap();
//!     assert_eq!(surface.len(), 16);
//! }
//! assert_eq!(pool.stats(), (1, 2));
//! ```

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

/// Why a surface could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceError {
    pub bytes: usize,
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not allocate a {} byte render surface", self.bytes)
    }
}

impl std::error::Error for SurfaceError {}

/// Allocate a zeroed buffer of `len` bytes without aborting on failure.
pub fn allocate_surface(len: usize) -> Result<Vec<u8>, SurfaceError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| SurfaceError { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// A bounded pool of reusable RGBA surfaces.
///
/// # Design Principles
///
/// - **Exclusive checkout**: each lease owns its buffer outright
/// - **Scoped release**: buffers come back through `Drop`, never by hand
/// - **Bounded growth**: at most `max_surfaces` buffers are retained
/// - **Zeroed on reuse**: a returned buffer is cleared before the next lease
#[derive(Debug)]
pub struct SurfacePool {
    surfaces: Mutex<VecDeque<Vec<u8>>>,
    max_surfaces: usize,
}

impl SurfacePool {
    /// Creates an empty pool that retains up to `max_surfaces` buffers.
    pub fn new(max_surfaces: usize) -> Self {
        Self {
            surfaces: Mutex::new(VecDeque::with_capacity(max_surfaces)),
            max_surfaces,
        }
    }

    /// Checks out a zeroed surface of exactly `len` bytes.
    ///
    /// Reuses a pooled buffer when one exists, growing it if needed, and
    /// allocates otherwise.
    pub fn checkout(pool: &Arc<Self>, len: usize) -> Result<SurfaceLease, SurfaceError> {
        let reused = pool.lock().pop_front();
        let buf = match reused {
            Some(mut buf) => {
                if buf.capacity() < len {
                    buf.try_reserve_exact(len - buf.len())
                        .map_err(|_| SurfaceError { bytes: len })?;
                }
                buf.resize(len, 0);
                trace!(len, "Reusing pooled render surface");
                buf
            }
            None => allocate_surface(len)?,
        };
        Ok(SurfaceLease {
            buf,
            pool: Some(Arc::clone(pool)),
        })
    }

    /// `(available, max)` surface counts.
    pub fn stats(&self) -> (usize, usize) {
        (self.lock().len(), self.max_surfaces)
    }

    fn give_back(&self, mut buf: Vec<u8>) {
        buf.fill(0);
        let mut surfaces = self.lock();
        if surfaces.len() < self.max_surfaces {
            surfaces.push_back(buf);
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Vec<u8>>> {
        // The queue holds plain buffers, so a poisoned lock is still consistent.
        self.surfaces.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive handle to a render surface.
///
/// Dereferences to the pixel bytes. Unpooled leases simply free their buffer.
#[derive(Debug)]
pub struct SurfaceLease {
    buf: Vec<u8>,
    pool: Option<Arc<SurfacePool>>,
}

impl SurfaceLease {
    /// A surface that is not backed by any pool.
    pub fn unpooled(len: usize) -> Result<Self, SurfaceError> {
        Ok(Self {
            buf: allocate_surface(len)?,
            pool: None,
        })
    }
}

impl Deref for SurfaceLease {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for SurfaceLease {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.give_back(std::mem::take(&mut self.buf));
        }
    }
}
