// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Veil.
//
// Pointers outside the displayed image and empty selections are not errors:
// the former are dropped silently, the latter produce an unchanged raster.

use thiserror::Error;

/// Top-level error type for all Veil operations.
#[derive(Debug, Error)]
pub enum VeilError {
    // -- Raster / geometry --
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    // -- Parameters --
    #[error("invalid parameter {name}: {value} is not a finite number")]
    InvalidParameter { name: &'static str, value: f32 },

    // -- Codecs --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Headless driver --
    #[error("replay script error: {0}")]
    Script(String),

    // -- Background compositing --
    #[error("composite worker failed: {0}")]
    Worker(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VeilError>;

/// Reject a non-finite numeric parameter at the boundary.
pub fn ensure_finite(name: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VeilError::InvalidParameter { name, value })
    }
}
