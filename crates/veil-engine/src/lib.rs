// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// veil-engine — Selective region blur and redaction.
//
// Maps pointer positions from the scaled display canvas into the source
// raster, paints a selection mask, runs one of four redaction kernels over
// the masked pixels, applies global brightness/contrast, and renders the
// result with overlay sprites on top.

pub mod compositor;
pub mod coords;
pub mod kernels;
pub mod mask;
pub mod raster;
pub mod render;
pub mod session;
pub mod worker;

// Re-export the primary structs so callers can use `veil_engine::EditSession` etc.
pub use compositor::{CompositeReport, Compositor};
pub use coords::{CoordinateMapper, ImagePlacement};
pub use kernels::PixelGrid;
pub use mask::Mask;
pub use raster::Raster;
pub use render::{Drawable, Scene, Sprite};
pub use session::{EditSession, PointerOutcome, SessionState};
pub use worker::CompositeWorker;
