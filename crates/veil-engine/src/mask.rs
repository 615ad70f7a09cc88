// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Selection mask — a display-sized alpha plane painted with circular brush
// and eraser stamps.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_circle_mut;
use tracing::trace;
use veil_core::error::{Result, VeilError};
use veil_core::{BRUSH_RADIUS_MAX, PixelRect, Tool};

/// Alpha value written by the brush.
pub const SELECTED: u8 = 255;

/// Per-pixel selection strength in display space. Non-zero alpha selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    alpha: GrayImage,
}

impl Mask {
    /// An empty mask the size of the display canvas.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(VeilError::InvalidRaster(format!(
                "mask must be non-empty, got {width}x{height}"
            )));
        }
        Ok(Self {
            alpha: GrayImage::new(width, height),
        })
    }

    /// Wrap an existing alpha plane.
    pub fn from_alpha(alpha: GrayImage) -> Result<Self> {
        if alpha.width() == 0 || alpha.height() == 0 {
            return Err(VeilError::InvalidRaster("mask must be non-empty".into()));
        }
        Ok(Self { alpha })
    }

    pub fn width(&self) -> u32 {
        self.alpha.width()
    }

    pub fn height(&self) -> u32 {
        self.alpha.height()
    }

    pub fn as_alpha(&self) -> &GrayImage {
        &self.alpha
    }

    /// Alpha at `(x, y)`; 0 outside the mask.
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        if x < self.width() && y < self.height() {
            self.alpha.get_pixel(x, y).0[0]
        } else {
            0
        }
    }

    /// Stamp a filled circle. The brush saturates at full alpha, the eraser
    /// clears to zero regardless of the previous value. The radius is capped
    /// at [`BRUSH_RADIUS_MAX`]. Returns the touched
    /// display rectangle (empty when the stamp misses the canvas).
    pub fn paint(&mut self, x: f32, y: f32, radius: f32, tool: Tool) -> PixelRect {
        let r = radius.round().clamp(0.0, BRUSH_RADIUS_MAX) as i32;
        // Stamps wholly off the canvas stay off it after clamping the centre.
        let cx = (x.round() as i32).clamp(-(r + 1), self.width() as i32 + r);
        let cy = (y.round() as i32).clamp(-(r + 1), self.height() as i32 + r);
        let value = match tool {
            Tool::Brush => SELECTED,
            Tool::Eraser => 0,
        };
        draw_filled_circle_mut(&mut self.alpha, (cx, cy), r, Luma([value]));
        let touched = PixelRect::around(cx, cy, r).clamp_to(self.width(), self.height());
        trace!(cx, cy, r, ?tool, "mask stamp");
        touched
    }

    /// Zero the whole mask.
    pub fn clear(&mut self) {
        self.alpha.fill(0);
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.as_raw().iter().all(|&a| a == 0)
    }

    /// Number of selected display pixels.
    pub fn selected_count(&self) -> usize {
        self.alpha.as_raw().iter().filter(|&&a| a > 0).count()
    }

    /// Bounding box of all selected pixels, empty when nothing is selected.
    pub fn selected_bounds(&self) -> PixelRect {
        self.iter_selected()
            .fold(PixelRect::EMPTY, |acc, (x, y)| {
                acc.union(&PixelRect::new(x as i32, y as i32, x as i32 + 1, y as i32 + 1))
            })
    }

    /// Selected pixels in row-major order.
    pub fn iter_selected(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.iter_selected_in(PixelRect::full(self.width(), self.height()))
    }

    /// Selected pixels within `rect`, row-major.
    pub fn iter_selected_in(&self, rect: PixelRect) -> impl Iterator<Item = (u32, u32)> + '_ {
        let rect = rect.clamp_to(self.width(), self.height());
        let (x0, x1) = (rect.x0.max(0) as u32, rect.x1.max(0) as u32);
        (rect.y0.max(0) as u32..rect.y1.max(0) as u32).flat_map(move |y| {
            (x0..x1).filter_map(move |x| (self.alpha.get_pixel(x, y).0[0] > 0).then_some((x, y)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brush_selects_a_disc() {
        let mut mask = Mask::new(100, 100).unwrap();
        let touched = mask.paint(50.0, 50.0, 10.0, Tool::Brush);
        assert_eq!(touched, PixelRect::new(40, 40, 61, 61));
        assert_eq!(mask.alpha(50, 50), SELECTED);
        assert_eq!(mask.alpha(60, 50), SELECTED);
        assert_eq!(mask.alpha(58, 58), 0);
        assert_eq!(mask.alpha(39, 50), 0);
    }

    #[test]
    fn repeated_strokes_saturate() {
        let mut mask = Mask::new(40, 40).unwrap();
        mask.paint(20.0, 20.0, 5.0, Tool::Brush);
        let once = mask.clone();
        mask.paint(20.0, 20.0, 5.0, Tool::Brush);
        assert_eq!(mask, once);
        assert_eq!(mask.alpha(20, 20), 255);
    }

    #[test]
    fn eraser_clears_within_stamp_only() {
        let mut mask = Mask::new(60, 60).unwrap();
        mask.paint(30.0, 30.0, 20.0, Tool::Brush);
        mask.paint(30.0, 30.0, 5.0, Tool::Eraser);
        assert_eq!(mask.alpha(30, 30), 0);
        assert_eq!(mask.alpha(33, 30), 0);
        assert_eq!(mask.alpha(40, 30), SELECTED);
    }

    #[test]
    fn stamp_overhanging_edge_is_clipped() {
        let mut mask = Mask::new(20, 20).unwrap();
        let touched = mask.paint(0.0, 0.0, 10.0, Tool::Brush);
        assert_eq!(touched, PixelRect::new(0, 0, 11, 11));
        assert_eq!(mask.alpha(0, 0), SELECTED);
        assert_eq!(mask.alpha(500, 500), 0);
    }

    #[test]
    fn oversized_or_distant_stamps_are_bounded() {
        let mut mask = Mask::new(300, 300).unwrap();
        let touched = mask.paint(150.0, 150.0, 1.0e9, Tool::Brush);
        assert_eq!(touched, PixelRect::new(50, 50, 251, 251));
        assert_eq!(mask.alpha(0, 0), 0);

        let mut far = Mask::new(20, 20).unwrap();
        assert!(far.paint(1.0e12, -1.0e12, 50.0, Tool::Brush).is_empty());
        assert!(far.paint(f32::MAX, f32::MAX, f32::MAX, Tool::Brush).is_empty());
        assert!(far.is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let mut mask = Mask::new(30, 30).unwrap();
        mask.paint(10.0, 10.0, 4.0, Tool::Brush);
        assert!(!mask.is_empty());
        mask.clear();
        assert!(mask.is_empty());
        assert_eq!(mask.selected_count(), 0);
        assert!(mask.selected_bounds().is_empty());
    }

    #[test]
    fn selection_iterates_row_major_within_bounds() {
        let mut mask = Mask::new(30, 30).unwrap();
        mask.paint(10.0, 12.0, 2.0, Tool::Brush);
        let bounds = mask.selected_bounds();
        assert_eq!(bounds, PixelRect::new(8, 10, 13, 15));

        let pixels: Vec<_> = mask.iter_selected().collect();
        assert_eq!(pixels.len(), mask.selected_count());
        assert_eq!(pixels.first().map(|p| p.1), Some(10));
        assert!(pixels.windows(2).all(|w| (w[0].1, w[0].0) < (w[1].1, w[1].0)));

        let top_row: Vec<_> = mask.iter_selected_in(PixelRect::new(0, 0, 30, 11)).collect();
        assert!(top_row.contains(&(10, 10)));
        assert!(top_row.iter().all(|&(_, y)| y == 10));
    }

    #[test]
    fn zero_sized_mask_is_rejected() {
        assert!(Mask::new(0, 10).is_err());
    }
}
