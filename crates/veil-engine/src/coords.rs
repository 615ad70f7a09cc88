// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between the scaled display canvas and the source raster.

use veil_core::PixelRect;
use veil_core::error::{Result, VeilError, ensure_finite};

/// Where the image is drawn on the display canvas, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ImagePlacement {
    /// Fit a `src_w x src_h` image inside the canvas, centred, preserving
    /// aspect ratio and never upscaling.
    pub fn fit_centered(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> Self {
        let scale = (canvas_w as f32 / src_w as f32)
            .min(canvas_h as f32 / src_h as f32)
            .min(1.0);
        let width = src_w as f32 * scale;
        let height = src_h as f32 * scale;
        Self {
            left: (canvas_w as f32 - width) / 2.0,
            top: (canvas_h as f32 - height) / 2.0,
            width,
            height,
        }
    }

    /// Inclusive bounding-box test. Points on the right/bottom edge count.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        !(px < self.left
            || px > self.left + self.width
            || py < self.top
            || py > self.top + self.height)
    }
}

/// Maps display-space positions to source-raster pixels and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    placement: ImagePlacement,
    source_width: u32,
    source_height: u32,
    scale_x: f32,
    scale_y: f32,
}

impl CoordinateMapper {
    pub fn new(placement: ImagePlacement, source_width: u32, source_height: u32) -> Result<Self> {
        if source_width == 0 || source_height == 0 {
            return Err(VeilError::InvalidRaster(format!(
                "source raster must be non-empty, got {source_width}x{source_height}"
            )));
        }
        ensure_finite("placement.left", placement.left)?;
        ensure_finite("placement.top", placement.top)?;
        ensure_finite("placement.width", placement.width)?;
        ensure_finite("placement.height", placement.height)?;
        if placement.width <= 0.0 || placement.height <= 0.0 {
            return Err(VeilError::InvalidRaster(format!(
                "displayed image footprint must be positive, got {}x{}",
                placement.width, placement.height
            )));
        }
        Ok(Self {
            placement,
            source_width,
            source_height,
            scale_x: source_width as f32 / placement.width,
            scale_y: source_height as f32 / placement.height,
        })
    }

    pub fn placement(&self) -> &ImagePlacement {
        &self.placement
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// Source pixels per display pixel on each axis.
    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Map a pointer position. `None` when it falls outside the image.
    pub fn map(&self, px: f32, py: f32) -> Option<(u32, u32)> {
        if !self.placement.contains(px, py) {
            return None;
        }
        Some(self.map_clamped(px, py))
    }

    /// Map any display position, clamping to the source raster.
    pub fn map_clamped(&self, px: f32, py: f32) -> (u32, u32) {
        let x = ((px - self.placement.left) * self.scale_x).floor();
        let y = ((py - self.placement.top) * self.scale_y).floor();
        (
            clamp_axis(x, self.source_width),
            clamp_axis(y, self.source_height),
        )
    }

    /// Display position of a source pixel's top-left corner.
    pub fn to_display(&self, sx: u32, sy: u32) -> (f32, f32) {
        (
            sx as f32 / self.scale_x + self.placement.left,
            sy as f32 / self.scale_y + self.placement.top,
        )
    }

    /// Source pixels covered by a display rectangle, clamped to the raster.
    pub fn display_rect_to_source(&self, rect: PixelRect) -> PixelRect {
        if rect.is_empty() {
            return PixelRect::EMPTY;
        }
        let (x0, y0) = self.map_clamped(rect.x0 as f32, rect.y0 as f32);
        let x1 = ((rect.x1 as f32 - self.placement.left) * self.scale_x).ceil();
        let y1 = ((rect.y1 as f32 - self.placement.top) * self.scale_y).ceil();
        PixelRect::new(
            x0 as i32,
            y0 as i32,
            x1.clamp(1.0, self.source_width as f32) as i32,
            y1.clamp(1.0, self.source_height as f32) as i32,
        )
    }

    /// Display pixels whose mapping can land inside a source rectangle.
    pub fn source_rect_to_display(&self, rect: PixelRect) -> PixelRect {
        if rect.is_empty() {
            return PixelRect::EMPTY;
        }
        let (x0, y0) = self.to_display(rect.x0.max(0) as u32, rect.y0.max(0) as u32);
        let (x1, y1) = self.to_display(rect.x1.max(0) as u32, rect.y1.max(0) as u32);
        PixelRect::new(
            x0.floor() as i32 - 1,
            y0.floor() as i32 - 1,
            x1.ceil() as i32 + 1,
            y1.ceil() as i32 + 1,
        )
    }
}

fn clamp_axis(v: f32, dim: u32) -> u32 {
    if v <= 0.0 {
        0
    } else {
        (v as u32).min(dim - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(left: f32, top: f32, width: f32, height: f32) -> ImagePlacement {
        ImagePlacement {
            left,
            top,
            width,
            height,
        }
    }

    #[test]
    fn maps_with_offset_and_scale() {
        // 2000x1000 image shown at 500x250 from (100, 50): scale 4.
        let mapper = CoordinateMapper::new(placement(100.0, 50.0, 500.0, 250.0), 2000, 1000).unwrap();
        assert_eq!(mapper.map(100.0, 50.0), Some((0, 0)));
        assert_eq!(mapper.map(110.3, 60.9), Some((41, 43)));
        assert_eq!(mapper.scale(), (4.0, 4.0));
    }

    #[test]
    fn points_outside_footprint_are_ignored() {
        let mapper = CoordinateMapper::new(placement(10.0, 10.0, 100.0, 100.0), 100, 100).unwrap();
        assert_eq!(mapper.map(9.9, 50.0), None);
        assert_eq!(mapper.map(50.0, 110.1), None);
        assert_eq!(mapper.map(110.1, 50.0), None);
        assert_eq!(mapper.map(50.0, 9.0), None);
    }

    #[test]
    fn far_edge_is_clamped_into_range() {
        let mapper = CoordinateMapper::new(placement(0.0, 0.0, 50.0, 50.0), 200, 100).unwrap();
        assert_eq!(mapper.map(50.0, 50.0), Some((199, 99)));
        assert_eq!(mapper.map_clamped(-20.0, 500.0), (0, 99));
    }

    #[test]
    fn round_trip_lands_within_one_pixel() {
        let mapper = CoordinateMapper::new(placement(37.5, 12.25, 400.0, 300.0), 1600, 1200).unwrap();
        for &(px, py) in &[(38.0, 13.0), (100.7, 200.2), (436.9, 311.9), (237.5, 162.25)] {
            let (sx, sy) = mapper.map(px, py).unwrap();
            let (dx, dy) = mapper.to_display(sx, sy);
            assert!((dx - px).abs() <= 1.0, "x: {px} -> {sx} -> {dx}");
            assert!((dy - py).abs() <= 1.0, "y: {py} -> {sy} -> {dy}");
        }
    }

    #[test]
    fn zero_source_is_invalid() {
        assert!(matches!(
            CoordinateMapper::new(placement(0.0, 0.0, 10.0, 10.0), 0, 10),
            Err(VeilError::InvalidRaster(_))
        ));
        assert!(CoordinateMapper::new(placement(0.0, 0.0, 0.0, 10.0), 10, 10).is_err());
        assert!(CoordinateMapper::new(placement(f32::NAN, 0.0, 10.0, 10.0), 10, 10).is_err());
    }

    #[test]
    fn fit_centers_and_never_upscales() {
        let fitted = ImagePlacement::fit_centered(800, 600, 1600, 600);
        assert_eq!(fitted, placement(0.0, 150.0, 800.0, 300.0));

        let small = ImagePlacement::fit_centered(800, 600, 200, 100);
        assert_eq!(small, placement(300.0, 250.0, 200.0, 100.0));
    }

    #[test]
    fn rect_mapping_covers_stamp() {
        let mapper = CoordinateMapper::new(placement(0.0, 0.0, 100.0, 100.0), 200, 200).unwrap();
        let src = mapper.display_rect_to_source(PixelRect::new(10, 20, 15, 30));
        assert_eq!(src, PixelRect::new(20, 40, 30, 60));
        let clipped = mapper.display_rect_to_source(PixelRect::new(-5, -5, 3, 3));
        assert_eq!(clipped, PixelRect::new(0, 0, 6, 6));

        let back = mapper.source_rect_to_display(src);
        assert!(back.x0 <= 10 && back.y0 <= 20 && back.x1 >= 15 && back.y1 >= 30);
    }
}
