// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render pipeline — draws a scene (raster layer, mask overlay, sprites) into
// a display-sized frame, and flattens sprites into the source raster for
// export.
//
// A scene is plain data rebuilt for every frame: `render(&scene) -> frame`.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, instrument};
use veil_core::error::Result;
use veil_core::{Rgba, SpriteId};

use crate::coords::{CoordinateMapper, ImagePlacement};
use crate::mask::Mask;
use crate::raster::Raster;

/// A decorative bitmap anchored to a source-raster position.
///
/// Sprites stay out of the raster until export, so redaction never touches
/// them and they can be moved independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub id: SpriteId,
    pub bitmap: RgbaImage,
    /// Centre in source pixels.
    pub source_x: u32,
    pub source_y: u32,
    /// Display size relative to the bitmap size.
    pub scale: f32,
}

impl Sprite {
    /// Place `bitmap` centred on a source pixel, sized so its longer edge
    /// spans `display_size` display pixels.
    pub fn new(bitmap: RgbaImage, source_x: u32, source_y: u32, display_size: u32) -> Self {
        let longest = bitmap.width().max(bitmap.height()).max(1);
        Self {
            id: SpriteId::new(),
            bitmap,
            source_x,
            source_y,
            scale: display_size as f32 / longest as f32,
        }
    }

    /// Size on the display canvas.
    pub fn display_size(&self) -> (u32, u32) {
        scaled(self.bitmap.width(), self.bitmap.height(), self.scale)
    }
}

/// One entry in the draw list.
#[derive(Debug, Clone, Copy)]
pub enum Drawable<'a> {
    /// The (redacted) raster, scaled into its displayed footprint.
    Raster {
        raster: &'a Raster,
        placement: ImagePlacement,
    },
    /// The selection mask, tinted.
    MaskOverlay { mask: &'a Mask, tint: Rgba },
    /// An overlay sprite positioned through the mapper.
    Sprite {
        sprite: &'a Sprite,
        mapper: &'a CoordinateMapper,
    },
}

/// Everything needed to draw one frame, bottom layer first.
#[derive(Debug, Clone)]
pub struct Scene<'a> {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    pub layers: Vec<Drawable<'a>>,
}

/// Draw the scene: background, then each layer in order.
#[instrument(skip_all, fields(width = scene.width, height = scene.height, layers = scene.layers.len()))]
pub fn render(scene: &Scene<'_>) -> RgbaImage {
    let mut frame = RgbaImage::from_pixel(scene.width, scene.height, image::Rgba(scene.background));
    for layer in &scene.layers {
        match *layer {
            Drawable::Raster { raster, placement } => draw_raster(&mut frame, raster, &placement),
            Drawable::MaskOverlay { mask, tint } => draw_mask(&mut frame, mask, tint),
            Drawable::Sprite { sprite, mapper } => draw_sprite(&mut frame, sprite, mapper),
        }
    }
    debug!("Frame rendered");
    frame
}

/// Rasterise sprites into a copy of `raster` at source resolution.
#[instrument(skip_all, fields(sprites = sprites.len()))]
pub fn flatten_sprites(
    raster: &Raster,
    sprites: &[Sprite],
    mapper: &CoordinateMapper,
) -> Result<Raster> {
    let mut image = raster.as_image().clone();
    let (scale_x, scale_y) = mapper.scale();
    for sprite in sprites {
        let (dw, dh) = sprite.display_size();
        let w = ((dw as f32 * scale_x).round() as u32).max(1);
        let h = ((dh as f32 * scale_y).round() as u32).max(1);
        let resized = imageops::resize(&sprite.bitmap, w, h, FilterType::Triangle);
        let left = sprite.source_x as i64 - (w / 2) as i64;
        let top = sprite.source_y as i64 - (h / 2) as i64;
        draw_over(&mut image, &resized, left, top);
    }
    Raster::from_image(image)
}

fn draw_raster(frame: &mut RgbaImage, raster: &Raster, placement: &ImagePlacement) {
    let w = (placement.width.round() as u32).max(1);
    let h = (placement.height.round() as u32).max(1);
    let left = placement.left.round() as i64;
    let top = placement.top.round() as i64;
    if (w, h) == (raster.width(), raster.height()) {
        draw_over(frame, raster.as_image(), left, top);
    } else {
        let scaled = imageops::resize(raster.as_image(), w, h, FilterType::Triangle);
        draw_over(frame, &scaled, left, top);
    }
}

fn draw_mask(frame: &mut RgbaImage, mask: &Mask, tint: Rgba) {
    let (fw, fh) = frame.dimensions();
    for (x, y) in mask.iter_selected() {
        if x >= fw || y >= fh {
            continue;
        }
        let coverage = (tint[3] as f32 / 255.0) * (mask.alpha(x, y) as f32 / 255.0);
        let px = frame.get_pixel_mut(x, y);
        for c in 0..3 {
            let blended = tint[c] as f32 * coverage + px.0[c] as f32 * (1.0 - coverage);
            px.0[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn draw_sprite(frame: &mut RgbaImage, sprite: &Sprite, mapper: &CoordinateMapper) {
    let (w, h) = sprite.display_size();
    let resized = imageops::resize(&sprite.bitmap, w, h, FilterType::Triangle);
    let (cx, cy) = mapper.to_display(sprite.source_x, sprite.source_y);
    let left = (cx - w as f32 / 2.0).round() as i64;
    let top = (cy - h as f32 / 2.0).round() as i64;
    draw_over(frame, &resized, left, top);
}

/// Source-over composite of `layer` onto `frame` with its top-left corner at
/// `(left, top)`. Opaque pixels are copied exactly.
fn draw_over(frame: &mut RgbaImage, layer: &RgbaImage, left: i64, top: i64) {
    let (fw, fh) = (frame.width() as i64, frame.height() as i64);
    for (x, y, src) in layer.enumerate_pixels() {
        let (fx, fy) = (left + x as i64, top + y as i64);
        if fx < 0 || fy < 0 || fx >= fw || fy >= fh {
            continue;
        }
        let dst = frame.get_pixel_mut(fx as u32, fy as u32);
        match src.0[3] {
            0 => {}
            255 => *dst = *src,
            a => {
                let sa = a as f32 / 255.0;
                let da = dst.0[3] as f32 / 255.0 * (1.0 - sa);
                let out_a = sa + da;
                for c in 0..3 {
                    let v = (src.0[c] as f32 * sa + dst.0[c] as f32 * da) / out_a;
                    dst.0[c] = v.round().clamp(0.0, 255.0) as u8;
                }
                dst.0[3] = (out_a * 255.0).round() as u8;
            }
        }
    }
}

fn scaled(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        ((width as f32 * scale).round() as u32).max(1),
        ((height as f32 * scale).round() as u32).max(1),
    )
}
