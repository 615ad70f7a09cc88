// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositor — drives the selected kernel over every masked source pixel,
// applies the strength blend, then global brightness/contrast.
//
// The pristine original is never mutated: every composite starts from a
// fresh copy, so repeated edits never compound blur across commits.

use tracing::{debug, info, instrument};
use veil_core::error::{Result, VeilError};
use veil_core::{PixelRect, RedactionParams};

use crate::coords::CoordinateMapper;
use crate::kernels::{self, BLEND_RADIUS, Footprint};
use crate::mask::Mask;
use crate::raster::Raster;

/// Outcome of a composite call.
#[derive(Debug, Clone)]
pub struct CompositeReport {
    /// The redacted and adjusted raster.
    pub raster: Raster,
    /// Unique source pixels a kernel was dispatched for.
    pub visited: usize,
    /// Selected display pixels in the mask.
    pub selected: usize,
}

impl CompositeReport {
    /// True when the mask selected nothing and the raster is untouched.
    pub fn is_noop(&self) -> bool {
        self.visited == 0
    }
}

/// Stateless compositing entry points.
pub struct Compositor;

impl Compositor {
    /// Redact `original` wherever `mask` is set and apply global adjustments.
    ///
    /// An empty mask returns an unchanged copy with `visited == 0`.
    #[instrument(skip_all, fields(kernel = ?params.kernel(), intensity = params.blur_intensity))]
    pub fn composite(
        original: &Raster,
        mask: &Mask,
        mapper: &CoordinateMapper,
        params: &RedactionParams,
    ) -> Result<CompositeReport> {
        params.validate()?;
        check_source(original, mapper)?;

        let mut raster = original.clone();
        let selected = mask.selected_count();
        if selected == 0 {
            debug!("empty selection; composite is a no-op");
            return Ok(CompositeReport {
                raster,
                visited: 0,
                selected,
            });
        }

        let visited = redact(&mut raster, mask, mapper, params, None);
        if params.needs_adjustment() {
            adjust(&mut raster, params.brightness, params.contrast);
        }

        info!(selected, visited, "Composite complete");
        Ok(CompositeReport {
            raster,
            visited,
            selected,
        })
    }

    /// Run the kernel (and strength blend) in place, without brightness or
    /// contrast. With `region`, only source pixels inside it are visited.
    /// Returns the number of source pixels visited.
    pub fn redact_in_place(
        target: &mut Raster,
        mask: &Mask,
        mapper: &CoordinateMapper,
        params: &RedactionParams,
        region: Option<PixelRect>,
    ) -> Result<usize> {
        params.validate()?;
        check_source(target, mapper)?;
        Ok(redact(target, mask, mapper, params, region))
    }

    /// Incrementally refresh a pre-adjustment preview after the mask changed
    /// within the source rectangle `dirty`.
    ///
    /// Pixels within the kernel's reach of `dirty` are restored from
    /// `original`, then every masked pixel whose stamp can cover them is
    /// re-run. Neighbours outside that band keep their previous values, so
    /// the result approximates a full recompute; commits always use
    /// [`Compositor::composite`].
    #[instrument(skip_all, fields(?dirty))]
    pub fn refresh_region(
        cache: &mut Raster,
        original: &Raster,
        mask: &Mask,
        mapper: &CoordinateMapper,
        params: &RedactionParams,
        dirty: PixelRect,
    ) -> Result<usize> {
        params.validate()?;
        check_source(original, mapper)?;
        let footprint = effective_footprint(params);
        let restore = dirty
            .expand(footprint.reach())
            .clamp_to(original.width(), original.height());
        if restore.is_empty() {
            return Ok(0);
        }
        cache.copy_region_from(original, restore)?;
        let rerun = restore.expand(footprint.write);
        let visited = redact(cache, mask, mapper, params, Some(rerun));
        debug!(?restore, visited, "Preview region refreshed");
        Ok(visited)
    }
}

/// Global brightness then contrast over every pixel:
/// `v' = clamp(v + (b - 100))`, `v'' = clamp((v' - 128) · c/100 + 128)`.
#[instrument(skip(raster))]
pub fn adjust(raster: &mut Raster, brightness: f32, contrast: f32) {
    let offset = brightness as f64 - 100.0;
    let factor = contrast as f64 / 100.0;
    let lut: [u8; 256] = std::array::from_fn(|v| adjust_channel(v as u8, offset, factor));

    for px in raster.image_mut().pixels_mut() {
        px.0[0] = lut[px.0[0] as usize];
        px.0[1] = lut[px.0[1] as usize];
        px.0[2] = lut[px.0[2] as usize];
    }
}

/// One channel through brightness then contrast.
pub fn adjust_channel(v: u8, offset: f64, factor: f64) -> u8 {
    let brightened = (v as f64 + offset).round().clamp(0.0, 255.0);
    ((brightened - 128.0) * factor + 128.0).round().clamp(0.0, 255.0) as u8
}

fn redact(
    target: &mut Raster,
    mask: &Mask,
    mapper: &CoordinateMapper,
    params: &RedactionParams,
    region: Option<PixelRect>,
) -> usize {
    let kind = params.kernel();
    let intensity = params.blur_intensity;
    let blends = params.blends();
    let pixels = unique_source_pixels(mask, mapper, region);

    for &(x, y) in &pixels {
        kernels::apply(kind, target, x, y, intensity);
        if blends {
            kernels::blend_toward_local_average(target, x, y, params.blur_opacity);
        }
    }
    pixels.len()
}

/// Map every selected display pixel to its source pixel, keeping the first
/// occurrence of each in display row-major order.
fn unique_source_pixels(
    mask: &Mask,
    mapper: &CoordinateMapper,
    region: Option<PixelRect>,
) -> Vec<(u32, u32)> {
    let (src_w, src_h) = mapper.source_size();
    let region = region
        .unwrap_or_else(|| PixelRect::full(src_w, src_h))
        .clamp_to(src_w, src_h);
    if region.is_empty() {
        return Vec::new();
    }
    // Mask pixels in the canvas margin clamp onto the edge rows/columns, so
    // a region touching a source edge scans out to the mask edge there.
    let mut scan = mapper.source_rect_to_display(region);
    if region.x0 == 0 {
        scan.x0 = 0;
    }
    if region.y0 == 0 {
        scan.y0 = 0;
    }
    if region.x1 == src_w as i32 {
        scan.x1 = mask.width() as i32;
    }
    if region.y1 == src_h as i32 {
        scan.y1 = mask.height() as i32;
    }

    let (rw, x0, y0) = (region.width() as usize, region.x0 as u32, region.y0 as u32);
    let mut seen = vec![false; rw * region.height() as usize];
    let mut out = Vec::new();
    for (mx, my) in mask.iter_selected_in(scan) {
        let (sx, sy) = mapper.map_clamped(mx as f32, my as f32);
        if !region.contains(sx as i32, sy as i32) {
            continue;
        }
        let idx = (sy - y0) as usize * rw + (sx - x0) as usize;
        if !seen[idx] {
            seen[idx] = true;
            out.push((sx, sy));
        }
    }
    out
}

fn effective_footprint(params: &RedactionParams) -> Footprint {
    let mut footprint = Footprint::of(params.kernel(), params.blur_intensity);
    if params.blends() {
        footprint.read = footprint.read.max(BLEND_RADIUS);
    }
    footprint
}

fn check_source(raster: &Raster, mapper: &CoordinateMapper) -> Result<()> {
    let (w, h) = mapper.source_size();
    if raster.width() != w || raster.height() != h {
        return Err(VeilError::DimensionMismatch {
            expected: format!("{w}x{h}"),
            actual: format!("{}x{}", raster.width(), raster.height()),
        });
    }
    Ok(())
}
