// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction kernels — per-pixel blur, pixelate and flatten algorithms.
//
// Every kernel reads a neighbourhood of the grid it writes to, with sampling
// coordinates clamped to the grid edges (no wraparound, no black borders).
// Kernels read before they write, so when several masked pixels are
// processed in sequence a later pixel sees the output of earlier ones.
// The radii and falloff constants below define the visual output and must
// not be tuned.

use veil_core::KernelKind;

/// Pixel storage the kernels operate on.
pub trait PixelGrid {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// RGB at an in-range coordinate.
    fn rgb(&self, x: u32, y: u32) -> [u8; 3];
    /// Overwrite RGB at an in-range coordinate, leaving alpha untouched.
    fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]);
}

// -- Constants ----------------------------------------------------------------

/// Enhanced Gaussian radius bounds.
pub const ENHANCED_RADIUS: (f32, f32) = (5.0, 40.0);
/// Narrowing factor applied to `radius²` in the enhanced Gaussian falloff.
pub const ENHANCED_FALLOFF: f64 = 0.3;

/// Double Gaussian first-pass radius bounds.
pub const DOUBLE_RADIUS: (f32, f32) = (3.0, 25.0);
/// Second-pass radius multiplier and cap.
pub const DOUBLE_SECOND_SCALE: f64 = 1.5;
pub const DOUBLE_SECOND_CAP: f64 = 35.0;
/// Mix weights of the two passes.
pub const DOUBLE_MIX: (f64, f64) = (0.4, 0.6);

/// Pixelate block size bounds.
pub const PIXELATE_BLOCK: (f32, f32) = (4.0, 16.0);
/// Largest radius of the pixelate paint disc.
pub const PIXELATE_PAINT_CAP: i32 = 24;

/// Complete-hide sampling radius, sampling stride and paint disc radius.
pub const HIDE_SAMPLE_RADIUS: i32 = 20;
pub const HIDE_SAMPLE_STRIDE: usize = 2;
pub const HIDE_PAINT_RADIUS: i32 = 8;

/// Radius of the unweighted local mean used by the strength blend.
pub const BLEND_RADIUS: i32 = 10;

// -- Dispatch -----------------------------------------------------------------

/// Run `kind` at `(x, y)`.
pub fn apply<G: PixelGrid + ?Sized>(kind: KernelKind, grid: &mut G, x: u32, y: u32, intensity: f32) {
    match kind {
        KernelKind::EnhancedGaussian => enhanced_gaussian(grid, x, y, intensity),
        KernelKind::DoubleGaussian => double_gaussian(grid, x, y, intensity),
        KernelKind::Pixelate => pixelate(grid, x, y, intensity),
        KernelKind::CompleteHide => complete_hide(grid, x, y),
    }
}

/// How far from the target pixel a kernel call reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    /// Largest sampling offset on either axis.
    pub read: i32,
    /// Largest painting offset on either axis (0 = target pixel only).
    pub write: i32,
}

impl Footprint {
    pub fn of(kind: KernelKind, intensity: f32) -> Self {
        match kind {
            KernelKind::EnhancedGaussian => Self {
                read: clamp_radius(intensity, ENHANCED_RADIUS),
                write: 0,
            },
            KernelKind::DoubleGaussian => {
                let (_, second) = double_radii(intensity);
                Self {
                    read: second.floor() as i32,
                    write: 0,
                }
            }
            KernelKind::Pixelate => {
                let block = clamp_radius(intensity, PIXELATE_BLOCK);
                Self {
                    read: block / 2,
                    write: pixelate_paint_radius(block),
                }
            }
            KernelKind::CompleteHide => Self {
                read: HIDE_SAMPLE_RADIUS,
                write: HIDE_PAINT_RADIUS,
            },
        }
    }

    /// Largest offset touched either way.
    pub fn reach(&self) -> i32 {
        self.read.max(self.write)
    }
}

// -- Kernels ------------------------------------------------------------------

/// Gaussian with a narrowed falloff `exp(-d² / (r² · 0.3))` over the square
/// `[-r, r]²`, `r = clamp(intensity, 5, 40)`.
pub fn enhanced_gaussian<G: PixelGrid + ?Sized>(grid: &mut G, x: u32, y: u32, intensity: f32) {
    let radius = clamp_radius(intensity, ENHANCED_RADIUS);
    let denom = (radius * radius) as f64 * ENHANCED_FALLOFF;
    let avg = weighted_average(grid, x, y, radius, denom);
    grid.set_rgb(x, y, to_rgb(avg));
}

/// Mix of two standard Gaussians: `0.4 · pass(r) + 0.6 · pass(min(1.5r, 35))`,
/// `r = clamp(intensity, 3, 25)`. Both passes read the same grid state.
pub fn double_gaussian<G: PixelGrid + ?Sized>(grid: &mut G, x: u32, y: u32, intensity: f32) {
    let (first, second) = double_radii(intensity);
    let first_reach = first as i32;
    let pass1 = weighted_average(grid, x, y, first_reach, first * first);
    let pass2 = weighted_average(grid, x, y, second.floor() as i32, second * second);
    let (w1, w2) = DOUBLE_MIX;
    grid.set_rgb(
        x,
        y,
        to_rgb([
            pass1[0] * w1 + pass2[0] * w2,
            pass1[1] * w1 + pass2[1] * w2,
            pass1[2] * w1 + pass2[2] * w2,
        ]),
    );
}

/// Average the `[-b/2, b/2]²` window, `b = clamp(intensity, 4, 16)`, then
/// stamp that colour over a disc of radius `min(2b, 24)`.
pub fn pixelate<G: PixelGrid + ?Sized>(grid: &mut G, x: u32, y: u32, intensity: f32) {
    let block = clamp_radius(intensity, PIXELATE_BLOCK);
    let half = block / 2;
    let avg = box_average(grid, x, y, half, 1);
    stamp_disc(grid, x, y, pixelate_paint_radius(block), to_rgb(avg));
}

/// Flatten to the local average: sample every other pixel within radius 20,
/// stamp the mean over a disc of radius 8. Takes no intensity.
pub fn complete_hide<G: PixelGrid + ?Sized>(grid: &mut G, x: u32, y: u32) {
    let avg = box_average(grid, x, y, HIDE_SAMPLE_RADIUS, HIDE_SAMPLE_STRIDE);
    stamp_disc(grid, x, y, HIDE_PAINT_RADIUS, to_rgb(avg));
}

/// Unweighted mean over `[-radius, radius]²` with edge clamping.
pub fn local_average<G: PixelGrid + ?Sized>(grid: &G, x: u32, y: u32, radius: i32) -> [f64; 3] {
    box_average(grid, x, y, radius, 1)
}

/// Pull the pixel at `(x, y)` toward the mean of its radius-10 neighbourhood:
/// `value · s + mean · (1 - s)` with `s = opacity / 100`.
pub fn blend_toward_local_average<G: PixelGrid + ?Sized>(
    grid: &mut G,
    x: u32,
    y: u32,
    opacity: f32,
) {
    let strength = (opacity as f64 / 100.0).clamp(0.0, 1.0);
    let current = grid.rgb(x, y);
    let mean = local_average(grid, x, y, BLEND_RADIUS);
    let mut out = [0.0; 3];
    for c in 0..3 {
        out[c] = current[c] as f64 * strength + mean[c] * (1.0 - strength);
    }
    grid.set_rgb(x, y, to_rgb(out));
}

// -- Helpers ------------------------------------------------------------------

fn clamp_radius(intensity: f32, (lo, hi): (f32, f32)) -> i32 {
    let value = if intensity.is_finite() { intensity } else { lo };
    value.clamp(lo, hi).floor() as i32
}

fn double_radii(intensity: f32) -> (f64, f64) {
    let first = clamp_radius(intensity, DOUBLE_RADIUS) as f64;
    (first, (first * DOUBLE_SECOND_SCALE).min(DOUBLE_SECOND_CAP))
}

fn pixelate_paint_radius(block: i32) -> i32 {
    (block * 2).min(PIXELATE_PAINT_CAP)
}

#[inline]
fn clamp_coord(v: i64, dim: u32) -> u32 {
    v.clamp(0, dim as i64 - 1) as u32
}

/// Gaussian-weighted RGB mean over `[-reach, reach]²` with weight
/// `exp(-d² / denom)`.
fn weighted_average<G: PixelGrid + ?Sized>(
    grid: &G,
    x: u32,
    y: u32,
    reach: i32,
    denom: f64,
) -> [f64; 3] {
    let (w, h) = (grid.width(), grid.height());
    let mut sum = [0.0f64; 3];
    let mut total = 0.0f64;
    for dy in -reach..=reach {
        let sy = clamp_coord(y as i64 + dy as i64, h);
        for dx in -reach..=reach {
            let sx = clamp_coord(x as i64 + dx as i64, w);
            let d2 = (dx * dx + dy * dy) as f64;
            let weight = (-d2 / denom).exp();
            let [r, g, b] = grid.rgb(sx, sy);
            sum[0] += r as f64 * weight;
            sum[1] += g as f64 * weight;
            sum[2] += b as f64 * weight;
            total += weight;
        }
    }
    [sum[0] / total, sum[1] / total, sum[2] / total]
}

/// Plain mean over `[-reach, reach]²`, visiting every `stride`-th offset.
fn box_average<G: PixelGrid + ?Sized>(
    grid: &G,
    x: u32,
    y: u32,
    reach: i32,
    stride: usize,
) -> [f64; 3] {
    let (w, h) = (grid.width(), grid.height());
    let mut sum = [0.0f64; 3];
    let mut count = 0u32;
    for dy in (-reach..=reach).step_by(stride) {
        let sy = clamp_coord(y as i64 + dy as i64, h);
        for dx in (-reach..=reach).step_by(stride) {
            let sx = clamp_coord(x as i64 + dx as i64, w);
            let [r, g, b] = grid.rgb(sx, sy);
            sum[0] += r as f64;
            sum[1] += g as f64;
            sum[2] += b as f64;
            count += 1;
        }
    }
    let n = count as f64;
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

/// Paint `rgb` over every in-range pixel within `radius` of `(x, y)`.
fn stamp_disc<G: PixelGrid + ?Sized>(grid: &mut G, x: u32, y: u32, radius: i32, rgb: [u8; 3]) {
    let (w, h) = (grid.width() as i64, grid.height() as i64);
    let r2 = radius * radius;
    for dy in -radius..=radius {
        let py = y as i64 + dy as i64;
        if py < 0 || py >= h {
            continue;
        }
        for dx in -radius..=radius {
            let px = x as i64 + dx as i64;
            if px < 0 || px >= w || dx * dx + dy * dy > r2 {
                continue;
            }
            grid.set_rgb(px as u32, py as u32, rgb);
        }
    }
}

#[inline]
fn to_rgb(v: [f64; 3]) -> [u8; 3] {
    let q = |c: f64| c.round().clamp(0.0, 255.0) as u8;
    [q(v[0]), q(v[1]), q(v[2])]
}

// -- Tests --------------------------------------------------------------------
