// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Veil redaction engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ensure_finite};

/// An RGBA8 colour.
pub type Rgba = [u8; 4];

/// Intensity forced while "hide completely" is active.
pub const HIDE_INTENSITY: f32 = 30.0;

/// Smallest and largest brush radius the editor accepts, in display pixels.
pub const BRUSH_RADIUS_MIN: f32 = 10.0;
pub const BRUSH_RADIUS_MAX: f32 = 100.0;

/// Blur algorithm selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlurMethod {
    /// Enhanced (narrow-falloff) Gaussian.
    Gaussian,
    /// Block-average pixelation.
    Pixelate,
    /// Two-scale Gaussian mix. Strongest text destruction.
    Double,
}

/// The redaction kernel actually dispatched by the compositor.
///
/// Differs from [`BlurMethod`] only in that "hide completely" selects a
/// dedicated flatten kernel that ignores intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    EnhancedGaussian,
    DoubleGaussian,
    Pixelate,
    CompleteHide,
}

impl From<BlurMethod> for KernelKind {
    fn from(method: BlurMethod) -> Self {
        match method {
            BlurMethod::Gaussian => Self::EnhancedGaussian,
            BlurMethod::Pixelate => Self::Pixelate,
            BlurMethod::Double => Self::DoubleGaussian,
        }
    }
}

/// Mask painting tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Adds to the selection.
    Brush,
    /// Removes from the selection.
    Eraser,
}

/// What a click on the image does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Pointer strokes paint the redaction mask.
    Blur,
    /// Clicks place an overlay sprite.
    Emoji,
}

/// Redaction and adjustment parameters passed into every composite call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionParams {
    pub blur_method: BlurMethod,
    /// Radius or block size; each kernel clamps it to its own range.
    pub blur_intensity: f32,
    /// Strength in percent (50–100). Below 100 the result is pulled toward
    /// the local average of the redacted neighbourhood.
    pub blur_opacity: f32,
    /// Forces the flatten kernel regardless of the other blur settings.
    pub hide_completely: bool,
    /// Global brightness in percent, 100 = unchanged.
    pub brightness: f32,
    /// Global contrast in percent, 100 = unchanged.
    pub contrast: f32,
}

impl Default for RedactionParams {
    fn default() -> Self {
        Self {
            blur_method: BlurMethod::Double,
            blur_intensity: 20.0,
            blur_opacity: 100.0,
            hide_completely: false,
            brightness: 100.0,
            contrast: 100.0,
        }
    }
}

impl RedactionParams {
    /// Reject non-finite numeric fields.
    pub fn validate(&self) -> Result<()> {
        ensure_finite("blur_intensity", self.blur_intensity)?;
        ensure_finite("blur_opacity", self.blur_opacity)?;
        ensure_finite("brightness", self.brightness)?;
        ensure_finite("contrast", self.contrast)?;
        Ok(())
    }

    /// The parameters in force once "hide completely" overrides are applied.
    pub fn effective(&self) -> Self {
        if self.hide_completely {
            Self {
                blur_method: BlurMethod::Double,
                blur_intensity: HIDE_INTENSITY,
                blur_opacity: 100.0,
                ..*self
            }
        } else {
            *self
        }
    }

    /// Kernel dispatched for masked pixels.
    pub fn kernel(&self) -> KernelKind {
        if self.hide_completely {
            KernelKind::CompleteHide
        } else {
            self.blur_method.into()
        }
    }

    /// Whether the opacity blend toward the local average runs.
    pub fn blends(&self) -> bool {
        !self.hide_completely && self.blur_opacity < 100.0
    }

    /// Whether global brightness/contrast changes any pixel.
    pub fn needs_adjustment(&self) -> bool {
        self.brightness != 100.0 || self.contrast != 100.0
    }
}

/// Brush radius and tool for mask painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    radius: f32,
    pub tool: Tool,
}

impl BrushSettings {
    pub fn new(radius: f32, tool: Tool) -> Result<Self> {
        let mut brush = Self { radius: BRUSH_RADIUS_MIN, tool };
        brush.set_radius(radius)?;
        Ok(brush)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the radius, clamped to the supported range.
    pub fn set_radius(&mut self, radius: f32) -> Result<()> {
        let radius = ensure_finite("brush_radius", radius)?;
        self.radius = radius.clamp(BRUSH_RADIUS_MIN, BRUSH_RADIUS_MAX);
        Ok(())
    }
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius: 30.0,
            tool: Tool::Brush,
        }
    }
}

/// Half-open integer rectangle `[x0, x1) x [y0, y1)`.
///
/// Coordinates may be negative before clamping (brush stamps overhanging the
/// canvas edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub const EMPTY: Self = Self { x0: 0, y0: 0, x1: 0, y1: 0 };

    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering `[0, width) x [0, height)`.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Bounding box of a circle.
    pub fn around(cx: i32, cy: i32, radius: i32) -> Self {
        Self::new(
            cx.saturating_sub(radius),
            cy.saturating_sub(radius),
            cx.saturating_add(radius).saturating_add(1),
            cy.saturating_add(radius).saturating_add(1),
        )
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        )
    }

    /// Smallest rectangle containing both; empty operands are ignored.
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: i32) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::new(
            self.x0.saturating_sub(margin),
            self.y0.saturating_sub(margin),
            self.x1.saturating_add(margin),
            self.y1.saturating_add(margin),
        )
    }

    /// Restrict to `[0, width) x [0, height)`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        self.intersection(&Self::full(width, height))
    }
}

/// Unique identifier for an overlay sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteId(pub Uuid);

impl SpriteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SpriteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_completely_overrides_blur_settings() {
        let params = RedactionParams {
            blur_method: BlurMethod::Pixelate,
            blur_intensity: 6.0,
            blur_opacity: 55.0,
            hide_completely: true,
            ..RedactionParams::default()
        };
        let effective = params.effective();
        assert_eq!(effective.blur_method, BlurMethod::Double);
        assert_eq!(effective.blur_intensity, HIDE_INTENSITY);
        assert_eq!(effective.blur_opacity, 100.0);
        assert_eq!(params.kernel(), KernelKind::CompleteHide);
        assert!(!params.blends());
    }

    #[test]
    fn kernel_follows_blur_method() {
        let mut params = RedactionParams::default();
        params.blur_method = BlurMethod::Gaussian;
        assert_eq!(params.kernel(), KernelKind::EnhancedGaussian);
        params.blur_method = BlurMethod::Pixelate;
        assert_eq!(params.kernel(), KernelKind::Pixelate);
        params.blur_method = BlurMethod::Double;
        assert_eq!(params.kernel(), KernelKind::DoubleGaussian);
    }

    #[test]
    fn validate_rejects_nan_contrast() {
        let params = RedactionParams {
            contrast: f32::NAN,
            ..RedactionParams::default()
        };
        assert!(params.validate().is_err());
        assert!(RedactionParams::default().validate().is_ok());
    }

    #[test]
    fn default_params_need_no_adjustment() {
        let params = RedactionParams::default();
        assert!(!params.needs_adjustment());
        assert!(!params.blends());
    }

    #[test]
    fn brush_radius_is_clamped() {
        let mut brush = BrushSettings::new(500.0, Tool::Brush).unwrap();
        assert_eq!(brush.radius(), BRUSH_RADIUS_MAX);
        brush.set_radius(1.0).unwrap();
        assert_eq!(brush.radius(), BRUSH_RADIUS_MIN);
        assert!(brush.set_radius(f32::INFINITY).is_err());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: RedactionParams =
            serde_json::from_str(r#"{"blur_method":"pixelate","blur_intensity":8}"#).unwrap();
        assert_eq!(params.blur_method, BlurMethod::Pixelate);
        assert_eq!(params.blur_intensity, 8.0);
        assert_eq!(params.blur_opacity, 100.0);
    }

    #[test]
    fn rect_union_and_clamp() {
        let a = PixelRect::around(5, 5, 3);
        let b = PixelRect::new(20, 20, 25, 22);
        let u = a.union(&b);
        assert_eq!(u, PixelRect::new(2, 2, 25, 22));
        assert_eq!(PixelRect::EMPTY.union(&b), b);

        let clamped = PixelRect::around(0, 0, 4).clamp_to(10, 10);
        assert_eq!(clamped, PixelRect::new(0, 0, 5, 5));
        assert!(PixelRect::new(12, 0, 14, 3).clamp_to(10, 10).is_empty());
    }

    #[test]
    fn rect_expand_and_intersects() {
        let r = PixelRect::new(10, 10, 12, 12).expand(2);
        assert_eq!(r, PixelRect::new(8, 8, 14, 14));
        assert!(r.contains(8, 13));
        assert!(!r.contains(14, 8));
        assert!(r.intersects(&PixelRect::new(13, 13, 20, 20)));
        assert!(!r.intersects(&PixelRect::new(14, 0, 20, 20)));
        assert_eq!(PixelRect::EMPTY.expand(5), PixelRect::EMPTY);
    }

    #[test]
    fn rect_arithmetic_saturates_at_extremes() {
        let huge = PixelRect::around(i32::MAX, i32::MIN, i32::MAX);
        assert_eq!(huge, PixelRect::new(0, i32::MIN, i32::MAX, 0));
        assert!(huge.clamp_to(10, 10).is_empty());

        let grown = PixelRect::new(i32::MIN, 0, i32::MAX, 1).expand(10);
        assert_eq!(grown, PixelRect::new(i32::MIN, -10, i32::MAX, 11));
        assert_eq!(grown.width(), u32::MAX >> 1);
    }
}
