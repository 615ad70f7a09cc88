// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster — packed RGBA8 pixel grid backed by `image::RgbaImage`, plus decode
// and PNG encode helpers.

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info, instrument};
use veil_core::error::{Result, VeilError};
use veil_core::{PixelRect, Rgba};

use crate::kernels::PixelGrid;

/// A row-major RGBA8 image, 4 bytes per pixel.
///
/// Width and height are always non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    // -- Construction ---------------------------------------------------------

    /// Wrap a packed RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(VeilError::InvalidRaster(format!(
                "{}x{} RGBA needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        let image = RgbaImage::from_raw(width, height, data).ok_or_else(|| {
            VeilError::InvalidRaster(format!("buffer does not fit {width}x{height}"))
        })?;
        Ok(Self { image })
    }

    /// Wrap an already-decoded `RgbaImage`.
    pub fn from_image(image: RgbaImage) -> Result<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self { image })
    }

    /// A raster filled with a single colour.
    pub fn filled(width: u32, height: u32, colour: Rgba) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(colour)),
        })
    }

    /// Decode raw encoded bytes (JPEG, PNG, WebP, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(data)
            .map_err(|err| VeilError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(
            width = decoded.width(),
            height = decoded.height(),
            "Image decoded from bytes"
        );
        Self::from_image(decoded.to_rgba8())
    }

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let decoded = image::open(path.as_ref()).map_err(|err| {
            VeilError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = decoded.width(),
            height = decoded.height(),
            "Image loaded"
        );
        Self::from_image(decoded.to_rgba8())
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Packed RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Borrow the underlying `RgbaImage`.
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Mutable pixel access for in-crate passes that keep the dimensions.
    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Consume the raster and return the underlying `RgbaImage`.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Full RGBA value at `(x, y)`. Panics when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.image.get_pixel(x, y).0
    }

    /// Rectangle covering the whole raster.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::full(self.width(), self.height())
    }

    /// Copy the pixels of `rect` from `other`, which must have the same size.
    pub fn copy_region_from(&mut self, other: &Raster, rect: PixelRect) -> Result<()> {
        if other.width() != self.width() || other.height() != self.height() {
            return Err(VeilError::DimensionMismatch {
                expected: format!("{}x{}", self.width(), self.height()),
                actual: format!("{}x{}", other.width(), other.height()),
            });
        }
        let rect = rect.clamp_to(self.width(), self.height());
        if rect.is_empty() {
            return Ok(());
        }
        let stride = self.width() as usize * 4;
        let (start, end) = (rect.x0 as usize * 4, rect.x1 as usize * 4);
        let src = other.image.as_raw();
        let dst: &mut [u8] = &mut self.image;
        for y in rect.y0 as usize..rect.y1 as usize {
            let row = y * stride;
            dst[row + start..row + end].copy_from_slice(&src[row + start..row + end]);
        }
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the raster as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| VeilError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the raster to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            VeilError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

impl PixelGrid for Raster {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let [r, g, b, _] = self.image.get_pixel(x, y).0;
        [r, g, b]
    }

    fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let px = self.image.get_pixel_mut(x, y);
        px.0[0] = rgb[0];
        px.0[1] = rgb[1];
        px.0[2] = rgb[2];
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(VeilError::InvalidRaster(format!(
            "raster must be non-empty, got {width}x{height}"
        )));
    }
    Ok(())
}
