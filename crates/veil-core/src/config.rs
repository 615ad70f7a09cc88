// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VeilError};
use crate::types::{RedactionParams, Rgba, Tool};

/// Persistent editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Display canvas width in pixels. The mask has the same size.
    pub canvas_width: u32,
    /// Display canvas height in pixels.
    pub canvas_height: u32,
    /// Parameters a new session starts with.
    pub default_params: RedactionParams,
    /// Initial brush radius in display pixels (10–100).
    pub brush_radius: f32,
    /// Initial mask painting tool.
    pub tool: Tool,
    /// Recompute the redaction while the brush is down.
    pub live_preview: bool,
    /// Restrict live preview to the region touched by the latest stamp.
    pub incremental_preview: bool,
    /// Neutral colour painted behind the image.
    pub background: Rgba,
    /// Tint used to show the mask while painting. `None` hides it.
    pub mask_tint: Option<Rgba>,
    /// Edge length of placed sprites in display pixels.
    pub sprite_size: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            default_params: RedactionParams::default(),
            brush_radius: 30.0,
            tool: Tool::Brush,
            live_preview: true,
            incremental_preview: true,
            background: [240, 240, 240, 255],
            mask_tint: Some([255, 0, 0, 64]),
            sprite_size: 48,
        }
    }
}

impl EditorConfig {
    /// Read a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Reject an unusable canvas or non-finite parameters.
    pub fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(VeilError::InvalidRaster(format!(
                "display canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        crate::error::ensure_finite("brush_radius", self.brush_radius)?;
        self.default_params.validate()
    }
}
