// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing session — the pointer-driven state machine tying mask painting,
// compositing and rendering together.
//
//   Idle --(pointer down on image, blur mode)--> Painting
//   Painting --(pointer move)--> Painting
//   Painting --(pointer up)--> Compositing --> Idle
//
// In emoji mode a pointer down places a sprite and the state stays Idle.

use image::RgbaImage;
use tracing::{debug, info, instrument, warn};
use veil_core::error::Result;
use veil_core::{
    BrushSettings, EditMode, EditorConfig, PixelRect, RedactionParams, SpriteId, Tool,
};

use crate::compositor::{self, Compositor};
use crate::coords::{CoordinateMapper, ImagePlacement};
use crate::mask::Mask;
use crate::raster::Raster;
use crate::render::{self, Drawable, Scene, Sprite};

/// Where the session is in a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Painting,
    Compositing,
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Outside the image, wrong state, or nothing to place.
    Ignored,
    /// The mask changed within this display rectangle.
    Painted { dirty: PixelRect },
    /// A sprite was added.
    SpritePlaced(SpriteId),
    /// The stroke was committed; `visited == 0` means nothing was selected.
    Committed { visited: usize },
}

/// One image being edited.
pub struct EditSession {
    config: EditorConfig,
    /// Pristine pixels captured on load. Never mutated.
    original: Raster,
    /// Result of the last commit, adjustments included.
    committed: Raster,
    /// Live-preview redaction before brightness/contrast.
    preview: Option<Raster>,
    mask: Mask,
    mapper: CoordinateMapper,
    params: RedactionParams,
    brush: BrushSettings,
    mode: EditMode,
    state: SessionState,
    sprites: Vec<Sprite>,
    sprite_bitmap: Option<RgbaImage>,
}

impl EditSession {
    // -- Construction ---------------------------------------------------------

    /// Start a session on `raster` with the given editor settings.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn new(raster: Raster, config: &EditorConfig) -> Result<Self> {
        config.validate()?;
        let mask = Mask::new(config.canvas_width, config.canvas_height)?;
        let mapper = fit_mapper(config, &raster)?;
        let brush = BrushSettings::new(config.brush_radius, config.tool)?;
        info!(scale = ?mapper.scale(), "Editing session started");
        Ok(Self {
            config: config.clone(),
            committed: raster.clone(),
            original: raster,
            preview: None,
            mask,
            mapper,
            params: config.default_params,
            brush,
            mode: EditMode::Blur,
            state: SessionState::Idle,
            sprites: Vec::new(),
            sprite_bitmap: None,
        })
    }

    /// Replace the image (new upload). Mask, sprites and previews are
    /// discarded; parameters and tool settings are kept.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn load(&mut self, raster: Raster) -> Result<()> {
        self.mapper = fit_mapper(&self.config, &raster)?;
        self.committed = raster.clone();
        self.original = raster;
        self.mask.clear();
        self.sprites.clear();
        self.preview = None;
        self.state = SessionState::Idle;
        info!("New image loaded into session");
        Ok(())
    }

    /// Drop all edits and return to the pristine image.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.mask.clear();
        self.sprites.clear();
        self.preview = None;
        self.committed = self.original.clone();
        self.state = SessionState::Idle;
        info!("Session reset");
    }

    // -- Accessors ------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn params(&self) -> &RedactionParams {
        &self.params
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn original(&self) -> &Raster {
        &self.original
    }

    /// The last committed result.
    pub fn committed(&self) -> &Raster {
        &self.committed
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    // -- Settings -------------------------------------------------------------

    /// Change the redaction parameters. When idle with a selection, the
    /// result is recomputed straight away.
    pub fn set_params(&mut self, params: RedactionParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        self.preview = None;
        if self.state == SessionState::Idle && !self.mask.is_empty() {
            self.commit()?;
        }
        Ok(())
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.brush.tool = tool;
    }

    pub fn set_brush_radius(&mut self, radius: f32) -> Result<()> {
        self.brush.set_radius(radius)
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    /// Bitmap placed by clicks in emoji mode.
    pub fn set_sprite_bitmap(&mut self, bitmap: RgbaImage) {
        self.sprite_bitmap = Some(bitmap);
    }

    /// Re-anchor a sprite. Returns false for an unknown id.
    pub fn move_sprite(&mut self, id: SpriteId, source_x: u32, source_y: u32) -> bool {
        let (w, h) = self.mapper.source_size();
        match self.sprites.iter_mut().find(|s| s.id == id) {
            Some(sprite) => {
                sprite.source_x = source_x.min(w - 1);
                sprite.source_y = source_y.min(h - 1);
                true
            }
            None => false,
        }
    }

    /// Remove a sprite. Returns false for an unknown id.
    pub fn remove_sprite(&mut self, id: SpriteId) -> bool {
        let before = self.sprites.len();
        self.sprites.retain(|s| s.id != id);
        self.sprites.len() != before
    }

    // -- Pointer events -------------------------------------------------------

    #[instrument(skip(self))]
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<PointerOutcome> {
        match self.mode {
            EditMode::Emoji => Ok(self.place_sprite(x, y)),
            EditMode::Blur => {
                if self.state != SessionState::Idle || !self.mapper.placement().contains(x, y) {
                    return Ok(PointerOutcome::Ignored);
                }
                self.state = SessionState::Painting;
                debug!("Stroke started");
                self.stamp(x, y)
            }
        }
    }

    #[instrument(skip(self), level = "trace")]
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Result<PointerOutcome> {
        if self.state != SessionState::Painting {
            return Ok(PointerOutcome::Ignored);
        }
        self.stamp(x, y)
    }

    #[instrument(skip(self))]
    pub fn pointer_up(&mut self) -> Result<PointerOutcome> {
        if self.state != SessionState::Painting {
            return Ok(PointerOutcome::Ignored);
        }
        self.state = SessionState::Compositing;
        let result = self.commit();
        self.state = SessionState::Idle;
        let visited = result?;
        Ok(PointerOutcome::Committed { visited })
    }

    // -- Output ---------------------------------------------------------------

    /// Render the current display frame.
    pub fn frame(&self) -> RgbaImage {
        let live = match (&self.preview, self.state) {
            (Some(preview), SessionState::Painting) => {
                let mut shown = preview.clone();
                if self.params.needs_adjustment() {
                    compositor::adjust(&mut shown, self.params.brightness, self.params.contrast);
                }
                Some(shown)
            }
            _ => None,
        };

        let mut layers = vec![Drawable::Raster {
            raster: live.as_ref().unwrap_or(&self.committed),
            placement: *self.mapper.placement(),
        }];
        if let (Some(tint), SessionState::Painting) = (self.config.mask_tint, self.state) {
            layers.push(Drawable::MaskOverlay {
                mask: &self.mask,
                tint,
            });
        }
        for sprite in &self.sprites {
            layers.push(Drawable::Sprite {
                sprite,
                mapper: &self.mapper,
            });
        }

        render::render(&Scene {
            width: self.config.canvas_width,
            height: self.config.canvas_height,
            background: self.config.background,
            layers,
        })
    }

    /// The committed raster with sprites flattened in, at source resolution.
    pub fn export(&self) -> Result<Raster> {
        render::flatten_sprites(&self.committed, &self.sprites, &self.mapper)
    }

    /// [`EditSession::export`] encoded as PNG.
    #[instrument(skip(self))]
    pub fn export_png(&self) -> Result<Vec<u8>> {
        let bytes = self.export()?.to_png_bytes()?;
        info!(bytes = bytes.len(), "Exported PNG");
        Ok(bytes)
    }

    // -- Internals ------------------------------------------------------------

    fn stamp(&mut self, x: f32, y: f32) -> Result<PointerOutcome> {
        if !self.mapper.placement().contains(x, y) {
            return Ok(PointerOutcome::Ignored);
        }
        let touched = self.mask.paint(x, y, self.brush.radius(), self.brush.tool);
        if touched.is_empty() {
            return Ok(PointerOutcome::Ignored);
        }
        if self.config.live_preview {
            self.update_preview(self.mapper.display_rect_to_source(touched))?;
        }
        Ok(PointerOutcome::Painted { dirty: touched })
    }

    fn update_preview(&mut self, dirty: PixelRect) -> Result<()> {
        match self.preview.as_mut() {
            Some(cache) if self.config.incremental_preview => {
                Compositor::refresh_region(
                    cache,
                    &self.original,
                    &self.mask,
                    &self.mapper,
                    &self.params,
                    dirty,
                )?;
            }
            _ => {
                let mut cache = self.original.clone();
                Compositor::redact_in_place(
                    &mut cache,
                    &self.mask,
                    &self.mapper,
                    &self.params,
                    None,
                )?;
                self.preview = Some(cache);
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<usize> {
        let report = Compositor::composite(&self.original, &self.mask, &self.mapper, &self.params)?;
        if report.is_noop() {
            debug!("Nothing selected; committed image unchanged");
        }
        self.committed = report.raster;
        self.preview = None;
        Ok(report.visited)
    }

    fn place_sprite(&mut self, x: f32, y: f32) -> PointerOutcome {
        let Some((sx, sy)) = self.mapper.map(x, y) else {
            return PointerOutcome::Ignored;
        };
        let Some(bitmap) = self.sprite_bitmap.as_ref() else {
            warn!("Emoji mode click without a sprite bitmap");
            return PointerOutcome::Ignored;
        };
        let sprite = Sprite::new(bitmap.clone(), sx, sy, self.config.sprite_size);
        let id = sprite.id;
        self.sprites.push(sprite);
        debug!(%id, sx, sy, "Sprite placed");
        PointerOutcome::SpritePlaced(id)
    }
}

fn fit_mapper(config: &EditorConfig, raster: &Raster) -> Result<CoordinateMapper> {
    let placement = ImagePlacement::fit_centered(
        config.canvas_width,
        config.canvas_height,
        raster.width(),
        raster.height(),
    );
    CoordinateMapper::new(placement, raster.width(), raster.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::BlurMethod;

    fn config(width: u32, height: u32) -> EditorConfig {
        EditorConfig {
            canvas_width: width,
            canvas_height: height,
            ..EditorConfig::default()
        }
    }

    fn gradient(width: u32, height: u32) -> Raster {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 3) % 256) as u8;
                data.extend_from_slice(&[v, 255 - v, (x % 2 * 255) as u8, 255]);
            }
        }
        Raster::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn stroke_walks_through_states() {
        let mut session = EditSession::new(gradient(100, 100), &config(100, 100)).unwrap();
        assert_eq!(session.state(), SessionState::Idle);

        let down = session.pointer_down(50.0, 50.0).unwrap();
        assert!(matches!(down, PointerOutcome::Painted { .. }));
        assert_eq!(session.state(), SessionState::Painting);

        let moved = session.pointer_move(55.0, 50.0).unwrap();
        assert!(matches!(moved, PointerOutcome::Painted { .. }));

        let up = session.pointer_up().unwrap();
        assert!(matches!(up, PointerOutcome::Committed { visited } if visited > 0));
        assert_eq!(session.state(), SessionState::Idle);
        assert_ne!(session.committed(), session.original());
    }

    #[test]
    fn pointer_outside_image_is_ignored() {
        // 100x50 image centred in a 100x100 canvas: rows 25..75.
        let mut session = EditSession::new(gradient(100, 50), &config(100, 100)).unwrap();
        assert_eq!(session.pointer_down(50.0, 10.0).unwrap(), PointerOutcome::Ignored);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.mask().is_empty());

        session.pointer_down(50.0, 50.0).unwrap();
        assert_eq!(session.pointer_move(50.0, 90.0).unwrap(), PointerOutcome::Ignored);
        session.pointer_up().unwrap();
    }

    #[test]
    fn moves_and_ups_without_a_stroke_are_ignored() {
        let mut session = EditSession::new(gradient(40, 40), &config(40, 40)).unwrap();
        assert_eq!(session.pointer_move(20.0, 20.0).unwrap(), PointerOutcome::Ignored);
        assert_eq!(session.pointer_up().unwrap(), PointerOutcome::Ignored);
        assert!(session.mask().is_empty());
    }

    #[test]
    fn erasing_everything_restores_original() {
        let mut session = EditSession::new(gradient(60, 60), &config(60, 60)).unwrap();
        session.pointer_down(30.0, 30.0).unwrap();
        session.pointer_up().unwrap();
        assert_ne!(session.committed(), session.original());

        session.set_tool(Tool::Eraser);
        session.set_brush_radius(60.0).unwrap();
        session.pointer_down(30.0, 30.0).unwrap();
        let up = session.pointer_up().unwrap();
        assert_eq!(up, PointerOutcome::Committed { visited: 0 });
        assert_eq!(session.committed(), session.original());
    }

    #[test]
    fn commits_recompute_from_the_original() {
        // Two identical strokes must give the same result as one.
        let mut session = EditSession::new(gradient(80, 80), &config(80, 80)).unwrap();
        session.pointer_down(40.0, 40.0).unwrap();
        session.pointer_up().unwrap();
        let once = session.committed().clone();

        session.pointer_down(40.0, 40.0).unwrap();
        session.pointer_up().unwrap();
        assert_eq!(session.committed(), &once);
    }

    #[test]
    fn preview_modes_agree_with_commit_for_a_single_stamp() {
        for incremental in [true, false] {
            let cfg = EditorConfig {
                incremental_preview: incremental,
                mask_tint: None,
                ..config(64, 64)
            };
            let mut session = EditSession::new(gradient(64, 64), &cfg).unwrap();
            session.pointer_down(32.0, 32.0).unwrap();
            let preview = session.frame();
            session.pointer_up().unwrap();
            let committed = session.frame();
            assert_eq!(preview, committed, "incremental = {incremental}");
        }
    }

    #[test]
    fn parameter_change_recommits() {
        let mut session = EditSession::new(gradient(50, 50), &config(50, 50)).unwrap();
        session.pointer_down(25.0, 25.0).unwrap();
        session.pointer_up().unwrap();
        let double = session.committed().clone();

        session
            .set_params(RedactionParams {
                blur_method: BlurMethod::Pixelate,
                blur_intensity: 8.0,
                ..RedactionParams::default()
            })
            .unwrap();
        assert_ne!(session.committed(), &double);
        assert!(
            session
                .set_params(RedactionParams {
                    brightness: f32::NAN,
                    ..RedactionParams::default()
                })
                .is_err()
        );
    }

    #[test]
    fn emoji_mode_places_sprites_without_touching_mask() {
        let mut session = EditSession::new(gradient(100, 100), &config(100, 100)).unwrap();
        session.set_mode(EditMode::Emoji);
        assert_eq!(session.pointer_down(50.0, 50.0).unwrap(), PointerOutcome::Ignored);

        session.set_sprite_bitmap(RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 255, 255])));
        let placed = session.pointer_down(50.0, 50.0).unwrap();
        let PointerOutcome::SpritePlaced(id) = placed else {
            panic!("expected a sprite, got {placed:?}");
        };
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.mask().is_empty());
        assert_eq!(session.sprites().len(), 1);
        assert_eq!(session.committed(), session.original());

        // Sprites only reach pixels on export.
        let exported = session.export().unwrap();
        assert_eq!(exported.pixel(50, 50), [255, 0, 255, 255]);

        assert!(session.move_sprite(id, 10, 10));
        assert_eq!(session.sprites()[0].source_x, 10);
        assert!(session.remove_sprite(id));
        assert!(!session.remove_sprite(id));
    }

    #[test]
    fn reset_and_load_discard_edits() {
        let mut session = EditSession::new(gradient(40, 40), &config(40, 40)).unwrap();
        session.pointer_down(20.0, 20.0).unwrap();
        session.pointer_up().unwrap();
        session.reset();
        assert!(session.mask().is_empty());
        assert_eq!(session.committed(), session.original());

        session.pointer_down(20.0, 20.0).unwrap();
        session.pointer_up().unwrap();
        session.load(gradient(80, 20)).unwrap();
        assert!(session.mask().is_empty());
        assert_eq!(session.original().width(), 80);
        assert_eq!(session.mapper().source_size(), (80, 20));
    }

    #[test]
    fn export_png_decodes_to_committed() {
        let mut session = EditSession::new(gradient(30, 30), &config(30, 30)).unwrap();
        session.pointer_down(15.0, 15.0).unwrap();
        session.pointer_up().unwrap();
        let png = session.export_png().unwrap();
        assert_eq!(&Raster::from_bytes(&png).unwrap(), session.committed());
    }
}
