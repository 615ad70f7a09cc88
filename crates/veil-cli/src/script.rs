// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Replay scripts: a recorded sequence of editor events applied headlessly.
//
//   {
//     "params": { "blur_method": "pixelate", "blur_intensity": 8 },
//     "events": [
//       { "event": "down", "x": 120, "y": 80 },
//       { "event": "move", "x": 160, "y": 80 },
//       { "event": "up" }
//     ]
//   }

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use veil_core::error::{Result, VeilError};
use veil_core::{EditMode, RedactionParams, Tool};
use veil_engine::{EditSession, PointerOutcome, SessionState};

/// One recorded editor event. Coordinates are display-canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ScriptEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up,
    Tool { tool: Tool },
    Radius { radius: f32 },
    Mode { mode: EditMode },
    Params(RedactionParams),
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Applied before the first event.
    #[serde(default)]
    pub params: Option<RedactionParams>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

/// Totals gathered while replaying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub strokes: usize,
    pub pixels_redacted: usize,
    pub sprites: usize,
    pub ignored: usize,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| VeilError::Script(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| VeilError::Script(format!("{}: {e}", path.display())))
    }

    /// Feed every event into `session` in order.
    ///
    /// A stroke left open at the end of the script is committed so the
    /// exported image reflects everything painted.
    #[instrument(skip_all, fields(events = self.events.len()))]
    pub fn replay(&self, session: &mut EditSession) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        if let Some(params) = self.params {
            session.set_params(params)?;
        }

        for (index, event) in self.events.iter().enumerate() {
            debug!(index, ?event, "Replaying event");
            let outcome = match *event {
                ScriptEvent::Down { x, y } => session.pointer_down(x, y)?,
                ScriptEvent::Move { x, y } => session.pointer_move(x, y)?,
                ScriptEvent::Up => session.pointer_up()?,
                ScriptEvent::Tool { tool } => {
                    session.set_tool(tool);
                    continue;
                }
                ScriptEvent::Radius { radius } => {
                    session.set_brush_radius(radius)?;
                    continue;
                }
                ScriptEvent::Mode { mode } => {
                    session.set_mode(mode);
                    continue;
                }
                ScriptEvent::Params(params) => {
                    session.set_params(params)?;
                    continue;
                }
                ScriptEvent::Reset => {
                    session.reset();
                    continue;
                }
            };
            summary.record(outcome);
        }

        if session.state() == SessionState::Painting {
            summary.record(session.pointer_up()?);
        }
        info!(
            strokes = summary.strokes,
            pixels = summary.pixels_redacted,
            sprites = summary.sprites,
            ignored = summary.ignored,
            "Script replayed"
        );
        Ok(summary)
    }
}

impl ReplaySummary {
    fn record(&mut self, outcome: PointerOutcome) {
        match outcome {
            PointerOutcome::Committed { visited } => {
                self.strokes += 1;
                self.pixels_redacted += visited;
            }
            PointerOutcome::SpritePlaced(_) => self.sprites += 1,
            PointerOutcome::Ignored => self.ignored += 1,
            PointerOutcome::Painted { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::{BlurMethod, EditorConfig};
    use veil_engine::Raster;

    fn session(size: u32) -> EditSession {
        let config = EditorConfig {
            canvas_width: size,
            canvas_height: size,
            ..EditorConfig::default()
        };
        let raster = Raster::filled(size, size, [200, 60, 60, 255]).unwrap();
        EditSession::new(raster, &config).unwrap()
    }

    #[test]
    fn parses_every_event_kind() {
        let script = Script::from_json(
            r#"{
                "params": { "blur_method": "gaussian", "blur_intensity": 5 },
                "events": [
                    { "event": "tool", "tool": "eraser" },
                    { "event": "radius", "radius": 25 },
                    { "event": "mode", "mode": "emoji" },
                    { "event": "params", "hide_completely": true },
                    { "event": "down", "x": 1, "y": 2.5 },
                    { "event": "move", "x": 3, "y": 4 },
                    { "event": "up" },
                    { "event": "reset" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.params.unwrap().blur_method, BlurMethod::Gaussian);
        assert_eq!(script.events.len(), 8);
        assert_eq!(script.events[0], ScriptEvent::Tool { tool: Tool::Eraser });
        assert_eq!(script.events[2], ScriptEvent::Mode { mode: EditMode::Emoji });
        match &script.events[3] {
            ScriptEvent::Params(p) => {
                assert!(p.hide_completely);
                assert_eq!(p.blur_intensity, RedactionParams::default().blur_intensity);
            }
            other => panic!("expected params, got {other:?}"),
        }
        assert_eq!(script.events[4], ScriptEvent::Down { x: 1.0, y: 2.5 });
        assert_eq!(script.events[7], ScriptEvent::Reset);
    }

    #[test]
    fn unknown_event_is_a_script_error() {
        let err = Script::from_json(r#"{ "events": [{ "event": "zoom" }] }"#).unwrap_err();
        assert!(matches!(err, VeilError::Script(_)));
    }

    #[test]
    fn empty_script_replays_to_nothing() {
        let mut session = session(64);
        let summary = Script::default().replay(&mut session).unwrap();
        assert_eq!(summary.strokes, 0);
        assert_eq!(session.committed(), session.original());
    }

    #[test]
    fn open_stroke_is_committed_at_end() {
        let mut session = session(100);
        let script = Script {
            params: None,
            events: vec![
                ScriptEvent::Down { x: 50.0, y: 50.0 },
                ScriptEvent::Move { x: 60.0, y: 50.0 },
            ],
        };
        let summary = script.replay(&mut session).unwrap();
        assert_eq!(summary.strokes, 1);
        assert!(summary.pixels_redacted > 0);
    }

    #[test]
    fn clicks_outside_the_image_are_counted_as_ignored() {
        let mut session = session(100);
        let script = Script {
            params: None,
            events: vec![ScriptEvent::Down { x: -5.0, y: 500.0 }, ScriptEvent::Up],
        };
        let summary = script.replay(&mut session).unwrap();
        assert_eq!(summary.strokes, 0);
        assert!(summary.ignored >= 2);
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stroke.json");
        std::fs::write(&path, r#"{ "events": [{ "event": "up" }] }"#).unwrap();
        let script = Script::load(&path).unwrap();
        assert_eq!(script.events, vec![ScriptEvent::Up]);
    }
}
