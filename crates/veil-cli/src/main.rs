// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Veil — headless driver.
//
// Entry point. Initialises logging, then either replays an editing script
// against an image or writes the default editor configuration.
//
//   veil apply --input photo.png --script strokes.json --output redacted.png
//   veil config --output veil.json

mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use veil_core::EditorConfig;
use veil_core::error::Result;
use veil_engine::{EditSession, Raster};

use script::Script;

/// Selective region blur and redaction for raster images.
#[derive(Parser, Debug)]
#[command(name = "veil", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded editing script on an image and export the result.
    Apply {
        /// Source image (any format the image crate decodes).
        #[arg(short, long, value_name = "IMAGE")]
        input: PathBuf,

        /// JSON replay script with pointer and parameter events.
        #[arg(short, long, value_name = "SCRIPT.json")]
        script: PathBuf,

        /// Where to write the redacted PNG.
        #[arg(short, long, value_name = "FILE.png")]
        output: PathBuf,

        /// Editor configuration. Defaults are used when omitted.
        #[arg(short, long, value_name = "CONFIG.json")]
        config: Option<PathBuf>,

        /// Bitmap placed by clicks in emoji mode.
        #[arg(long, value_name = "SPRITE.png")]
        sprite: Option<PathBuf>,
    },
    /// Write the default editor configuration.
    Config {
        #[arg(short, long, value_name = "FILE.json")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Apply {
            input,
            script,
            output,
            config,
            sprite,
        } => apply(&input, &script, &output, config.as_deref(), sprite.as_deref()),
        Command::Config { output } => write_default_config(&output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "veil failed");
            ExitCode::FAILURE
        }
    }
}

fn apply(
    input: &Path,
    script: &Path,
    output: &Path,
    config: Option<&Path>,
    sprite: Option<&Path>,
) -> Result<()> {
    let started = Instant::now();
    let config = match config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let script = Script::load(script)?;
    let raster = Raster::open(input)?;

    let mut session = EditSession::new(raster, &config)?;
    if let Some(path) = sprite {
        session.set_sprite_bitmap(Raster::open(path)?.into_image());
    }

    let summary = script.replay(&mut session)?;
    session.export()?.save(output)?;

    info!(
        output = %output.display(),
        strokes = summary.strokes,
        pixels = summary.pixels_redacted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Redacted image written"
    );
    Ok(())
}

fn write_default_config(output: &Path) -> Result<()> {
    EditorConfig::default().save(output)?;
    info!(output = %output.display(), "Default configuration written");
    Ok(())
}
