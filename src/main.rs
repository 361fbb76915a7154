//! TopoSonics - Turn landscape images into music

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use toposonics::analysis::{ImageAnalysisResult, PixelBuffer};
use toposonics::compose::PresetCatalog;
use toposonics::config::{self, TopoConfig};
use toposonics::engine::Engine;

mod cli;

use cli::{Cli, Commands};

/// Load the configuration file if one was given, defaults otherwise
fn load_or_default(path: Option<&Path>) -> Result<TopoConfig> {
    match path {
        Some(path) => {
            println!("Loading configuration from {:?}...", path);
            config::load_config(path)
        }
        None => Ok(TopoConfig::default()),
    }
}

fn read_pixels(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read pixels from {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_profile(name: &str, profile: Option<&Vec<f64>>) {
    if let Some(values) = profile {
        let mean = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        println!("  {}: {} samples, mean {:.3}", name, values.len(), mean);
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            pixels,
            width,
            height,
            config: config_path,
            mode,
            output,
        } => {
            let mut cfg = load_or_default(config_path.as_deref())?;
            if mode.is_some() {
                cfg.mapping.mode = mode;
            }
            cfg.validate()?;
            let engine = Engine::from_config(cfg)?;

            let data = read_pixels(&pixels)?;
            let buffer = PixelBuffer::new(&data, width, height)?;
            let analysis = engine.analyze(&buffer);

            println!("Analyzed {}x{} image for {}", width, height, engine.mode());
            print_profile("Brightness", Some(&analysis.brightness_profile));
            print_profile("Ridges", analysis.ridge_strength.as_ref());
            print_profile("Depth", analysis.depth_profile.as_ref());
            print_profile("Horizon", analysis.horizon_profile.as_ref());
            print_profile("Texture", analysis.texture_profile.as_ref());

            if let Some(path) = output {
                write_json(&path, &analysis)?;
                println!("Wrote analysis to {:?}", path);
            }
        }

        Commands::Compose {
            pixels,
            width,
            height,
            analysis,
            config: config_path,
            preset,
            mode,
            title,
            output,
            notes,
        } => {
            let mut cfg = load_or_default(config_path.as_deref())?;
            if preset.is_some() {
                cfg.mapping.preset = preset;
            }
            if mode.is_some() {
                cfg.mapping.mode = mode;
            }
            if title.is_some() {
                cfg.export.title = title;
            }
            cfg.validate()?;
            let engine = Engine::from_config(cfg)?;

            let analysis = match (pixels, analysis) {
                (_, Some(path)) => {
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read analysis {}", path.display()))?;
                    serde_json::from_str::<ImageAnalysisResult>(&json)
                        .with_context(|| format!("Failed to parse analysis {}", path.display()))?
                }
                (Some(path), None) => {
                    let data = read_pixels(&path)?;
                    let buffer = PixelBuffer::new(&data, width.unwrap_or(0), height.unwrap_or(0))?;
                    engine.analyze(&buffer)
                }
                (None, None) => anyhow::bail!("Either --pixels or --analysis is required"),
            };

            let composition = engine.render(&analysis)?;
            println!(
                "Composed \"{}\": {} notes, {:.1}s at {} BPM ({})",
                composition.title,
                composition.note_events.len(),
                composition.duration_seconds(),
                composition.tempo_bpm,
                composition.mapping_mode
            );
            for (voice, count) in composition.voice_counts() {
                println!("  {}: {} notes", voice, count);
            }

            let output = output.unwrap_or_else(|| PathBuf::from(composition.suggested_filename()));
            engine.export(&composition, &output)?;
            println!("Wrote MIDI to {:?}", output);

            if let Some(path) = notes {
                write_json(&path, &composition)?;
                println!("Wrote notes to {:?}", path);
            }
        }

        Commands::Presets { catalog } => {
            let mut presets = PresetCatalog::builtin()?;
            if let Some(path) = catalog {
                presets.extend(PresetCatalog::load(&path)?);
            }

            println!("Topo presets:");
            for preset in presets.topo_presets() {
                println!(
                    "  {:<20} {} {} @ {} BPM ({})",
                    preset.id, preset.default_key, preset.default_scale, preset.default_tempo_bpm, preset.mapping_mode
                );
                println!("    {}", preset.name);
            }

            println!("\nScene packs:");
            for scene in presets.scene_packs() {
                println!("  {:<28} {} -> {}", scene.id, scene.tagline, scene.preset_id);
            }

            println!("\nSound presets:");
            for sound in presets.sound_presets() {
                println!("  {:<20} {:?} {}", sound.id, sound.oscillator, sound.name);
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    let engine = Engine::from_config(cfg)?;
                    let preset = engine.preset();
                    let mapping = &engine.config().mapping;
                    println!("Configuration is valid!");
                    println!("  Mode: {}", engine.mode());
                    println!("  Key: {}", mapping.key(preset)?);
                    println!("  Scale: {}", mapping.scale_name(preset));
                    println!("  BPM: {}", mapping.tempo_bpm(preset));
                    match preset {
                        Some(preset) => println!("  Preset: {} ({})", preset.id, preset.name),
                        None => println!("  Preset: none"),
                    }
                    println!("  Max samples: {}", engine.config().analysis.max_samples);
                    let pipeline = engine.config().post.pipeline();
                    if !pipeline.is_empty() {
                        println!("  Post-processing: {}", pipeline.names().join(", "));
                    }
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = "topo.yaml";
            if Path::new(path).exists() {
                println!("topo.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, config::EXAMPLE_CONFIG)?;
                println!("Created topo.yaml with example configuration.");
            }
        }
    }

    Ok(())
}
