//! Rendering engine for TopoSonics
//!
//! Wires configuration, the preset catalog, analysis, the mapper for the
//! selected mode and post-processing into one call.

mod composition;
mod midi;

pub use composition::Composition;
pub use midi::{
    beats_to_ticks, encode_midi, tempo_microseconds, velocity_to_midi, write_midi_file, MAIN_TRACK, TICKS_PER_BEAT,
};

use std::path::Path;

use log::{debug, info, warn};

use crate::analysis::{
    analyze_for_linear_landscape, analyze_for_multi_voice, ImageAnalysisResult, LandscapeAnalysisOptions, PixelBuffer,
};
use crate::compose::{Composer, PresetCatalog, TopoPreset};
use crate::config::TopoConfig;
use crate::error::Result;
use crate::mapping::{LandscapeMapper, MappingMode, NoteMapper, RidgeMapper};

const DEFAULT_TITLE: &str = "Untitled";

/// The main rendering engine
pub struct Engine {
    config: TopoConfig,
    catalog: PresetCatalog,
}

impl Engine {
    /// Create a new engine with the given configuration and catalog
    pub fn new(config: TopoConfig, catalog: PresetCatalog) -> Self {
        Self { config, catalog }
    }

    /// Engine over the built-in catalog plus the catalog file named in the
    /// configuration, if any
    pub fn from_config(config: TopoConfig) -> Result<Self> {
        let mut catalog = PresetCatalog::builtin()?;
        if let Some(path) = &config.catalog {
            catalog.extend(PresetCatalog::load(path)?);
            debug!("Loaded preset catalog {}", path.display());
        }
        Ok(Self::new(config, catalog))
    }

    pub fn config(&self) -> &TopoConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    /// The configured topo preset. Unknown ids fall back to no preset.
    pub fn preset(&self) -> Option<&TopoPreset> {
        let id = self.config.mapping.preset.as_deref()?;
        let preset = self.catalog.topo_preset(id);
        if preset.is_none() {
            warn!("Unknown preset '{}', using built-in voice defaults", id);
        }
        preset
    }

    /// Mapping mode in effect
    pub fn mode(&self) -> MappingMode {
        self.config.mapping.mode(self.preset())
    }

    /// Extract the profiles the current mode needs
    pub fn analyze(&self, pixels: &PixelBuffer) -> ImageAnalysisResult {
        let analysis = &self.config.analysis;
        match self.mode() {
            MappingMode::LinearLandscape => {
                let options = LandscapeAnalysisOptions {
                    include_ridges: false,
                    ..analysis.landscape()
                };
                analyze_for_linear_landscape(pixels, &options)
            }
            MappingMode::DepthRidge => analyze_for_linear_landscape(pixels, &analysis.landscape()),
            MappingMode::MultiVoice => analyze_for_multi_voice(pixels, analysis),
        }
    }

    /// Mapper for the current mode, key and scale
    pub fn mapper(&self) -> Result<Box<dyn NoteMapper>> {
        let preset = self.preset();
        let mapping = &self.config.mapping;
        let key = mapping.key(preset)?;
        let scale = mapping.scale(preset)?;

        let mapper: Box<dyn NoteMapper> = match mapping.mode(preset) {
            MappingMode::LinearLandscape => Box::new(LandscapeMapper::new(mapping.landscape_options(key, scale))),
            MappingMode::DepthRidge => Box::new(RidgeMapper::new(mapping.depth_ridge_options(key, scale))),
            MappingMode::MultiVoice => {
                let options = mapping.multi_voice_options(key, scale);
                match preset {
                    Some(preset) => Box::new(Composer::with_preset(options, preset)),
                    None => Box::new(Composer::new(options)),
                }
            }
        };
        Ok(mapper)
    }

    /// Map an analysis to a composition and apply post-processing
    pub fn render(&self, analysis: &ImageAnalysisResult) -> Result<Composition> {
        let preset = self.preset();
        let mapping = &self.config.mapping;

        let mapper = self.mapper()?;
        let notes = mapper.map(analysis)?;
        let pipeline = self.config.post.pipeline();
        let notes = pipeline.apply(notes)?;

        info!(
            "{} rendered {} notes from {} samples",
            mapper.name(),
            notes.len(),
            analysis.len()
        );

        Ok(Composition {
            title: self
                .config
                .export
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            key: mapping.key(preset)?,
            scale: mapping.scale_name(preset).to_string(),
            tempo_bpm: mapping.tempo_bpm(preset),
            mapping_mode: mapping.mode(preset),
            note_events: notes,
            preset_id: preset.map(|p| p.id.clone()),
        })
    }

    /// Analyze pixels and render them in one step
    pub fn render_pixels(&self, pixels: &PixelBuffer) -> Result<Composition> {
        let analysis = self.analyze(pixels);
        self.render(&analysis)
    }

    /// Write a composition as a MIDI file
    pub fn export(&self, composition: &Composition, path: &Path) -> Result<()> {
        write_midi_file(
            path,
            &composition.note_events,
            composition.tempo_bpm,
            Some(&composition.title),
        )?;
        info!("Wrote {} notes to {}", composition.note_events.len(), path.display());
        Ok(())
    }
}
