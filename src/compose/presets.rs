//! Preset catalog: topo presets, scene packs and sound presets
//!
//! The built-in catalog is an embedded YAML document; callers can layer a
//! catalog file of their own on top of it. Lookups by id return `None` for
//! unknown ids and the caller falls back to the built-in voice defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::voice::{MappingBias, VoiceConfig, VoiceSet};
use crate::error::Result;
use crate::mapping::{Key, MappingMode, Scale};

const BUILTIN_CATALOG: &str = include_str!("../../presets/catalog.yaml");

/// Named mood preset for multi-voice composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopoPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub default_key: Key,
    /// Scale name such as "D_MAJOR" or "minor_pentatonic"
    pub default_scale: String,
    pub default_tempo_bpm: f64,
    #[serde(default)]
    pub mapping_mode: MappingMode,
    pub voices: VoiceSet<VoiceConfig>,
    pub mapping_bias: VoiceSet<MappingBias>,
}

impl TopoPreset {
    pub fn scale(&self) -> Result<Scale> {
        Scale::parse(&self.default_scale)
    }

    /// Check the scale name and every voice configuration
    pub fn validate(&self) -> Result<()> {
        self.scale()?;
        for (_, voice) in self.voices.iter() {
            voice.validate()?;
        }
        Ok(())
    }
}

/// Curated bundle of a preset with shooting guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePack {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub preset_id: String,
    #[serde(default)]
    pub recommended_subjects: Vec<String>,
    #[serde(default)]
    pub recommended_lighting: String,
    #[serde(default)]
    pub recommended_usage_notes: String,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Oscillator {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// ADSR envelope; times in seconds, sustain as a level 0-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Cutoff in Hz
    pub frequency: f64,
    pub resonance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbSettings {
    pub wet: f64,
    /// Decay time in seconds
    pub decay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelaySettings {
    /// Delay time in seconds
    pub time: f64,
    pub feedback: f64,
}

/// Synthesis hints for an external rendering engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundPreset {
    pub id: String,
    pub name: String,
    pub oscillator: Oscillator,
    #[serde(default)]
    pub description: String,
    pub envelope: Envelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverb: Option<ReverbSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelaySettings>,
}

/// On-disk catalog layout
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    #[serde(default)]
    topo_presets: Vec<TopoPreset>,
    #[serde(default)]
    scene_packs: Vec<ScenePack>,
    #[serde(default)]
    sound_presets: Vec<SoundPreset>,
}

/// Read-only collection of presets, looked up by id
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    topo_presets: Vec<TopoPreset>,
    scene_packs: Vec<ScenePack>,
    sound_presets: Vec<SoundPreset>,
}

/// Replace entries with a matching id, append the rest
fn merge_by_id<T>(target: &mut Vec<T>, incoming: Vec<T>, id: impl Fn(&T) -> &str) {
    for item in incoming {
        match target.iter().position(|existing| id(existing) == id(&item)) {
            Some(index) => target[index] = item,
            None => target.push(item),
        }
    }
}

impl PresetCatalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Parse a catalog document and validate its topo presets
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: CatalogDocument = serde_yaml::from_str(yaml)?;
        let catalog = Self {
            topo_presets: document.topo_presets,
            scene_packs: document.scene_packs,
            sound_presets: document.sound_presets,
        };
        for preset in &catalog.topo_presets {
            preset.validate()?;
        }
        Ok(catalog)
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Layer another catalog on top of this one; entries sharing an id are
    /// replaced
    pub fn extend(&mut self, other: PresetCatalog) {
        merge_by_id(&mut self.topo_presets, other.topo_presets, |p| p.id.as_str());
        merge_by_id(&mut self.scene_packs, other.scene_packs, |p| p.id.as_str());
        merge_by_id(&mut self.sound_presets, other.sound_presets, |p| p.id.as_str());
    }

    pub fn topo_presets(&self) -> &[TopoPreset] {
        &self.topo_presets
    }

    pub fn scene_packs(&self) -> &[ScenePack] {
        &self.scene_packs
    }

    pub fn sound_presets(&self) -> &[SoundPreset] {
        &self.sound_presets
    }

    pub fn topo_preset(&self, id: &str) -> Option<&TopoPreset> {
        self.topo_presets.iter().find(|p| p.id == id)
    }

    /// First topo preset in the catalog
    pub fn default_topo_preset(&self) -> Option<&TopoPreset> {
        self.topo_presets.first()
    }

    pub fn scene_pack(&self, id: &str) -> Option<&ScenePack> {
        self.scene_packs.iter().find(|p| p.id == id)
    }

    /// The topo preset a scene pack refers to
    pub fn scene_preset(&self, scene: &ScenePack) -> Option<&TopoPreset> {
        self.topo_preset(&scene.preset_id)
    }

    pub fn sound_preset(&self, id: &str) -> Option<&SoundPreset> {
        self.sound_presets.iter().find(|p| p.id == id)
    }

    /// First sound preset in the catalog
    pub fn default_sound_preset(&self) -> Option<&SoundPreset> {
        self.sound_presets.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_catalog() {
        let catalog = PresetCatalog::builtin().unwrap();
        assert_eq!(catalog.topo_presets().len(), 6);
        assert_eq!(catalog.scene_packs().len(), 6);
        assert_eq!(catalog.sound_presets().len(), 6);

        assert_eq!(catalog.default_topo_preset().unwrap().id, "majestic-mountains");
        assert_eq!(catalog.default_sound_preset().unwrap().id, "sine-soft");
    }

    #[test]
    fn test_builtin_presets_parse() {
        let catalog = PresetCatalog::builtin().unwrap();

        let grid = catalog.topo_preset("industrial-grid").unwrap();
        assert_eq!(grid.default_key, Key::ASharp);
        assert_eq!(grid.scale().unwrap().intervals(), Scale::minor().intervals());
        assert_eq!(grid.default_tempo_bpm, 110.0);
        assert_eq!(grid.voices.bass.min_note, "A#1");
        assert_eq!(grid.mapping_bias.fx.ridge_weight, 0.7);

        let desert = catalog.topo_preset("desert-drones").unwrap();
        assert_eq!(desert.scale().unwrap().intervals(), Scale::major_pentatonic().intervals());
    }

    #[test]
    fn test_every_scene_resolves_to_a_preset() {
        let catalog = PresetCatalog::builtin().unwrap();
        for scene in catalog.scene_packs() {
            let preset = catalog.scene_preset(scene).unwrap();
            assert_eq!(scene.id, format!("scene-{}", preset.id));
        }
    }

    #[test]
    fn test_sound_preset_effects() {
        let catalog = PresetCatalog::builtin().unwrap();
        let ambient = catalog.sound_preset("sine-ambient").unwrap();
        assert_eq!(ambient.oscillator, Oscillator::Sine);
        assert_eq!(ambient.delay, Some(DelaySettings { time: 0.375, feedback: 0.3 }));
        assert_eq!(ambient.filter.unwrap().filter_type, FilterType::Lowpass);
        assert!(catalog.sound_preset("sine-soft").unwrap().delay.is_none());
    }

    #[test]
    fn test_unknown_ids() {
        let catalog = PresetCatalog::builtin().unwrap();
        assert!(catalog.topo_preset("volcano").is_none());
        assert!(catalog.scene_pack("scene-volcano").is_none());
        assert!(catalog.sound_preset("theremin").is_none());
    }

    #[test]
    fn test_extend_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
soundPresets:
  - id: sine-soft
    name: Softer Sine
    oscillator: sine
    envelope: {{ attack: 0.2, decay: 0.2, sustain: 0.5, release: 1.0 }}
  - id: square-buzz
    name: Buzz
    oscillator: square
    envelope: {{ attack: 0.0, decay: 0.1, sustain: 0.9, release: 0.1 }}
"#
        )
        .unwrap();

        let mut catalog = PresetCatalog::builtin().unwrap();
        catalog.extend(PresetCatalog::load(file.path()).unwrap());

        assert_eq!(catalog.sound_presets().len(), 7);
        assert_eq!(catalog.sound_preset("sine-soft").unwrap().name, "Softer Sine");
        assert!(catalog.sound_preset("square-buzz").is_some());
        assert_eq!(catalog.topo_presets().len(), 6);
    }

    #[test]
    fn test_invalid_catalog() {
        assert!(PresetCatalog::from_yaml("topoPresets: 5").is_err());
        assert!(PresetCatalog::load(Path::new("/nonexistent/catalog.yaml")).is_err());
    }
}
