//! Multi-voice composition and the preset catalog
//!
//! Layers bass, melody, pad and fx voices over one image analysis.

mod composer;
mod presets;
mod voice;

pub use composer::{
    blend_profiles, compose_multi_voice, voice_pitch_table, voice_stride, Composer, MultiVoiceOptions, MIN_DENSITY,
};
pub use presets::{
    DelaySettings, Envelope, FilterSettings, FilterType, Oscillator, PresetCatalog, ReverbSettings, ScenePack,
    SoundPreset, TopoPreset,
};
pub use voice::{MappingBias, VoiceConfig, VoiceKind, VoiceSet};
