//! TopoSonics - Turn landscape images into music
//!
//! Samples brightness, depth, ridges, the horizon and texture along an
//! image, maps those profiles to notes in a key and scale, and writes the
//! result as a Standard MIDI File. A single mapper plays one line; the
//! multi-voice composer layers bass, melody, pad and fx.

pub mod analysis;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod mapping;

pub use config::TopoConfig;
pub use engine::{Composition, Engine};
pub use error::{Result, TopoError};
