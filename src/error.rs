//! Error types for analysis, mapping and export

use thiserror::Error;

/// Errors raised by the core pipeline
#[derive(Debug, Error)]
pub enum TopoError {
    /// A pitch string that is not `[A-G]#?<octave>` or falls outside MIDI 0-127
    #[error("invalid pitch name: {0:?}")]
    InvalidPitchName(String),

    /// Encoding was attempted with zero note events
    #[error("composition has no note events to encode")]
    EmptyComposition,

    /// Profiles or pixel buffers whose shape does not match what was declared
    #[error("malformed analysis input: {0}")]
    MalformedAnalysisInput(String),

    /// A note event that breaks the duration/velocity/pan invariants
    #[error("invalid note event: {0}")]
    InvalidNoteEvent(String),

    /// A voice configuration with an empty or inverted range
    #[error("invalid voice config: {0}")]
    InvalidVoiceConfig(String),

    #[error("unknown key: {0:?}")]
    UnknownKey(String),

    #[error("unknown scale: {0:?}")]
    UnknownScale(String),

    /// The preset catalog document could not be parsed
    #[error("invalid preset catalog: {0}")]
    Catalog(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for the library
pub type Result<T> = std::result::Result<T, TopoError>;
