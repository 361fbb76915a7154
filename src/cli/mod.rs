//! CLI interface for TopoSonics

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toposonics::mapping::MappingMode;

/// Turn landscape images into music
#[derive(Parser)]
#[command(name = "toposonics")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract feature profiles from a raw RGBA dump
    Analyze {
        /// Raw RGBA bytes, row-major, 4 bytes per pixel
        #[arg(short, long)]
        pixels: PathBuf,

        /// Image width in pixels
        #[arg(long)]
        width: usize,

        /// Image height in pixels
        #[arg(long)]
        height: usize,

        /// Configuration file path (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Mapping mode whose profiles to extract
        #[arg(short, long)]
        mode: Option<MappingMode>,

        /// Write the analysis as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compose a MIDI file from pixels or a saved analysis
    Compose {
        /// Raw RGBA bytes, row-major, 4 bytes per pixel
        #[arg(short, long, requires_all = ["width", "height"], conflicts_with = "analysis")]
        pixels: Option<PathBuf>,

        #[arg(long)]
        width: Option<usize>,

        #[arg(long)]
        height: Option<usize>,

        /// Analysis JSON written by `analyze`
        #[arg(short, long, required_unless_present = "pixels")]
        analysis: Option<PathBuf>,

        /// Configuration file path (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Topo preset id, overrides the configuration
        #[arg(long)]
        preset: Option<String>,

        /// Mapping mode, overrides the configuration and preset
        #[arg(short, long)]
        mode: Option<MappingMode>,

        /// Composition title
        #[arg(short, long)]
        title: Option<String>,

        /// MIDI output path (default: derived from the title)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the composition as JSON
        #[arg(long)]
        notes: Option<PathBuf>,
    },

    /// List topo presets, scene packs and sound presets
    Presets {
        /// Extra catalog file layered over the built-in presets
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "topo.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
