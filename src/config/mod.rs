//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Commented example configuration written by `toposonics init`
pub const EXAMPLE_CONFIG: &str = include_str!("../../topo.example.yaml");

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<TopoConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: TopoConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
