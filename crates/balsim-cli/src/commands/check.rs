//! `balsim check` — validate a config file and print the resolved settings.

use std::path::Path;

use anyhow::Context;
use balsim_core::SimConfig;

/// Load and validate `path`, returning the fully resolved config as TOML.
pub fn check(path: &Path) -> anyhow::Result<String> {
    let config = SimConfig::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(config.to_toml_string()?)
}
