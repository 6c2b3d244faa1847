//! Run configuration: an optional TOML file of CLI defaults, grounded in the
//! same config-layer ambient concern `DESIGN.md` calls out for `main.rs`.
//! Nothing in the library depends on this; it only feeds the CLI boundary.

use serde::Deserialize;
use std::path::Path;

/// Output format the CLI prints join/lookup results in.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Defaults loaded from a TOML file, overridden by whatever the caller
/// passes explicitly on the command line.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RunConfig {
    pub default_threshold: Option<f64>,
    pub default_algo: Option<String>,
    pub guha_seed: Option<u64>,
    pub output_format: Option<OutputFormat>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let text = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let cfg: RunConfig = toml::from_str(
            r#"
            default_threshold = 2.0
            output_format = "json"
        "#,
        )
        .unwrap();
        assert_eq!(cfg.default_threshold, Some(2.0));
        assert_eq!(cfg.output_format, Some(OutputFormat::Json));
        assert_eq!(cfg.default_algo, None);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let cfg: RunConfig = toml::from_str("").unwrap();
        assert!(cfg.default_threshold.is_none());
        assert!(cfg.guha_seed.is_none());
    }
}
