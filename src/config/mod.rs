use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::audit::DEFAULT_DEVICE_DIR;
use crate::catalog::RateLadder;
use crate::core::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExploreConfig {
    /// List every device with names, mixers and the full rate/format matrix.
    pub extended: bool,
    pub ladder: RateLadder,
    /// Exhaustive scans continue into the other ladder.
    pub include_alternate: bool,
    pub device_dir: PathBuf,
    pub json: bool,
    /// PCM names to probe instead of enumerating the sound cards.
    pub devices: Vec<String>,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            extended: false,
            ladder: RateLadder::Standard,
            include_alternate: true,
            device_dir: PathBuf::from(DEFAULT_DEVICE_DIR),
            json: false,
            devices: Vec::new(),
        }
    }
}

impl ExploreConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::with_context(format!("reading config {}", path), e))?;
        let config = Self::from_toml(&content).with_context(|| format!("in config {}", path))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate().context("config validation failed")?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_dir.as_os_str().is_empty() {
            return Err(ConfigError::message("device_dir must not be empty"));
        }
        if self.devices.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::message("devices must not contain empty names"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ExploreConfig::from_toml("").unwrap();
        assert_eq!(config, ExploreConfig::default());
        assert_eq!(config.device_dir, PathBuf::from("/dev/snd"));
        assert!(config.include_alternate);
    }

    #[test]
    fn parses_all_fields() {
        let config = ExploreConfig::from_toml(
            r#"
            extended = true
            ladder = "alternate"
            include_alternate = false
            device_dir = "/tmp/snd"
            json = true
            devices = ["hw:1,0"]
            "#,
        )
        .unwrap();

        assert!(config.extended);
        assert_eq!(config.ladder, RateLadder::Alternate);
        assert!(!config.include_alternate);
        assert_eq!(config.devices, vec!["hw:1,0".to_string()]);
    }

    #[test]
    fn rejects_empty_device_names() {
        let err = ExploreConfig::from_toml("devices = [\" \"]").unwrap_err();
        assert!(format!("{:#}", err).contains("empty names"));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(ExploreConfig::from_toml("verbose = 3").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ExploreConfig::load("/nonexistent/explore.toml").unwrap_err();
        assert!(err.to_string().contains("reading config /nonexistent/explore.toml"));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explore.toml");
        let path = path.to_str().unwrap();

        let config = ExploreConfig {
            extended: true,
            ..ExploreConfig::default()
        };
        config.save(path).unwrap();

        assert_eq!(ExploreConfig::load(path).unwrap(), config);
    }
}
