//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docsift_filters::{RejectedFormat, StagesConfig};
use serde::Deserialize;

/// Config file contents (`docsift.toml`)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub workers: WorkersConfig,
    pub stages: StagesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/raw"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Gzip `results.filtering` and `stats.filtering`
    pub compress_merged: bool,
    pub rejected_format: RejectedFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/filtered"),
            compress_merged: false,
            rejected_format: RejectedFormat::Raw,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self { default: 1, max: 16 }
    }
}

impl WorkersConfig {
    /// Requested worker count, clamped to `1..=max`
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        let n = requested.unwrap_or(self.default);
        if n > self.max {
            log::warn!("{n} workers requested, capping at {}", self.max);
        }
        n.clamp(1, self.max.max(1))
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./docsift.toml (current directory)
    /// 2. ~/.config/docsift/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("docsift.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "docsift") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_filters::CharClass;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.dir, PathBuf::from("./data/filtered"));
        assert_eq!(config.workers.default, 1);
        assert!(config.stages.language.enabled);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[input]
dir = "/srv/corpus"

[output]
dir = "/tmp/filtered"
compress_merged = true
rejected_format = "dumped"

[workers]
default = 4

[stages]
text_key = "body"

[stages.length]
min_doc_len = 50

[stages.char_ratio]
class = "digit"
max_ratio = 0.5

[stages.language]
enabled = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.input.dir, PathBuf::from("/srv/corpus"));
        assert!(config.output.compress_merged);
        assert_eq!(config.output.rejected_format, RejectedFormat::Dumped);
        assert_eq!(config.workers.default, 4);
        assert_eq!(config.workers.max, 16);
        assert_eq!(config.stages.text_key, "body");
        assert_eq!(config.stages.length.min_doc_len, 50);
        assert_eq!(config.stages.length.max_doc_len, 100_000);
        assert_eq!(config.stages.char_ratio.class, CharClass::Digit);
        assert!(!config.stages.language.enabled);
    }

    #[test]
    fn workers_resolve_clamps() {
        let w = WorkersConfig { default: 2, max: 8 };
        assert_eq!(w.resolve(None), 2);
        assert_eq!(w.resolve(Some(0)), 1);
        assert_eq!(w.resolve(Some(32)), 8);
    }

    #[test]
    fn from_file_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docsift.toml");
        std::fs::write(&path, "[output\ndir = 1").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
