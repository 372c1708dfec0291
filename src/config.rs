//! Configuration for the verifier.
//!
//! Loads settings from config.json at startup. Provides the concurrency limit,
//! fast-path tuning and Tesseract location overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::{PipelineSettings, DEFAULT_CONCURRENCY, DEFAULT_FAST_PATH_MAX_SIDE};

/// Environment variable overriding `ocr_concurrency`.
pub const CONCURRENCY_ENV: &str = "OCR_CONCURRENCY";

/// Complete verifier configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Maximum screenshots processed at once
    #[serde(default = "default_concurrency")]
    pub ocr_concurrency: usize,
    /// Try cheap region-of-interest recognition before the full frame
    #[serde(default = "default_fast_path")]
    pub fast_path: bool,
    /// Longest side (px) of the image the fast-path crops are cut from
    #[serde(default = "default_fast_path_max_side")]
    pub fast_path_max_side: u32,
    /// Explicit Tesseract executable; searched for when absent
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory; searched for when absent
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract language code
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_fast_path() -> bool {
    true
}

fn default_fast_path_max_side() -> u32 {
    DEFAULT_FAST_PATH_MAX_SIDE
}

fn default_language() -> String {
    "eng".to_string()
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            ocr_concurrency: default_concurrency(),
            fast_path: default_fast_path(),
            fast_path_max_side: default_fast_path_max_side(),
            tesseract_path: None,
            tessdata_dir: None,
            language: default_language(),
        }
    }
}

impl VerifierConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            concurrency: self.ocr_concurrency.max(1),
            fast_path: self.fast_path,
            fast_path_max_side: self.fast_path_max_side,
        }
    }

    /// Applies an `OCR_CONCURRENCY` value; non-positive or unparsable values are ignored.
    fn apply_concurrency_override(&mut self, value: Option<&str>) {
        let Some(raw) = value else {
            return;
        };
        match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => {
                tracing::info!(concurrency = n, "Using {} from environment", CONCURRENCY_ENV);
                self.ocr_concurrency = n;
            }
            _ => tracing::warn!(value = raw, "Ignoring invalid {}", CONCURRENCY_ENV),
        }
    }
}

/// Reads and parses a config file.
fn read_config(path: &Path) -> anyhow::Result<VerifierConfig> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Loads configuration from `path` (default: config.json next to the
/// executable) or returns defaults, then applies the environment override.
pub fn load_config(path: Option<&Path>) -> VerifierConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::paths::get_default_config_path);

    tracing::info!(path = %config_path.display(), "Looking for config");

    let mut config = if config_path.exists() {
        match read_config(&config_path) {
            Ok(config) => {
                tracing::info!("Config loaded from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                VerifierConfig::default()
            }
        }
    } else {
        tracing::info!("{} not found. Using default config.", config_path.display());
        VerifierConfig::default()
    };

    config.apply_concurrency_override(std::env::var(CONCURRENCY_ENV).ok().as_deref());
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: VerifierConfig = serde_json::from_str(r#"{ "ocr_concurrency": 8 }"#).unwrap();
        assert_eq!(config.ocr_concurrency, 8);
        assert!(config.fast_path);
        assert_eq!(config.fast_path_max_side, DEFAULT_FAST_PATH_MAX_SIDE);
        assert_eq!(config.language, "eng");
        assert_eq!(config.tesseract_path, None);
    }

    #[test]
    fn test_read_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "fast_path": false, "tesseract_path": "/opt/tesseract/bin/tesseract" }"#,
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        assert!(!config.fast_path);
        assert_eq!(
            config.tesseract_path,
            Some(PathBuf::from("/opt/tesseract/bin/tesseract"))
        );
    }

    #[test]
    fn test_unparsable_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(read_config(&path).is_err());
    }

    #[test]
    fn test_load_config_falls_back_on_unparsable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let mut expected = VerifierConfig::default();
        expected.apply_concurrency_override(std::env::var(CONCURRENCY_ENV).ok().as_deref());
        assert_eq!(load_config(Some(&path)), expected);
    }

    #[test]
    fn test_concurrency_override() {
        let mut config = VerifierConfig::default();
        config.apply_concurrency_override(Some("12"));
        assert_eq!(config.ocr_concurrency, 12);

        config.apply_concurrency_override(Some("0"));
        config.apply_concurrency_override(Some("many"));
        config.apply_concurrency_override(None);
        assert_eq!(config.ocr_concurrency, 12);
    }

    #[test]
    fn test_pipeline_settings_clamps_concurrency() {
        let config = VerifierConfig {
            ocr_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.pipeline_settings().concurrency, 1);
    }
}
