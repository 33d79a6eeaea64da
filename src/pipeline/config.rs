//! Configuration for ensemble runs and its file loading.
//!
//! A run is configured by one [`EnsembleConfig`], loaded from TOML or JSON and
//! then overridden by command-line flags. Every field has a default, so an
//! empty file is a valid configuration.

use crate::core::validation::validate_non_empty;
use crate::core::{EnsembleError, ParallelPolicy};
use ocr_ensemble_core::processors::{ArrangeConfig, FilterConfig, MergeConfig, RowConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a run reads label crops and writes its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for `<key>.txt` files; no text output when unset.
    #[serde(default)]
    pub text_dir: Option<PathBuf>,
    /// Directory for reconstructed `<key>.<ext>` images; no image output when unset.
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    /// Directory holding the original label crops.
    #[serde(default)]
    pub label_dir: Option<PathBuf>,
    /// Extension of label crops and reconstructed images.
    #[serde(default = "OutputConfig::default_image_extension")]
    pub image_extension: String,
    /// Font for reconstructed images; common system fonts are tried when unset.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Process only the first N labels.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl OutputConfig {
    fn default_image_extension() -> String {
        "jpg".to_string()
    }

    /// Path of the text output for `key`, when text output is enabled.
    pub fn text_path(&self, key: &str) -> Option<PathBuf> {
        self.text_dir.as_ref().map(|dir| dir.join(format!("{key}.txt")))
    }

    /// Path of the reconstructed image for `key`, when image output is enabled.
    pub fn image_path(&self, key: &str) -> Option<PathBuf> {
        self.image_dir
            .as_ref()
            .map(|dir| dir.join(format!("{key}.{}", self.image_extension)))
    }

    /// Path of the original label crop for `key`.
    pub fn label_path(&self, key: &str) -> Option<PathBuf> {
        self.label_dir
            .as_ref()
            .map(|dir| dir.join(format!("{key}.{}", self.image_extension)))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            text_dir: None,
            image_dir: None,
            label_dir: None,
            image_extension: Self::default_image_extension(),
            font_path: None,
            limit: None,
        }
    }
}

/// Everything that controls one ensemble run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Directories of OCR output, one per pipeline/engine run.
    #[serde(default)]
    pub ocr_dirs: Vec<PathBuf>,
    /// Optional word list used to break votes without a majority.
    #[serde(default)]
    pub vocabulary: Option<PathBuf>,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub rows: RowConfig,
    #[serde(default)]
    pub arrange: ArrangeConfig,
    #[serde(default)]
    pub parallel: ParallelPolicy,
    #[serde(default)]
    pub output: OutputConfig,
}

impl EnsembleConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamps out-of-range thresholds and sizes with a warning.
    pub fn validated(mut self) -> Self {
        self.filter = self.filter.validated();
        self.merge = self.merge.validated();
        self.rows = self.rows.validated();
        self.arrange = self.arrange.validated();
        self
    }

    /// Checks that the run has something to read and somewhere to write.
    pub fn check_runnable(&self) -> Result<(), EnsembleError> {
        validate_non_empty(&self.ocr_dirs, "ocr_dirs")?;
        if self.output.text_dir.is_none() && self.output.image_dir.is_none() {
            return Err(EnsembleError::config_error(
                "neither a text nor an image output directory is set",
            ));
        }
        if self.output.image_dir.is_some() && self.output.label_dir.is_none() {
            return Err(EnsembleError::config_error(
                "image output needs a label image directory",
            ));
        }
        Ok(())
    }
}

/// Configuration file format
#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration loader for ensemble runs
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, auto-detecting the format from the extension
    ///
    /// ```rust,no_run
    /// use ocr_ensemble::pipeline::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load_from_file(Path::new("ensemble.toml"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_from_file(path: &Path) -> Result<EnsembleConfig, EnsembleError> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            EnsembleError::config_error(format!(
                "Unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            EnsembleError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::load_from_string(&content, format)
    }

    /// Load configuration from a string with specified format
    pub fn load_from_string(
        content: &str,
        format: ConfigFormat,
    ) -> Result<EnsembleConfig, EnsembleError> {
        match format {
            ConfigFormat::Toml => Self::load_from_toml(content),
            ConfigFormat::Json => Self::load_from_json(content),
        }
    }

    /// Load configuration from TOML string
    pub fn load_from_toml(content: &str) -> Result<EnsembleConfig, EnsembleError> {
        toml::from_str(content).map_err(|e| {
            EnsembleError::config_error(format!("Failed to parse TOML config: {e}"))
        })
    }

    /// Load configuration from JSON string
    pub fn load_from_json(content: &str) -> Result<EnsembleConfig, EnsembleError> {
        serde_json::from_str(content).map_err(|e| {
            EnsembleError::config_error(format!("Failed to parse JSON config: {e}"))
        })
    }

    /// Save configuration to a file, auto-detecting the format from the extension
    pub fn save_to_file(config: &EnsembleConfig, path: &Path) -> Result<(), EnsembleError> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            EnsembleError::config_error(format!(
                "Unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;

        let content = Self::save_to_string(config, format)?;

        std::fs::write(path, content).map_err(|e| {
            EnsembleError::config_error(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Save configuration to string with specified format
    pub fn save_to_string(
        config: &EnsembleConfig,
        format: ConfigFormat,
    ) -> Result<String, EnsembleError> {
        match format {
            ConfigFormat::Toml => Self::save_to_toml(config),
            ConfigFormat::Json => Self::save_to_json(config),
        }
    }

    /// Save configuration to TOML string
    pub fn save_to_toml(config: &EnsembleConfig) -> Result<String, EnsembleError> {
        toml::to_string_pretty(config).map_err(|e| {
            EnsembleError::config_error(format!("Failed to serialize config to TOML: {e}"))
        })
    }

    /// Save configuration to JSON string
    pub fn save_to_json(config: &EnsembleConfig) -> Result<String, EnsembleError> {
        serde_json::to_string_pretty(config).map_err(|e| {
            EnsembleError::config_error(format!("Failed to serialize config to JSON: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnsembleConfig {
        let mut config = EnsembleConfig::new();
        config.ocr_dirs = vec![PathBuf::from("ocr/easyocr"), PathBuf::from("ocr/tesseract")];
        config.merge.iou_threshold = 0.4;
        config.rows.width_threshold = 0.6;
        config.output.text_dir = Some(PathBuf::from("out/text"));
        config.output.limit = Some(10);
        config
    }

    #[test]
    fn test_config_format_detection() {
        assert!(matches!(
            ConfigFormat::from_extension(Path::new("config.toml")),
            Some(ConfigFormat::Toml)
        ));
        assert!(matches!(
            ConfigFormat::from_extension(Path::new("config.json")),
            Some(ConfigFormat::Json)
        ));
        assert!(ConfigFormat::from_extension(Path::new("config.txt")).is_none());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = sample();
        let toml_str = ConfigLoader::save_to_toml(&config).unwrap();
        let loaded = ConfigLoader::load_from_toml(&toml_str).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = sample();
        let json_str = ConfigLoader::save_to_json(&config).unwrap();
        let loaded = ConfigLoader::load_from_json(&json_str).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ConfigLoader::load_from_toml("").unwrap();
        assert_eq!(config, EnsembleConfig::default());
        assert_eq!(config.arrange.gutter, 12);
        assert_eq!(config.arrange.base_font_size, 42);
        assert_eq!(config.output.image_extension, "jpg");
        assert!(config.merge.use_containment);
    }

    #[test]
    fn test_partial_section() {
        let config = ConfigLoader::load_from_toml("[merge]\niou_threshold = 0.5\n").unwrap();
        assert_eq!(config.merge.iou_threshold, 0.5);
        assert_eq!(config.merge.max_boxes, 2000);
    }

    #[test]
    fn test_output_paths() {
        let mut output = OutputConfig::default();
        assert!(output.text_path("a").is_none());
        output.text_dir = Some(PathBuf::from("text"));
        output.image_dir = Some(PathBuf::from("images"));
        output.label_dir = Some(PathBuf::from("labels"));
        assert_eq!(output.text_path("a"), Some(PathBuf::from("text/a.txt")));
        assert_eq!(output.image_path("a"), Some(PathBuf::from("images/a.jpg")));
        assert_eq!(output.label_path("a"), Some(PathBuf::from("labels/a.jpg")));
    }

    #[test]
    fn test_check_runnable() {
        let mut config = EnsembleConfig::new();
        assert!(config.check_runnable().is_err());
        config.ocr_dirs.push(PathBuf::from("ocr"));
        assert!(config.check_runnable().is_err());
        config.output.image_dir = Some(PathBuf::from("images"));
        assert!(config.check_runnable().is_err());
        config.output.label_dir = Some(PathBuf::from("labels"));
        assert!(config.check_runnable().is_ok());
    }

    #[test]
    fn test_save_to_file_roundtrip() {
        let root = tempfile::tempdir().unwrap();
        let mut config = EnsembleConfig::new();
        config.ocr_dirs.push(PathBuf::from("ocr/easyocr"));
        config.output.text_dir = Some(PathBuf::from("text"));
        config.merge.iou_threshold = 0.45;

        for name in ["ensemble.toml", "ensemble.json"] {
            let path = root.path().join(name);
            ConfigLoader::save_to_file(&config, &path).unwrap();
            let loaded = ConfigLoader::load_from_file(&path).unwrap();
            assert_eq!(loaded.ocr_dirs, config.ocr_dirs);
            assert_eq!(loaded.output.text_dir, config.output.text_dir);
            assert_eq!(loaded.merge, config.merge);
        }

        let json = ConfigLoader::save_to_string(&config, ConfigFormat::Json).unwrap();
        assert!(json.trim_start().starts_with('{'));
        assert!(ConfigLoader::save_to_file(&config, &root.path().join("ensemble.yaml")).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_file(Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, EnsembleError::ConfigError { .. }));
    }
}
