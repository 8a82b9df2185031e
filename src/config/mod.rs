//! Application Configuration
//!
//! Reader settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::extraction::IdPrecedence;
use crate::vision::ocr::{OcrConfig, OcrMode};

/// Reader settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Field extraction settings
    pub extraction: ExtractionSettings,
    /// Visualization output settings
    pub visualization: VisualizationSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// OCR engine settings shared by all segmentation modes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language model (e.g. "vie", "vie+eng")
    pub language: String,
    /// Tesseract OCR engine mode (3 = default, based on what is available)
    pub engine_mode: i32,
    /// Page segmentation mode for a uniform block of text
    pub block_psm: i32,
    /// Page segmentation mode for sparse text without structure
    pub sparse_psm: i32,
    /// Page segmentation mode for a single text line
    pub single_line_psm: i32,
    /// Resolution hint passed to the engine
    pub dpi: Option<i32>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "vie".to_string(),
            engine_mode: 3,
            block_psm: 6,
            sparse_psm: 11,
            single_line_psm: 7,
            dpi: None,
        }
    }
}

impl OcrSettings {
    /// Build the per-call configuration for a segmentation mode
    pub fn config_for(&self, mode: OcrMode) -> OcrConfig {
        let psm = match mode {
            OcrMode::Block => self.block_psm,
            OcrMode::Sparse => self.sparse_psm,
            OcrMode::SingleLine => self.single_line_psm,
        };

        OcrConfig {
            language: self.language.clone(),
            engine_mode: self.engine_mode,
            page_seg_mode: psm,
            dpi: self.dpi,
        }
    }
}

/// Field extraction settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Whether labeled student IDs beat stray standalone numbers
    pub id_precedence: IdPrecedence,
}

/// Visualization output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationSettings {
    /// Write the visualization artifacts after extraction
    pub enabled: bool,
    /// Base directory; artifact paths are reported relative to it
    pub media_root: Option<PathBuf>,
    /// Directory under the media root that receives the artifacts
    pub subdir: String,
    /// TrueType font for region numbers and panel titles, replacing the bundled one
    pub font_path: Option<PathBuf>,
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            media_root: None,
            subdir: "visualizations".to_string(),
            font_path: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load `config.toml` from the platform config directory, or use defaults
pub fn load_or_default() -> AppConfig {
    if let Ok(config_dir) = crate::storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(config) = load_config(&config_path) {
                info!("Loaded configuration from {:?}", config_path);
                return config;
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}
