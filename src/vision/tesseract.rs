//! Tesseract OCR backend
//!
//! Drives the `tesseract` executable through `rusty-tesseract`. Images are
//! handed over as temporary PNG files.

use image::{DynamicImage, ImageFormat};
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;
use tracing::{debug, info};

use super::ocr::{OcrConfig, TextRecognizer};
use crate::error::{CardError, Result};

/// Tesseract command-line engine
#[derive(Debug, Clone, Default)]
pub struct TesseractRecognizer {
    /// Extra `-c name=value` engine variables
    config_variables: HashMap<String, String>,
}

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an engine variable passed with every call
    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.config_variables.insert(name.to_string(), value.to_string());
        self
    }

    /// Installed Tesseract version, if the executable can be found
    pub fn version() -> Result<String> {
        let version = rusty_tesseract::get_tesseract_version()
            .map_err(|e| CardError::Recognition(e.to_string()))?;
        info!("Using tesseract {}", version.lines().next().unwrap_or_default());
        Ok(version)
    }

    fn args_for(&self, config: &OcrConfig) -> Args {
        Args {
            lang: config.language.clone(),
            config_variables: self.config_variables.clone(),
            dpi: config.dpi,
            psm: Some(config.page_seg_mode),
            oem: Some(config.engine_mode),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, config: &OcrConfig) -> Result<String> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(String::new());
        }

        let file = tempfile::Builder::new()
            .prefix("card-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| CardError::Recognition(format!("temp file: {}", e)))?;

        image
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|e| CardError::Recognition(format!("encode: {}", e)))?;

        let tess_image = Image::from_path(file.path().to_path_buf())
            .map_err(|e| CardError::Recognition(e.to_string()))?;

        debug!(
            "Tesseract: lang={} psm={} oem={} on {}x{}",
            config.language,
            config.page_seg_mode,
            config.engine_mode,
            image.width(),
            image.height()
        );

        rusty_tesseract::image_to_string(&tess_image, &self.args_for(config))
            .map_err(|e| CardError::Recognition(e.to_string()))
    }
}
