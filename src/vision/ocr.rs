//! OCR fan-out
//!
//! Runs one image through several page segmentation modes and concatenates
//! everything the engine reads. The engine sits behind [`TextRecognizer`] and
//! receives its configuration with every call.

use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::OcrSettings;
use crate::error::Result;

/// Page segmentation strategy for one recognition pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Assume a single uniform block of text
    Block,
    /// Find as much text as possible without assuming structure
    Sparse,
    /// Treat the image as a single text line
    SingleLine,
}

impl OcrMode {
    /// Fan-out order
    pub const ALL: [OcrMode; 3] = [OcrMode::Block, OcrMode::Sparse, OcrMode::SingleLine];

    pub fn name(&self) -> &'static str {
        match self {
            OcrMode::Block => "block",
            OcrMode::Sparse => "sparse",
            OcrMode::SingleLine => "single_line",
        }
    }
}

/// Configuration for a single recognizer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Language model, e.g. "vie"
    pub language: String,
    /// Engine mode (Tesseract OEM)
    pub engine_mode: i32,
    /// Page segmentation mode (Tesseract PSM)
    pub page_seg_mode: i32,
    /// Resolution hint
    pub dpi: Option<i32>,
}

/// An OCR engine that turns an image into plain text
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage, config: &OcrConfig) -> Result<String>;
}

/// Runs a recognizer under every segmentation mode
#[derive(Clone)]
pub struct OcrFanOut {
    recognizer: Arc<dyn TextRecognizer>,
    settings: OcrSettings,
}

impl OcrFanOut {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, settings: OcrSettings) -> Self {
        Self { recognizer, settings }
    }

    /// Recognize text under one mode; engine failures read as no text
    pub fn recognize(&self, image: &DynamicImage, mode: OcrMode) -> String {
        let config = self.settings.config_for(mode);

        match self.recognizer.recognize(image, &config) {
            Ok(text) => {
                debug!(
                    "OCR ({}) on {}x{}: {} bytes",
                    mode.name(),
                    image.width(),
                    image.height(),
                    text.len()
                );
                text
            }
            Err(e) => {
                warn!("OCR ({}) failed, continuing without text: {}", mode.name(), e);
                String::new()
            }
        }
    }

    /// Block, sparse and single-line output joined by newlines
    pub fn recognize_all(&self, image: &DynamicImage) -> String {
        OcrMode::ALL
            .iter()
            .map(|&mode| self.recognize(image, mode))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
