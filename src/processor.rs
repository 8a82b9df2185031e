//! Card processing orchestrator
//!
//! load → preprocess → OCR fan-out per variant → region OCR → fuse → extract
//! → region overlay. Image loading is the only failure a caller sees; every
//! later stage degrades instead of failing.

use anyhow::Context;
use image::{GrayImage, RgbImage};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{CardError, Result};
use crate::extraction::{CardExtractor, StudentCardRecord};
use crate::visualization::{VisualizationBundle, Visualizer};
use crate::vision::{
    detect_regions, OcrFanOut, TesseractRecognizer, TextRecognizer, TextRegion,
};

/// Everything produced by one processing run
#[derive(Debug, Clone)]
pub struct ProcessedCard {
    pub record: StudentCardRecord,
    pub original: RgbImage,
    /// Representative preprocessed variant
    pub processed: GrayImage,
    /// Original with numbered region boxes
    pub annotated: RgbImage,
    /// Regions drawn on `annotated`, in discovery order
    pub regions: Vec<TextRegion>,
}

impl ProcessedCard {
    /// Build the comparison panel and write all four artifacts
    pub fn visualize(
        &self,
        visualizer: &Visualizer,
        base_name: &str,
    ) -> Result<VisualizationBundle> {
        let bundle =
            visualizer.emit(&self.original, &self.processed, &self.annotated, base_name)?;
        Ok(bundle)
    }
}

/// Reads student cards from image files
pub struct CardProcessor {
    extractor: CardExtractor,
    visualizer: Visualizer,
}

impl CardProcessor {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        config: &AppConfig,
        visualizer: Visualizer,
    ) -> Self {
        let ocr = OcrFanOut::new(recognizer, config.ocr.clone());
        Self {
            extractor: CardExtractor::new(ocr, config.extraction.id_precedence),
            visualizer,
        }
    }

    /// Processor backed by the Tesseract executable
    pub fn with_tesseract(config: &AppConfig) -> anyhow::Result<Self> {
        let media_root = match &config.visualization.media_root {
            Some(root) => root.clone(),
            None => crate::storage::get_data_dir()?.join("media"),
        };

        let mut visualizer = Visualizer::new(media_root, &config.visualization.subdir);
        if let Some(font_path) = &config.visualization.font_path {
            visualizer = visualizer
                .with_font_path(font_path)
                .with_context(|| format!("Failed to load font {:?}", font_path))?;
        }

        Ok(Self::new(Arc::new(TesseractRecognizer::new()), config, visualizer))
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    /// Process a card photo; `None` when the image cannot be loaded
    pub fn process(&self, image_path: &Path) -> Option<ProcessedCard> {
        match self.try_process(image_path) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!("Card processing aborted: {}", e);
                None
            }
        }
    }

    /// Like [`process`](Self::process) but keeps the load error
    pub fn try_process(&self, image_path: &Path) -> Result<ProcessedCard> {
        let start = Instant::now();
        info!("Processing card image {:?}", image_path);

        let original = load_image(image_path)?;
        let (record, representative) = self.extractor.extract(&original);

        let regions = detect_regions(&original);
        let annotated = self.visualizer.render_regions(&original, &regions);

        info!(
            "Card {:?} processed in {:?}: {} fields, {} regions",
            image_path,
            start.elapsed(),
            record.resolved_fields(),
            regions.len()
        );

        Ok(ProcessedCard {
            record,
            original,
            processed: representative.image,
            annotated,
            regions,
        })
    }
}

/// Decode an image file as 8-bit RGB
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|source| CardError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

/// `{prefix}_{8 hex chars}` for collision-free artifact names
pub fn unique_base_name(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..8])
}
