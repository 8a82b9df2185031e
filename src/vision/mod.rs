//! Vision/OCR Layer
//!
//! Turns a card photo into text. Provides:
//! - the preprocessing bank (six binarized renderings)
//! - contour-based text region detection
//! - OCR fan-out over several page segmentation modes
//! - a Tesseract backend for the recognizer trait

pub mod detection;
pub mod ocr;
pub mod preprocess;
pub mod tesseract;

pub use detection::{detect_regions, TextRegion};
pub use ocr::{OcrConfig, OcrFanOut, OcrMode, TextRecognizer};
pub use preprocess::{produce_variants, PreprocessedVariant};
pub use tesseract::TesseractRecognizer;

use image::{imageops, RgbImage};

/// Crop a region out of the source image, clamped to its bounds
pub fn crop_region(image: &RgbImage, region: &TextRegion) -> RgbImage {
    let (img_width, img_height) = image.dimensions();

    let x = region.x.min(img_width);
    let y = region.y.min(img_height);
    let width = region.width.min(img_width - x);
    let height = region.height.min(img_height - y);

    imageops::crop_imm(image, x, y, width, height).to_image()
}
