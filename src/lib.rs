//! Card Reader - student ID card information extraction
//!
//! Takes a photographed student card, renders it through several
//! preprocessing strategies, runs OCR under multiple segmentation modes,
//! fuses all recognized text and extracts the card fields with ordered
//! pattern families.

pub mod config;
pub mod error;
pub mod extraction;
pub mod processor;
pub mod storage;
pub mod vision;
pub mod visualization;

pub use config::AppConfig;
pub use error::{CardError, PersistError};
pub use extraction::{extract_fields, CardExtractor, Field, IdPrecedence, StudentCardRecord};
pub use processor::{load_image, unique_base_name, CardProcessor, ProcessedCard};
pub use vision::{OcrConfig, OcrMode, TesseractRecognizer, TextRecognizer, TextRegion};
pub use visualization::{VisualizationBundle, Visualizer};
