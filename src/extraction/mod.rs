//! Text fusion and field extraction
//!
//! OCR runs over every preprocessed variant and every detected text region.
//! All of it is concatenated into one corpus in a fixed order, and the field
//! pattern table is evaluated against that corpus.

pub mod patterns;

pub use patterns::{Field, IdPrecedence, PatternTable};

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::vision::detection::detect_regions;
use crate::vision::ocr::{OcrFanOut, OcrMode};
use crate::vision::preprocess::{produce_variants, PreprocessedVariant};
use crate::vision::crop_region;

/// Structured fields read from one student card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCardRecord {
    pub university: Option<String>,
    pub card_type: Option<String>,
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub student_id: Option<String>,
    pub class_name: Option<String>,
    pub cohort: Option<String>,
}

impl StudentCardRecord {
    /// Build a record from the pattern table's first matches
    pub fn from_corpus(corpus: &str, table: &PatternTable) -> Self {
        let mut record = Self::default();
        for family in table.families() {
            *record.slot_mut(family.field) = family.first_match(corpus);
        }
        record
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::University => self.university.as_deref(),
            Field::CardType => self.card_type.as_deref(),
            Field::Name => self.name.as_deref(),
            Field::DateOfBirth => self.date_of_birth.as_deref(),
            Field::StudentId => self.student_id.as_deref(),
            Field::ClassName => self.class_name.as_deref(),
            Field::Cohort => self.cohort.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::University => &mut self.university,
            Field::CardType => &mut self.card_type,
            Field::Name => &mut self.name,
            Field::DateOfBirth => &mut self.date_of_birth,
            Field::StudentId => &mut self.student_id,
            Field::ClassName => &mut self.class_name,
            Field::Cohort => &mut self.cohort,
        }
    }

    /// Number of fields that matched
    pub fn resolved_fields(&self) -> usize {
        Field::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    /// True when no field matched at all
    pub fn is_empty(&self) -> bool {
        self.resolved_fields() == 0
    }
}

/// Extract fields from an already fused corpus
pub fn extract_fields(corpus: &str, precedence: IdPrecedence) -> StudentCardRecord {
    StudentCardRecord::from_corpus(corpus, PatternTable::shared(precedence))
}

/// Fuses OCR output from every rendering of a card and extracts fields
#[derive(Clone)]
pub struct CardExtractor {
    ocr: OcrFanOut,
    table: &'static PatternTable,
}

impl CardExtractor {
    pub fn new(ocr: OcrFanOut, precedence: IdPrecedence) -> Self {
        Self {
            ocr,
            table: PatternTable::shared(precedence),
        }
    }

    /// Extract the record and return the representative (first) variant
    pub fn extract(&self, image: &RgbImage) -> (StudentCardRecord, PreprocessedVariant) {
        let variants = produce_variants(image);
        let corpus = self.fuse_corpus(image, &variants);

        let record = StudentCardRecord::from_corpus(&corpus, self.table);
        info!(
            "Extracted {}/{} fields from {} bytes of OCR text",
            record.resolved_fields(),
            Field::ALL.len(),
            corpus.len()
        );

        let representative = variants[0].clone();
        (record, representative)
    }

    /// Variant text (block, sparse, single line) followed by region text
    pub fn fuse_corpus(&self, image: &RgbImage, variants: &[PreprocessedVariant]) -> String {
        let start = Instant::now();
        let mut corpus = String::new();

        for variant in variants {
            let text = self
                .ocr
                .recognize_all(&DynamicImage::ImageLuma8(variant.image.clone()));
            debug!("Variant '{}' produced {} bytes", variant.name, text.len());
            corpus.push_str(&text);
            corpus.push('\n');
        }

        let regions = detect_regions(image);
        for region in &regions {
            let crop = crop_region(image, region);
            if crop.width() == 0 || crop.height() == 0 {
                continue;
            }
            let text = self.ocr.recognize(&DynamicImage::ImageRgb8(crop), OcrMode::Block);
            corpus.push_str(&text);
            corpus.push('\n');
        }

        debug!(
            "Fused corpus from {} variants and {} regions in {:?}",
            variants.len(),
            regions.len(),
            start.elapsed()
        );

        corpus
    }
}
