//! Visualization of detected text regions
//!
//! Renders the region boxes over the card photo, builds a side-by-side
//! comparison panel and writes the four audit artifacts to disk. Nothing here
//! affects extraction; failures surface as [`PersistError`].

use ab_glyph::FontVec;
use image::{imageops, DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::PersistError;
use crate::vision::TextRegion;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TITLE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 16.0;
const TITLE_SCALE: f32 = 20.0;
pub(crate) const TITLE_BAND: u32 = 32;
const PANEL_GAP: u32 = 10;

/// Artifact keys and their file name suffixes, in write order
pub const ARTIFACTS: [(&str, &str); 4] = [
    ("original", "_original"),
    ("processed", "_processed"),
    ("regions", "_regions"),
    ("combined", "_combined"),
];

const ARTIFACT_EXTENSION: &str = "jpg";

const PANEL_TITLES: [&str; 3] = ["Original Image", "Processed Image", "Detected Text Regions"];

/// Combined panel plus where each artifact was written
#[derive(Debug, Clone)]
pub struct VisualizationBundle {
    pub combined: RgbImage,
    /// Artifact key to path relative to the media root
    pub paths: BTreeMap<String, PathBuf>,
}

/// Font used for region numbers and panel titles unless one is configured
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

fn bundled_font() -> FontVec {
    FontVec::try_from_vec(BUNDLED_FONT.to_vec()).expect("bundled font")
}

/// Draws region overlays and persists visualization artifacts
pub struct Visualizer {
    media_root: PathBuf,
    subdir: String,
    /// Font for region numbers and titles
    font: FontVec,
}

impl Visualizer {
    pub fn new(media_root: impl Into<PathBuf>, subdir: &str) -> Self {
        Self {
            media_root: media_root.into(),
            subdir: subdir.to_string(),
            font: bundled_font(),
        }
    }

    /// Replace the bundled font with a TrueType/OpenType font file
    pub fn with_font_path(mut self, font_path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(data).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to parse font file: {}", font_path.display()),
            )
        })?;
        info!("Loaded font: {}", font_path.display());
        self.font = font;
        Ok(self)
    }

    /// Directory that receives the artifacts
    pub fn output_dir(&self) -> PathBuf {
        self.media_root.join(&self.subdir)
    }

    /// Draw a box and a 1-based number for each region, in the given order
    pub fn render_regions(&self, image: &RgbImage, regions: &[TextRegion]) -> RgbImage {
        let mut canvas = image.clone();

        for (i, region) in regions.iter().enumerate() {
            for t in 0..BOX_THICKNESS {
                let rect = Rect::at(region.x as i32 - t, region.y as i32 - t)
                    .of_size(region.width + 2 * t as u32, region.height + 2 * t as u32);
                draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
            }

            let label_y = (region.y as i32 - 5 - LABEL_SCALE as i32).max(0);
            draw_text_mut(
                &mut canvas,
                BOX_COLOR,
                region.x as i32,
                label_y,
                LABEL_SCALE,
                &self.font,
                &(i + 1).to_string(),
            );
        }

        canvas
    }

    /// Original, processed and annotated images side by side
    pub fn build_panel(
        &self,
        original: &RgbImage,
        processed: &GrayImage,
        annotated: &RgbImage,
    ) -> RgbImage {
        let processed = DynamicImage::ImageLuma8(processed.clone()).to_rgb8();
        let images = [original, &processed, annotated];

        let width = images.iter().map(|i| i.width()).sum::<u32>() + PANEL_GAP * 2;
        let height = images.iter().map(|i| i.height()).max().unwrap_or(0) + TITLE_BAND;

        let mut panel = RgbImage::from_pixel(width, height, BACKGROUND_COLOR);

        let mut x = 0u32;
        for (image, title) in images.iter().zip(PANEL_TITLES) {
            imageops::overlay(&mut panel, *image, x as i64, TITLE_BAND as i64);
            draw_text_mut(
                &mut panel,
                TITLE_COLOR,
                x as i32 + 4,
                6,
                TITLE_SCALE,
                &self.font,
                title,
            );
            x += image.width() + PANEL_GAP;
        }

        panel
    }

    /// Write the four artifacts as `{base_name}_{suffix}.jpg`
    ///
    /// Returns each artifact key mapped to its path relative to the media root.
    pub fn persist(
        &self,
        original: &RgbImage,
        processed: &GrayImage,
        annotated: &RgbImage,
        combined: &RgbImage,
        base_name: &str,
    ) -> Result<BTreeMap<String, PathBuf>, PersistError> {
        let dir = self.output_dir();
        std::fs::create_dir_all(&dir).map_err(|source| PersistError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let mut paths = BTreeMap::new();
        for (key, suffix) in ARTIFACTS {
            let file_name = artifact_file_name(base_name, suffix);
            let path = dir.join(&file_name);

            let result = match key {
                "original" => original.save(&path),
                "processed" => processed.save(&path),
                "regions" => annotated.save(&path),
                _ => combined.save(&path),
            };
            result.map_err(|source| PersistError::WriteImage {
                path: path.clone(),
                source,
            })?;

            paths.insert(key.to_string(), Path::new(&self.subdir).join(file_name));
        }

        info!("Saved visualizations for '{}' to {:?}", base_name, dir);
        Ok(paths)
    }

    /// Build the panel and persist all four artifacts
    pub fn emit(
        &self,
        original: &RgbImage,
        processed: &GrayImage,
        annotated: &RgbImage,
        base_name: &str,
    ) -> Result<VisualizationBundle, PersistError> {
        let combined = self.build_panel(original, processed, annotated);
        let paths = self.persist(original, processed, annotated, &combined, base_name)?;
        Ok(VisualizationBundle { combined, paths })
    }
}

fn artifact_file_name(base_name: &str, suffix: &str) -> String {
    format!("{}{}.{}", base_name, suffix, ARTIFACT_EXTENSION)
}
