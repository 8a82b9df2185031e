//! Text region detection
//!
//! Proposes bounding boxes of probable text blocks using contour analysis on
//! an inverted Otsu binarization, filtered by size and aspect heuristics.

use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use tracing::debug;

use super::preprocess::{otsu_binarize, to_grayscale};

/// Regions must be strictly larger than this many pixels
pub const MIN_REGION_AREA: u32 = 200;
/// Regions must cover strictly less than this share of the image
pub const MAX_REGION_AREA_RATIO: f64 = 0.5;
/// Exclusive bounds on width / height
pub const MIN_ASPECT_RATIO: f64 = 0.1;
pub const MAX_ASPECT_RATIO: f64 = 10.0;

/// Bounding box of a probable text block, in source image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TextRegion {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Get bounding box as (x, y, width, height)
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }

    /// Whether the box passes the size and aspect filters for an image
    pub fn is_plausible_text(&self, image_width: u32, image_height: u32) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let area = self.area();
        let image_area = image_width as f64 * image_height as f64;
        let aspect = self.aspect_ratio();

        area > MIN_REGION_AREA as u64
            && (area as f64) < image_area * MAX_REGION_AREA_RATIO
            && aspect > MIN_ASPECT_RATIO
            && aspect < MAX_ASPECT_RATIO
    }
}

/// Detect text regions on a color image, in contour discovery order
pub fn detect_regions(image: &RgbImage) -> Vec<TextRegion> {
    detect_regions_gray(&to_grayscale(image))
}

/// Detect text regions on a grayscale image, in contour discovery order
pub fn detect_regions_gray(gray: &GrayImage) -> Vec<TextRegion> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return vec![];
    }

    let binary = otsu_binarize(gray, true);
    let contours = find_contours::<i32>(&binary);

    let regions: Vec<TextRegion> = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(bounding_rect)
        .filter(|r| r.is_plausible_text(width, height))
        .collect();

    debug!(
        "Region detection: {} contours, {} text regions kept",
        contours.len(),
        regions.len()
    );

    regions
}

/// Inclusive axis-aligned bounding box of a contour
fn bounding_rect(contour: &Contour<i32>) -> Option<TextRegion> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(TextRegion {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const PAPER: Rgb<u8> = Rgb([235, 235, 235]);
    const INK: Rgb<u8> = Rgb([20, 20, 20]);

    fn fill(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                image.put_pixel(xx, yy, INK);
            }
        }
    }

    #[test]
    fn test_detects_text_block() {
        let mut image = RgbImage::from_pixel(200, 100, PAPER);
        fill(&mut image, 20, 30, 40, 12);

        let regions = detect_regions(&image);
        assert_eq!(regions, vec![TextRegion { x: 20, y: 30, width: 40, height: 12 }]);
    }

    #[test]
    fn test_regions_in_discovery_order() {
        let mut image = RgbImage::from_pixel(200, 120, PAPER);
        fill(&mut image, 120, 10, 30, 10);
        fill(&mut image, 10, 70, 50, 12);

        let regions = detect_regions(&image);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bounds(), (120, 10, 30, 10));
        assert_eq!(regions[1].bounds(), (10, 70, 50, 12));
    }

    #[test]
    fn test_filters_small_wide_and_huge_blobs() {
        let mut image = RgbImage::from_pixel(200, 100, PAPER);
        // 5x5 speck: area too small
        fill(&mut image, 5, 5, 5, 5);
        // 150x2 rule line: aspect ratio 75
        fill(&mut image, 20, 90, 150, 2);

        assert!(detect_regions(&image).is_empty());

        let mut dark = RgbImage::from_pixel(100, 100, PAPER);
        // 80x80 covers 64% of the image
        fill(&mut dark, 10, 10, 80, 80);
        assert!(detect_regions(&dark).is_empty());
    }

    #[test]
    fn test_nested_contours_are_ignored() {
        let mut image = RgbImage::from_pixel(200, 100, PAPER);
        fill(&mut image, 20, 20, 60, 40);
        // Hollow out the block and put a blob inside the hole
        for y in 24..56 {
            for x in 24..76 {
                image.put_pixel(x, y, PAPER);
            }
        }
        fill(&mut image, 40, 30, 20, 15);

        let regions = detect_regions(&image);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bounds(), (20, 20, 60, 40));
    }

    #[test]
    fn test_empty_and_blank_images() {
        assert!(detect_regions(&RgbImage::new(0, 0)).is_empty());
        assert!(detect_regions(&RgbImage::from_pixel(50, 50, PAPER)).is_empty());
    }

    #[test]
    fn test_regions_always_satisfy_invariants() {
        // Deterministic pseudo-random blotches of varying size
        let mut image = RgbImage::from_pixel(240, 160, PAPER);
        let mut seed: u32 = 12345;
        for _ in 0..40 {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let x = (seed >> 8) % 220;
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let y = (seed >> 8) % 140;
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let w = 1 + (seed >> 8) % 20;
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let h = 1 + (seed >> 8) % 20;
            fill(&mut image, x, y, w.min(240 - x), h.min(160 - y));
        }

        let image_area = 240.0 * 160.0;
        for region in detect_regions(&image) {
            assert!(region.area() > 200);
            assert!((region.area() as f64) < 0.5 * image_area);
            assert!(region.aspect_ratio() > 0.1 && region.aspect_ratio() < 10.0);
        }
    }

    #[test]
    fn test_plausibility_bounds_are_exclusive() {
        // area exactly 200 is rejected
        let r = TextRegion { x: 0, y: 0, width: 20, height: 10 };
        assert!(!r.is_plausible_text(1000, 1000));

        // aspect exactly 10 is rejected
        let r = TextRegion { x: 0, y: 0, width: 100, height: 10 };
        assert!(!r.is_plausible_text(1000, 1000));

        let r = TextRegion { x: 0, y: 0, width: 30, height: 10 };
        assert!(r.is_plausible_text(1000, 1000));
    }
}
