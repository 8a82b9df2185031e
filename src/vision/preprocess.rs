//! Preprocessing bank for card OCR
//!
//! Produces a fixed, ordered set of single-channel renderings of a card photo.
//! Each technique targets a different degradation (noise, uneven lighting,
//! low contrast, edge clutter) and runs independently of the others.
//! Index 0 is the representative variant used for visualization.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{equalize_histogram, otsu_level};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, dilate, open};
use std::time::Instant;
use tracing::debug;

/// Neighbourhood size for adaptive thresholding
const ADAPTIVE_BLOCK_SIZE: u32 = 11;
/// Constant subtracted from the weighted local mean
const ADAPTIVE_C: f32 = 2.0;
/// Bilateral filter diameter
const BILATERAL_DIAMETER: u32 = 9;
const BILATERAL_SIGMA_COLOR: f32 = 75.0;
const BILATERAL_SIGMA_SPACE: f32 = 75.0;
const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;
/// Structuring element radius; 0 is a 1x1 element
const MORPH_RADIUS: u8 = 0;

/// A named preprocessing technique operating on the grayscale card image
#[derive(Debug, Clone, Copy)]
pub struct Technique {
    /// Stable identifier used in logs
    pub name: &'static str,
    /// Pure transformation from grayscale to a new single-channel image
    pub apply: fn(&GrayImage) -> GrayImage,
}

/// Registered techniques, in output order
pub const TECHNIQUES: [Technique; 6] = [
    Technique { name: "adaptive", apply: adaptive_gaussian_threshold },
    Technique { name: "otsu", apply: otsu_threshold },
    Technique { name: "equalized", apply: equalized_threshold },
    Technique { name: "bilateral", apply: bilateral_threshold },
    Technique { name: "morphology", apply: morphology_cleanup },
    Technique { name: "edges", apply: edge_masked_threshold },
];

/// One preprocessed rendering of the card image
#[derive(Debug, Clone)]
pub struct PreprocessedVariant {
    /// Technique that produced this variant
    pub name: &'static str,
    /// Single-channel image with the input's dimensions
    pub image: GrayImage,
}

/// Run every registered technique over the image
pub fn produce_variants(image: &RgbImage) -> Vec<PreprocessedVariant> {
    let gray = to_grayscale(image);

    TECHNIQUES
        .iter()
        .map(|technique| {
            let start = Instant::now();
            let output = if gray.width() == 0 || gray.height() == 0 {
                gray.clone()
            } else {
                (technique.apply)(&gray)
            };
            debug!("Preprocessing '{}' done in {:?}", technique.name, start.elapsed());

            PreprocessedVariant {
                name: technique.name,
                image: output,
            }
        })
        .collect()
}

/// Convert RGB to grayscale with the standard luminance weights
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let p = image.get_pixel(x, y);
        let gray = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
        Luma([gray.round().clamp(0.0, 255.0) as u8])
    })
}

/// Binarize with Otsu's level; `inverted` maps dark pixels to white
pub fn otsu_binarize(gray: &GrayImage, inverted: bool) -> GrayImage {
    let level = otsu_level(gray);
    let (on, off) = if inverted { (0u8, 255u8) } else { (255u8, 0u8) };

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([on])
        } else {
            Luma([off])
        }
    })
}

/// Local thresholding against a Gaussian-weighted neighbourhood mean
fn adaptive_gaussian_threshold(gray: &GrayImage) -> GrayImage {
    // Sigma matching an 11px Gaussian kernel
    let sigma = 0.3 * ((ADAPTIVE_BLOCK_SIZE as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let mean = gaussian_blur_f32(gray, sigma);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as f32;
        let local = mean.get_pixel(x, y)[0] as f32;
        if value > local - ADAPTIVE_C {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

fn otsu_threshold(gray: &GrayImage) -> GrayImage {
    otsu_binarize(gray, false)
}

fn equalized_threshold(gray: &GrayImage) -> GrayImage {
    otsu_binarize(&equalize_histogram(gray), false)
}

fn bilateral_threshold(gray: &GrayImage) -> GrayImage {
    let smoothed = bilateral_filter(
        gray,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
    );
    otsu_binarize(&smoothed, false)
}

/// Closing then opening of the Otsu output to drop speckle
fn morphology_cleanup(gray: &GrayImage) -> GrayImage {
    let binary = otsu_binarize(gray, false);
    let closed = close(&binary, Norm::LInf, MORPH_RADIUS);
    open(&closed, Norm::LInf, MORPH_RADIUS)
}

/// Keep only grayscale pixels on (dilated) edges, then threshold
fn edge_masked_threshold(gray: &GrayImage) -> GrayImage {
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let mask = dilate(&edges, Norm::LInf, MORPH_RADIUS);

    let masked = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            *gray.get_pixel(x, y)
        } else {
            Luma([0])
        }
    });

    otsu_binarize(&masked, false)
}

/// Edge-preserving smoothing
///
/// Each output pixel is the average of its circular neighbourhood, weighted by
/// spatial distance and by intensity difference to the center pixel. Borders
/// are handled by clamping to the nearest edge pixel.
fn bilateral_filter(
    gray: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = gray.dimensions();
    let radius = (diameter / 2) as i64;

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let color_weights: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq.sqrt() > radius as f32 {
                continue;
            }
            offsets.push((dx, dy, (dist_sq * space_coeff).exp()));
        }
    }

    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    GrayImage::from_fn(width, height, |x, y| {
        let center = gray.get_pixel(x, y)[0] as i32;
        let mut sum = 0.0f32;
        let mut weight_sum = 0.0f32;

        for &(dx, dy, space_weight) in &offsets {
            let nx = (x as i64 + dx).clamp(0, max_x) as u32;
            let ny = (y as i64 + dy).clamp(0, max_y) as u32;
            let value = gray.get_pixel(nx, ny)[0] as i32;
            let weight = space_weight * color_weights[(value - center).unsigned_abs() as usize];
            sum += weight * value as f32;
            weight_sum += weight;
        }

        Luma([(sum / weight_sum).round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn split_card(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([30, 30, 30])
            } else {
                Rgb([220, 220, 220])
            }
        })
    }

    #[test]
    fn test_produces_six_variants_with_input_dimensions() {
        let image = split_card(64, 40);
        let variants = produce_variants(&image);

        assert_eq!(variants.len(), 6);
        for variant in &variants {
            assert_eq!(variant.image.dimensions(), (64, 40), "variant {}", variant.name);
        }
    }

    #[test]
    fn test_variant_order_is_fixed() {
        let variants = produce_variants(&split_card(16, 16));
        let names: Vec<_> = variants.iter().map(|v| v.name).collect();
        assert_eq!(
            names,
            vec!["adaptive", "otsu", "equalized", "bilateral", "morphology", "edges"]
        );
    }

    #[test]
    fn test_empty_image_yields_empty_variants() {
        let variants = produce_variants(&RgbImage::new(0, 0));
        assert_eq!(variants.len(), 6);
        assert!(variants.iter().all(|v| v.image.dimensions() == (0, 0)));
    }

    #[test]
    fn test_grayscale_weights() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let gray = to_grayscale(&image);
        // 0.299 * 255 = 76.245
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
    }

    #[test]
    fn test_otsu_separates_two_levels() {
        let gray = to_grayscale(&split_card(20, 10));

        let binary = otsu_binarize(&gray, false);
        assert_eq!(binary.get_pixel(2, 5)[0], 0);
        assert_eq!(binary.get_pixel(17, 5)[0], 255);

        let inverted = otsu_binarize(&gray, true);
        assert_eq!(inverted.get_pixel(2, 5)[0], 255);
        assert_eq!(inverted.get_pixel(17, 5)[0], 0);
    }

    #[test]
    fn test_adaptive_threshold_marks_dark_stroke() {
        let mut gray = GrayImage::from_pixel(31, 31, Luma([200]));
        for y in 10..20 {
            gray.put_pixel(15, y, Luma([20]));
        }

        let binary = adaptive_gaussian_threshold(&gray);
        assert_eq!(binary.get_pixel(15, 15)[0], 0);
        assert_eq!(binary.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_adaptive_threshold_uniform_is_white() {
        let gray = GrayImage::from_pixel(12, 12, Luma([128]));
        let binary = adaptive_gaussian_threshold(&gray);
        assert!(binary.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_bilateral_keeps_uniform_regions() {
        let gray = GrayImage::from_pixel(10, 10, Luma([90]));
        let smoothed = bilateral_filter(&gray, 9, 75.0, 75.0);
        assert!(smoothed.pixels().all(|p| p[0] == 90));
    }

    #[test]
    fn test_bilateral_preserves_strong_edge() {
        let gray = to_grayscale(&split_card(20, 10));
        let smoothed = bilateral_filter(&gray, 9, 75.0, 75.0);
        // Far from the boundary both sides keep their level
        assert!(smoothed.get_pixel(1, 5)[0] < 60);
        assert!(smoothed.get_pixel(18, 5)[0] > 190);
    }

    #[test]
    fn test_morphology_with_unit_element_matches_otsu() {
        let gray = to_grayscale(&split_card(24, 12));
        assert_eq!(morphology_cleanup(&gray), otsu_threshold(&gray));
    }

    #[test]
    fn test_edge_variant_is_black_without_edges() {
        let gray = GrayImage::from_pixel(16, 16, Luma([180]));
        let output = edge_masked_threshold(&gray);
        assert!(output.pixels().all(|p| p[0] == 0));
    }
}
