//! Bitmap cleanup ahead of OCR: grayscale, Otsu inverted binarization, and a
//! non-local-means denoise pass.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;

use crate::config::PreprocessConfig;

/// Runs the full preprocessing chain on a decoded image.
pub fn preprocess_image(image: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let _span = tracing::info_span!(
        "processor.preprocess",
        width = image.width(),
        height = image.height()
    )
    .entered();

    let gray = image.to_luma8();
    let binary = binarize_inverted(&gray);
    denoise_nl_means(
        &binary,
        config.denoise_strength,
        config.patch_radius,
        config.search_radius,
    )
}

/// Otsu global threshold followed by inverted binary thresholding:
/// pixels above the level become 0, the rest 255.
pub fn binarize_inverted(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    tracing::debug!(level, "Otsu threshold selected");

    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { 0 } else { 255 };
    }
    out
}

/// Non-local-means denoising for a single-channel image.
///
/// Each output pixel is a weighted mean of the pixels within `search_radius`,
/// weighted by `exp(-d² / h²)` where `d²` is the mean squared difference of
/// the `(2 * patch_radius + 1)²` patches around the two pixels. For every
/// search offset the patch sums are kept as running column and row sums in
/// `u32`, so besides the two `f32` accumulators the working set is a single
/// padded row. Borders are handled by clamping coordinates.
pub fn denoise_nl_means(
    image: &GrayImage,
    strength: f32,
    patch_radius: u32,
    search_radius: u32,
) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || strength <= 0.0 {
        return image.clone();
    }

    let w = width as usize;
    let h = height as usize;
    let pr = patch_radius as i64;
    let sr = search_radius as i64;
    let span = (2 * pr + 1) as usize;
    let patch_area = (span * span) as f32;
    let h2 = strength * strength;

    let src = image.as_raw();
    let at = |x: i64, y: i64| -> i32 {
        let cx = x.clamp(0, w as i64 - 1) as usize;
        let cy = y.clamp(0, h as i64 - 1) as usize;
        src[cy * w + cx] as i32
    };
    let squared_diff = |x: i64, y: i64, dx: i64, dy: i64| -> u32 {
        let diff = at(x, y) - at(x + dx, y + dy);
        (diff * diff) as u32
    };

    let mut weight_sum = vec![0.0f32; w * h];
    let mut value_sum = vec![0.0f32; w * h];

    // Column sums over the patch rows, for a row padded by the patch radius.
    let mut column_sums = vec![0u32; w + span - 1];

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            for (px, sum) in column_sums.iter_mut().enumerate() {
                let x = px as i64 - pr;
                *sum = (-pr..=pr).map(|y| squared_diff(x, y, dx, dy)).sum();
            }

            for y in 0..h {
                let yi = y as i64;
                let mut patch_sum: u32 = column_sums[..span].iter().sum();
                for x in 0..w {
                    if x > 0 {
                        patch_sum = patch_sum + column_sums[x + span - 1] - column_sums[x - 1];
                    }
                    let distance = patch_sum as f32 / patch_area;
                    let weight = (-distance / h2).exp();
                    let idx = y * w + x;
                    weight_sum[idx] += weight;
                    value_sum[idx] += weight * at(x as i64 + dx, yi + dy) as f32;
                }

                if y + 1 < h {
                    for (px, sum) in column_sums.iter_mut().enumerate() {
                        let x = px as i64 - pr;
                        *sum = *sum + squared_diff(x, yi + 1 + pr, dx, dy)
                            - squared_diff(x, yi - pr, dx, dy);
                    }
                }
            }
        }
    }

    let mut out = GrayImage::new(width, height);
    for (idx, pixel) in out.pixels_mut().enumerate() {
        let value = if weight_sum[idx] > 0.0 {
            value_sum[idx] / weight_sum[idx]
        } else {
            src[idx] as f32
        };
        *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }
    out
}
