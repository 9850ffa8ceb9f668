//! Pixel filters used by the preprocessor.
//!
//! All filters work on single-channel 8-bit images. Out-of-range reads use
//! reflect-101 borders (`dcb|abcd|cba`) unless noted otherwise.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

/// 5-tap binomial kernel, the fixed 5x5 Gaussian for an automatic sigma.
const GAUSSIAN_5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Cubic convolution coefficient.
const CUBIC_A: f32 = -0.75;

fn reflect101(i: i64, n: i64) -> i64 {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    if m < n { m } else { period - m }
}

fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Non-local-means denoising.
///
/// Each output pixel is the weighted mean of the pixels in a
/// `search_window`² neighbourhood, weighted by
/// `exp(-mean_sq_patch_distance / h²)` over `template_window`² patches.
/// Patch distances are computed per search offset with an integral image, so
/// the cost is O(width · height · search_window²).
pub fn nl_means_denoise(
    image: &GrayImage,
    strength: f32,
    template_window: u32,
    search_window: u32,
) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || strength <= 0.0 {
        return image.clone();
    }

    let w = width as i64;
    let h = height as i64;
    let tr = (template_window / 2) as i64;
    let sr = (search_window / 2) as i64;
    let pad = tr + sr;
    let pw = w + 2 * pad;
    let ph = h + 2 * pad;

    let mut padded = Vec::with_capacity((pw * ph) as usize);
    for y in 0..ph {
        let sy = reflect101(y - pad, h) as u32;
        for x in 0..pw {
            let sx = reflect101(x - pad, w) as u32;
            padded.push(image.get_pixel(sx, sy)[0] as f32);
        }
    }
    let at = |x: i64, y: i64| padded[(y * pw + x) as usize];

    // Region of squared differences: every output pixel plus its patch radius
    let rw = w + 2 * tr;
    let rh = h + 2 * tr;
    let stride = (rw + 1) as usize;
    let mut integral = vec![0f64; stride * (rh + 1) as usize];

    let pixels = (w * h) as usize;
    let mut weighted = vec![0f32; pixels];
    let mut weights = vec![0f32; pixels];

    let patch_area = ((2 * tr + 1) * (2 * tr + 1)) as f32;
    let norm = 1.0 / (patch_area * strength * strength);

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            for ry in 0..rh {
                let mut row_sum = 0f64;
                for rx in 0..rw {
                    let px = rx + sr;
                    let py = ry + sr;
                    let d = at(px, py) - at(px + dx, py + dy);
                    row_sum += (d * d) as f64;
                    let cell = (ry as usize + 1) * stride + rx as usize + 1;
                    integral[cell] = integral[cell - stride] + row_sum;
                }
            }

            for y in 0..h {
                for x in 0..w {
                    let (x0, y0) = (x as usize, y as usize);
                    let (x1, y1) = (x0 + 2 * tr as usize + 1, y0 + 2 * tr as usize + 1);
                    let ssd = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                        - integral[y1 * stride + x0]
                        + integral[y0 * stride + x0];

                    let weight = (-(ssd as f32) * norm).exp();
                    let i = (y * w + x) as usize;
                    weighted[i] += weight * at(x + pad + dx, y + pad + dy);
                    weights[i] += weight;
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize;
        Luma([to_u8(weighted[i] / weights[i])])
    })
}

/// 5x5 Gaussian blur with the fixed binomial kernel.
pub fn gaussian_blur_5x5(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as i64, height as i64);

    let mut horizontal = vec![0f32; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, coeff) in GAUSSIAN_5.iter().enumerate() {
                let sx = reflect101(x + k as i64 - 2, w) as u32;
                acc += coeff * image.get_pixel(sx, y as u32)[0] as f32;
            }
            horizontal[(y * w + x) as usize] = acc;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let mut acc = 0.0;
        for (k, coeff) in GAUSSIAN_5.iter().enumerate() {
            let sy = reflect101(y as i64 + k as i64 - 2, h);
            acc += coeff * horizontal[(sy * w + x as i64) as usize];
        }
        Luma([to_u8(acc)])
    })
}

/// Global binarization at Otsu's level: pixels above it become 255, the rest 0.
pub fn otsu_binarize(image: &GrayImage) -> GrayImage {
    let level = otsu_level(image);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([if image.get_pixel(x, y)[0] > level { 255 } else { 0 }])
    })
}

fn cubic_weight(t: f32) -> f32 {
    let t = t.abs();
    if t <= 1.0 {
        ((CUBIC_A + 2.0) * t - (CUBIC_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((CUBIC_A * t - 5.0 * CUBIC_A) * t + 8.0 * CUBIC_A) * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Rotate by `angle_deg` (positive is counter-clockwise on screen) about
/// `(width / 2, height / 2)`, keeping the canvas size. Bicubic sampling,
/// edge pixels replicated outside the source.
pub fn rotate_about_center(image: &GrayImage, angle_deg: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    GrayImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = cos * dx - sin * dy + cx;
        let sy = sin * dx + cos * dy + cy;

        let x0 = sx.floor();
        let y0 = sy.floor();
        let fx = sx - x0;
        let fy = sy - y0;

        let mut acc = 0.0;
        for j in -1..=2i64 {
            let wy = cubic_weight(fy - j as f32);
            if wy == 0.0 {
                continue;
            }
            let py = (y0 as i64 + j).clamp(0, max_y) as u32;
            for i in -1..=2i64 {
                let wx = cubic_weight(fx - i as f32);
                if wx == 0.0 {
                    continue;
                }
                let px = (x0 as i64 + i).clamp(0, max_x) as u32;
                acc += wx * wy * image.get_pixel(px, py)[0] as f32;
            }
        }
        Luma([to_u8(acc)])
    })
}

/// Scale contrast around the mean luminance: `mean + factor * (p - mean)`.
pub fn adjust_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let count = (image.width() as u64 * image.height() as u64).max(1);
    let sum: u64 = image.pixels().map(|p| p[0] as u64).sum();
    let mean = (sum as f32 / count as f32 + 0.5).floor();

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y)[0] as f32;
        Luma([to_u8(mean + factor * (p - mean))])
    })
}

/// Sharpen by extrapolating away from a 3x3 smoothed copy
/// (`[[1,1,1],[1,5,1],[1,1,1]] / 13`). Border pixels are left as they are.
pub fn adjust_sharpness(image: &GrayImage, factor: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return image.clone();
    }

    GrayImage::from_fn(width, height, |x, y| {
        let p = image.get_pixel(x, y)[0] as f32;
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            return Luma([p as u8]);
        }
        let mut acc = 0.0;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let k = if nx == x && ny == y { 5.0 } else { 1.0 };
                acc += k * image.get_pixel(nx, ny)[0] as f32;
            }
        }
        let smoothed = acc / 13.0;
        Luma([to_u8(smoothed + factor * (p - smoothed))])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flat(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(13, 5), 3);
        assert_eq!(reflect101(-7, 1), 0);
    }

    #[test]
    fn test_nl_means_keeps_flat_image() {
        let image = flat(9, 7, 120);
        let denoised = nl_means_denoise(&image, 10.0, 7, 21);
        assert_eq!(denoised, image);
    }

    #[test]
    fn test_nl_means_suppresses_single_speck() {
        let mut image = flat(15, 15, 200);
        image.put_pixel(7, 7, Luma([190]));
        let denoised = nl_means_denoise(&image, 10.0, 3, 7);
        assert!(denoised.get_pixel(7, 7)[0] > 190);
        assert_eq!(denoised.get_pixel(0, 0)[0], 200);
    }

    #[test]
    fn test_gaussian_blur_spreads_impulse() {
        let mut image = flat(5, 5, 0);
        image.put_pixel(2, 2, Luma([160]));
        let blurred = gaussian_blur_5x5(&image);
        // centre weight is (6/16)^2
        assert_eq!(blurred.get_pixel(2, 2)[0], 23);
        assert!(blurred.get_pixel(1, 2)[0] > 0);
        assert_eq!(gaussian_blur_5x5(&flat(3, 3, 77)), flat(3, 3, 77));
    }

    #[test]
    fn test_otsu_splits_bimodal_image() {
        let image = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 30 } else { 220 }]));
        let binary = otsu_binarize(&image);
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(9, 9)[0], 255);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let image = GrayImage::from_fn(6, 4, |x, y| Luma([(x * 40 + y * 10) as u8]));
        assert_eq!(rotate_about_center(&image, 0.0), image);
    }

    #[test]
    fn test_rotate_replicates_border() {
        // A flat image stays flat: no black corners after rotation
        let rotated = rotate_about_center(&flat(20, 10, 255), 10.0);
        assert!(rotated.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_contrast_stretches_around_mean() {
        let image = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 100 } else { 140 }]));
        let adjusted = adjust_contrast(&image, 2.0);
        assert_eq!(adjusted.get_pixel(0, 0)[0], 80);
        assert_eq!(adjusted.get_pixel(1, 0)[0], 160);
    }

    #[test]
    fn test_sharpness_keeps_flat_and_borders() {
        assert_eq!(adjust_sharpness(&flat(5, 5, 90), 2.0), flat(5, 5, 90));

        let mut image = flat(5, 5, 100);
        image.put_pixel(2, 2, Luma([200]));
        let sharpened = adjust_sharpness(&image, 2.0);
        assert!(sharpened.get_pixel(2, 2)[0] > 200);
        assert_eq!(sharpened.get_pixel(0, 0)[0], 100);
    }
}
