// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background and ink colour sampling around a token box.

use digitswap_core::EngineOptions;
use image::{Rgba, RgbaImage};

use crate::surface::{PixelRect, luminance};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Paper colour measured on a box border, and the colour actually used to
/// fill erased pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundEstimate {
    pub measured: Rgba<u8>,
    pub fill: Rgba<u8>,
}

/// Brightest pixel on the four border edges of `rect`. The interior is never
/// sampled.
pub fn brightest_border_pixel(image: &RgbaImage, rect: &PixelRect) -> Option<Rgba<u8>> {
    if rect.is_empty() {
        return None;
    }
    let (x_last, y_last) = (rect.x1 - 1, rect.y1 - 1);
    let top_bottom = (rect.x0..rect.x1).flat_map(|x| [(x, rect.y0), (x, y_last)]);
    let left_right = (rect.y0..rect.y1).flat_map(|y| [(rect.x0, y), (x_last, y)]);

    let mut best: Option<(u8, Rgba<u8>)> = None;
    for (x, y) in top_bottom.chain(left_right) {
        let px = *image.get_pixel(x, y);
        let lum = luminance(&px);
        if best.is_none_or(|(b, _)| lum > b) {
            best = Some((lum, px));
        }
    }
    best.map(|(_, px)| px)
}

/// Near-white and implausibly dark estimates snap to pure white.
pub fn snap_fill(measured: Rgba<u8>, options: &EngineOptions) -> Rgba<u8> {
    let [r, g, b, _] = measured.0;
    let floor = options.near_white_floor;
    if (r > floor && g > floor && b > floor)
        || luminance(&measured) < options.min_background_brightness
    {
        WHITE
    } else {
        Rgba([r, g, b, 255])
    }
}

/// Estimate the background for a padded box. An empty rectangle falls back to
/// white.
pub fn estimate_background(
    image: &RgbaImage,
    rect: &PixelRect,
    options: &EngineOptions,
) -> BackgroundEstimate {
    let measured = brightest_border_pixel(image, rect).unwrap_or(WHITE);
    BackgroundEstimate {
        measured,
        fill: snap_fill(measured, options),
    }
}

/// Darkest pixel inside `rect` that counts as ink, used to colour the
/// replacement glyphs like the original ones.
pub fn sample_ink_color(
    image: &RgbaImage,
    rect: &PixelRect,
    options: &EngineOptions,
) -> Option<Rgba<u8>> {
    let mut best: Option<(u8, Rgba<u8>)> = None;
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let px = *image.get_pixel(x, y);
            let lum = luminance(&px);
            if lum < options.ink_luminance_threshold && best.is_none_or(|(b, _)| lum < b) {
                best = Some((lum, px));
            }
        }
    }
    best.map(|(_, px)| Rgba([px.0[0], px.0[1], px.0[2], 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: u32, y0: u32, x1: u32, y1: u32) -> PixelRect {
        PixelRect { x0, y0, x1, y1 }
    }

    #[test]
    fn near_white_background_snaps_to_exact_white() {
        let img = RgbaImage::from_pixel(20, 20, Rgba([230, 225, 215, 255]));
        let est = estimate_background(&img, &rect(2, 2, 18, 18), &EngineOptions::default());
        assert_eq!(est.measured, Rgba([230, 225, 215, 255]));
        assert_eq!(est.fill, WHITE);
    }

    #[test]
    fn tinted_paper_is_kept() {
        let img = RgbaImage::from_pixel(20, 20, Rgba([200, 190, 150, 255]));
        let est = estimate_background(&img, &rect(0, 0, 20, 20), &EngineOptions::default());
        assert_eq!(est.fill, Rgba([200, 190, 150, 255]));
    }

    #[test]
    fn dark_estimate_snaps_to_white() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([40, 40, 40, 255]));
        let est = estimate_background(&img, &rect(0, 0, 10, 10), &EngineOptions::default());
        assert_eq!(est.fill, WHITE);
    }

    #[test]
    fn only_border_pixels_are_sampled() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([150, 150, 150, 255]));
        // Bright interior pixel must be ignored.
        img.put_pixel(5, 5, Rgba([250, 250, 250, 255]));
        // Brightest border pixel wins.
        img.put_pixel(9, 4, Rgba([180, 170, 160, 255]));
        let px = brightest_border_pixel(&img, &rect(0, 0, 10, 10)).unwrap();
        assert_eq!(px, Rgba([180, 170, 160, 255]));
    }

    #[test]
    fn empty_rect_defaults_to_white() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let est = estimate_background(&img, &rect(2, 2, 2, 4), &EngineOptions::default());
        assert_eq!(est.fill, WHITE);
    }

    #[test]
    fn ink_colour_is_darkest_pixel() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        img.put_pixel(3, 3, Rgba([60, 20, 20, 255]));
        img.put_pixel(4, 3, Rgba([10, 10, 90, 255]));
        let ink = sample_ink_color(&img, &rect(0, 0, 10, 10), &EngineOptions::default());
        assert_eq!(ink, Some(Rgba([10, 10, 90, 255])));
        let none = sample_ink_color(&img, &rect(6, 6, 10, 10), &EngineOptions::default());
        assert_eq!(none, None);
    }
}
