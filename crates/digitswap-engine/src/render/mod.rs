// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph layout and rendering of replacement strings.

pub mod font;
pub mod glyphs;
pub mod layout;

use digitswap_core::{DetectedToken, ReplacementPlan};
use image::Rgba;
use tracing::debug;

use crate::surface::RasterSurface;

pub use font::{FontGlyphs, FontPreset, preset, preset_for};
pub use glyphs::{BoxGlyphs, GlyphSource};
pub use layout::{Anchor, PlacedGlyph, base_metrics, find_anchor, place_glyphs, plan_token};

/// Draw a planned replacement. Layout is logical; drawing happens at device
/// resolution.
pub fn draw_plan<G: GlyphSource + ?Sized>(
    surface: &mut RasterSurface,
    glyphs: &G,
    token: &DetectedToken,
    plan: &ReplacementPlan,
    color: Rgba<u8>,
) {
    let dpr = surface.device_pixel_ratio();
    let style = token.font_style.unwrap_or_default();
    let size = plan.font_size * dpr;
    let baseline = plan.render_baseline_y * dpr;

    let mut buf = [0u8; 4];
    for glyph in place_glyphs(glyphs, token, plan) {
        let text = glyph.ch.encode_utf8(&mut buf);
        glyphs.draw(surface.image_mut(), style, size, glyph.x * dpr, baseline, text, color);
    }
    debug!(
        original = %plan.original,
        replacement = %plan.replacement,
        font_size = plan.font_size,
        baseline = plan.render_baseline_y,
        "Replacement drawn"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use digitswap_core::{BoundingBox, EngineOptions, EraseKind};
    use image::RgbaImage;

    #[test]
    fn draws_at_device_resolution() {
        let white = Rgba([255, 255, 255, 255]);
        let ink = Rgba([10, 10, 10, 255]);
        let mut surface =
            RasterSurface::new(RgbaImage::from_pixel(100, 100, white), 2.0).unwrap();
        let token = DetectedToken::new("4", BoundingBox::new(10.0, 10.0, 20.0, 20.0));
        let plan = plan_token(&token, "8", 20.0, None, EraseKind::Blob, &EngineOptions::default());
        draw_plan(&mut surface, &BoxGlyphs, &token, &plan, ink);

        // Baseline at logical 28 lands on device row 56; ink sits just above.
        let img = surface.image();
        assert_eq!(img.get_pixel(40, 55), &ink);
        assert_eq!(img.get_pixel(40, 56), &white);
        // Nothing outside the doubled token box.
        assert!((0..100).all(|y| img.get_pixel(15, y) == &white));
    }
}
