// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph source abstraction. Layout only needs advances; drawing needs a
// rasteriser. Production uses real fonts (`FontGlyphs`); `BoxGlyphs` paints
// solid cells and needs no font files, for tests and headless previews.

use digitswap_core::FontStyle;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Measures and draws text for one style at a given size.
///
/// Sizes and coordinates are in device pixels; `baseline` is the Y of the
/// text baseline and `x` the left edge of the first glyph's advance box.
pub trait GlyphSource: Send + Sync {
    /// Horizontal advance of `ch`.
    fn advance(&self, style: FontStyle, font_size: f32, ch: char) -> f32;

    /// Advance of a whole string, including any kerning the source applies.
    fn text_width(&self, style: FontStyle, font_size: f32, text: &str) -> f32 {
        text.chars()
            .map(|ch| self.advance(style, font_size, ch))
            .sum()
    }

    fn draw(
        &self,
        image: &mut RgbaImage,
        style: FontStyle,
        font_size: f32,
        x: f32,
        baseline: f32,
        text: &str,
        color: Rgba<u8>,
    );
}

/// Monospaced stand-in that draws each character as a filled cell:
/// `0.5 × size` wide (advance `0.6 × size`), `0.7 × size` tall, resting on
/// the baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxGlyphs;

impl BoxGlyphs {
    pub const ADVANCE: f32 = 0.6;
    pub const INK_WIDTH: f32 = 0.5;
    pub const CAP_HEIGHT: f32 = 0.7;
}

impl GlyphSource for BoxGlyphs {
    fn advance(&self, _style: FontStyle, font_size: f32, _ch: char) -> f32 {
        font_size * Self::ADVANCE
    }

    fn draw(
        &self,
        image: &mut RgbaImage,
        _style: FontStyle,
        font_size: f32,
        x: f32,
        baseline: f32,
        text: &str,
        color: Rgba<u8>,
    ) {
        let ink_w = (font_size * Self::INK_WIDTH).round().max(1.0) as u32;
        let ink_h = (font_size * Self::CAP_HEIGHT).round().max(1.0) as u32;
        let side_bearing = font_size * (Self::ADVANCE - Self::INK_WIDTH) * 0.5;
        let top = (baseline - ink_h as f32).round() as i32;
        for (i, _) in text.chars().enumerate() {
            let left = x + i as f32 * font_size * Self::ADVANCE + side_bearing;
            let rect = Rect::at(left.round() as i32, top).of_size(ink_w, ink_h);
            draw_filled_rect_mut(image, rect, color);
        }
    }
}
