// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The replacement pass: classify, erase, generate, lay out, draw.
//
// The pass runs in phases over the whole token list. Every eligible token's
// erase request and ink colour are taken from the untouched surface, then all
// erasures run, then all replacements are drawn, so a neighbour's flood fill
// never removes freshly drawn glyphs.

use std::collections::{HashMap, HashSet};

use digitswap_core::error::Result;
use digitswap_core::{DetectedToken, EngineOptions};
use image::Rgba;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::erase::{InkRemover, sample_ink_color};
use crate::geometry::{DetectorPayload, convert_payload};
use crate::render::{FontGlyphs, GlyphSource, draw_plan, find_anchor, plan_token};
use crate::replace::generate;
use crate::report::{ReplacementReport, TokenFailure};
use crate::safety::classify_tokens;
use crate::surface::RasterSurface;

/// Immutable replacement configuration: options, glyphs, erase strategies.
/// One engine can serve many surfaces.
pub struct Engine<G = FontGlyphs> {
    options: EngineOptions,
    glyphs: G,
    remover: InkRemover,
}

// -- Construction -------------------------------------------------------------

impl Engine<FontGlyphs> {
    /// Engine drawing with fonts resolved from `options.font_files` and the
    /// system font database.
    pub fn with_system_fonts(options: EngineOptions) -> Result<Self> {
        let glyphs = FontGlyphs::load(&options)?;
        Ok(Self::new(options, glyphs))
    }
}

impl<G: GlyphSource> Engine<G> {
    pub fn new(options: EngineOptions, glyphs: G) -> Self {
        Self {
            options,
            glyphs,
            remover: InkRemover::default(),
        }
    }

    /// Replace the erase strategy chain.
    pub fn with_remover(mut self, remover: InkRemover) -> Self {
        self.remover = remover;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn glyphs(&self) -> &G {
        &self.glyphs
    }

    // -- Passes ---------------------------------------------------------------

    /// Run one pass, seeded from `options.seed` when set.
    pub fn replace_digits(
        &self,
        surface: &mut RasterSurface,
        tokens: &[DetectedToken],
    ) -> Result<ReplacementReport> {
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.replace_digits_with_rng(surface, tokens, &mut rng)
    }

    /// Convert a raw detector payload against the surface's logical size and
    /// run one pass. Tokens with unusable geometry are listed in
    /// `ReplacementReport::dropped`.
    pub fn replace_from_payload(
        &self,
        surface: &mut RasterSurface,
        payload: &DetectorPayload,
    ) -> Result<ReplacementReport> {
        surface.ensure_usable()?;
        let (tokens, drops) =
            convert_payload(payload, surface.logical_width(), surface.logical_height());
        let mut report = self.replace_digits(surface, &tokens)?;
        report.dropped = drops
            .into_iter()
            .map(|d| TokenFailure {
                text: d.text,
                error: d.error.to_string(),
            })
            .collect();
        Ok(report)
    }

    /// Run one pass with a caller-supplied random source.
    #[instrument(skip_all, fields(tokens = tokens.len()))]
    pub fn replace_digits_with_rng<R: Rng>(
        &self,
        surface: &mut RasterSurface,
        tokens: &[DetectedToken],
        rng: &mut R,
    ) -> Result<ReplacementReport> {
        surface.ensure_usable()?;
        let options = &self.options;
        let dpr = surface.device_pixel_ratio();
        let classification = classify_tokens(
            tokens,
            surface.logical_width(),
            surface.logical_height(),
            options,
        );
        let mut report = ReplacementReport {
            skipped: classification.skipped,
            ..ReplacementReport::default()
        };

        // Requests and ink colours come from the untouched surface.
        let fallback_ink = {
            let [r, g, b] = options.fallback_ink_color;
            Rgba([r, g, b, 255])
        };
        let untouched: &RasterSurface = surface;
        let prepared: Vec<_> = classification
            .safe_indices
            .iter()
            .zip(&classification.safe)
            .map(|(&index, token)| {
                let request = self.remover.prepare(untouched, token, options);
                let ink = sample_ink_color(untouched.image(), &request.box_rect, options)
                    .unwrap_or(fallback_ink);
                (index, request, ink)
            })
            .collect();

        let mut erased = Vec::with_capacity(prepared.len());
        let mut ink_heights: HashMap<usize, f32> = HashMap::new();
        for (index, request, ink) in &prepared {
            match self.remover.erase(surface, request) {
                Ok(done) => {
                    if let Some(bounds) = done.ink_bounds {
                        ink_heights.insert(*index, bounds.height() as f32 / dpr);
                    }
                    erased.push((*index, request.token, done.kind, *ink));
                }
                Err(err) if err.is_per_token() => report.failures.push(TokenFailure {
                    text: request.token.text.clone(),
                    error: err.to_string(),
                }),
                Err(err) => return Err(err),
            }
        }

        let effective_height = |i: usize| {
            ink_heights
                .get(&i)
                .copied()
                .unwrap_or(tokens[i].bounding_box.height)
        };

        let mut used: HashSet<String> = HashSet::new();
        for (index, token, kind, ink) in erased {
            let Some(replacement) = generate(
                options.policy,
                &token.text,
                &used,
                options.unique_attempts,
                rng,
            ) else {
                warn!(text = %token.text, "No replacement value could be generated");
                report.failures.push(TokenFailure {
                    text: token.text.clone(),
                    error: "no digit to replace".into(),
                });
                continue;
            };

            let anchor = if token.role.is_script() {
                find_anchor(tokens, index, effective_height, options)
            } else {
                None
            };
            let plan = plan_token(
                token,
                &replacement,
                effective_height(index),
                anchor,
                kind,
                options,
            );
            draw_plan(surface, &self.glyphs, token, &plan, ink);
            debug!(original = %token.text, %replacement, ?kind, "Token replaced");
            used.insert(replacement);
            report.record(plan);
        }

        info!(
            replaced = report.replaced_count(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "Replacement pass complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erase::RectEraser;
    use crate::render::BoxGlyphs;
    use crate::safety::SkipReason;
    use crate::surface::luminance;
    use digitswap_core::{BoundingBox, EraseKind, FontStyle, Role};
    use image::RgbaImage;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);

    /// Draws nothing, leaving only the erase visible.
    struct NoGlyphs;

    impl GlyphSource for NoGlyphs {
        fn advance(&self, _style: FontStyle, font_size: f32, _ch: char) -> f32 {
            font_size * 0.6
        }

        fn draw(
            &self,
            _image: &mut image::RgbaImage,
            _style: FontStyle,
            _font_size: f32,
            _x: f32,
            _baseline: f32,
            _text: &str,
            _color: Rgba<u8>,
        ) {
        }
    }

    fn paint(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, INK);
            }
        }
    }

    fn seeded(seed: u64) -> EngineOptions {
        EngineOptions {
            seed: Some(seed),
            ..EngineOptions::default()
        }
    }

    /// "23" in a 20px box, 10px from the top of a 200px page. At the
    /// default 5% header margin that sits on the margin, so it is narrowed.
    fn twenty_three() -> (RgbaImage, DetectedToken, EngineOptions) {
        let mut img = RgbaImage::from_pixel(200, 200, WHITE);
        paint(&mut img, 13, 13, 18, 27);
        paint(&mut img, 22, 13, 27, 27);
        let token = DetectedToken::new("23", BoundingBox::new(10.0, 10.0, 20.0, 20.0));
        let options = EngineOptions {
            top_edge_ratio: 0.04,
            ..seeded(11)
        };
        (img, token, options)
    }

    fn dark_pixels(surface: &RasterSurface, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                if luminance(surface.image().get_pixel(x, y)) < 140 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn erase_leaves_no_ink_in_the_box() {
        let (img, token, options) = twenty_three();
        let mut surface = RasterSurface::from_image(img).unwrap();
        let report = Engine::new(options, NoGlyphs)
            .replace_digits(&mut surface, &[token])
            .unwrap();
        assert_eq!(report.plans.len(), 1);
        assert_eq!(report.plans[0].erase, EraseKind::Blob);
        assert!(dark_pixels(&surface, 10, 10, 30, 30).is_empty());
    }

    #[test]
    fn twenty_three_is_replaced_and_centered() {
        let (img, token, options) = twenty_three();
        let mut surface = RasterSurface::from_image(img).unwrap();
        let report = Engine::new(options, BoxGlyphs)
            .replace_digits(&mut surface, &[token])
            .unwrap();

        let replacement = &report.replacements["23"];
        assert_eq!(replacement.len(), 2);
        for (a, b) in "23".chars().zip(replacement.chars()) {
            assert!(b.is_ascii_digit());
            assert_ne!(a, b);
        }
        // Blob ink was 14px tall: size round(14 × 0.85).
        assert_eq!(report.plans[0].font_size, 12.0);

        let ink = dark_pixels(&surface, 0, 0, 200, 200);
        assert!(!ink.is_empty());
        let min_x = ink.iter().map(|p| p.0).min().unwrap();
        let max_x = ink.iter().map(|p| p.0).max().unwrap() + 1;
        let center = (min_x + max_x) as f32 * 0.5;
        assert!((center - 20.0).abs() <= 1.0, "drawn ink centered at {center}");
        // Drawn in the sampled ink colour.
        assert_eq!(surface.image().get_pixel(ink[0].0, ink[0].1), &INK);
    }

    #[test]
    fn oversized_token_is_skipped_and_untouched() {
        let mut img = RgbaImage::from_pixel(200, 200, WHITE);
        paint(&mut img, 60, 60, 100, 75);
        let original = img.clone();
        // 40px wide on a 200px page is over the 15% limit.
        let token = DetectedToken::new("7", BoundingBox::new(58.0, 58.0, 44.0, 20.0));
        let mut surface = RasterSurface::from_image(img).unwrap();
        let report = Engine::new(seeded(1), BoxGlyphs)
            .replace_digits(&mut surface, &[token])
            .unwrap();

        assert!(report.replacements.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::OversizedBox);
        assert_eq!(surface.image(), &original);
        assert!(report.require_any().is_err());
    }

    #[test]
    fn erasure_stays_within_padding_and_dilation() {
        let mut img = RgbaImage::from_pixel(200, 200, WHITE);
        // Glyph plus a long rule running through it.
        paint(&mut img, 102, 100, 108, 116);
        paint(&mut img, 60, 107, 150, 109);
        let original = img.clone();
        let token = DetectedToken::new("1", BoundingBox::new(100.0, 98.0, 10.0, 20.0));
        let mut surface = RasterSurface::from_image(img).unwrap();
        Engine::new(seeded(3), NoGlyphs)
            .replace_digits(&mut surface, &[token])
            .unwrap();

        // Box 100..110 × 98..118, 1px small-box padding, 1px dilation.
        for (x, y, px) in surface.image().enumerate_pixels() {
            let inside = (98..112).contains(&x) && (96..120).contains(&y);
            if !inside {
                assert_eq!(px, original.get_pixel(x, y), "changed at ({x},{y})");
            }
        }
        assert_eq!(surface.image().get_pixel(96, 108), &INK);
    }

    #[test]
    fn superscript_follows_base_neighbour() {
        let mut img = RgbaImage::from_pixel(200, 200, WHITE);
        paint(&mut img, 52, 42, 56, 46);
        let tokens = vec![
            DetectedToken::new("x", BoundingBox::new(38.0, 40.0, 12.0, 16.0)),
            DetectedToken::new("2", BoundingBox::new(50.0, 40.0, 8.0, 8.0))
                .with_role(Role::Superscript),
        ];
        let options = EngineOptions {
            replace_scripts: true,
            ..seeded(5)
        };
        let mut surface = RasterSurface::from_image(img).unwrap();
        let report = Engine::new(options, BoxGlyphs)
            .replace_digits(&mut surface, &tokens)
            .unwrap();

        let plan = &report.plans[0];
        // Base "x": size round(16 × 0.85) = 14, baseline 40 + 16 × 0.9.
        assert!((plan.font_size - 14.0 * 0.6).abs() < 1e-3);
        assert!((plan.render_baseline_y - (54.4 - 14.0 * 0.4)).abs() < 1e-3);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn scripts_are_skipped_by_default() {
        let img = RgbaImage::from_pixel(200, 200, WHITE);
        let token = DetectedToken::new("2", BoundingBox::new(50.0, 40.0, 8.0, 8.0))
            .with_role(Role::Subscript);
        let mut surface = RasterSurface::from_image(img.clone()).unwrap();
        let report = Engine::new(seeded(5), BoxGlyphs)
            .replace_digits(&mut surface, &[token])
            .unwrap();
        assert_eq!(report.skipped[0].reason, SkipReason::ScriptRole);
        assert_eq!(surface.image(), &img);
    }

    #[test]
    fn blank_token_falls_back_to_rectangle() {
        // No ink at all: the blob strategy declines and the box is filled.
        let img = RgbaImage::from_pixel(200, 200, Rgba([240, 240, 240, 255]));
        let token = DetectedToken::new("4", BoundingBox::new(100.0, 100.0, 10.0, 16.0));
        let mut surface = RasterSurface::from_image(img).unwrap();
        let report = Engine::new(seeded(9), NoGlyphs)
            .replace_digits(&mut surface, &[token])
            .unwrap();
        assert_eq!(report.plans[0].erase, EraseKind::Rectangle);
        assert_eq!(surface.image().get_pixel(104, 108), &WHITE);
        assert_eq!(surface.image().get_pixel(90, 108), &Rgba([240, 240, 240, 255]));
    }

    #[test]
    fn failing_strategies_leave_token_untouched() {
        let img = RgbaImage::from_pixel(200, 200, WHITE);
        let token = DetectedToken::new("4", BoundingBox::new(100.0, 100.0, 10.0, 16.0));
        let mut surface = RasterSurface::from_image(img.clone()).unwrap();
        // Blob only: declines on a blank page.
        let engine = Engine::new(seeded(9), BoxGlyphs)
            .with_remover(InkRemover::new(vec![Box::new(crate::erase::BlobEraser)]));
        let report = engine.replace_digits(&mut surface, &[token]).unwrap();
        assert!(report.plans.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(surface.image(), &img);
    }

    #[test]
    fn same_seed_gives_same_pass() {
        let (img, token, options) = twenty_three();
        let run = || {
            let mut surface = RasterSurface::from_image(img.clone()).unwrap();
            let report = Engine::new(options.clone(), BoxGlyphs)
                .with_remover(InkRemover::new(vec![Box::new(RectEraser)]))
                .replace_digits(&mut surface, std::slice::from_ref(&token))
                .unwrap();
            (report.replacements, surface.into_image())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn payload_drops_are_reported() {
        let json = r#"[
            {"text": "5", "box_2d": [100, 100, 116, 110]},
            {"text": "6", "box_2d": [50, 50, 50, 60]}
        ]"#;
        let payload = DetectorPayload::from_json_str(json).unwrap();
        let mut img = RgbaImage::from_pixel(200, 200, WHITE);
        paint(&mut img, 103, 102, 107, 114);
        let mut surface = RasterSurface::from_image(img).unwrap();
        let report = Engine::new(seeded(2), BoxGlyphs)
            .replace_from_payload(&mut surface, &payload)
            .unwrap();
        assert_eq!(report.plans.len(), 1);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].text, "6");
    }
}
