// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font presets and the TrueType/OpenType glyph source.
//
// Each detected font style maps to a preset (candidate families, weight,
// baseline ratio, letter spacing). Faces are resolved once at engine setup:
// explicit font files first, then the system database, then any sans-serif.

use std::collections::HashMap;
use std::path::Path;

use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont};
use digitswap_core::error::{DigitSwapError, Result};
use digitswap_core::{EngineOptions, FontStyle};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::{debug, info, warn};

use super::glyphs::GlyphSource;

// -- Presets ------------------------------------------------------------------

/// Rendering parameters for one font style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontPreset {
    /// Family names tried in order.
    pub families: &'static [&'static str],
    /// Generic family used when none of the named ones is installed.
    pub generic: Family<'static>,
    pub weight: u16,
    /// Baseline position as a fraction of the box height, from the top.
    pub baseline_ratio: f32,
    /// Kerning fallback past the last detected character box, as a fraction
    /// of the font size.
    pub letter_spacing: f32,
}

const SERIF: FontPreset = FontPreset {
    families: &["Times New Roman", "Liberation Serif", "DejaVu Serif"],
    generic: Family::Serif,
    weight: 400,
    baseline_ratio: 0.88,
    letter_spacing: 0.05,
};

const SANS_SERIF: FontPreset = FontPreset {
    families: &["Arial", "Helvetica", "Liberation Sans", "DejaVu Sans"],
    generic: Family::SansSerif,
    weight: 400,
    baseline_ratio: 0.9,
    letter_spacing: 0.04,
};

const MONOSPACE: FontPreset = FontPreset {
    families: &["Courier New", "Liberation Mono", "DejaVu Sans Mono"],
    generic: Family::Monospace,
    weight: 400,
    baseline_ratio: 0.9,
    letter_spacing: 0.0,
};

const HANDWRITTEN: FontPreset = FontPreset {
    families: &["Comic Sans MS", "Comic Neue", "Patrick Hand"],
    generic: Family::Cursive,
    weight: 400,
    baseline_ratio: 0.86,
    letter_spacing: 0.08,
};

const MATH: FontPreset = FontPreset {
    families: &["STIX Two Math", "Cambria Math", "Latin Modern Math", "DejaVu Serif"],
    generic: Family::Serif,
    weight: 400,
    baseline_ratio: 0.88,
    letter_spacing: 0.05,
};

/// The preset for `style`.
pub fn preset(style: FontStyle) -> &'static FontPreset {
    match style {
        FontStyle::Serif => &SERIF,
        FontStyle::SansSerif => &SANS_SERIF,
        FontStyle::Monospace => &MONOSPACE,
        FontStyle::Handwritten => &HANDWRITTEN,
        FontStyle::Math => &MATH,
    }
}

/// The preset for an optional detected style; undetected text is sans-serif.
pub fn preset_for(style: Option<FontStyle>) -> &'static FontPreset {
    preset(style.unwrap_or(FontStyle::SansSerif))
}

// -- Font glyph source ----------------------------------------------------------

/// Glyph source backed by real font faces, one per style plus a fallback.
#[derive(Clone)]
pub struct FontGlyphs {
    faces: HashMap<FontStyle, FontArc>,
    fallback: FontArc,
}

impl std::fmt::Debug for FontGlyphs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontGlyphs")
            .field("styles", &self.faces.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl FontGlyphs {
    /// Use already-parsed faces.
    pub fn from_fonts(faces: HashMap<FontStyle, FontArc>, fallback: FontArc) -> Self {
        Self { faces, fallback }
    }

    /// Resolve a face for every style: `options.font_files` first, then the
    /// system font database by preset family. Fails with `Font` only when no
    /// face at all can be found.
    pub fn load(options: &EngineOptions) -> Result<Self> {
        let mut faces = HashMap::new();
        for (style, path) in &options.font_files {
            faces.insert(*style, load_font_file(path)?);
            debug!(?style, path = %path.display(), "Loaded font file");
        }

        let mut db = Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "System font database loaded");

        for style in FontStyle::ALL {
            if faces.contains_key(&style) {
                continue;
            }
            match query_preset(&db, preset(style)) {
                Some(font) => {
                    faces.insert(style, font);
                }
                None => warn!(?style, "No installed face for style, using fallback"),
            }
        }

        let fallback = query_family(&db, &[Family::SansSerif], 400)
            .or_else(|| faces.get(&FontStyle::SansSerif).cloned())
            .or_else(|| faces.values().next().cloned())
            .ok_or_else(|| {
                DigitSwapError::Font("no usable font found on this system".into())
            })?;

        info!(styles = faces.len(), "Fonts resolved");
        Ok(Self { faces, fallback })
    }

    fn face(&self, style: FontStyle) -> &FontArc {
        self.faces.get(&style).unwrap_or(&self.fallback)
    }
}

impl GlyphSource for FontGlyphs {
    fn advance(&self, style: FontStyle, font_size: f32, ch: char) -> f32 {
        let font = self.face(style);
        let scaled = font.as_scaled(px_scale(font, font_size));
        scaled.h_advance(scaled.glyph_id(ch))
    }

    fn text_width(&self, style: FontStyle, font_size: f32, text: &str) -> f32 {
        let font = self.face(style);
        let scaled = font.as_scaled(px_scale(font, font_size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
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
    ) {
        let font = self.face(style);
        let scale = px_scale(font, font_size);
        // draw_text_mut positions the top of the line box.
        let top = baseline - font.as_scaled(scale).ascent();
        draw_text_mut(
            image,
            color,
            x.round() as i32,
            top.round() as i32,
            scale,
            font,
            text,
        );
    }
}

/// Convert an em-based font size to ab_glyph's line-height scale.
fn px_scale(font: &FontArc, font_size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(font_size * font.height_unscaled() / units_per_em)
}

fn load_font_file(path: &Path) -> Result<FontArc> {
    let data = std::fs::read(path).map_err(|e| {
        DigitSwapError::Font(format!("cannot read font {}: {e}", path.display()))
    })?;
    FontVec::try_from_vec(data)
        .map(FontArc::new)
        .map_err(|e| DigitSwapError::Font(format!("cannot parse font {}: {e}", path.display())))
}

fn query_preset(db: &Database, preset: &FontPreset) -> Option<FontArc> {
    let mut families: Vec<Family<'_>> = preset.families.iter().copied().map(Family::Name).collect();
    families.push(preset.generic);
    query_family(db, &families, preset.weight)
}

fn query_family(db: &Database, families: &[Family<'_>], weight: u16) -> Option<FontArc> {
    let query = Query {
        families,
        weight: Weight(weight),
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
    })
    .flatten()
    .map(FontArc::new)
}
