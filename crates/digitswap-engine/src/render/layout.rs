// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph layout: font size, baseline and horizontal placement of a
// replacement string. All values here are logical pixels.

use digitswap_core::{DetectedToken, EngineOptions, EraseKind, ReplacementPlan, Role};

use super::font::preset_for;
use super::glyphs::GlyphSource;

/// Size and baseline of a base token, which scripts attached to it inherit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub font_size: f32,
    pub baseline_y: f32,
}

/// One character of a replacement and the left edge of its advance box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub x: f32,
}

/// `max(round(effective_height × font_scale), min_font_size)`.
pub fn base_font_size(effective_height: f32, options: &EngineOptions) -> f32 {
    (effective_height * options.font_scale)
        .round()
        .max(options.min_font_size)
}

/// Font size and baseline a token would get rendered as base text.
pub fn base_metrics(
    token: &DetectedToken,
    effective_height: f32,
    options: &EngineOptions,
) -> Anchor {
    let bbox = &token.bounding_box;
    let ratio = preset_for(token.font_style).baseline_ratio;
    Anchor {
        font_size: base_font_size(effective_height, options),
        baseline_y: token
            .baseline_y
            .unwrap_or(bbox.y + bbox.height * ratio),
    }
}

/// The nearest `Base` token before `index` whose vertical span overlaps the
/// token at `index`. `effective_height` gives the height used to size each
/// candidate.
pub fn find_anchor<F>(
    tokens: &[DetectedToken],
    index: usize,
    effective_height: F,
    options: &EngineOptions,
) -> Option<Anchor>
where
    F: Fn(usize) -> f32,
{
    let script = tokens.get(index)?;
    tokens[..index]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, t)| {
            t.role == Role::Base && t.bounding_box.overlaps_vertically(&script.bounding_box)
        })
        .map(|(i, t)| base_metrics(t, effective_height(i), options))
}

/// Lay out one replacement: size and baseline by role.
pub fn plan_token(
    token: &DetectedToken,
    replacement: &str,
    effective_height: f32,
    anchor: Option<Anchor>,
    erase: EraseKind,
    options: &EngineOptions,
) -> ReplacementPlan {
    let own = base_metrics(token, effective_height, options);
    let (font_size, baseline_y) = match (&token.role, anchor) {
        (Role::Superscript, Some(a)) => (
            a.font_size * options.script_scale,
            a.baseline_y - a.font_size * options.superscript_shift,
        ),
        (Role::Subscript, Some(a)) => (
            a.font_size * options.script_scale,
            a.baseline_y + a.font_size * options.subscript_shift,
        ),
        _ => (own.font_size, own.baseline_y),
    };

    ReplacementPlan {
        original: token.text.clone(),
        replacement: replacement.to_string(),
        render_box: token.bounding_box,
        render_baseline_y: baseline_y,
        font_size,
        erase,
    }
}

/// Horizontal position of every replacement character.
///
/// A single character is centered in the box. Several characters follow the
/// detector's per-character boxes when present: each glyph is centered in its
/// original slot and the cursor steps by the original slot pitch, with the
/// style's letter spacing only past the last slot. Otherwise the string is
/// measured with kerning and centered as a whole.
pub fn place_glyphs<G: GlyphSource + ?Sized>(
    glyphs: &G,
    token: &DetectedToken,
    plan: &ReplacementPlan,
) -> Vec<PlacedGlyph> {
    let style = token.font_style.unwrap_or_default();
    let size = plan.font_size;
    let bbox = &plan.render_box;
    let chars: Vec<char> = plan.replacement.chars().collect();
    let advances: Vec<f32> = chars
        .iter()
        .map(|ch| glyphs.advance(style, size, *ch))
        .collect();

    if chars.len() > 1
        && let Some(slots) = token.aligned_char_boxes()
    {
        let spacing = preset_for(token.font_style).letter_spacing * size;
        let mut cursor = slots[0].xmin;
        let mut placed = Vec::with_capacity(chars.len());
        for (i, (&ch, &adv)) in chars.iter().zip(&advances).enumerate() {
            let x = match slots.get(i) {
                Some(slot) => cursor + (slot.width() - adv) * 0.5,
                None => cursor,
            };
            placed.push(PlacedGlyph { ch, x });
            cursor += match (slots.get(i), slots.get(i + 1)) {
                (Some(this), Some(next)) => next.xmin - this.xmin,
                _ => adv + spacing,
            };
        }
        return placed;
    }

    // Kerned pitch: each glyph starts where the kerned prefix ends.
    let total = glyphs.text_width(style, size, &plan.replacement);
    let start = bbox.x + (bbox.width - total) * 0.5;
    plan.replacement
        .char_indices()
        .zip(&advances)
        .map(|((i, ch), &adv)| {
            let through = &plan.replacement[..i + ch.len_utf8()];
            PlacedGlyph {
                ch,
                x: start + glyphs.text_width(style, size, through) - adv,
            }
        })
        .collect()
}
