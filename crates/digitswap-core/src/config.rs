// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine options. Every field has a default; callers override only what they
// need, typically from a JSON file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::FontStyle;

/// How replacement digit strings are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplacementPolicy {
    /// Every digit position changes; length is preserved.
    #[default]
    DigitWise,
    /// Same-length integer different from the original value and from every
    /// replacement already assigned in the pass.
    Unique,
}

/// Tunables for one replacement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    // -- Safety classifier --
    /// Longest digit string eligible for autonomous replacement.
    pub max_digits: usize,
    /// Largest box width as a fraction of the image width.
    pub max_width_ratio: f32,
    /// Largest box height as a fraction of the image height.
    pub max_height_ratio: f32,
    /// Boxes whose right edge reaches this fraction of the width are skipped.
    pub right_edge_ratio: f32,
    /// Boxes whose top edge is above this fraction of the height are skipped.
    pub top_edge_ratio: f32,
    /// Allow superscript/subscript tokens into the safe set.
    pub replace_scripts: bool,

    // -- Ink removal --
    /// Padding (logical px) around the box for erasure.
    pub padding: f32,
    /// Padding used when the box is smaller than `small_box_threshold`.
    pub small_box_padding: f32,
    /// Boxes whose shorter side is below this (logical px) use the small padding.
    pub small_box_threshold: f32,
    /// Pixels darker than this luminance count as ink.
    pub ink_luminance_threshold: u8,
    /// Radius (device px) searched around a seed point for dark ink.
    pub seed_search_radius: u32,
    /// Fewest accepted pixels for a blob erase to count.
    pub min_blob_area: usize,
    /// Morphological dilation applied to the accepted blob (device px).
    pub dilation_radius: u8,
    /// Background colours with every channel above this snap to white.
    pub near_white_floor: u8,
    /// Background estimates darker than this luminance snap to white.
    pub min_background_brightness: u8,

    // -- Rendering --
    /// Ratio of effective ink height to font size.
    pub font_scale: f32,
    /// Smallest font size ever rendered (logical px).
    pub min_font_size: f32,
    /// Script font size as a fraction of the base font size.
    pub script_scale: f32,
    /// Superscript baseline lift, as a fraction of the base font size.
    pub superscript_shift: f32,
    /// Subscript baseline drop, as a fraction of the base font size.
    pub subscript_shift: f32,
    /// Ink colour used when none could be sampled from the original glyph.
    pub fallback_ink_color: [u8; 3],
    /// Font files overriding the system lookup for a style.
    pub font_files: BTreeMap<FontStyle, PathBuf>,

    // -- Replacement values --
    pub policy: ReplacementPolicy,
    /// Draws attempted by the unique policy before it gives up on uniqueness.
    pub unique_attempts: u32,
    /// Seed for reproducible replacements; fresh entropy when absent.
    pub seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_digits: 2,
            max_width_ratio: 0.15,
            max_height_ratio: 0.10,
            right_edge_ratio: 0.95,
            top_edge_ratio: 0.05,
            replace_scripts: false,

            padding: 2.0,
            small_box_padding: 1.0,
            small_box_threshold: 12.0,
            ink_luminance_threshold: 140,
            seed_search_radius: 3,
            min_blob_area: 6,
            dilation_radius: 1,
            near_white_floor: 210,
            min_background_brightness: 90,

            font_scale: 0.85,
            min_font_size: 8.0,
            script_scale: 0.6,
            superscript_shift: 0.4,
            subscript_shift: 0.25,
            fallback_ink_color: [26, 26, 26],
            font_files: BTreeMap::new(),

            policy: ReplacementPolicy::DigitWise,
            unique_attempts: 10,
            seed: None,
        }
    }
}

impl EngineOptions {
    /// Erasure padding for a box of the given logical size.
    pub fn padding_for(&self, width: f32, height: f32) -> f32 {
        if width.min(height) < self.small_box_threshold {
            self.small_box_padding
        } else {
            self.padding
        }
    }

    /// Load options from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: EngineOptions =
            serde_json::from_str(r#"{"padding": 3.5, "policy": "unique"}"#).unwrap();
        assert_eq!(opts.padding, 3.5);
        assert_eq!(opts.policy, ReplacementPolicy::Unique);
        assert_eq!(opts.max_digits, 2);
        assert_eq!(opts.near_white_floor, 210);
    }

    #[test]
    fn small_boxes_get_small_padding() {
        let opts = EngineOptions::default();
        assert_eq!(opts.padding_for(8.0, 20.0), 1.0);
        assert_eq!(opts.padding_for(20.0, 20.0), 2.0);
    }

    #[test]
    fn font_files_round_trip_with_style_keys() {
        let mut opts = EngineOptions::default();
        opts.font_files
            .insert(FontStyle::Serif, PathBuf::from("/fonts/serif.ttf"));
        let json = serde_json::to_string(&opts).unwrap();
        assert!(json.contains(r#""serif":"/fonts/serif.ttf""#));
    }
}
