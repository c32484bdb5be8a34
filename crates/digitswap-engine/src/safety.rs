// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Token safety classifier. Partitions detector output into tokens that can be
// mutated autonomously and tokens that must be left exactly as they are.
//
// Detector output is untrusted: the rules guard against multi-part notation,
// script placement errors, hallucinated boxes, and header/pagination areas.

use digitswap_core::{DetectedToken, EngineOptions};
use serde::Serialize;
use tracing::debug;

/// Why a token was kept out of the safe set. Rules are checked in this order
/// and the first failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Not a 1..=max_digits run of ASCII digits.
    NotShortInteger,
    /// Fraction, root, operator bound, matrix element, or unknown role.
    ComplexRole,
    /// Superscript or subscript while script replacement is disabled.
    ScriptRole,
    DegenerateBox,
    /// Wider or taller than plausible for a printed digit.
    OversizedBox,
    RightMargin,
    TopMargin,
}

/// A token left untouched, with the rule it failed.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedToken {
    pub token: DetectedToken,
    pub reason: SkipReason,
}

/// Result of classifying a token list.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub safe: Vec<DetectedToken>,
    /// Position of each safe token in the input list, parallel to `safe`.
    pub safe_indices: Vec<usize>,
    pub skipped: Vec<SkippedToken>,
}

fn is_short_integer(text: &str, max_digits: usize) -> bool {
    let len = text.chars().count();
    (1..=max_digits).contains(&len) && text.chars().all(|c| c.is_ascii_digit())
}

/// Check one token against every rule.
pub fn check_token(
    token: &DetectedToken,
    image_width: f32,
    image_height: f32,
    options: &EngineOptions,
) -> Result<(), SkipReason> {
    if !is_short_integer(&token.text, options.max_digits) {
        return Err(SkipReason::NotShortInteger);
    }
    if token.role.is_complex() {
        return Err(SkipReason::ComplexRole);
    }
    if token.role.is_script() && !options.replace_scripts {
        return Err(SkipReason::ScriptRole);
    }

    let b = &token.bounding_box;
    if b.is_degenerate() {
        return Err(SkipReason::DegenerateBox);
    }
    if b.width > image_width * options.max_width_ratio
        || b.height > image_height * options.max_height_ratio
    {
        return Err(SkipReason::OversizedBox);
    }
    if b.right() >= image_width * options.right_edge_ratio {
        return Err(SkipReason::RightMargin);
    }
    if b.y <= image_height * options.top_edge_ratio {
        return Err(SkipReason::TopMargin);
    }
    Ok(())
}

/// Partition `tokens` into safe and skipped. Pure and order-preserving, so
/// classifying the same list twice yields the same partition.
pub fn classify_tokens(
    tokens: &[DetectedToken],
    image_width: f32,
    image_height: f32,
    options: &EngineOptions,
) -> Classification {
    let mut out = Classification::default();
    for (index, token) in tokens.iter().enumerate() {
        match check_token(token, image_width, image_height, options) {
            Ok(()) => {
                out.safe.push(token.clone());
                out.safe_indices.push(index);
            }
            Err(reason) => {
                debug!(text = %token.text, ?reason, "Token skipped");
                out.skipped.push(SkippedToken {
                    token: token.clone(),
                    reason,
                });
            }
        }
    }
    out
}
