// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verification retry loop for hosts that check the altered page (for example
// with a model asking "is this still solvable?") and want fresh values when
// the check fails.
//
// Every attempt is an independent pass on a fresh copy of the original
// surface. Nothing carries over between attempts except the attempt number.

use digitswap_core::error::{DigitSwapError, Result};
use digitswap_core::DetectedToken;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::engine::Engine;
use crate::render::GlyphSource;
use crate::report::ReplacementReport;
use crate::surface::RasterSurface;

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Passes attempted before giving up. Zero is treated as one.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// What the host's check decided about one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(String),
}

/// Host-side acceptance check for an altered page.
pub trait SemanticVerifier {
    fn verify(&mut self, surface: &RasterSurface, report: &ReplacementReport) -> Verdict;
}

impl<F> SemanticVerifier for F
where
    F: FnMut(&RasterSurface, &ReplacementReport) -> Verdict,
{
    fn verify(&mut self, surface: &RasterSurface, report: &ReplacementReport) -> Verdict {
        self(surface, report)
    }
}

/// Run passes until `verifier` accepts one.
///
/// Returns the accepted surface and report. Fails with `NoEligibleTokens` as
/// soon as a pass replaces nothing, and with `VerificationRejected` when every
/// attempt was rejected. With `options.seed` set, attempt `n` is seeded with
/// `seed + n`, so the whole loop is reproducible.
pub fn replace_with_verification<G, V>(
    engine: &Engine<G>,
    original: &RasterSurface,
    tokens: &[DetectedToken],
    verifier: &mut V,
    config: &RetryConfig,
) -> Result<(RasterSurface, ReplacementReport)>
where
    G: GlyphSource,
    V: SemanticVerifier + ?Sized,
{
    let attempts = config.max_attempts.max(1);
    for attempt in 0..attempts {
        let mut rng = match engine.options().seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(attempt))),
            None => StdRng::from_entropy(),
        };
        let mut surface = original.clone();
        let report = engine
            .replace_digits_with_rng(&mut surface, tokens, &mut rng)?
            .require_any()?;

        match verifier.verify(&surface, &report) {
            Verdict::Accept => {
                info!(attempt = attempt + 1, "Altered page accepted");
                return Ok((surface, report));
            }
            Verdict::Reject(reason) => {
                warn!(attempt = attempt + 1, max = attempts, %reason, "Altered page rejected");
            }
        }
    }
    Err(DigitSwapError::VerificationRejected { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BoxGlyphs;
    use digitswap_core::{BoundingBox, EngineOptions};
    use image::{Rgba, RgbaImage};

    fn page() -> (RasterSurface, Vec<DetectedToken>) {
        let mut img = RgbaImage::from_pixel(200, 200, Rgba([255, 255, 255, 255]));
        for y in 102..114 {
            for x in 103..107 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let tokens = vec![DetectedToken::new("5", BoundingBox::new(100.0, 100.0, 10.0, 16.0))];
        (RasterSurface::from_image(img).unwrap(), tokens)
    }

    fn engine() -> Engine<BoxGlyphs> {
        let options = EngineOptions {
            seed: Some(21),
            ..EngineOptions::default()
        };
        Engine::new(options, BoxGlyphs)
    }

    #[test]
    fn retries_until_accepted() {
        let (original, tokens) = page();
        let mut calls = 0;
        let mut verifier = |_: &RasterSurface, _: &ReplacementReport| {
            calls += 1;
            if calls < 3 {
                Verdict::Reject("not solvable".into())
            } else {
                Verdict::Accept
            }
        };
        let (surface, report) = replace_with_verification(
            &engine(),
            &original,
            &tokens,
            &mut verifier,
            &RetryConfig::default(),
        )
        .unwrap();
        assert_eq!(calls, 3);
        assert_eq!(report.plans.len(), 1);
        assert_ne!(surface.image(), original.image());
    }

    #[test]
    fn exhausted_attempts_are_reported() {
        let (original, tokens) = page();
        let mut verifier =
            |_: &RasterSurface, _: &ReplacementReport| Verdict::Reject("no".into());
        let err = replace_with_verification(
            &engine(),
            &original,
            &tokens,
            &mut verifier,
            &RetryConfig { max_attempts: 2 },
        )
        .unwrap_err();
        assert!(matches!(err, DigitSwapError::VerificationRejected { attempts: 2 }));
    }

    #[test]
    fn nothing_to_replace_stops_immediately() {
        let (original, _) = page();
        let mut calls = 0;
        let mut verifier = |_: &RasterSurface, _: &ReplacementReport| {
            calls += 1;
            Verdict::Accept
        };
        let err = replace_with_verification(
            &engine(),
            &original,
            &[],
            &mut verifier,
            &RetryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DigitSwapError::NoEligibleTokens));
        assert_eq!(calls, 0);
    }

    #[test]
    fn original_surface_is_never_modified() {
        let (original, tokens) = page();
        let before = original.image().clone();
        let mut verifier = |_: &RasterSurface, _: &ReplacementReport| Verdict::Accept;
        replace_with_verification(&engine(), &original, &tokens, &mut verifier, &RetryConfig::default())
            .unwrap();
        assert_eq!(original.image(), &before);
    }
}
