// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// digitswap-engine — Visual digit replacement on a raster page.
//
// Converts detector geometry, picks the tokens that are safe to change, erases
// their ink (seeded blob fill, rectangular fallback), generates new values and
// draws them back in a matching font, size and baseline.

pub mod engine;
pub mod erase;
pub mod geometry;
pub mod render;
pub mod replace;
pub mod report;
pub mod retry;
pub mod safety;
pub mod surface;

// Re-export the primary types so callers can use `digitswap_engine::Engine` etc.
pub use engine::Engine;
pub use erase::{EraseStrategy, InkRemover};
pub use geometry::{CoordinateSpace, DetectorPayload};
pub use render::{BoxGlyphs, FontGlyphs, GlyphSource};
pub use report::ReplacementReport;
pub use retry::{RetryConfig, SemanticVerifier, Verdict, replace_with_verification};
pub use safety::{SkipReason, classify_tokens};
pub use surface::RasterSurface;
