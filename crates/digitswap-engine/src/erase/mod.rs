// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ink removal. Makes a token's original glyphs disappear into the paper.
//
// Strategies are tried in order until one succeeds. A strategy either erases
// (writing pixels) or declines (writing nothing), so exactly one strategy's
// effect is visible per token.

pub mod background;
pub mod blob;
pub mod rect;

use digitswap_core::error::DigitSwapError;
use digitswap_core::{DetectedToken, EngineOptions, EraseKind};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::surface::{PixelRect, RasterSurface};

pub use background::{BackgroundEstimate, estimate_background, sample_ink_color};
pub use blob::BlobEraser;
pub use rect::RectEraser;

/// Everything a strategy needs to erase one token, in device pixels.
#[derive(Debug, Clone)]
pub struct EraseRequest<'a> {
    pub token: &'a DetectedToken,
    /// The token's own box.
    pub box_rect: PixelRect,
    /// Box grown by the erasure padding; flood fill and rectangle fill stay
    /// inside it.
    pub padded: PixelRect,
    /// Padded box grown by the dilation radius; no write ever leaves it.
    pub limit: PixelRect,
    /// Seed search centers, one per character slot.
    pub seed_points: Vec<(f32, f32)>,
    pub background: BackgroundEstimate,
    pub options: &'a EngineOptions,
}

/// A successful erase.
#[derive(Debug, Clone, PartialEq)]
pub struct Erased {
    pub kind: EraseKind,
    /// Bounds of the ink that was removed, when the strategy measured it.
    pub ink_bounds: Option<PixelRect>,
    pub pixels_written: usize,
}

/// What a strategy did with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum EraseOutcome {
    Erased(Erased),
    /// Nothing was written; the next strategy gets a turn.
    Declined(String),
}

/// One way of removing a token's ink.
pub trait EraseStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Erase the token's ink or decline without touching `image`.
    fn try_erase(&self, image: &mut RgbaImage, request: &EraseRequest<'_>) -> EraseOutcome;
}

/// Ordered list of strategies; the first to succeed wins.
pub struct InkRemover {
    strategies: Vec<Box<dyn EraseStrategy>>,
}

impl Default for InkRemover {
    /// Blob erasure first, rectangular fill as the fallback.
    fn default() -> Self {
        Self::new(vec![Box::new(BlobEraser), Box::new(RectEraser)])
    }
}

impl InkRemover {
    pub fn new(strategies: Vec<Box<dyn EraseStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the request for a token: padding, limits, seeds, and background.
    pub fn prepare<'a>(
        &self,
        surface: &RasterSurface,
        token: &'a DetectedToken,
        options: &'a EngineOptions,
    ) -> EraseRequest<'a> {
        let bbox = &token.bounding_box;
        let pad = options.padding_for(bbox.width, bbox.height);
        let box_rect = surface.device_rect(bbox);
        let padded = surface.device_rect(&bbox.expand(pad));
        let limit = padded.grow_within(u32::from(options.dilation_radius), &surface.bounds());
        let background = estimate_background(surface.image(), &padded, options);

        EraseRequest {
            token,
            box_rect,
            padded,
            limit,
            seed_points: seed_points(surface, token),
            background,
            options,
        }
    }

    /// Run the strategies in order against the surface.
    pub fn erase(
        &self,
        surface: &mut RasterSurface,
        request: &EraseRequest<'_>,
    ) -> Result<Erased, DigitSwapError> {
        let mut reasons = Vec::new();
        for strategy in &self.strategies {
            match strategy.try_erase(surface.image_mut(), request) {
                EraseOutcome::Erased(erased) => {
                    debug!(
                        text = %request.token.text,
                        strategy = strategy.name(),
                        pixels = erased.pixels_written,
                        "Token ink erased"
                    );
                    return Ok(erased);
                }
                EraseOutcome::Declined(reason) => {
                    debug!(text = %request.token.text, strategy = strategy.name(), %reason, "Strategy declined");
                    reasons.push(format!("{}: {reason}", strategy.name()));
                }
            }
        }
        let err = DigitSwapError::ErasureFailure {
            token: request.token.text.clone(),
            reason: reasons.join("; "),
        };
        warn!(error = %err, "Leaving token untouched");
        Err(err)
    }
}

/// Seed search centers in device pixels: one per character slot, using the
/// detector's character boxes when they line up with the text, otherwise an
/// even split of the token box.
fn seed_points(surface: &RasterSurface, token: &DetectedToken) -> Vec<(f32, f32)> {
    let bbox = &token.bounding_box;
    let cy = surface.to_device(bbox.y + bbox.height * 0.5);
    if let Some(boxes) = token.aligned_char_boxes() {
        return boxes
            .iter()
            .map(|cb| (surface.to_device((cb.xmin + cb.xmax) * 0.5), cy))
            .collect();
    }
    let slots = token.text.chars().count().max(1);
    let slot_w = bbox.width / slots as f32;
    (0..slots)
        .map(|i| {
            let cx = bbox.x + slot_w * (i as f32 + 0.5);
            (surface.to_device(cx), cy)
        })
        .collect()
}

/// Fill every pixel of `rect` with `color`.
pub(crate) fn fill_rect(image: &mut RgbaImage, rect: &PixelRect, color: Rgba<u8>) -> usize {
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            image.put_pixel(x, y, color);
        }
    }
    rect.width() as usize * rect.height() as usize
}
