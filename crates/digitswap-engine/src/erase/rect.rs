// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectangular fallback. Paints the padded token box with the background
// estimate when no qualifying ink blob was found.

use digitswap_core::EraseKind;
use image::RgbaImage;

use super::{EraseOutcome, EraseRequest, EraseStrategy, Erased, fill_rect};

/// Fills the padded token box with the (snapped) border-brightest colour.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectEraser;

impl EraseStrategy for RectEraser {
    fn name(&self) -> &'static str {
        "rectangle"
    }

    fn try_erase(&self, image: &mut RgbaImage, request: &EraseRequest<'_>) -> EraseOutcome {
        if request.padded.is_empty() {
            return EraseOutcome::Declined("padded box lies outside the surface".into());
        }
        let written = fill_rect(image, &request.padded, request.background.fill);
        EraseOutcome::Erased(Erased {
            kind: EraseKind::Rectangle,
            ink_bounds: None,
            pixels_written: written,
        })
    }
}
