// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seeded blob erasure. Removes only the connected ink of a glyph, leaving
// neighbouring strokes (fraction bars, radicals, grid lines) outside the
// padded box intact.

use std::collections::VecDeque;

use digitswap_core::EraseKind;
use image::{GrayImage, Luma, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use super::{EraseOutcome, EraseRequest, EraseStrategy, Erased};
use crate::surface::{PixelRect, luminance};

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Flood-fill erasure seeded from the darkest pixel near each character slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobEraser;

impl EraseStrategy for BlobEraser {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn try_erase(&self, image: &mut RgbaImage, request: &EraseRequest<'_>) -> EraseOutcome {
        let options = request.options;
        let region = request.padded;
        if region.is_empty() || request.box_rect.is_empty() {
            return EraseOutcome::Declined("token box lies outside the surface".into());
        }
        let threshold = options.ink_luminance_threshold;
        let radius = search_radius(
            &request.box_rect,
            request.seed_points.len(),
            options.seed_search_radius,
        );

        // Collect the blob first; nothing is written unless it qualifies.
        let mut accepted = vec![false; region.width() as usize * region.height() as usize];
        let mut area = 0usize;
        for &(cx, cy) in &request.seed_points {
            let Some(seed) = find_seed(image, &request.box_rect, cx, cy, radius, threshold) else {
                return EraseOutcome::Declined(format!("no ink within {radius}px of ({cx:.1}, {cy:.1})"));
            };
            area += flood_fill(image, &region, seed, threshold, &mut accepted);
        }
        if area < options.min_blob_area {
            return EraseOutcome::Declined(format!(
                "blob of {area}px is below the {}px minimum",
                options.min_blob_area
            ));
        }

        let limit = request.limit;
        let mut mask = GrayImage::new(limit.width(), limit.height());
        let mut ink_bounds: Option<PixelRect> = None;
        let region_w = region.width() as usize;
        for (idx, _) in accepted.iter().enumerate().filter(|(_, hit)| **hit) {
            let x = region.x0 + (idx % region_w) as u32;
            let y = region.y0 + (idx / region_w) as u32;
            mask.put_pixel(x - limit.x0, y - limit.y0, Luma([255]));
            ink_bounds = Some(match ink_bounds {
                None => PixelRect { x0: x, y0: y, x1: x + 1, y1: y + 1 },
                Some(b) => PixelRect {
                    x0: b.x0.min(x),
                    y0: b.y0.min(y),
                    x1: b.x1.max(x + 1),
                    y1: b.y1.max(y + 1),
                },
            });
        }

        // One ring of dilation absorbs the anti-aliased glyph edge.
        if options.dilation_radius > 0 {
            mask = morphology::dilate(&mask, Norm::LInf, options.dilation_radius);
        }

        let fill = request.background.fill;
        let mut written = 0usize;
        for (mx, my, px) in mask.enumerate_pixels() {
            if px.0[0] > 0 {
                image.put_pixel(limit.x0 + mx, limit.y0 + my, fill);
                written += 1;
            }
        }

        EraseOutcome::Erased(Erased {
            kind: EraseKind::Blob,
            ink_bounds,
            pixels_written: written,
        })
    }
}

/// Seed search radius: at least the configured minimum, growing with the
/// glyph so hollow digits (0, 8) still reach their stroke from the center.
fn search_radius(box_rect: &PixelRect, slots: usize, minimum: u32) -> u32 {
    let slot_w = box_rect.width() / slots.max(1) as u32;
    minimum.max(slot_w.min(box_rect.height()) / 4)
}

/// Darkest ink pixel within `radius` of `(cx, cy)`, restricted to the box.
fn find_seed(
    image: &RgbaImage,
    box_rect: &PixelRect,
    cx: f32,
    cy: f32,
    radius: u32,
    threshold: u8,
) -> Option<(u32, u32)> {
    let cx = cx.max(0.0) as u32;
    let cy = cy.max(0.0) as u32;
    let window = PixelRect {
        x0: cx.saturating_sub(radius).max(box_rect.x0),
        y0: cy.saturating_sub(radius).max(box_rect.y0),
        x1: (cx + radius + 1).min(box_rect.x1),
        y1: (cy + radius + 1).min(box_rect.y1),
    };
    let mut best: Option<(u8, (u32, u32))> = None;
    for y in window.y0..window.y1 {
        for x in window.x0..window.x1 {
            let lum = luminance(image.get_pixel(x, y));
            if lum < threshold && best.is_none_or(|(b, _)| lum < b) {
                best = Some((lum, (x, y)));
            }
        }
    }
    best.map(|(_, p)| p)
}

/// Breadth-first fill over 8-connected ink pixels inside `region`, marking
/// `accepted`. Returns the number of newly accepted pixels.
fn flood_fill(
    image: &RgbaImage,
    region: &PixelRect,
    seed: (u32, u32),
    threshold: u8,
    accepted: &mut [bool],
) -> usize {
    let width = region.width() as usize;
    let index = |x: u32, y: u32| (y - region.y0) as usize * width + (x - region.x0) as usize;

    if !region.contains(seed.0, seed.1) || accepted[index(seed.0, seed.1)] {
        return 0;
    }

    let mut queue = VecDeque::new();
    queue.push_back(seed);
    accepted[index(seed.0, seed.1)] = true;
    let mut count = 0usize;

    while let Some((x, y)) = queue.pop_front() {
        count += 1;
        for (dx, dy) in NEIGHBOURS {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if !region.contains(nx, ny) {
                continue;
            }
            let idx = index(nx, ny);
            if accepted[idx] || luminance(image.get_pixel(nx, ny)) >= threshold {
                continue;
            }
            accepted[idx] = true;
            queue.push_back((nx, ny));
        }
    }
    count
}
