// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster surface: the mutable RGBA pixel buffer a pass edits in place, plus
// its logical (CSS-space) size and device pixel ratio.

use digitswap_core::BoundingBox;
use digitswap_core::error::{DigitSwapError, Result};
use image::{DynamicImage, Pixel, Rgba, RgbaImage};
use tracing::debug;

/// Half-open rectangle of device pixels: `x0..x1`, `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Grow by `by` pixels on every side, clamped to `bounds`.
    pub fn grow_within(&self, by: u32, bounds: &PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.saturating_sub(by).max(bounds.x0),
            y0: self.y0.saturating_sub(by).max(bounds.y0),
            x1: (self.x1 + by).min(bounds.x1),
            y1: (self.y1 + by).min(bounds.y1),
        }
    }
}

/// Mutable pixel buffer owned by the caller and borrowed by the engine for the
/// duration of one call.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    logical_width: f32,
    logical_height: f32,
    device_pixel_ratio: f32,
}

impl RasterSurface {
    /// Wrap a device-resolution buffer. The logical size is the pixel size
    /// divided by `device_pixel_ratio`.
    pub fn new(image: RgbaImage, device_pixel_ratio: f32) -> Result<Self> {
        if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
            return Err(DigitSwapError::SurfaceUnavailable(format!(
                "invalid device pixel ratio {device_pixel_ratio}"
            )));
        }
        let surface = Self {
            logical_width: image.width() as f32 / device_pixel_ratio,
            logical_height: image.height() as f32 / device_pixel_ratio,
            image,
            device_pixel_ratio,
        };
        surface.ensure_usable()?;
        debug!(
            width = surface.image.width(),
            height = surface.image.height(),
            dpr = device_pixel_ratio,
            "Raster surface ready"
        );
        Ok(surface)
    }

    /// Wrap an image at a device pixel ratio of 1.
    pub fn from_image(image: RgbaImage) -> Result<Self> {
        Self::new(image, 1.0)
    }

    /// Convert any decoded image to an RGBA surface at ratio 1.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        Self::from_image(image.to_rgba8())
    }

    /// Fail with `SurfaceUnavailable` if the buffer cannot be edited.
    pub fn ensure_usable(&self) -> Result<()> {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return Err(DigitSwapError::SurfaceUnavailable(format!(
                "surface has no pixels ({w}x{h})"
            )));
        }
        let expected = w as usize * h as usize * 4;
        if self.image.as_raw().len() < expected {
            return Err(DigitSwapError::SurfaceUnavailable(format!(
                "pixel buffer holds {} bytes, expected {expected}",
                self.image.as_raw().len()
            )));
        }
        Ok(())
    }

    pub fn logical_width(&self) -> f32 {
        self.logical_width
    }

    pub fn logical_height(&self) -> f32 {
        self.logical_height
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// The whole buffer as a rectangle.
    pub fn bounds(&self) -> PixelRect {
        PixelRect {
            x0: 0,
            y0: 0,
            x1: self.image.width(),
            y1: self.image.height(),
        }
    }

    pub fn to_device(&self, logical: f32) -> f32 {
        logical * self.device_pixel_ratio
    }

    pub fn to_logical(&self, device: f32) -> f32 {
        device / self.device_pixel_ratio
    }

    /// Device pixels covered by a logical box, clamped to the buffer. Edges
    /// are widened outward to whole pixels.
    pub fn device_rect(&self, bbox: &BoundingBox) -> PixelRect {
        let dpr = self.device_pixel_ratio;
        let (w, h) = self.image.dimensions();
        let clamp = |v: f32, max: u32| -> u32 { v.max(0.0).min(max as f32) as u32 };
        PixelRect {
            x0: clamp((bbox.x * dpr).floor(), w),
            y0: clamp((bbox.y * dpr).floor(), h),
            x1: clamp((bbox.right() * dpr).ceil(), w),
            y1: clamp((bbox.bottom() * dpr).ceil(), h),
        }
    }
}

/// Perceived brightness of a pixel, ignoring alpha.
pub fn luminance(pixel: &Rgba<u8>) -> u8 {
    pixel.to_luma().0[0]
}
