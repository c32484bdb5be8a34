// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry and coordinate adapter. Turns raw detector records into
// `DetectedToken`s whose boxes are in logical pixels.
//
// Detectors report corners as `[ymin, xmin, ymax, xmax]` in one of three
// conventions: normalized to 0..1, normalized to 0..1000, or plain pixels.
// Conversion never rounds; rounding happens only when pixels are written.

use digitswap_core::error::{DigitSwapError, Result};
use digitswap_core::{BoundingBox, CharBox, DetectedToken, FontStyle, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Coordinate convention of a detector payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Decide from the values themselves.
    #[default]
    Auto,
    /// Fractions of the image size (0..1).
    Normalized,
    /// Thousandths of the image size (0..1000).
    Permille,
    /// Logical pixels.
    Pixels,
}

/// Per-character horizontal extent as reported by the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCharBox {
    #[serde(rename = "char")]
    pub ch: char,
    pub xmin: f32,
    pub xmax: f32,
}

/// One token record as emitted by the vision detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawToken {
    pub text: String,
    /// `[ymin, xmin, ymax, xmax]`.
    pub box_2d: [f32; 4],
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub group: Option<u32>,
    #[serde(default)]
    pub row: Option<u32>,
    #[serde(default)]
    pub col: Option<u32>,
    #[serde(default)]
    pub parent_char: Option<String>,
    #[serde(default)]
    pub font_style: Option<String>,
    #[serde(default)]
    pub baseline_y: Option<f32>,
    #[serde(default)]
    pub char_boxes: Option<Vec<RawCharBox>>,
}

impl RawToken {
    fn coordinates(&self) -> impl Iterator<Item = f32> + '_ {
        self.box_2d
            .iter()
            .copied()
            .chain(self.baseline_y)
            .chain(
                self.char_boxes
                    .iter()
                    .flatten()
                    .flat_map(|cb| [cb.xmin, cb.xmax]),
            )
    }
}

/// A full detector response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorPayload {
    #[serde(default)]
    pub coordinates: CoordinateSpace,
    pub tokens: Vec<RawToken>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PayloadShape {
    Bare(Vec<RawToken>),
    Wrapped(DetectorPayload),
}

impl DetectorPayload {
    /// Parse either a bare token array or a `{coordinates, tokens}` object.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let shape: PayloadShape = serde_json::from_str(data)
            .map_err(|err| DigitSwapError::Payload(format!("unrecognized detector JSON: {err}")))?;
        Ok(match shape {
            PayloadShape::Bare(tokens) => Self {
                coordinates: CoordinateSpace::Auto,
                tokens,
            },
            PayloadShape::Wrapped(payload) => payload,
        })
    }
}

/// A token dropped during conversion.
#[derive(Debug)]
pub struct GeometryDrop {
    pub text: String,
    pub error: DigitSwapError,
}

/// Pick a concrete coordinate space for the payload.
///
/// All values within 0..1 means normalized. Otherwise values bounded by 1000
/// are read as permille when they overshoot the logical image, or when the
/// image itself is larger than 1000 px on an axis; anything else is pixels.
pub fn resolve_space(
    space: CoordinateSpace,
    tokens: &[RawToken],
    logical_width: f32,
    logical_height: f32,
) -> CoordinateSpace {
    if space != CoordinateSpace::Auto {
        return space;
    }
    let mut max = f32::MIN;
    let mut overshoots = false;
    for token in tokens {
        let [ymin, xmin, ymax, xmax] = token.box_2d;
        if xmin.max(xmax) > logical_width || ymin.max(ymax) > logical_height {
            overshoots = true;
        }
        for value in token.coordinates().filter(|v| v.is_finite()) {
            max = max.max(value);
        }
    }
    if max == f32::MIN {
        return CoordinateSpace::Pixels;
    }
    if max <= 1.0 {
        CoordinateSpace::Normalized
    } else if max <= 1000.0 && (overshoots || logical_width > 1000.0 || logical_height > 1000.0) {
        CoordinateSpace::Permille
    } else {
        CoordinateSpace::Pixels
    }
}

fn scale_factors(space: CoordinateSpace, logical_width: f32, logical_height: f32) -> (f32, f32) {
    match space {
        CoordinateSpace::Normalized => (logical_width, logical_height),
        CoordinateSpace::Permille => (logical_width / 1000.0, logical_height / 1000.0),
        CoordinateSpace::Pixels | CoordinateSpace::Auto => (1.0, 1.0),
    }
}

/// Convert one record. `space` must already be resolved.
pub fn convert_token(
    raw: &RawToken,
    space: CoordinateSpace,
    logical_width: f32,
    logical_height: f32,
) -> Result<DetectedToken> {
    if raw.coordinates().any(|v| !v.is_finite()) {
        return Err(DigitSwapError::Geometry(format!(
            "token '{}' has non-finite coordinates",
            raw.text
        )));
    }
    let (sx, sy) = scale_factors(space, logical_width, logical_height);
    let [ymin, xmin, ymax, xmax] = raw.box_2d;
    let bounding_box = BoundingBox::from_corners(xmin * sx, ymin * sy, xmax * sx, ymax * sy);
    if bounding_box.is_degenerate() {
        return Err(DigitSwapError::Geometry(format!(
            "token '{}' has a degenerate box ({} x {})",
            raw.text, bounding_box.width, bounding_box.height
        )));
    }

    let role = raw
        .role
        .as_deref()
        .map(|label| Role::from_label(label, raw.group, raw.row, raw.col))
        .unwrap_or_default();
    let font_style = raw.font_style.as_deref().and_then(|label| {
        let style = FontStyle::from_label(label);
        if style.is_none() {
            debug!(label, "Unknown font style label; using default preset");
        }
        style
    });
    let char_boxes = raw.char_boxes.as_ref().map(|boxes| {
        boxes
            .iter()
            .map(|cb| CharBox {
                ch: cb.ch,
                xmin: cb.xmin * sx,
                xmax: cb.xmax * sx,
            })
            .collect()
    });

    Ok(DetectedToken {
        text: raw.text.trim().to_string(),
        bounding_box,
        baseline_y: raw.baseline_y.map(|y| y * sy),
        font_style,
        role,
        parent_char: raw.parent_char.as_deref().and_then(|s| s.chars().next()),
        char_boxes,
    })
}

/// Convert a whole payload. Records that fail conversion are dropped and
/// returned alongside the good tokens; they are never retried.
pub fn convert_payload(
    payload: &DetectorPayload,
    logical_width: f32,
    logical_height: f32,
) -> (Vec<DetectedToken>, Vec<GeometryDrop>) {
    let space = resolve_space(
        payload.coordinates,
        &payload.tokens,
        logical_width,
        logical_height,
    );
    debug!(?space, count = payload.tokens.len(), "Converting detector tokens");

    let mut tokens = Vec::with_capacity(payload.tokens.len());
    let mut dropped = Vec::new();
    for raw in &payload.tokens {
        match convert_token(raw, space, logical_width, logical_height) {
            Ok(token) => tokens.push(token),
            Err(error) => {
                warn!(text = %raw.text, %error, "Dropping token with invalid geometry");
                dropped.push(GeometryDrop {
                    text: raw.text.clone(),
                    error,
                });
            }
        }
    }
    (tokens, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, box_2d: [f32; 4]) -> RawToken {
        RawToken {
            text: text.into(),
            box_2d,
            role: None,
            group: None,
            row: None,
            col: None,
            parent_char: None,
            font_style: None,
            baseline_y: None,
            char_boxes: None,
        }
    }

    #[test]
    fn normalized_coordinates_keep_subpixel_precision() {
        let token = convert_token(
            &raw("3", [0.1, 0.25, 0.2, 0.2625]),
            CoordinateSpace::Normalized,
            200.0,
            100.0,
        )
        .unwrap();
        let b = token.bounding_box;
        assert!((b.x - 50.0).abs() < 1e-4);
        assert!((b.y - 10.0).abs() < 1e-4);
        assert!((b.width - 2.5).abs() < 1e-4);
        assert!((b.height - 10.0).abs() < 1e-4);
    }

    #[test]
    fn permille_scales_char_boxes_and_baseline() {
        let mut r = raw("12", [100.0, 100.0, 200.0, 300.0]);
        r.baseline_y = Some(190.0);
        r.char_boxes = Some(vec![
            RawCharBox { ch: '1', xmin: 100.0, xmax: 180.0 },
            RawCharBox { ch: '2', xmin: 200.0, xmax: 300.0 },
        ]);
        let token = convert_token(&r, CoordinateSpace::Permille, 500.0, 400.0).unwrap();
        assert!((token.bounding_box.x - 50.0).abs() < 1e-4);
        assert!((token.bounding_box.width - 100.0).abs() < 1e-4);
        assert!((token.baseline_y.unwrap() - 76.0).abs() < 1e-4);
        let boxes = token.aligned_char_boxes().unwrap();
        assert!((boxes[1].xmin - 100.0).abs() < 1e-4);
    }

    #[test]
    fn inverted_box_is_geometry_error() {
        let err = convert_token(
            &raw("4", [10.0, 20.0, 5.0, 30.0]),
            CoordinateSpace::Pixels,
            100.0,
            100.0,
        )
        .unwrap_err();
        assert!(matches!(err, DigitSwapError::Geometry(_)));
    }

    #[test]
    fn auto_detects_each_convention() {
        let unit = vec![raw("1", [0.1, 0.1, 0.2, 0.2])];
        assert_eq!(
            resolve_space(CoordinateSpace::Auto, &unit, 640.0, 480.0),
            CoordinateSpace::Normalized
        );
        let permille = vec![raw("1", [100.0, 700.0, 150.0, 750.0])];
        assert_eq!(
            resolve_space(CoordinateSpace::Auto, &permille, 640.0, 480.0),
            CoordinateSpace::Permille
        );
        let pixels = vec![raw("1", [100.0, 200.0, 120.0, 215.0])];
        assert_eq!(
            resolve_space(CoordinateSpace::Auto, &pixels, 640.0, 480.0),
            CoordinateSpace::Pixels
        );
        let big_pixels = vec![raw("1", [1500.0, 200.0, 1520.0, 215.0])];
        assert_eq!(
            resolve_space(CoordinateSpace::Auto, &big_pixels, 3000.0, 2000.0),
            CoordinateSpace::Pixels
        );
    }

    #[test]
    fn payload_accepts_bare_array_and_drops_bad_tokens() {
        let json = r#"[
            {"text": "7", "box_2d": [10, 10, 30, 25], "role": "superscript", "parent_char": "x"},
            {"text": "8", "box_2d": [10, 40, 10, 50]}
        ]"#;
        let payload = DetectorPayload::from_json_str(json).unwrap();
        let (tokens, dropped) = convert_payload(&payload, 100.0, 100.0);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].role, Role::Superscript);
        assert_eq!(tokens[0].parent_char, Some('x'));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].text, "8");
    }

    #[test]
    fn payload_object_form_with_explicit_space() {
        let json = r#"{"coordinates": "permille",
            "tokens": [{"text": "5", "box_2d": [500, 500, 550, 520], "font_style": "serif"}]}"#;
        let payload = DetectorPayload::from_json_str(json).unwrap();
        assert_eq!(payload.coordinates, CoordinateSpace::Permille);
        let (tokens, _) = convert_payload(&payload, 2000.0, 1000.0);
        assert!((tokens[0].bounding_box.x - 1000.0).abs() < 1e-3);
        assert_eq!(tokens[0].font_style, Some(FontStyle::Serif));
    }

    #[test]
    fn malformed_payload_is_payload_error() {
        let err = DetectorPayload::from_json_str(r#"{"nope": true}"#).unwrap_err();
        assert!(matches!(err, DigitSwapError::Payload(_)));
    }
}
