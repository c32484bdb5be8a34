// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the DigitSwap replacement engine.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in logical (CSS-space) pixels.
///
/// Coordinates keep sub-pixel precision; rounding happens only when pixels
/// are written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from its corner coordinates.
    pub fn from_corners(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            x: xmin,
            y: ymin,
            width: xmax - xmin,
            height: ymax - ymin,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// True when either side is non-positive or any field is not finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Grow the box by `pad` on every side.
    pub fn expand(&self, pad: f32) -> Self {
        Self {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + pad * 2.0,
            height: self.height + pad * 2.0,
        }
    }

    /// Whether the vertical spans of two boxes intersect.
    pub fn overlaps_vertically(&self, other: &BoundingBox) -> bool {
        self.y < other.bottom() && other.y < self.bottom()
    }
}

/// Large operators whose limits are typeset above and below the symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigOperator {
    Sum,
    Product,
    Integral,
    Limit,
}

/// Which bound of a big operator a token sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundPosition {
    Upper,
    Lower,
}

/// Structural position of a token within a mathematical expression.
///
/// Multi-part constructs carry the group they belong to so that coordinated
/// edits can be planned by a caller; the engine itself never edits them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    #[default]
    Base,
    Superscript,
    Subscript,
    FractionNumerator { group: Option<u32> },
    FractionDenominator { group: Option<u32> },
    OperatorBound {
        operator: BigOperator,
        position: BoundPosition,
    },
    RootContent { group: Option<u32> },
    RootIndex { group: Option<u32> },
    MatrixElement { row: Option<u32>, col: Option<u32> },
    /// A label the detector produced that is not part of the vocabulary.
    Unrecognized { label: String },
}

impl Role {
    /// Parse a detector role label. Unknown labels are kept as
    /// [`Role::Unrecognized`] rather than rejected.
    pub fn from_label(
        label: &str,
        group: Option<u32>,
        row: Option<u32>,
        col: Option<u32>,
    ) -> Self {
        let normalized = label.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let bound = |operator, position| Self::OperatorBound { operator, position };
        match normalized.as_str() {
            "" | "base" | "normal" | "inline" => Self::Base,
            "superscript" | "sup" | "exponent" => Self::Superscript,
            "subscript" | "sub" => Self::Subscript,
            "fraction_numerator" | "numerator" => Self::FractionNumerator { group },
            "fraction_denominator" | "denominator" => Self::FractionDenominator { group },
            "sum_upper" => bound(BigOperator::Sum, BoundPosition::Upper),
            "sum_lower" => bound(BigOperator::Sum, BoundPosition::Lower),
            "product_upper" => bound(BigOperator::Product, BoundPosition::Upper),
            "product_lower" => bound(BigOperator::Product, BoundPosition::Lower),
            "integral_upper" => bound(BigOperator::Integral, BoundPosition::Upper),
            "integral_lower" => bound(BigOperator::Integral, BoundPosition::Lower),
            "limit_lower" | "limit" => bound(BigOperator::Limit, BoundPosition::Lower),
            "root_content" | "radicand" => Self::RootContent { group },
            "root_index" => Self::RootIndex { group },
            "matrix_element" | "matrix" => Self::MatrixElement { row, col },
            _ => Self::Unrecognized {
                label: label.to_string(),
            },
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Self::Superscript | Self::Subscript)
    }

    /// Roles that need coordinated multi-token edits.
    pub fn is_complex(&self) -> bool {
        match self {
            Self::Base | Self::Superscript | Self::Subscript => false,
            Self::FractionNumerator { .. }
            | Self::FractionDenominator { .. }
            | Self::OperatorBound { .. }
            | Self::RootContent { .. }
            | Self::RootIndex { .. }
            | Self::MatrixElement { .. }
            | Self::Unrecognized { .. } => true,
        }
    }
}

/// Print-style families a detector can report for a token.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    Serif,
    /// Assumed when the detector reports no style.
    #[default]
    SansSerif,
    Monospace,
    Handwritten,
    Math,
}

impl FontStyle {
    pub const ALL: [FontStyle; 5] = [
        Self::Serif,
        Self::SansSerif,
        Self::Monospace,
        Self::Handwritten,
        Self::Math,
    ];

    /// Lenient parse of a detector style label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_")
            .as_str()
        {
            "serif" | "times" | "printed_serif" => Some(Self::Serif),
            "sans_serif" | "sans" | "sansserif" | "arial" | "helvetica" => Some(Self::SansSerif),
            "monospace" | "mono" | "typewriter" => Some(Self::Monospace),
            "handwritten" | "handwriting" | "script" | "cursive" => Some(Self::Handwritten),
            "math" | "latex" | "computer_modern" => Some(Self::Math),
            _ => None,
        }
    }
}

/// Horizontal extent of one character inside a multi-digit token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharBox {
    #[serde(rename = "char")]
    pub ch: char,
    pub xmin: f32,
    pub xmax: f32,
}

impl CharBox {
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }
}

/// One numeric string observed in the source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedToken {
    pub text: String,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub baseline_y: Option<f32>,
    #[serde(default)]
    pub font_style: Option<FontStyle>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parent_char: Option<char>,
    #[serde(default)]
    pub char_boxes: Option<Vec<CharBox>>,
}

impl DetectedToken {
    /// A base-role token with no optional metadata.
    pub fn new(text: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            baseline_y: None,
            font_style: None,
            role: Role::Base,
            parent_char: None,
            char_boxes: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_char_boxes(mut self, boxes: Vec<CharBox>) -> Self {
        self.char_boxes = Some(boxes);
        self
    }

    pub fn with_baseline(mut self, baseline_y: f32) -> Self {
        self.baseline_y = Some(baseline_y);
        self
    }

    pub fn with_font_style(mut self, style: FontStyle) -> Self {
        self.font_style = Some(style);
        self
    }

    /// Character boxes, only when there is exactly one per character of `text`.
    pub fn aligned_char_boxes(&self) -> Option<&[CharBox]> {
        self.char_boxes
            .as_deref()
            .filter(|boxes| !boxes.is_empty() && boxes.len() == self.text.chars().count())
    }
}

/// Which ink-removal strategy produced the visible erase for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraseKind {
    /// Seeded flood-fill over connected ink, dilated by one ring.
    Blob,
    /// Padded rectangle filled with the background estimate.
    Rectangle,
}

/// Derived, per accepted token, for the duration of one erase+draw pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementPlan {
    pub original: String,
    pub replacement: String,
    pub render_box: BoundingBox,
    pub render_baseline_y: f32,
    pub font_size: f32,
    pub erase: EraseKind,
}

// -- Tests --------------------------------------------------------------------
