// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for DigitSwap.

use thiserror::Error;

/// Top-level error type for all DigitSwap operations.
#[derive(Debug, Error)]
pub enum DigitSwapError {
    // -- Per-token errors (recovered locally, never abort a pass) --
    #[error("invalid token geometry: {0}")]
    Geometry(String),

    #[error("could not erase token '{token}': {reason}")]
    ErasureFailure { token: String, reason: String },

    // -- Fatal pass errors --
    #[error("raster surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("no tokens were eligible for replacement")]
    NoEligibleTokens,

    #[error("replacement rejected by verifier after {attempts} attempt(s)")]
    VerificationRejected { attempts: u32 },

    // -- Setup / ambient --
    #[error("font loading failed: {0}")]
    Font(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("detector payload invalid: {0}")]
    Payload(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DigitSwapError {
    /// Whether this error only affects a single token and the pass may continue.
    pub fn is_per_token(&self) -> bool {
        matches!(self, Self::Geometry(_) | Self::ErasureFailure { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DigitSwapError>;
