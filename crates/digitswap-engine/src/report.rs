// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outcome of one replacement pass.

use std::collections::BTreeMap;

use digitswap_core::ReplacementPlan;
use digitswap_core::error::{DigitSwapError, Result};
use serde::Serialize;

use crate::safety::SkippedToken;

/// A token that was eligible but could not be replaced.
#[derive(Debug, Clone, Serialize)]
pub struct TokenFailure {
    pub text: String,
    pub error: String,
}

/// Everything a pass did and declined to do.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplacementReport {
    /// `original → replacement`. When the same original appears more than
    /// once, the last replacement wins; `plans` has every occurrence.
    pub replacements: BTreeMap<String, String>,
    pub plans: Vec<ReplacementPlan>,
    pub skipped: Vec<SkippedToken>,
    /// Tokens dropped for unusable geometry, before classification.
    pub dropped: Vec<TokenFailure>,
    /// Safe tokens whose ink could not be removed.
    pub failures: Vec<TokenFailure>,
}

impl ReplacementReport {
    pub fn replaced_count(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// `NoEligibleTokens` when nothing was replaced.
    pub fn require_any(self) -> Result<Self> {
        if self.is_empty() {
            return Err(DigitSwapError::NoEligibleTokens);
        }
        Ok(self)
    }

    pub(crate) fn record(&mut self, plan: ReplacementPlan) {
        self.replacements
            .insert(plan.original.clone(), plan.replacement.clone());
        self.plans.push(plan);
    }
}
