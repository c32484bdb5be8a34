// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Replacement value generator. Produces a new digit string for a token that
// never equals the original.

use std::collections::HashSet;

use digitswap_core::ReplacementPolicy;
use rand::Rng;

/// Attempts the digit-wise policy makes to also dodge already-used values.
const DIGIT_WISE_ATTEMPTS: u32 = 8;

/// Generate a replacement for `original` under `policy`.
///
/// Returns `None` only when `original` has no digit to change. The result
/// always differs from `original`; avoiding `used` is best-effort.
pub fn generate<R: Rng>(
    policy: ReplacementPolicy,
    original: &str,
    used: &HashSet<String>,
    unique_attempts: u32,
    rng: &mut R,
) -> Option<String> {
    match policy {
        ReplacementPolicy::DigitWise => digit_wise(original, used, rng),
        ReplacementPolicy::Unique => unique_value(original, used, unique_attempts, rng),
    }
}

/// Every digit position gets a different random digit; non-digits are kept.
/// Multi-digit numbers never gain a leading zero.
pub fn digit_wise<R: Rng>(
    original: &str,
    used: &HashSet<String>,
    rng: &mut R,
) -> Option<String> {
    if !original.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let multi_digit = original.chars().filter(|c| c.is_ascii_digit()).count() > 1;

    let mut candidate = String::new();
    for _ in 0..DIGIT_WISE_ATTEMPTS {
        candidate = original
            .chars()
            .enumerate()
            .map(|(pos, ch)| match ch.to_digit(10) {
                Some(digit) => pick_other_digit(digit, pos == 0 && multi_digit, rng),
                None => ch,
            })
            .collect();
        if !used.contains(&candidate) {
            break;
        }
    }
    Some(candidate)
}

fn pick_other_digit<R: Rng>(original: u32, leading: bool, rng: &mut R) -> char {
    let lowest = if leading { 1 } else { 0 };
    let choices: Vec<u32> = (lowest..=9).filter(|d| *d != original).collect();
    let digit = choices[rng.gen_range(0..choices.len())];
    char::from_digit(digit, 10).unwrap_or('1')
}

/// A same-length integer different from the original value and from every
/// used replacement, tried up to `attempts` times before falling back to the
/// digit-wise policy.
pub fn unique_value<R: Rng>(
    original: &str,
    used: &HashSet<String>,
    attempts: u32,
    rng: &mut R,
) -> Option<String> {
    let len = original.len();
    let all_digits = !original.is_empty() && original.chars().all(|c| c.is_ascii_digit());
    // Longer strings than u64 can hold go through the digit-wise path.
    if !all_digits || len > 18 {
        return digit_wise(original, used, rng);
    }
    let value: u64 = original.parse().ok()?;
    let low = if len == 1 { 0 } else { 10u64.pow(len as u32 - 1) };
    let high = 10u64.pow(len as u32) - 1;

    for _ in 0..attempts {
        let drawn = rng.gen_range(low..=high);
        let candidate = format!("{drawn:0len$}");
        if drawn != value && candidate != original && !used.contains(&candidate) {
            return Some(candidate);
        }
    }
    digit_wise(original, used, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn digit_wise_changes_every_position_and_keeps_length() {
        let mut rng = rng();
        let used = HashSet::new();
        for original in ["0", "5", "9", "10", "23", "99", "07"] {
            for _ in 0..200 {
                let out = digit_wise(original, &used, &mut rng).unwrap();
                assert_eq!(out.len(), original.len());
                assert_ne!(out, original);
                for (a, b) in original.chars().zip(out.chars()) {
                    assert_ne!(a, b, "{original} -> {out}");
                }
                if original.len() > 1 {
                    assert!(!out.starts_with('0'), "{original} -> {out}");
                }
            }
        }
    }

    #[test]
    fn digit_wise_covers_all_other_digits() {
        let mut rng = rng();
        let used = HashSet::new();
        let seen: HashSet<String> = (0..500)
            .map(|_| digit_wise("4", &used, &mut rng).unwrap())
            .collect();
        assert_eq!(seen.len(), 9);
        assert!(!seen.contains("4"));
    }

    #[test]
    fn unique_avoids_used_values() {
        let mut rng = rng();
        let mut used = HashSet::new();
        for _ in 0..50 {
            let out = unique_value("42", &used, 50, &mut rng).unwrap();
            assert_eq!(out.len(), 2);
            assert_ne!(out, "42");
            assert!(used.insert(out), "collision");
        }
    }

    #[test]
    fn unique_falls_back_when_space_is_exhausted() {
        let mut rng = rng();
        // Every single-digit value except the original is taken.
        let used: HashSet<String> = (0..10).filter(|d| *d != 3).map(|d| d.to_string()).collect();
        let out = unique_value("3", &used, 5, &mut rng).unwrap();
        assert_ne!(out, "3");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn non_numeric_input_has_no_replacement() {
        let mut rng = rng();
        assert_eq!(
            generate(ReplacementPolicy::DigitWise, "x", &HashSet::new(), 10, &mut rng),
            None
        );
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let used = HashSet::new();
        let a = generate(ReplacementPolicy::Unique, "57", &used, 10, &mut rng());
        let b = generate(ReplacementPolicy::Unique, "57", &used, 10, &mut rng());
        assert_eq!(a, b);
    }
}
