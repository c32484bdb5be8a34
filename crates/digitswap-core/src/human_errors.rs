// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people photographing worksheets.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a host application presents it.

use crate::error::DigitSwapError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again (fresh replacement values) may well succeed.
    Transient,
    /// The user must do something, usually take a different photo.
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the host may retry automatically.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `DigitSwapError` into a `HumanError`.
pub fn humanize_error(err: &DigitSwapError) -> HumanError {
    match err {
        DigitSwapError::NoEligibleTokens => HumanError {
            message: "We couldn't find any numbers we could safely change.".into(),
            suggestion: "Try a different photo, ideally a flat, well-lit page with printed numbers.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DigitSwapError::VerificationRejected { attempts } => HumanError {
            message: "We couldn't make a version of this worksheet that still works.".into(),
            suggestion: format!(
                "We tried {attempts} time(s). Try again, or use a different worksheet."
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        DigitSwapError::Geometry(_) | DigitSwapError::ErasureFailure { .. } => HumanError {
            message: "Some numbers on the page couldn't be changed.".into(),
            suggestion: "The rest of the page was updated. A sharper photo usually helps.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DigitSwapError::SurfaceUnavailable(_) | DigitSwapError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        DigitSwapError::Payload(_) => HumanError {
            message: "The number detection result couldn't be read.".into(),
            suggestion: "Try scanning the worksheet again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DigitSwapError::Font(_) => HumanError {
            message: "No suitable font is installed for redrawing numbers.".into(),
            suggestion: "Install a standard font such as DejaVu Sans, or point the app at a font file.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DigitSwapError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try copying the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        DigitSwapError::Serialization(_) => HumanError {
            message: "A settings or detection file is not valid JSON.".into(),
            suggestion: "Check the file contents and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_eligible_tokens_asks_for_new_photo() {
        let human = humanize_error(&DigitSwapError::NoEligibleTokens);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
        assert!(human.suggestion.contains("different photo"));
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = DigitSwapError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn verifier_exhaustion_mentions_attempts() {
        let human = humanize_error(&DigitSwapError::VerificationRejected { attempts: 3 });
        assert!(human.suggestion.contains('3'));
        assert!(human.retriable);
    }
}
