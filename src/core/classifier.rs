use crate::constants::*;
use crate::errors::Error;

/// A known vendor failure: every needle must occur in the raw error text
#[derive(Debug, Clone, Copy)]
pub struct FailurePattern {
    pub needles: &'static [&'static str],
    pub message: &'static str,
}

/// Checked in order; the first matching entry wins
pub const FAILURE_PATTERNS: &[FailurePattern] = &[
    FailurePattern {
        needles: &[
            VALIDATION_EXCEPTION,
            "The provided image must have dimensions in set [1280x720]",
        ],
        message: IMAGE_DIMENSIONS_MESSAGE,
    },
    FailurePattern {
        needles: &[
            VALIDATION_EXCEPTION,
            "The width of the provided image must be within range [320, 4096]",
        ],
        message: IMAGE_WIDTH_MESSAGE,
    },
    FailurePattern {
        needles: &[
            ACCESS_DENIED_EXCEPTION,
            "You don't have access to the model with the specified model ID",
        ],
        message: MODEL_NOT_ENABLED_MESSAGE,
    },
];

/// Message safe to show to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    Specific(&'static str),
    Generic,
}

impl UserMessage {
    pub fn text(&self) -> &'static str {
        match self {
            UserMessage::Specific(message) => *message,
            UserMessage::Generic => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// True when the raw error was not recognised and must be logged server-side
    pub fn is_generic(&self) -> bool {
        matches!(self, UserMessage::Generic)
    }
}

/// Maps a raw backend error to a client-safe message
///
/// The raw text may embed infrastructure details and never leaves this function.
pub fn classify(raw_error: &str) -> UserMessage {
    FAILURE_PATTERNS
        .iter()
        .find(|pattern| pattern.needles.iter().all(|n| raw_error.contains(n)))
        .map(|pattern| UserMessage::Specific(pattern.message))
        .unwrap_or(UserMessage::Generic)
}

/// Client-facing text for an error
///
/// Request errors keep their own text; anything raised by a backend goes through `classify`.
pub fn client_message(error: &Error) -> String {
    match error {
        Error::Validation(_)
        | Error::NotFound(_)
        | Error::NotReady(_)
        | Error::UnsupportedEngine(_) => error.to_string(),
        other => classify(&other.to_string()).text().to_string(),
    }
}
