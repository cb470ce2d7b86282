//! Submission errors

use thiserror::Error;

use crate::event::EventKind;

/// Why a record was not accepted, either locally or by the events API
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("{kind}: profile email is required")]
    MissingEmail { kind: EventKind },

    #[error("{kind}: missing required properties: {}", keys.join(", "))]
    MissingProperties { kind: EventKind, keys: Vec<String> },

    #[error("{kind}: unknown properties: {}", keys.join(", "))]
    UnknownProperties { kind: EventKind, keys: Vec<String> },

    #[error("{kind}: event does not carry a monetary value")]
    UnexpectedValue { kind: EventKind },

    #[error("{kind}: value_currency given without value")]
    CurrencyWithoutValue { kind: EventKind },

    #[error("{kind}: invalid currency code '{code}' (expected three uppercase letters)")]
    InvalidCurrency { kind: EventKind, code: String },

    #[error("{kind}: value must be a finite number")]
    InvalidValue { kind: EventKind },

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("events API rejected the event (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

impl SubmissionError {
    /// True when the record was refused before any call was made
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            SubmissionError::Serialize(_) | SubmissionError::Transport(_) | SubmissionError::Rejected { .. }
        )
    }
}

impl From<ureq::Error> for SubmissionError {
    fn from(e: ureq::Error) -> Self {
        SubmissionError::Transport(e.to_string())
    }
}
