use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateErrorKind {
    InvalidConfiguration,
    InvalidRating,
    RatingUnavailable,
    InteractionLogUnavailable,
    DuplicateRecord,
    PostFailed,
    Internal,
}

impl GateErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "invalid_configuration",
            Self::InvalidRating => "invalid_rating",
            Self::RatingUnavailable => "rating_unavailable",
            Self::InteractionLogUnavailable => "interaction_log_unavailable",
            Self::DuplicateRecord => "duplicate_record",
            Self::PostFailed => "post_failed",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateError {
    pub kind: GateErrorKind,
    pub message: String,
}

impl GateError {
    pub fn new(kind: GateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GateError {}

pub fn invalid_configuration(message: impl Into<String>) -> GateError {
    GateError::new(GateErrorKind::InvalidConfiguration, message)
}

pub fn invalid_rating(message: impl Into<String>) -> GateError {
    GateError::new(GateErrorKind::InvalidRating, message)
}

pub fn rating_unavailable(message: impl Into<String>) -> GateError {
    GateError::new(GateErrorKind::RatingUnavailable, message)
}

pub fn interaction_log_unavailable(message: impl Into<String>) -> GateError {
    GateError::new(GateErrorKind::InteractionLogUnavailable, message)
}

pub fn duplicate_record(message: impl Into<String>) -> GateError {
    GateError::new(GateErrorKind::DuplicateRecord, message)
}

pub fn post_failed(message: impl Into<String>) -> GateError {
    GateError::new(GateErrorKind::PostFailed, message)
}

pub fn internal_error(message: impl Into<String>) -> GateError {
    GateError::new(GateErrorKind::Internal, message)
}
