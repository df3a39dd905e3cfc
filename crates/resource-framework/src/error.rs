//! # Resource Errors
//!
//! Every failure the controller can observe is folded into [`ResourceError`]. The variants
//! follow the failure taxonomy callers branch on: transport failures (nothing reached the
//! backend), status failures (the backend answered with an error), validation failures
//! (field errors aggregated into one message) and caller-side refusals that never touch
//! the network.
//!
//! A partially failed import is deliberately *not* an error; see
//! [`ImportOutcome`](crate::client::ImportOutcome).

use crate::review::{ReviewStatus, ReviewStep};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors surfaced by resource clients and controllers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    /// No response reached us (connection refused, DNS, timeout).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Request failed ({status}): {message}")]
    Status { status: u16, message: String },

    /// The backend rejected the payload field by field (422).
    #[error("Validation failed: {}", join_field_errors(.errors))]
    Validation { errors: Vec<FieldError> },

    /// The session could not be refreshed; the session has been logged out.
    #[error("Session expired")]
    Unauthorized,

    /// The backend answered but the body did not match the expected envelope.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Refused before any request was issued.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller's role does not grant the requested capability.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Illegal transition: cannot {step} an item that is {from}")]
    IllegalTransition { from: ReviewStatus, step: ReviewStep },

    /// Saving a downloaded file failed.
    #[error("File error: {0}")]
    Io(String),
}

/// One rejected field from a validation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldErrorRepr")]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldErrorRepr {
    Message(String),
    Detailed {
        #[serde(default, alias = "path", alias = "param")]
        field: Option<String>,
        #[serde(alias = "msg")]
        message: String,
    },
}

impl From<FieldErrorRepr> for FieldError {
    fn from(repr: FieldErrorRepr) -> Self {
        match repr {
            FieldErrorRepr::Message(message) => Self {
                field: None,
                message,
            },
            FieldErrorRepr::Detailed { field, message } => Self { field, message },
        }
    }
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Default message for a status code when the body carries none.
pub fn status_message(status: u16) -> String {
    match status {
        400 => "Bad request".to_string(),
        401 => "Not signed in".to_string(),
        403 => "You do not have permission to perform this action".to_string(),
        404 => "The requested resource was not found".to_string(),
        409 => "The request conflicts with the current state of the resource".to_string(),
        422 => "Validation failed".to_string(),
        429 => "Too many requests, please try again later".to_string(),
        500..=599 => "Server error, please try again later".to_string(),
        other => format!("Request failed with status {other}"),
    }
}

impl ResourceError {
    /// Human-readable text for notifications.
    pub fn user_message(&self) -> String {
        match self {
            ResourceError::Transport(_) => "Network error, please check your connection".into(),
            ResourceError::Status { message, .. } => message.clone(),
            ResourceError::Validation { errors } if errors.is_empty() => status_message(422),
            ResourceError::Validation { errors } => join_field_errors(errors),
            ResourceError::Unauthorized => "Your session has expired, please sign in again".into(),
            other => other.to_string(),
        }
    }

    /// HTTP status for failures that came back from the backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            ResourceError::Status { status, .. } => Some(*status),
            ResourceError::Validation { .. } => Some(422),
            ResourceError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ResourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ResourceError::Decode(e.to_string())
        } else {
            ResourceError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(e: serde_json::Error) -> Self {
        ResourceError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for ResourceError {
    fn from(e: std::io::Error) -> Self {
        ResourceError::Io(e.to_string())
    }
}

/// Result type for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;
