use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::TreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerErrorKind {
    InvalidRequest,
    Timeout,
    Detached,
    Serialization,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerError {
    pub kind: TrackerErrorKind,
    pub message: String,
}

impl TrackerError {
    pub fn new(kind: TrackerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TrackerError {}

impl From<TreeError> for TrackerError {
    fn from(err: TreeError) -> Self {
        invalid_request(err.to_string())
    }
}

pub fn invalid_request(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::InvalidRequest, message)
}

pub fn timeout(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::Timeout, message)
}

pub fn detached(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::Detached, message)
}

pub fn serialization(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::Serialization, message)
}

pub fn internal_error(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::Internal, message)
}
