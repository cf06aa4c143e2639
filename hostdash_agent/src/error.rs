//! Error taxonomy shared by every collector.
//!
//! Collectors never propagate these past the facade: a failure becomes an
//! omitted field, an empty list, or an `{"error": ...}` body for that one
//! metric domain.

use serde_json::{json, Value};
use std::io;
use thiserror::Error;

pub type MetricResult<T> = Result<T, MetricError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("{0}")]
    Unavailable(String),

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{program} exited with status {code}")]
    NonZeroExit { program: String, code: i32 },

    #[error("cannot parse {0}")]
    ParseFailure(String),

    #[error("io error: {0}")]
    Io(String),
}

impl MetricError {
    /// Map an io error for `what` (a path or program name) onto the taxonomy.
    pub fn from_io(what: &str, e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => MetricError::NotFound(what.to_string()),
            io::ErrorKind::PermissionDenied => MetricError::PermissionDenied(what.to_string()),
            _ => MetricError::Io(format!("{what}: {e}")),
        }
    }

    /// JSON body served in place of a record.
    pub fn to_body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// Serialize a collector result: the record itself, or `{"error": "..."}`.
pub fn to_json<T: serde::Serialize>(result: &MetricResult<T>) -> Value {
    match result {
        Ok(v) => serde_json::to_value(v).unwrap_or_else(|e| {
            MetricError::ParseFailure(format!("record serialization: {e}")).to_body()
        }),
        Err(e) => e.to_body(),
    }
}
