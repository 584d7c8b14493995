//! Command response type

use crate::error::ErrorCode;
use std::time::Duration;

/// Outcome of one executed command.
///
/// Every call to the correlator resolves to a `Response`; failures are
/// expressed through [`ErrorCode`], never as an `Err` across the caller
/// boundary.
#[derive(Debug, Clone)]
pub struct Response {
    /// Command token the response belongs to
    pub command: String,
    /// Time from send to completion
    pub elapsed: Duration,
    /// Classification of the outcome
    pub error_code: ErrorCode,
    /// Comma-separated fields of the correlated reply line, including the
    /// leading command (or `ER`) token. Empty when no reply was received.
    pub fields: Vec<String>,
}

impl Response {
    /// Build a response that never reached the wire or received no reply
    pub fn failed(command: impl Into<String>, error_code: ErrorCode) -> Self {
        Self {
            command: command.into(),
            elapsed: Duration::ZERO,
            error_code,
            fields: Vec::new(),
        }
    }

    /// Check if the command succeeded
    pub fn is_success(&self) -> bool {
        self.error_code.is_success()
    }

    /// Field at `index`, if present
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Field at `index` parsed as `T`
    ///
    /// Returns `None` when the field is absent or does not parse, which
    /// callers classify as [`ErrorCode::Unknown`].
    pub fn parse_field<T: std::str::FromStr>(&self, index: usize) -> Option<T> {
        self.field(index)?.parse().ok()
    }
}
