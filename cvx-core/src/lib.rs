//! Core types and utilities for the CV-series vision controller protocol
//!
//! This crate provides the protocol-level building blocks shared by the
//! transport and client crates: error handling, response classification,
//! and line framing. It performs no I/O.

pub mod error;
pub mod line;
pub mod response;

pub use error::{CvxError, CvxResult, ErrorCode};
pub use line::LineSplitter;
pub use response::Response;

/// First field of a failure reply.
pub const ERROR_TOKEN: &str = "ER";

/// Field separator within a protocol line.
pub const FIELD_SEPARATOR: char = ',';

/// Terminator appended to every outgoing command line.
pub const COMMAND_TERMINATOR: char = '\r';

/// Leading character of out-of-band telemetry lines.
///
/// Lines starting with this marker carry structured result data pushed by
/// the controller and are never candidates for command correlation.
pub const TELEMETRY_MARKER: char = '{';
