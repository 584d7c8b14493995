use thiserror::Error;

/// Main error type for cvx operations
#[derive(Error, Debug)]
pub enum CvxError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    #[error("No target configured: {0}")]
    NotConfigured(String),
}

/// Result type alias for cvx operations
pub type CvxResult<T> = Result<T, CvxError>;

/// Classification of a completed command.
///
/// The non-negative variants are the numeric codes the controller reports
/// in the third field of an `ER` reply; their values are fixed by the
/// device documentation and must be preserved for wire compatibility.
/// The remaining variants are produced by the client itself and never
/// appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Command accepted and executed.
    Success,
    /// Wire code 2: no such command exists.
    UnrecognizedCommand,
    /// Wire code 3: the command cannot run in the current device state.
    CommandNotExecutable,
    /// Wire code 22: an argument value or count is out of range.
    ArgumentOutOfRange,
    /// Wire code 97: the device reported an internal timeout.
    DeviceTimeout,

    /// The device replied with `ER` but the sub-code was missing or
    /// not parseable as an integer.
    ErrorReply,
    /// No connection could be obtained for the command.
    NoConnection,
    /// A local I/O failure occurred while sending or awaiting.
    Exception,
    /// The single in-flight admission slot could not be acquired.
    CommandBusy,
    /// No correlated reply arrived within the command timeout.
    CommandTimeout,
    /// A success reply arrived but its expected fields were missing
    /// or unparsable, or the wire code is outside the documented set.
    Unknown,
}

impl ErrorCode {
    /// Map a numeric sub-code from an `ER` reply to a classification.
    ///
    /// Codes outside the documented set map to [`ErrorCode::Unknown`]
    /// rather than an undefined value.
    pub fn from_wire(code: i32) -> Self {
        match code {
            0 => ErrorCode::Success,
            2 => ErrorCode::UnrecognizedCommand,
            3 => ErrorCode::CommandNotExecutable,
            22 => ErrorCode::ArgumentOutOfRange,
            97 => ErrorCode::DeviceTimeout,
            _ => ErrorCode::Unknown,
        }
    }

    /// Check if this classification is a success
    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_documented_codes() {
        assert_eq!(ErrorCode::from_wire(0), ErrorCode::Success);
        assert_eq!(ErrorCode::from_wire(2), ErrorCode::UnrecognizedCommand);
        assert_eq!(ErrorCode::from_wire(3), ErrorCode::CommandNotExecutable);
        assert_eq!(ErrorCode::from_wire(22), ErrorCode::ArgumentOutOfRange);
        assert_eq!(ErrorCode::from_wire(97), ErrorCode::DeviceTimeout);
    }

    #[test]
    fn test_from_wire_unknown_codes() {
        assert_eq!(ErrorCode::from_wire(1), ErrorCode::Unknown);
        assert_eq!(ErrorCode::from_wire(23), ErrorCode::Unknown);
        assert_eq!(ErrorCode::from_wire(-1), ErrorCode::Unknown);
        assert_eq!(ErrorCode::from_wire(9999), ErrorCode::Unknown);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::CommandTimeout.is_success());
    }
}
