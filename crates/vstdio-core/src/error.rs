//! Error taxonomy for virtual streams and the format renderer.
//!
//! Every condition here is local and recoverable: it is handed back to the
//! immediate caller, which decides whether it is fatal. Short reads and
//! short writes are not errors; they are signalled through returned counts.

use core::fmt;

use thiserror::Error;

use crate::stdio::{Access, Whence};

/// Errno values reported by [`StdioError::errno`].
pub const ENOENT: i32 = 2;
pub const EBADF: i32 = 9;
pub const EINVAL: i32 = 22;

/// Transfer direction of a rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Why a directive could not be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveFault {
    /// The template ended inside a conversion.
    Unterminated,
    /// The directive needs an argument but the sequence is exhausted.
    MissingArgument,
    /// The argument variant cannot satisfy the conversion (e.g. `%s` given an integer).
    ArgumentMismatch,
}

impl fmt::Display for DirectiveFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unterminated => "unterminated conversion",
            Self::MissingArgument => "missing argument",
            Self::ArgumentMismatch => "argument does not match conversion",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StdioError {
    #[error("no stream named {name:?}")]
    NotFound { name: String },
    #[error("unrecognized open mode {mode:?}")]
    InvalidMode { mode: String },
    #[error("stream handle is closed")]
    Closed,
    #[error("{op} is not permitted on a {access} handle")]
    ModeViolation { access: Access, op: Direction },
    #[error("seek {offset} from {origin} lands outside [0, {length}]")]
    OutOfBounds {
        origin: Whence,
        offset: i64,
        length: usize,
    },
    #[error("malformed directive at byte {offset}: {fault}")]
    MalformedDirective { offset: usize, fault: DirectiveFault },
}

pub type Result<T, E = StdioError> = core::result::Result<T, E>;

impl StdioError {
    /// Classic errno value for this condition.
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::NotFound { .. } => ENOENT,
            Self::Closed | Self::ModeViolation { .. } => EBADF,
            Self::InvalidMode { .. }
            | Self::OutOfBounds { .. }
            | Self::MalformedDirective { .. } => EINVAL,
        }
    }

    /// Short stable name, used in logs and fixtures.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::InvalidMode { .. } => "InvalidMode",
            Self::Closed => "Closed",
            Self::ModeViolation { .. } => "ModeViolation",
            Self::OutOfBounds { .. } => "OutOfBounds",
            Self::MalformedDirective { .. } => "MalformedDirective",
        }
    }
}

impl From<StdioError> for std::io::Error {
    fn from(err: StdioError) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            StdioError::NotFound { .. } => ErrorKind::NotFound,
            StdioError::InvalidMode { .. } | StdioError::OutOfBounds { .. } => {
                ErrorKind::InvalidInput
            }
            StdioError::Closed => ErrorKind::BrokenPipe,
            StdioError::ModeViolation { .. } => ErrorKind::PermissionDenied,
            StdioError::MalformedDirective { .. } => ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, err)
    }
}
