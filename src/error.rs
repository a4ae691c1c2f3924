//! Error type shared by every fallible adapter operation.

use crate::status::Status;

pub type Result<T> = std::result::Result<T, Error>;

/// Logical failure categories.
///
/// Vendor status codes are many; callers usually only care which of these
/// buckets a failure falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Allocation,
    InvalidArgument,
    InvalidHandle,
    UnsupportedType,
    InsufficientWorkArea,
    InvalidState,
    Internal,
    Config,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A vendor call returned something other than success.
    #[error("{operation} failed: {status}")]
    Vendor {
        operation: &'static str,
        status: Status,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported transform type: {0}")]
    UnsupportedType(String),

    #[error("work area too small: {provided} bytes provided, {required} bytes required")]
    InsufficientWorkArea { required: usize, provided: usize },

    #[error("plan is {state}, operation requires a plan that is {required}")]
    InvalidState {
        state: &'static str,
        required: &'static str,
    },

    #[error("config error: {0}")]
    Config(String),

    #[cfg(feature = "telemetry")]
    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn vendor(operation: &'static str, status: Status) -> Self {
        Error::Vendor { operation, status }
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn unsupported_type<S: Into<String>>(msg: S) -> Self {
        Error::UnsupportedType(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    #[cfg(feature = "telemetry")]
    pub fn telemetry<S: Into<String>>(msg: S) -> Self {
        Error::Telemetry(msg.into())
    }

    /// The vendor status behind this error, if it came from the library.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Vendor { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Vendor { status, .. } => status.kind(),
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Error::InsufficientWorkArea { .. } => ErrorKind::InsufficientWorkArea,
            Error::InvalidState { .. } => ErrorKind::InvalidState,
            Error::Config(_) => ErrorKind::Config,
            #[cfg(feature = "telemetry")]
            Error::Telemetry(_) => ErrorKind::Io,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}
