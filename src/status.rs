//! Vendor status codes and their diagnostic text.

use std::fmt;

use crate::error::ErrorKind;

/// Result code returned by every hipFFT entry point.
///
/// Codes outside the documented range are kept as [`Status::Unknown`] instead
/// of being folded into a neighbouring variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidPlan,
    AllocFailed,
    InvalidType,
    InvalidValue,
    InternalError,
    ExecFailed,
    SetupFailed,
    InvalidSize,
    UnalignedData,
    IncompleteParameterList,
    InvalidDevice,
    ParseError,
    NoWorkspace,
    NotImplemented,
    NotSupported,
    Unknown(i32),
}

impl Status {
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => Status::Success,
            1 => Status::InvalidPlan,
            2 => Status::AllocFailed,
            3 => Status::InvalidType,
            4 => Status::InvalidValue,
            5 => Status::InternalError,
            6 => Status::ExecFailed,
            7 => Status::SetupFailed,
            8 => Status::InvalidSize,
            9 => Status::UnalignedData,
            10 => Status::IncompleteParameterList,
            11 => Status::InvalidDevice,
            12 => Status::ParseError,
            13 => Status::NoWorkspace,
            14 => Status::NotImplemented,
            16 => Status::NotSupported,
            other => Status::Unknown(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::InvalidPlan => 1,
            Status::AllocFailed => 2,
            Status::InvalidType => 3,
            Status::InvalidValue => 4,
            Status::InternalError => 5,
            Status::ExecFailed => 6,
            Status::SetupFailed => 7,
            Status::InvalidSize => 8,
            Status::UnalignedData => 9,
            Status::IncompleteParameterList => 10,
            Status::InvalidDevice => 11,
            Status::ParseError => 12,
            Status::NoWorkspace => 13,
            Status::NotImplemented => 14,
            Status::NotSupported => 16,
            Status::Unknown(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// `Ok(())` for success, the status itself otherwise.
    pub fn check(self) -> std::result::Result<(), Status> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Enumerator name as spelled in `hipfft.h`.
    pub fn name(self) -> &'static str {
        match self {
            Status::Success => "HIPFFT_SUCCESS",
            Status::InvalidPlan => "HIPFFT_INVALID_PLAN",
            Status::AllocFailed => "HIPFFT_ALLOC_FAILED",
            Status::InvalidType => "HIPFFT_INVALID_TYPE",
            Status::InvalidValue => "HIPFFT_INVALID_VALUE",
            Status::InternalError => "HIPFFT_INTERNAL_ERROR",
            Status::ExecFailed => "HIPFFT_EXEC_FAILED",
            Status::SetupFailed => "HIPFFT_SETUP_FAILED",
            Status::InvalidSize => "HIPFFT_INVALID_SIZE",
            Status::UnalignedData => "HIPFFT_UNALIGNED_DATA",
            Status::IncompleteParameterList => "HIPFFT_INCOMPLETE_PARAMETER_LIST",
            Status::InvalidDevice => "HIPFFT_INVALID_DEVICE",
            Status::ParseError => "HIPFFT_PARSE_ERROR",
            Status::NoWorkspace => "HIPFFT_NO_WORKSPACE",
            Status::NotImplemented => "HIPFFT_NOT_IMPLEMENTED",
            Status::NotSupported => "HIPFFT_NOT_SUPPORTED",
            Status::Unknown(_) => "HIPFFT_UNKNOWN",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Status::Success => "the operation completed successfully",
            Status::InvalidPlan => "the plan handle is invalid or has been destroyed",
            Status::AllocFailed => "the library failed to allocate memory",
            Status::InvalidType => "the transform type is invalid for this call",
            Status::InvalidValue => "an argument or pointer is invalid",
            Status::InternalError => "the library encountered an internal error",
            Status::ExecFailed => "the transform failed to execute on the device",
            Status::SetupFailed => "the library failed to initialize",
            Status::InvalidSize => "a transform size is invalid",
            Status::UnalignedData => "a data pointer is not suitably aligned",
            Status::IncompleteParameterList => "required parameters are missing",
            Status::InvalidDevice => "the plan was executed on a different device",
            Status::ParseError => "the plan description could not be parsed",
            Status::NoWorkspace => "no work area has been provided for the plan",
            Status::NotImplemented => "the requested configuration is not implemented",
            Status::NotSupported => "the requested operation is not supported",
            Status::Unknown(_) => "unrecognized status code",
        }
    }

    /// Category used for [`crate::Error::kind`].
    pub fn kind(self) -> ErrorKind {
        match self {
            Status::AllocFailed => ErrorKind::Allocation,
            Status::InvalidPlan => ErrorKind::InvalidHandle,
            Status::InvalidValue
            | Status::InvalidSize
            | Status::UnalignedData
            | Status::IncompleteParameterList
            | Status::InvalidDevice
            | Status::ParseError => ErrorKind::InvalidArgument,
            Status::InvalidType | Status::NotImplemented | Status::NotSupported => {
                ErrorKind::UnsupportedType
            }
            Status::NoWorkspace => ErrorKind::InsufficientWorkArea,
            Status::Success
            | Status::InternalError
            | Status::ExecFailed
            | Status::SetupFailed
            | Status::Unknown(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unknown(code) => {
                write!(f, "{} ({}): {}", self.name(), code, self.description())
            }
            _ => write!(f, "{}: {}", self.name(), self.description()),
        }
    }
}

/// Human-readable text for a raw vendor status code. Never fails.
pub fn render_status(code: i32) -> String {
    Status::from_raw(code).to_string()
}
