//! The vendor FFT library seam.
//!
//! [`FftLibrary`] mirrors the C entry points of hipFFT one-to-one. Each call
//! reports failure as a raw [`Status`]; giving those statuses meaning is the
//! job of [`crate::FftAdapter`].
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  FftAdapter / FftPlan  (Result<T, Error>)    │
//! ├──────────────────────────────────────────────┤
//! │  FftLibrary            (Result<T, Status>)   │
//! ├──────────────────────┬───────────────────────┤
//! │  HipFftLibrary       │  HostFftLibrary       │
//! │  extern "C" hipfft*  │  rustfft on host mem  │
//! └──────────────────────┴───────────────────────┘
//! ```

use std::ffi::c_void;
use std::fmt;

use num_complex::{Complex32, Complex64};

use crate::memory::Platform;
use crate::status::Status;
use crate::stream::StreamRef;
use crate::types::{FftDirection, TransformDescriptor};

pub mod host;

#[cfg(feature = "hip")]
pub mod hip;

#[cfg(feature = "hip")]
pub mod sys;

pub use host::HostFftLibrary;

#[cfg(feature = "hip")]
pub use hip::HipFftLibrary;

/// Outcome of a raw library call.
pub type RawResult<T> = std::result::Result<T, Status>;

/// Opaque plan handle as issued by the library.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFftHandle(usize);

impl RawFftHandle {
    pub const NULL: RawFftHandle = RawFftHandle(0);

    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr as usize)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for RawFftHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFftHandle({:#x})", self.0)
    }
}

impl fmt::Display for RawFftHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The hipFFT C surface, one method per entry point.
///
/// Execution methods only enqueue work on the plan's stream; buffers are read
/// and written when that stream runs.
pub trait FftLibrary: Send + Sync {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Platform whose memory the library reads and writes.
    fn platform(&self) -> Platform;

    /// `hipStreamSynchronize`: returns once everything enqueued on `stream`
    /// has run.
    fn synchronize(&self, stream: StreamRef) -> RawResult<()>;

    /// `hipfftGetVersion`, packed as `major * 10000 + minor * 100 + patch`.
    fn get_version(&self) -> RawResult<i32>;

    /// `hipfftCreate`
    fn create(&self) -> RawResult<RawFftHandle>;

    /// `hipfftDestroy`
    fn destroy(&self, handle: RawFftHandle) -> RawResult<()>;

    /// `hipfftSetAutoAllocation`; takes effect at the next plan generation.
    fn set_auto_allocation(&self, handle: RawFftHandle, enabled: bool) -> RawResult<()>;

    /// `hipfftSetStream`
    fn set_stream(&self, handle: RawFftHandle, stream: StreamRef) -> RawResult<()>;

    /// `hipfftMakePlanMany64`; returns the work-area size in bytes.
    fn make_plan_many(&self, handle: RawFftHandle, desc: &TransformDescriptor)
        -> RawResult<usize>;

    /// `hipfftGetSize`
    fn get_size(&self, handle: RawFftHandle) -> RawResult<usize>;

    /// `hipfftSetWorkArea`
    ///
    /// # Safety
    /// `work_area` must hold at least [`get_size`](Self::get_size) bytes and
    /// stay valid until every transform enqueued with it has completed.
    unsafe fn set_work_area(&self, handle: RawFftHandle, work_area: *mut c_void)
        -> RawResult<()>;

    /// `hipfftExecC2C`
    ///
    /// # Safety
    /// Both pointers must address memory of the library's platform, sized for
    /// the plan's layout, and stay valid until the stream has run the
    /// transform. The plan's work area, if one was set, must still meet the
    /// [`set_work_area`](Self::set_work_area) contract. The same holds for
    /// every `exec_*` method.
    unsafe fn exec_c2c(
        &self,
        handle: RawFftHandle,
        input: *mut Complex32,
        output: *mut Complex32,
        direction: FftDirection,
    ) -> RawResult<()>;

    /// `hipfftExecZ2Z`
    ///
    /// # Safety
    /// See [`FftLibrary::exec_c2c`].
    unsafe fn exec_z2z(
        &self,
        handle: RawFftHandle,
        input: *mut Complex64,
        output: *mut Complex64,
        direction: FftDirection,
    ) -> RawResult<()>;

    /// `hipfftExecR2C`
    ///
    /// # Safety
    /// See [`FftLibrary::exec_c2c`].
    unsafe fn exec_r2c(
        &self,
        handle: RawFftHandle,
        input: *mut f32,
        output: *mut Complex32,
    ) -> RawResult<()>;

    /// `hipfftExecD2Z`
    ///
    /// # Safety
    /// See [`FftLibrary::exec_c2c`].
    unsafe fn exec_d2z(
        &self,
        handle: RawFftHandle,
        input: *mut f64,
        output: *mut Complex64,
    ) -> RawResult<()>;

    /// `hipfftExecC2R`
    ///
    /// # Safety
    /// See [`FftLibrary::exec_c2c`].
    unsafe fn exec_c2r(
        &self,
        handle: RawFftHandle,
        input: *mut Complex32,
        output: *mut f32,
    ) -> RawResult<()>;

    /// `hipfftExecZ2D`
    ///
    /// # Safety
    /// See [`FftLibrary::exec_c2c`].
    unsafe fn exec_z2d(
        &self,
        handle: RawFftHandle,
        input: *mut Complex64,
        output: *mut f64,
    ) -> RawResult<()>;
}
