//! `Result`-returning front end over an [`FftLibrary`].
//!
//! Every vendor entry point gets a method here that turns its status code
//! into an [`Error`], checks what the vendor cannot (argument consistency,
//! pointer platforms, work-area sizes) and records telemetry. The adapter
//! holds no per-plan state; lifecycle ordering is enforced by [`FftPlan`].

use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use num_complex::{Complex32, Complex64};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::library::{FftLibrary, RawFftHandle, RawResult};
use crate::memory::Pointer;
use crate::plan::FftPlan;
use crate::status::Status;
use crate::stream::StreamRef;
use crate::telemetry::{CallGuard, CallLog, Metrics};
use crate::types::{FftDirection, FftType, LibraryVersion, TransformDescriptor};

pub use crate::status::render_status;
pub use crate::types::to_vendor_type;

/// Plan operations against one FFT library.
///
/// Cloning is cheap and clones share the library, metrics and call log.
pub struct FftAdapter<L: FftLibrary> {
    library: Arc<L>,
    config: Config,
    metrics: Arc<Metrics>,
    calls: Arc<CallLog>,
}

impl<L: FftLibrary> Clone for FftAdapter<L> {
    fn clone(&self) -> Self {
        Self {
            library: Arc::clone(&self.library),
            config: self.config.clone(),
            metrics: Arc::clone(&self.metrics),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<L: FftLibrary> fmt::Debug for FftAdapter<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftAdapter")
            .field("library", &self.library.name())
            .field("config", &self.config)
            .finish()
    }
}

impl<L: FftLibrary> FftAdapter<L> {
    pub fn new(library: L) -> Self {
        Self::build(Arc::new(library), Config::default())
    }

    /// Adapter over a library that is also used elsewhere.
    pub fn from_shared(library: Arc<L>) -> Self {
        Self::build(library, Config::default())
    }

    pub fn with_config(library: Arc<L>, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(library, config))
    }

    fn build(library: Arc<L>, config: Config) -> Self {
        #[cfg(feature = "telemetry")]
        let calls = CallLog::new(config.enable_telemetry);
        #[cfg(not(feature = "telemetry"))]
        let calls = CallLog::new(false);

        Self {
            library,
            config,
            metrics: Arc::new(Metrics::new()),
            calls: Arc::new(calls),
        }
    }

    pub fn library(&self) -> &Arc<L> {
        &self.library
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn call_log(&self) -> &CallLog {
        &self.calls
    }

    /// Runs one traced library call and maps its status.
    fn call<T>(
        &self,
        operation: &'static str,
        handle: Option<RawFftHandle>,
        f: impl FnOnce(&mut CallGuard<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.calls.enter(operation, handle);
        let result = f(&mut guard);
        guard.finish(&result);
        if result.is_err() {
            self.metrics.record_failure();
        }
        result
    }

    fn check_pointer<T>(&self, role: &str, pointer: Pointer<T>) -> Result<()> {
        if pointer.platform() != self.library.platform() {
            return Err(Error::invalid_argument(format!(
                "{role} is {} memory, {} library needs {} memory",
                pointer.platform(),
                self.library.name(),
                self.library.platform()
            )));
        }
        if pointer.is_null() {
            return Err(Error::invalid_argument(format!("{role} is null")));
        }
        Ok(())
    }

    /// Checks both pointers, then times the enqueue.
    fn enqueue<I, O>(
        &self,
        operation: &'static str,
        handle: RawFftHandle,
        input: Pointer<I>,
        output: Pointer<O>,
        exec: impl FnOnce() -> RawResult<()>,
    ) -> Result<()> {
        self.call(operation, Some(handle), |guard| {
            self.check_pointer("input", input)?;
            self.check_pointer("output", output)?;
            guard.field("in_place", input.raw() as usize == output.raw() as usize);

            let start = Instant::now();
            exec().map_err(|status| Error::vendor(operation, status))?;
            self.metrics
                .record_execution(start.elapsed().as_nanos() as u64);
            Ok(())
        })
    }

    /// Version of the underlying library.
    pub fn version(&self) -> Result<LibraryVersion> {
        self.call("hipfftGetVersion", None, |_| {
            let packed = self
                .library
                .get_version()
                .map_err(|status| Error::vendor("hipfftGetVersion", status))?;
            Ok(LibraryVersion::from_packed(packed))
        })
    }

    /// Creates a plan handle owned by the returned [`FftPlan`].
    ///
    /// Vendor auto-allocation of work areas is switched off unless
    /// [`Config::auto_allocate_work_area`] is set, so a new plan needs a
    /// work area bound before it can execute.
    pub fn create(&self) -> Result<FftPlan<L>> {
        let handle = self.call("hipfftCreate", None, |guard| {
            let handle = self
                .library
                .create()
                .map_err(|status| Error::vendor("hipfftCreate", status))?;
            guard.set_handle(handle);

            let auto = self.config.auto_allocate_work_area;
            guard.field("auto_allocate", auto);
            if let Err(status) = self.library.set_auto_allocation(handle, auto) {
                if let Err(destroy) = self.library.destroy(handle) {
                    log::warn!("leaking FFT plan {handle}: destroy failed with {destroy}");
                }
                return Err(Error::vendor("hipfftSetAutoAllocation", status));
            }
            Ok(handle)
        })?;

        self.metrics.record_plan_created();
        Ok(FftPlan::new(self.clone(), handle))
    }

    /// Destroys a raw handle. Destroying it twice fails with an
    /// invalid-handle error.
    pub fn destroy(&self, handle: RawFftHandle) -> Result<()> {
        self.call("hipfftDestroy", Some(handle), |_| {
            self.library
                .destroy(handle)
                .map_err(|status| Error::vendor("hipfftDestroy", status))
        })?;
        self.metrics.record_plan_destroyed();
        Ok(())
    }

    pub fn set_stream(&self, handle: RawFftHandle, stream: StreamRef) -> Result<()> {
        self.call("hipfftSetStream", Some(handle), |guard| {
            guard.field("stream", format_args!("{stream:?}"));
            self.library
                .set_stream(handle, stream)
                .map_err(|status| Error::vendor("hipfftSetStream", status))
        })
    }

    /// Blocks until every transform enqueued on `stream` has run.
    pub fn synchronize(&self, stream: StreamRef) -> Result<()> {
        self.call("hipStreamSynchronize", None, |guard| {
            guard.field("stream", format_args!("{stream:?}"));
            self.library
                .synchronize(stream)
                .map_err(|status| Error::vendor("hipStreamSynchronize", status))
        })
    }

    /// Configures the plan for a (possibly batched, strided) transform and
    /// returns the work-area size in bytes.
    pub fn make_plan_many(
        &self,
        handle: RawFftHandle,
        desc: &TransformDescriptor,
    ) -> Result<usize> {
        let work_size = self.call("hipfftMakePlanMany64", Some(handle), |guard| {
            guard.field("rank", desc.rank);
            guard.field("n", format_args!("{:?}", desc.n));
            guard.field("type", format_args!("{:?}", desc.fft_type));
            guard.field("batch", desc.batch);

            desc.validate(self.config.max_rank)?;
            let work_size = self
                .library
                .make_plan_many(handle, desc)
                .map_err(|status| Error::vendor("hipfftMakePlanMany64", status))?;
            guard.field("work_size", work_size);
            Ok(work_size)
        })?;

        self.metrics.record_plan_configured();
        Ok(work_size)
    }

    /// Work-area size in bytes of a configured plan.
    pub fn get_size(&self, handle: RawFftHandle) -> Result<usize> {
        self.call("hipfftGetSize", Some(handle), |_| {
            self.library
                .get_size(handle)
                .map_err(|status| Error::vendor("hipfftGetSize", status))
        })
    }

    /// Binds a caller-owned work area of `size` bytes.
    ///
    /// A null pointer is always rejected. With
    /// [`Config::check_work_area_size`] on, so is a work area smaller than
    /// [`get_size`](Self::get_size) reports.
    ///
    /// # Safety
    /// The work area must hold at least [`get_size`](Self::get_size) bytes,
    /// whether or not the size check is on. It must stay valid, and not be
    /// used for anything else, until every transform enqueued with it has
    /// completed.
    pub unsafe fn set_work_area(
        &self,
        handle: RawFftHandle,
        work_area: Pointer<c_void>,
        size: usize,
    ) -> Result<()> {
        self.call("hipfftSetWorkArea", Some(handle), |guard| {
            guard.field("size", size);
            if work_area.platform() != self.library.platform() {
                return Err(Error::invalid_argument(format!(
                    "work area is {} memory, {} library needs {} memory",
                    work_area.platform(),
                    self.library.name(),
                    self.library.platform()
                )));
            }

            if work_area.is_null() || self.config.check_work_area_size {
                let required = self
                    .library
                    .get_size(handle)
                    .map_err(|status| Error::vendor("hipfftGetSize", status))?;
                let provided = if work_area.is_null() { 0 } else { size };
                if work_area.is_null() || provided < required {
                    return Err(Error::InsufficientWorkArea { required, provided });
                }
            }

            self.library
                .set_work_area(handle, work_area.raw())
                .map_err(|status| Error::vendor("hipfftSetWorkArea", status))
        })
    }

    /// Single-precision complex transform.
    ///
    /// # Safety
    /// Both buffers must be sized for the plan's layout and stay valid until
    /// the plan's stream has run the transform. Input and output may alias.
    /// A work area bound with [`set_work_area`](Self::set_work_area) must
    /// still meet that method's contract. The same holds for every `exec*`
    /// method.
    pub unsafe fn exec_c2c(
        &self,
        handle: RawFftHandle,
        input: Pointer<Complex32>,
        output: Pointer<Complex32>,
        direction: FftDirection,
    ) -> Result<()> {
        self.enqueue("hipfftExecC2C", handle, input, output, || {
            self.library
                .exec_c2c(handle, input.raw(), output.raw(), direction)
        })
    }

    /// Double-precision complex transform.
    ///
    /// # Safety
    /// See [`exec_c2c`](Self::exec_c2c).
    pub unsafe fn exec_z2z(
        &self,
        handle: RawFftHandle,
        input: Pointer<Complex64>,
        output: Pointer<Complex64>,
        direction: FftDirection,
    ) -> Result<()> {
        self.enqueue("hipfftExecZ2Z", handle, input, output, || {
            self.library
                .exec_z2z(handle, input.raw(), output.raw(), direction)
        })
    }

    /// # Safety
    /// See [`exec_c2c`](Self::exec_c2c).
    pub unsafe fn exec_r2c(
        &self,
        handle: RawFftHandle,
        input: Pointer<f32>,
        output: Pointer<Complex32>,
    ) -> Result<()> {
        self.enqueue("hipfftExecR2C", handle, input, output, || {
            self.library.exec_r2c(handle, input.raw(), output.raw())
        })
    }

    /// # Safety
    /// See [`exec_c2c`](Self::exec_c2c).
    pub unsafe fn exec_d2z(
        &self,
        handle: RawFftHandle,
        input: Pointer<f64>,
        output: Pointer<Complex64>,
    ) -> Result<()> {
        self.enqueue("hipfftExecD2Z", handle, input, output, || {
            self.library.exec_d2z(handle, input.raw(), output.raw())
        })
    }

    /// # Safety
    /// See [`exec_c2c`](Self::exec_c2c).
    pub unsafe fn exec_c2r(
        &self,
        handle: RawFftHandle,
        input: Pointer<Complex32>,
        output: Pointer<f32>,
    ) -> Result<()> {
        self.enqueue("hipfftExecC2R", handle, input, output, || {
            self.library.exec_c2r(handle, input.raw(), output.raw())
        })
    }

    /// # Safety
    /// See [`exec_c2c`](Self::exec_c2c).
    pub unsafe fn exec_z2d(
        &self,
        handle: RawFftHandle,
        input: Pointer<Complex64>,
        output: Pointer<f64>,
    ) -> Result<()> {
        self.enqueue("hipfftExecZ2D", handle, input, output, || {
            self.library.exec_z2d(handle, input.raw(), output.raw())
        })
    }

    /// Runs the transform selected by `fft_type` on untyped buffers.
    ///
    /// # Safety
    /// The buffers must hold the element types `fft_type` implies; otherwise
    /// as [`exec_c2c`](Self::exec_c2c).
    pub unsafe fn exec(
        &self,
        handle: RawFftHandle,
        input: Pointer<c_void>,
        output: Pointer<c_void>,
        fft_type: FftType,
    ) -> Result<()> {
        match fft_type {
            FftType::C2CForward => {
                self.exec_c2c(handle, input.cast(), output.cast(), FftDirection::Forward)
            }
            FftType::C2CInverse => {
                self.exec_c2c(handle, input.cast(), output.cast(), FftDirection::Inverse)
            }
            FftType::Z2ZForward => {
                self.exec_z2z(handle, input.cast(), output.cast(), FftDirection::Forward)
            }
            FftType::Z2ZInverse => {
                self.exec_z2z(handle, input.cast(), output.cast(), FftDirection::Inverse)
            }
            FftType::R2C => self.exec_r2c(handle, input.cast(), output.cast()),
            FftType::D2Z => self.exec_d2z(handle, input.cast(), output.cast()),
            FftType::C2R => self.exec_c2r(handle, input.cast(), output.cast()),
            FftType::Z2D => self.exec_z2d(handle, input.cast(), output.cast()),
            FftType::C2CHalfForward | FftType::C2CHalfInverse => {
                let err = Error::unsupported_type(format!("{fft_type} has no hipFFT entry point"));
                self.call("hipfftExec", Some(handle), |_| Err::<(), _>(err))
            }
        }
    }
}

/// Status of a raw call, for callers holding a bare vendor code.
pub fn check_status(operation: &'static str, code: i32) -> Result<()> {
    Status::from_raw(code)
        .check()
        .map_err(|status| Error::vendor(operation, status))
}
