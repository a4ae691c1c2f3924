//! Owning plan handle with lifecycle tracking.

use std::ffi::c_void;
use std::fmt;

use num_complex::{Complex32, Complex64};

use crate::adapter::FftAdapter;
use crate::error::{Error, Result};
use crate::library::{FftLibrary, RawFftHandle};
use crate::memory::{DeviceBuffer, Pointer};
use crate::stream::StreamRef;
use crate::types::{to_vendor_type, FftDirection, FftType, TransformDescriptor, VendorFftType};

/// Where a plan is in `Created -> Configured -> Executable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    /// Handle exists, no transform shape yet.
    Created,
    /// Shape committed; executable once a work area is bound.
    Configured {
        vendor_type: VendorFftType,
        work_size: usize,
    },
    /// Ready to execute.
    Executable {
        vendor_type: VendorFftType,
        work_size: usize,
    },
}

impl PlanState {
    pub fn name(&self) -> &'static str {
        match self {
            PlanState::Created => "created",
            PlanState::Configured { .. } => "configured",
            PlanState::Executable { .. } => "executable",
        }
    }

    fn shape(&self) -> Option<(VendorFftType, usize)> {
        match *self {
            PlanState::Created => None,
            PlanState::Configured {
                vendor_type,
                work_size,
            }
            | PlanState::Executable {
                vendor_type,
                work_size,
            } => Some((vendor_type, work_size)),
        }
    }
}

/// Exclusively owned FFT plan.
///
/// The vendor handle is released exactly once: by [`destroy`](Self::destroy)
/// or, failing that, on drop. Ownership moves with the value; `into_raw`
/// gives it up explicitly.
///
/// An owned work area is never freed or replaced while transforms on the
/// plan's stream may still use it: the plan synchronizes that stream first.
/// If the synchronization fails the buffer is leaked instead.
pub struct FftPlan<L: FftLibrary> {
    adapter: FftAdapter<L>,
    handle: RawFftHandle,
    state: PlanState,
    stream: StreamRef,
    work_area: Option<DeviceBuffer>,
}

impl<L: FftLibrary> FftPlan<L> {
    pub(crate) fn new(adapter: FftAdapter<L>, handle: RawFftHandle) -> Self {
        Self {
            adapter,
            handle,
            state: PlanState::Created,
            stream: StreamRef::DEFAULT,
            work_area: None,
        }
    }

    /// Adopts a raw handle. The plan starts out [`PlanState::Created`];
    /// configure it again before executing.
    ///
    /// # Safety
    /// `handle` must be a live handle of the adapter's library that nothing
    /// else will destroy, bound to the default stream.
    pub unsafe fn from_raw(adapter: FftAdapter<L>, handle: RawFftHandle) -> Self {
        Self::new(adapter, handle)
    }

    pub fn handle(&self) -> RawFftHandle {
        self.handle
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    pub fn adapter(&self) -> &FftAdapter<L> {
        &self.adapter
    }

    pub fn vendor_type(&self) -> Option<VendorFftType> {
        self.state.shape().map(|(vendor_type, _)| vendor_type)
    }

    /// Work-area bytes the current configuration needs.
    pub fn work_size(&self) -> Option<usize> {
        self.state.shape().map(|(_, work_size)| work_size)
    }

    /// Stream the plan's transforms are enqueued on.
    pub fn stream(&self) -> StreamRef {
        self.stream
    }

    /// Moves the plan to `stream`. Work still queued on the old stream is
    /// drained first when the plan owns its work area.
    pub fn set_stream(&mut self, stream: StreamRef) -> Result<()> {
        self.drain()?;
        self.adapter.set_stream(self.handle, stream)?;
        self.stream = stream;
        Ok(())
    }

    /// Waits until nothing queued on the plan's stream can still touch the
    /// owned work area.
    fn drain(&self) -> Result<()> {
        if self.work_area.is_some() {
            self.adapter.synchronize(self.stream)?;
        }
        Ok(())
    }

    /// Drains, then drops the owned work area. On a failed drain the buffer
    /// is leaked.
    fn release_work_area(&mut self) -> Result<()> {
        let drained = self.drain();
        if let Some(buffer) = self.work_area.take() {
            if drained.is_err() {
                std::mem::forget(buffer);
            }
        }
        drained
    }

    /// Commits a transform shape, replacing any previous one together with
    /// its work area. On failure the plan is back to `Created`, except when
    /// draining the old work area fails, which leaves the plan untouched.
    pub fn configure(&mut self, desc: &TransformDescriptor) -> Result<usize> {
        self.drain()?;
        self.state = PlanState::Created;
        self.work_area = None;

        let work_size = self.adapter.make_plan_many(self.handle, desc)?;
        let needs_work_area = work_size > 0 && !self.adapter.config().auto_allocate_work_area;
        self.state = if needs_work_area {
            PlanState::Configured {
                vendor_type: desc.fft_type,
                work_size,
            }
        } else {
            PlanState::Executable {
                vendor_type: desc.fft_type,
                work_size,
            }
        };
        Ok(work_size)
    }

    fn require_shape(&self, required: &'static str) -> Result<(VendorFftType, usize)> {
        self.state.shape().ok_or(Error::InvalidState {
            state: self.state.name(),
            required,
        })
    }

    /// Binds a caller-owned work area, replacing any owned one once the
    /// plan's stream has drained.
    ///
    /// # Safety
    /// See [`FftAdapter::set_work_area`].
    pub unsafe fn set_work_area(&mut self, work_area: Pointer<c_void>, size: usize) -> Result<()> {
        let (vendor_type, work_size) = self.require_shape("configured")?;
        self.drain()?;
        self.adapter.set_work_area(self.handle, work_area, size)?;
        self.work_area = None;
        self.state = PlanState::Executable {
            vendor_type,
            work_size,
        };
        Ok(())
    }

    /// Binds a work area the plan owns from now on.
    ///
    /// The buffer must hold at least [`work_size`](Self::work_size) bytes,
    /// whatever [`Config::check_work_area_size`] says.
    ///
    /// [`Config::check_work_area_size`]: crate::Config::check_work_area_size
    pub fn set_owned_work_area(&mut self, mut buffer: DeviceBuffer) -> Result<()> {
        let (_, required) = self.require_shape("configured")?;
        let size = buffer.size();
        if size < required {
            return Err(Error::InsufficientWorkArea {
                required,
                provided: size,
            });
        }
        let pointer = buffer.pointer::<c_void>();
        // SAFETY: the buffer is large enough and moves into the plan below.
        // It is only dropped after the plan's stream has drained.
        unsafe { self.set_work_area(pointer, size)? };
        self.work_area = Some(buffer);
        Ok(())
    }

    /// Takes back an owned work area after the plan's stream has drained.
    /// The plan needs a new one before it can execute again.
    pub fn take_work_area(&mut self) -> Result<Option<DeviceBuffer>> {
        self.drain()?;
        let Some(buffer) = self.work_area.take() else {
            return Ok(None);
        };
        if let PlanState::Executable {
            vendor_type,
            work_size,
        } = self.state
        {
            self.state = PlanState::Configured {
                vendor_type,
                work_size,
            };
        }
        Ok(Some(buffer))
    }

    fn require_executable(&self) -> Result<()> {
        match self.state {
            PlanState::Executable { .. } => Ok(()),
            PlanState::Configured { work_size, .. } => Err(Error::InsufficientWorkArea {
                required: work_size,
                provided: 0,
            }),
            PlanState::Created => Err(Error::InvalidState {
                state: self.state.name(),
                required: "executable",
            }),
        }
    }

    /// # Safety
    /// See [`FftAdapter::exec_c2c`]. The handle must not have been moved to
    /// another stream except through [`set_stream`](Self::set_stream), and a
    /// caller-owned work area must still meet the
    /// [`set_work_area`](Self::set_work_area) contract. The same holds for
    /// every `execute*` method.
    pub unsafe fn execute_c2c(
        &mut self,
        input: Pointer<Complex32>,
        output: Pointer<Complex32>,
        direction: FftDirection,
    ) -> Result<()> {
        self.require_executable()?;
        self.adapter.exec_c2c(self.handle, input, output, direction)
    }

    /// # Safety
    /// See [`execute_c2c`](Self::execute_c2c).
    pub unsafe fn execute_z2z(
        &mut self,
        input: Pointer<Complex64>,
        output: Pointer<Complex64>,
        direction: FftDirection,
    ) -> Result<()> {
        self.require_executable()?;
        self.adapter.exec_z2z(self.handle, input, output, direction)
    }

    /// # Safety
    /// See [`execute_c2c`](Self::execute_c2c).
    pub unsafe fn execute_r2c(
        &mut self,
        input: Pointer<f32>,
        output: Pointer<Complex32>,
    ) -> Result<()> {
        self.require_executable()?;
        self.adapter.exec_r2c(self.handle, input, output)
    }

    /// # Safety
    /// See [`execute_c2c`](Self::execute_c2c).
    pub unsafe fn execute_d2z(
        &mut self,
        input: Pointer<f64>,
        output: Pointer<Complex64>,
    ) -> Result<()> {
        self.require_executable()?;
        self.adapter.exec_d2z(self.handle, input, output)
    }

    /// # Safety
    /// See [`execute_c2c`](Self::execute_c2c).
    pub unsafe fn execute_c2r(
        &mut self,
        input: Pointer<Complex32>,
        output: Pointer<f32>,
    ) -> Result<()> {
        self.require_executable()?;
        self.adapter.exec_c2r(self.handle, input, output)
    }

    /// # Safety
    /// See [`execute_c2c`](Self::execute_c2c).
    pub unsafe fn execute_z2d(
        &mut self,
        input: Pointer<Complex64>,
        output: Pointer<f64>,
    ) -> Result<()> {
        self.require_executable()?;
        self.adapter.exec_z2d(self.handle, input, output)
    }

    /// Generic execution. `fft_type` must translate to the plan's type.
    ///
    /// # Safety
    /// See [`FftAdapter::exec`] and [`execute_c2c`](Self::execute_c2c).
    pub unsafe fn execute(
        &mut self,
        input: Pointer<c_void>,
        output: Pointer<c_void>,
        fft_type: FftType,
    ) -> Result<()> {
        let vendor_type = to_vendor_type(fft_type)?;
        let (planned, _) = self.require_shape("executable")?;
        if vendor_type != planned {
            return Err(Error::unsupported_type(format!(
                "{fft_type} on a plan configured for {planned:?}"
            )));
        }
        self.require_executable()?;
        self.adapter.exec(self.handle, input, output, fft_type)
    }

    /// Destroys the handle, reporting failure instead of logging it.
    ///
    /// An owned work area is released after the plan's stream has drained.
    /// The handle is destroyed even if that drain fails; the first error is
    /// returned.
    pub fn destroy(mut self) -> Result<()> {
        let released = self.release_work_area();
        let (adapter, handle) = self.into_parts();
        let destroyed = adapter.destroy(handle);
        released.and(destroyed)
    }

    /// Gives up ownership of the handle. Any owned work area is dropped once
    /// the plan's stream has drained, so bind a new one before executing
    /// through the raw handle.
    pub fn into_raw(mut self) -> RawFftHandle {
        if let Err(err) = self.release_work_area() {
            log::warn!("leaking work area of FFT plan {}: {}", self.handle, err);
        }
        self.into_parts().1
    }

    fn into_parts(self) -> (FftAdapter<L>, RawFftHandle) {
        let this = std::mem::ManuallyDrop::new(self);
        // SAFETY: `this` is never used or dropped again after the read.
        let adapter = unsafe { std::ptr::read(&this.adapter) };
        (adapter, this.handle)
    }
}

impl<L: FftLibrary> Drop for FftPlan<L> {
    fn drop(&mut self) {
        if let Err(err) = self.release_work_area() {
            log::warn!("leaking work area of FFT plan {}: {}", self.handle, err);
        }
        if let Err(err) = self.adapter.destroy(self.handle) {
            log::warn!("failed to destroy FFT plan {}: {}", self.handle, err);
        }
    }
}

impl<L: FftLibrary> fmt::Debug for FftPlan<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftPlan")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("stream", &self.stream)
            .field("owns_work_area", &self.work_area.is_some())
            .finish()
    }
}
