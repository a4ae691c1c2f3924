//! hipFFT proper, through the declarations in [`super::sys`].

use std::ffi::{c_int, c_longlong, c_void};

use num_complex::{Complex32, Complex64};

use super::sys;
use super::{FftLibrary, RawFftHandle, RawResult};
use crate::memory::Platform;
use crate::status::Status;
use crate::stream::StreamRef;
use crate::types::{DataLayout, FftDirection, TransformDescriptor};

fn check(code: sys::hipfftResult) -> RawResult<()> {
    Status::from_raw(code).check()
}

/// Splits a layout into the `(embed, stride, dist)` triple hipFFT takes. A
/// null embed pointer selects the contiguous layout.
fn layout_args(
    layout: &mut Vec<c_longlong>,
    source: &DataLayout,
) -> (*mut c_longlong, c_longlong, c_longlong) {
    if source.is_contiguous() {
        return (std::ptr::null_mut(), 1, 0);
    }
    layout.extend(source.embed.iter().map(|&e| e as c_longlong));
    (layout.as_mut_ptr(), source.stride, source.dist)
}

/// The system hipFFT library.
///
/// Stateless; every call goes straight to the C entry point.
#[derive(Debug, Default, Clone, Copy)]
pub struct HipFftLibrary;

impl HipFftLibrary {
    pub fn new() -> Self {
        Self
    }
}

impl FftLibrary for HipFftLibrary {
    fn name(&self) -> &'static str {
        "hipfft"
    }

    fn platform(&self) -> Platform {
        Platform::Rocm
    }

    fn synchronize(&self, stream: StreamRef) -> RawResult<()> {
        match unsafe { sys::hipStreamSynchronize(stream.as_ptr()) } {
            sys::hipSuccess => Ok(()),
            code => {
                log::debug!("hipStreamSynchronize failed with hipError_t {code}");
                Err(Status::ExecFailed)
            }
        }
    }

    fn get_version(&self) -> RawResult<i32> {
        let mut version: c_int = 0;
        check(unsafe { sys::hipfftGetVersion(&mut version) })?;
        Ok(version)
    }

    fn create(&self) -> RawResult<RawFftHandle> {
        let mut handle: sys::hipfftHandle = std::ptr::null_mut();
        check(unsafe { sys::hipfftCreate(&mut handle) })?;
        Ok(RawFftHandle::from_ptr(handle))
    }

    fn destroy(&self, handle: RawFftHandle) -> RawResult<()> {
        check(unsafe { sys::hipfftDestroy(handle.as_ptr()) })
    }

    fn set_auto_allocation(&self, handle: RawFftHandle, enabled: bool) -> RawResult<()> {
        check(unsafe { sys::hipfftSetAutoAllocation(handle.as_ptr(), enabled as c_int) })
    }

    fn set_stream(&self, handle: RawFftHandle, stream: StreamRef) -> RawResult<()> {
        check(unsafe { sys::hipfftSetStream(handle.as_ptr(), stream.as_ptr()) })
    }

    fn make_plan_many(
        &self,
        handle: RawFftHandle,
        desc: &TransformDescriptor,
    ) -> RawResult<usize> {
        let rank = c_int::try_from(desc.rank).map_err(|_| Status::InvalidValue)?;
        let mut n: Vec<c_longlong> = desc.n.iter().map(|&e| e as c_longlong).collect();
        let mut inembed = Vec::new();
        let mut onembed = Vec::new();
        let (inembed_ptr, istride, idist) = layout_args(&mut inembed, &desc.input);
        let (onembed_ptr, ostride, odist) = layout_args(&mut onembed, &desc.output);
        let mut work_size: usize = 0;

        check(unsafe {
            sys::hipfftMakePlanMany64(
                handle.as_ptr(),
                rank,
                n.as_mut_ptr(),
                inembed_ptr,
                istride,
                idist,
                onembed_ptr,
                ostride,
                odist,
                desc.fft_type.as_raw(),
                desc.batch,
                &mut work_size,
            )
        })?;
        Ok(work_size)
    }

    fn get_size(&self, handle: RawFftHandle) -> RawResult<usize> {
        let mut work_size: usize = 0;
        check(unsafe { sys::hipfftGetSize(handle.as_ptr(), &mut work_size) })?;
        Ok(work_size)
    }

    unsafe fn set_work_area(
        &self,
        handle: RawFftHandle,
        work_area: *mut c_void,
    ) -> RawResult<()> {
        check(sys::hipfftSetWorkArea(handle.as_ptr(), work_area))
    }

    unsafe fn exec_c2c(
        &self,
        handle: RawFftHandle,
        input: *mut Complex32,
        output: *mut Complex32,
        direction: FftDirection,
    ) -> RawResult<()> {
        check(sys::hipfftExecC2C(handle.as_ptr(), input, output, direction.as_raw()))
    }

    unsafe fn exec_z2z(
        &self,
        handle: RawFftHandle,
        input: *mut Complex64,
        output: *mut Complex64,
        direction: FftDirection,
    ) -> RawResult<()> {
        check(sys::hipfftExecZ2Z(handle.as_ptr(), input, output, direction.as_raw()))
    }

    unsafe fn exec_r2c(
        &self,
        handle: RawFftHandle,
        input: *mut f32,
        output: *mut Complex32,
    ) -> RawResult<()> {
        check(sys::hipfftExecR2C(handle.as_ptr(), input, output))
    }

    unsafe fn exec_d2z(
        &self,
        handle: RawFftHandle,
        input: *mut f64,
        output: *mut Complex64,
    ) -> RawResult<()> {
        check(sys::hipfftExecD2Z(handle.as_ptr(), input, output))
    }

    unsafe fn exec_c2r(
        &self,
        handle: RawFftHandle,
        input: *mut Complex32,
        output: *mut f32,
    ) -> RawResult<()> {
        check(sys::hipfftExecC2R(handle.as_ptr(), input, output))
    }

    unsafe fn exec_z2d(
        &self,
        handle: RawFftHandle,
        input: *mut Complex64,
        output: *mut f64,
    ) -> RawResult<()> {
        check(sys::hipfftExecZ2D(handle.as_ptr(), input, output))
    }
}
