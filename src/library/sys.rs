//! Raw declarations from `hipfft/hipfft.h`, plus the one HIP runtime call
//! the adapter needs.
//!
//! Linking is set up by the build script when the `hip` feature is on.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

use std::ffi::{c_int, c_longlong, c_void};

use num_complex::{Complex32, Complex64};

pub type hipfftHandle = *mut c_void;
pub type hipfftResult = c_int;
pub type hipfftType = c_int;
pub type hipStream_t = *mut c_void;
pub type hipError_t = c_int;

pub const hipSuccess: hipError_t = 0;

/// `hipfftComplex`, layout-compatible with `Complex32`.
pub type hipfftComplex = Complex32;
/// `hipfftDoubleComplex`, layout-compatible with `Complex64`.
pub type hipfftDoubleComplex = Complex64;
pub type hipfftReal = f32;
pub type hipfftDoubleReal = f64;

pub const HIPFFT_FORWARD: c_int = -1;
pub const HIPFFT_BACKWARD: c_int = 1;

extern "C" {
    pub fn hipStreamSynchronize(stream: hipStream_t) -> hipError_t;

    pub fn hipfftGetVersion(version: *mut c_int) -> hipfftResult;

    pub fn hipfftCreate(plan: *mut hipfftHandle) -> hipfftResult;
    pub fn hipfftDestroy(plan: hipfftHandle) -> hipfftResult;

    pub fn hipfftSetStream(plan: hipfftHandle, stream: hipStream_t) -> hipfftResult;
    pub fn hipfftSetAutoAllocation(plan: hipfftHandle, auto_allocate: c_int) -> hipfftResult;

    pub fn hipfftMakePlanMany64(
        plan: hipfftHandle,
        rank: c_int,
        n: *mut c_longlong,
        inembed: *mut c_longlong,
        istride: c_longlong,
        idist: c_longlong,
        onembed: *mut c_longlong,
        ostride: c_longlong,
        odist: c_longlong,
        fft_type: hipfftType,
        batch: c_longlong,
        work_size: *mut usize,
    ) -> hipfftResult;

    pub fn hipfftGetSize(plan: hipfftHandle, work_size: *mut usize) -> hipfftResult;
    pub fn hipfftSetWorkArea(plan: hipfftHandle, work_area: *mut c_void) -> hipfftResult;

    pub fn hipfftExecC2C(
        plan: hipfftHandle,
        idata: *mut hipfftComplex,
        odata: *mut hipfftComplex,
        direction: c_int,
    ) -> hipfftResult;
    pub fn hipfftExecZ2Z(
        plan: hipfftHandle,
        idata: *mut hipfftDoubleComplex,
        odata: *mut hipfftDoubleComplex,
        direction: c_int,
    ) -> hipfftResult;
    pub fn hipfftExecR2C(
        plan: hipfftHandle,
        idata: *mut hipfftReal,
        odata: *mut hipfftComplex,
    ) -> hipfftResult;
    pub fn hipfftExecD2Z(
        plan: hipfftHandle,
        idata: *mut hipfftDoubleReal,
        odata: *mut hipfftDoubleComplex,
    ) -> hipfftResult;
    pub fn hipfftExecC2R(
        plan: hipfftHandle,
        idata: *mut hipfftComplex,
        odata: *mut hipfftReal,
    ) -> hipfftResult;
    pub fn hipfftExecZ2D(
        plan: hipfftHandle,
        idata: *mut hipfftDoubleComplex,
        odata: *mut hipfftDoubleReal,
    ) -> hipfftResult;
}
