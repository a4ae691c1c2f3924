//! VEDA hipFFT adapter
//!
//! Thin, `Result`-returning layer over the hipFFT plan API: plan creation and
//! destruction, stream binding, batched and strided configuration, work-area
//! management and typed or type-dispatched execution.
//!
//! # Quick Start
//!
//! ```no_run
//! use veda_hipfft::prelude::*;
//! use num_complex::Complex32;
//!
//! # fn main() -> veda_hipfft::Result<()> {
//! let adapter = FftAdapter::new(HostFftLibrary::new());
//! let mut plan = adapter.create()?;
//! let work_size = plan.configure(&TransformDescriptor::new(&[8], VendorFftType::C2C))?;
//! plan.set_owned_work_area(DeviceBuffer::zeroed(work_size))?;
//!
//! let mut data = DeviceBuffer::from_slice(&[Complex32::new(1.0, 0.0); 8]);
//! let ptr = data.pointer::<Complex32>();
//! unsafe { plan.execute_c2c(ptr, ptr, FftDirection::Forward)? };
//! adapter.synchronize(StreamRef::DEFAULT)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Typed errors**: vendor status codes become [`Error`] values with a
//!   logical [`ErrorKind`] and the vendor's diagnostic text
//! - **Owned plans**: [`FftPlan`] releases its handle exactly once and
//!   tracks the create, configure, bind work area, execute order
//! - **Host backend**: [`HostFftLibrary`] runs the same contract on host
//!   memory, for tests and machines without ROCm
//! - **Telemetry**: call tracing and metrics (optional, `telemetry`)
//! - **hipFFT backend**: links the system library (optional, `hip`)

#![warn(missing_debug_implementations)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod library;
pub mod memory;
pub mod plan;
pub mod prelude;
pub mod status;
pub mod stream;
pub mod telemetry;
pub mod types;

pub use adapter::{check_status, FftAdapter};
pub use config::{Config, ConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use library::{FftLibrary, HostFftLibrary, RawFftHandle};
pub use memory::{DeviceBuffer, Platform, Pointer};
pub use plan::{FftPlan, PlanState};
pub use status::{render_status, Status};
pub use stream::StreamRef;
pub use types::{
    to_vendor_type, DataLayout, FftDirection, FftType, LibraryVersion, Precision,
    TransformDescriptor, VendorFftType,
};

#[cfg(feature = "hip")]
pub use library::HipFftLibrary;
