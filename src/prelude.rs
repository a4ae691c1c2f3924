pub use crate::adapter::FftAdapter;
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::library::{FftLibrary, HostFftLibrary, RawFftHandle};
pub use crate::memory::{DeviceBuffer, Platform, Pointer};
pub use crate::plan::{FftPlan, PlanState};
pub use crate::stream::StreamRef;
pub use crate::types::{
    DataLayout, FftDirection, FftType, TransformDescriptor, VendorFftType,
};

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{Metrics, MetricsSnapshot};

#[cfg(feature = "hip")]
pub use crate::library::HipFftLibrary;
