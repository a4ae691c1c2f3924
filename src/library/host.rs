//! In-process implementation of the hipFFT contract.
//!
//! Plans, status codes, work-area rules and stream ordering behave like the
//! vendor library; the transforms themselves run on host memory through
//! `rustfft` when a stream is synchronized.

use std::collections::{HashMap, VecDeque};
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

use num_complex::{Complex, Complex32, Complex64};
use parking_lot::Mutex;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftNum, FftPlanner};

use super::{FftLibrary, RawFftHandle, RawResult};
use crate::error::{Error, Result};
use crate::memory::{DeviceBuffer, Platform};
use crate::status::Status;
use crate::stream::StreamRef;
use crate::types::{
    DataLayout, FftDirection, LibraryVersion, Precision, TransformDescriptor, VendorFftType,
};

const MAX_RANK: usize = 3;

/// One side of a resolved plan, in elements.
#[derive(Debug, Clone)]
struct SideLayout {
    extents: Vec<usize>,
    embed: Vec<usize>,
    stride: usize,
    dist: usize,
}

impl SideLayout {
    fn resolve(extents: Vec<i64>, layout: &DataLayout) -> RawResult<Self> {
        let extents: Vec<usize> = extents.into_iter().map(|e| e as usize).collect();

        if layout.is_contiguous() {
            let dist = extents.iter().product();
            return Ok(Self {
                embed: extents.clone(),
                extents,
                stride: 1,
                dist,
            });
        }

        if layout.embed.len() != extents.len()
            || layout.stride < 1
            || layout.dist < 1
            || layout.embed.iter().any(|&e| e < 1)
        {
            return Err(Status::InvalidValue);
        }
        let embed: Vec<usize> = layout.embed.iter().map(|&e| e as usize).collect();
        // The outermost embed entry only matters through `dist`.
        if embed.iter().zip(&extents).skip(1).any(|(e, x)| e < x) {
            return Err(Status::InvalidValue);
        }

        Ok(Self {
            extents,
            embed,
            stride: layout.stride as usize,
            dist: layout.dist as usize,
        })
    }

    fn offset(&self, index: &[usize]) -> usize {
        let linear = index
            .iter()
            .zip(&self.embed)
            .fold(0, |acc, (&k, &e)| acc * e + k);
        linear * self.stride
    }
}

struct AxisKernels<T: FftNum> {
    forward: Vec<Arc<dyn Fft<T>>>,
    inverse: Vec<Arc<dyn Fft<T>>>,
}

impl<T: FftNum> AxisKernels<T> {
    fn plan(n: &[usize]) -> Self {
        let mut planner = FftPlanner::<T>::new();
        Self {
            forward: n.iter().map(|&len| planner.plan_fft_forward(len)).collect(),
            inverse: n.iter().map(|&len| planner.plan_fft_inverse(len)).collect(),
        }
    }

    fn get(&self, axis: usize, direction: FftDirection) -> &Arc<dyn Fft<T>> {
        match direction {
            FftDirection::Forward => &self.forward[axis],
            FftDirection::Inverse => &self.inverse[axis],
        }
    }
}

enum Kernels {
    Single(AxisKernels<f32>),
    Double(AxisKernels<f64>),
}

/// A committed plan shape.
struct PlanConfig {
    vendor_type: VendorFftType,
    n: Vec<usize>,
    input: SideLayout,
    output: SideLayout,
    batch: usize,
    work_size: usize,
    kernels: Kernels,
}

impl PlanConfig {
    fn resolve(desc: &TransformDescriptor) -> RawResult<Self> {
        if desc.rank == 0 || desc.rank > MAX_RANK || desc.n.len() != desc.rank {
            return Err(Status::InvalidValue);
        }
        if desc.n.iter().any(|&e| e < 1) {
            return Err(Status::InvalidSize);
        }
        if desc.batch < 1 {
            return Err(Status::InvalidValue);
        }

        let n: Vec<usize> = desc.n.iter().map(|&e| e as usize).collect();
        let input = SideLayout::resolve(desc.input_extents(), &desc.input)?;
        let output = SideLayout::resolve(desc.output_extents(), &desc.output)?;

        let precision = desc.fft_type.precision();
        let work_size = n
            .iter()
            .try_fold(precision.complex_size(), |acc, &e| acc.checked_mul(e))
            .ok_or(Status::InvalidSize)?;

        let kernels = match precision {
            Precision::Single => Kernels::Single(AxisKernels::plan(&n)),
            Precision::Double => Kernels::Double(AxisKernels::plan(&n)),
            Precision::Half => return Err(Status::InvalidType),
        };

        Ok(Self {
            vendor_type: desc.fft_type,
            n,
            input,
            output,
            batch: desc.batch as usize,
            work_size,
            kernels,
        })
    }

    /// # Safety
    /// `input`, `output` and `work` must address memory laid out as this
    /// plan describes.
    unsafe fn execute(&self, input: usize, output: usize, work: *mut u8, direction: FftDirection) {
        match &self.kernels {
            Kernels::Single(kernels) => {
                self.execute_with::<f32>(kernels, input, output, work.cast(), direction)
            }
            Kernels::Double(kernels) => {
                self.execute_with::<f64>(kernels, input, output, work.cast(), direction)
            }
        }
    }

    unsafe fn execute_with<T: FftNum>(
        &self,
        kernels: &AxisKernels<T>,
        input: usize,
        output: usize,
        work: *mut Complex<T>,
        direction: FftDirection,
    ) {
        let total: usize = self.n.iter().product();
        let work = std::slice::from_raw_parts_mut(work, total);
        let real_input = self.vendor_type.input_element().is_real();
        let real_output = self.vendor_type.output_element().is_real();
        let last = self.n.len() - 1;
        let mut index = vec![0usize; self.n.len()];

        for batch in 0..self.batch {
            let in_base = batch * self.input.dist;
            let out_base = batch * self.output.dist;

            for (flat, slot) in work.iter_mut().enumerate() {
                unravel(flat, &self.n, &mut index);
                *slot = if real_input {
                    let src = (input as *const T).add(in_base + self.input.offset(&index));
                    Complex::new(src.read(), T::zero())
                } else if index[last] >= self.input.extents[last] {
                    // Half spectrum input: the rest follows from Hermitian symmetry.
                    mirror(&mut index, &self.n);
                    let src = (input as *const Complex<T>).add(in_base + self.input.offset(&index));
                    src.read().conj()
                } else {
                    let src = (input as *const Complex<T>).add(in_base + self.input.offset(&index));
                    src.read()
                };
            }

            transform_axes(work, &self.n, kernels, direction);

            let out_total: usize = self.output.extents.iter().product();
            for flat in 0..out_total {
                unravel(flat, &self.output.extents, &mut index);
                let value = work[ravel(&index, &self.n)];
                let offset = out_base + self.output.offset(&index);
                if real_output {
                    (output as *mut T).add(offset).write(value.re);
                } else {
                    (output as *mut Complex<T>).add(offset).write(value);
                }
            }
        }
    }
}

fn unravel(mut flat: usize, extents: &[usize], index: &mut [usize]) {
    for (slot, &extent) in index.iter_mut().zip(extents).rev() {
        *slot = flat % extent;
        flat /= extent;
    }
}

fn ravel(index: &[usize], extents: &[usize]) -> usize {
    index
        .iter()
        .zip(extents)
        .fold(0, |acc, (&k, &extent)| acc * extent + k)
}

fn mirror(index: &mut [usize], extents: &[usize]) {
    for (k, &extent) in index.iter_mut().zip(extents) {
        *k = (extent - *k) % extent;
    }
}

/// Unnormalized multi-dimensional transform of a dense row-major buffer.
fn transform_axes<T: FftNum>(
    data: &mut [Complex<T>],
    n: &[usize],
    kernels: &AxisKernels<T>,
    direction: FftDirection,
) {
    let mut lines = Vec::new();
    for axis in (0..n.len()).rev() {
        let fft = kernels.get(axis, direction);
        let len = n[axis];
        let stride: usize = n[axis + 1..].iter().product();
        if stride == 1 {
            fft.process(data);
            continue;
        }

        let repeats: usize = n[..axis].iter().product();
        let block = len * stride;
        lines.clear();
        for outer in 0..repeats {
            for offset in 0..stride {
                let base = outer * block + offset;
                lines.extend((0..len).map(|i| data[base + i * stride]));
            }
        }

        fft.process(&mut lines);

        for (line, chunk) in lines.chunks_exact(len).enumerate() {
            let base = (line / stride) * block + line % stride;
            for (i, &value) in chunk.iter().enumerate() {
                data[base + i * stride] = value;
            }
        }
    }
}

#[derive(Clone)]
enum WorkArea {
    Borrowed(usize),
    Owned(Arc<Mutex<DeviceBuffer>>),
}

struct HostPlan {
    stream: StreamRef,
    auto_allocate: bool,
    config: Option<Arc<PlanConfig>>,
    work_area: Option<WorkArea>,
}

impl HostPlan {
    fn new() -> Self {
        Self {
            stream: StreamRef::DEFAULT,
            auto_allocate: true,
            config: None,
            work_area: None,
        }
    }
}

struct PendingTransform {
    config: Arc<PlanConfig>,
    input: usize,
    output: usize,
    work_area: WorkArea,
    direction: FftDirection,
}

impl PendingTransform {
    unsafe fn run(self) {
        match &self.work_area {
            WorkArea::Borrowed(addr) => {
                self.config
                    .execute(self.input, self.output, *addr as *mut u8, self.direction)
            }
            WorkArea::Owned(buffer) => {
                let mut buffer = buffer.lock();
                let work = buffer.pointer::<u8>().raw();
                self.config
                    .execute(self.input, self.output, work, self.direction)
            }
        }
    }
}

struct HostState {
    next_handle: usize,
    next_stream: usize,
    plans: HashMap<usize, HostPlan>,
    streams: HashMap<usize, VecDeque<PendingTransform>>,
}

/// Host emulation of hipFFT.
///
/// Plans start with auto-allocation enabled, as in the vendor library.
/// Executions are queued per stream and run, in order, by
/// [`FftLibrary::synchronize`].
pub struct HostFftLibrary {
    state: Mutex<HostState>,
}

impl HostFftLibrary {
    /// Version reported through `get_version`.
    pub const VERSION: LibraryVersion = LibraryVersion {
        major: 1,
        minor: 0,
        patch: 0,
    };

    pub fn new() -> Self {
        let mut streams = HashMap::new();
        streams.insert(StreamRef::DEFAULT.as_raw(), VecDeque::new());
        Self {
            state: Mutex::new(HostState {
                next_handle: 1,
                next_stream: 1,
                plans: HashMap::new(),
                streams,
            }),
        }
    }

    /// Creates an empty stream.
    pub fn create_stream(&self) -> StreamRef {
        let mut state = self.state.lock();
        let id = state.next_stream;
        state.next_stream += 1;
        state.streams.insert(id, VecDeque::new());
        StreamRef::from_raw(id)
    }

    /// Drains and removes `stream`. The default stream cannot be destroyed.
    pub fn destroy_stream(&self, stream: StreamRef) -> Result<()> {
        if stream.is_default() {
            return Err(Error::vendor("hostStreamDestroy", Status::InvalidValue));
        }
        FftLibrary::synchronize(self, stream)
            .map_err(|status| Error::vendor("hostStreamDestroy", status))?;
        self.state.lock().streams.remove(&stream.as_raw());
        Ok(())
    }

    /// Number of transforms waiting on `stream`.
    pub fn pending(&self, stream: StreamRef) -> usize {
        self.state
            .lock()
            .streams
            .get(&stream.as_raw())
            .map_or(0, VecDeque::len)
    }

    /// Number of handles created and not yet destroyed.
    pub fn live_plans(&self) -> usize {
        self.state.lock().plans.len()
    }

    fn enqueue(
        &self,
        handle: RawFftHandle,
        expected: VendorFftType,
        input: usize,
        output: usize,
        direction: FftDirection,
    ) -> RawResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let plan = state
            .plans
            .get(&handle.as_raw())
            .ok_or(Status::InvalidPlan)?;
        let config = plan.config.clone().ok_or(Status::InvalidPlan)?;
        if config.vendor_type != expected {
            return Err(Status::InvalidType);
        }
        if input == 0 || output == 0 {
            return Err(Status::InvalidValue);
        }
        let align = config.vendor_type.precision().real_size();
        if input % align != 0 || output % align != 0 {
            return Err(Status::UnalignedData);
        }
        let work_area = plan.work_area.clone().ok_or(Status::NoWorkspace)?;

        let queue = state
            .streams
            .get_mut(&plan.stream.as_raw())
            .ok_or(Status::InvalidValue)?;
        queue.push_back(PendingTransform {
            config,
            input,
            output,
            work_area,
            direction,
        });
        Ok(())
    }
}

impl Default for HostFftLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostFftLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HostFftLibrary")
            .field("live_plans", &state.plans.len())
            .field("streams", &state.streams.len())
            .finish()
    }
}

impl FftLibrary for HostFftLibrary {
    fn name(&self) -> &'static str {
        "host"
    }

    fn platform(&self) -> Platform {
        Platform::Host
    }

    /// Runs everything enqueued on `stream`, in enqueue order.
    fn synchronize(&self, stream: StreamRef) -> RawResult<()> {
        let queue = {
            let mut state = self.state.lock();
            let queue = state
                .streams
                .get_mut(&stream.as_raw())
                .ok_or(Status::InvalidValue)?;
            std::mem::take(queue)
        };

        for transform in queue {
            // SAFETY: the exec caller promised the buffers stay valid until
            // the stream is synchronized, which is now.
            unsafe { transform.run() };
        }
        Ok(())
    }

    fn get_version(&self) -> RawResult<i32> {
        Ok(Self::VERSION.packed())
    }

    fn create(&self) -> RawResult<RawFftHandle> {
        let mut state = self.state.lock();
        let id = state.next_handle;
        state.next_handle += 1;
        state.plans.insert(id, HostPlan::new());
        Ok(RawFftHandle::from_raw(id))
    }

    fn destroy(&self, handle: RawFftHandle) -> RawResult<()> {
        self.state
            .lock()
            .plans
            .remove(&handle.as_raw())
            .map(|_| ())
            .ok_or(Status::InvalidPlan)
    }

    fn set_auto_allocation(&self, handle: RawFftHandle, enabled: bool) -> RawResult<()> {
        let mut state = self.state.lock();
        let plan = state
            .plans
            .get_mut(&handle.as_raw())
            .ok_or(Status::InvalidPlan)?;
        plan.auto_allocate = enabled;
        Ok(())
    }

    fn set_stream(&self, handle: RawFftHandle, stream: StreamRef) -> RawResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let plan = state
            .plans
            .get_mut(&handle.as_raw())
            .ok_or(Status::InvalidPlan)?;
        if !state.streams.contains_key(&stream.as_raw()) {
            return Err(Status::InvalidValue);
        }
        plan.stream = stream;
        Ok(())
    }

    fn make_plan_many(
        &self,
        handle: RawFftHandle,
        desc: &TransformDescriptor,
    ) -> RawResult<usize> {
        let mut state = self.state.lock();
        let plan = state
            .plans
            .get_mut(&handle.as_raw())
            .ok_or(Status::InvalidPlan)?;

        // Any previous shape and work area are discarded, even on failure.
        plan.config = None;
        plan.work_area = None;

        let config = PlanConfig::resolve(desc)?;
        let work_size = config.work_size;
        if plan.auto_allocate {
            plan.work_area = Some(WorkArea::Owned(Arc::new(Mutex::new(
                DeviceBuffer::zeroed(work_size),
            ))));
        }
        plan.config = Some(Arc::new(config));
        Ok(work_size)
    }

    fn get_size(&self, handle: RawFftHandle) -> RawResult<usize> {
        let state = self.state.lock();
        let plan = state.plans.get(&handle.as_raw()).ok_or(Status::InvalidPlan)?;
        plan.config
            .as_ref()
            .map(|config| config.work_size)
            .ok_or(Status::InvalidPlan)
    }

    unsafe fn set_work_area(
        &self,
        handle: RawFftHandle,
        work_area: *mut c_void,
    ) -> RawResult<()> {
        let mut state = self.state.lock();
        let plan = state
            .plans
            .get_mut(&handle.as_raw())
            .ok_or(Status::InvalidPlan)?;
        let config = plan.config.as_ref().ok_or(Status::InvalidPlan)?;
        if work_area.is_null() {
            return Err(Status::InvalidValue);
        }
        if (work_area as usize) % config.vendor_type.precision().real_size() != 0 {
            return Err(Status::UnalignedData);
        }
        plan.work_area = Some(WorkArea::Borrowed(work_area as usize));
        Ok(())
    }

    unsafe fn exec_c2c(
        &self,
        handle: RawFftHandle,
        input: *mut Complex32,
        output: *mut Complex32,
        direction: FftDirection,
    ) -> RawResult<()> {
        self.enqueue(
            handle,
            VendorFftType::C2C,
            input as usize,
            output as usize,
            direction,
        )
    }

    unsafe fn exec_z2z(
        &self,
        handle: RawFftHandle,
        input: *mut Complex64,
        output: *mut Complex64,
        direction: FftDirection,
    ) -> RawResult<()> {
        self.enqueue(
            handle,
            VendorFftType::Z2Z,
            input as usize,
            output as usize,
            direction,
        )
    }

    unsafe fn exec_r2c(
        &self,
        handle: RawFftHandle,
        input: *mut f32,
        output: *mut Complex32,
    ) -> RawResult<()> {
        self.enqueue(
            handle,
            VendorFftType::R2C,
            input as usize,
            output as usize,
            FftDirection::Forward,
        )
    }

    unsafe fn exec_d2z(
        &self,
        handle: RawFftHandle,
        input: *mut f64,
        output: *mut Complex64,
    ) -> RawResult<()> {
        self.enqueue(
            handle,
            VendorFftType::D2Z,
            input as usize,
            output as usize,
            FftDirection::Forward,
        )
    }

    unsafe fn exec_c2r(
        &self,
        handle: RawFftHandle,
        input: *mut Complex32,
        output: *mut f32,
    ) -> RawResult<()> {
        self.enqueue(
            handle,
            VendorFftType::C2R,
            input as usize,
            output as usize,
            FftDirection::Inverse,
        )
    }

    unsafe fn exec_z2d(
        &self,
        handle: RawFftHandle,
        input: *mut Complex64,
        output: *mut f64,
    ) -> RawResult<()> {
        self.enqueue(
            handle,
            VendorFftType::Z2D,
            input as usize,
            output as usize,
            FftDirection::Inverse,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(library: &HostFftLibrary, desc: &TransformDescriptor) -> RawFftHandle {
        let handle = library.create().unwrap();
        library.make_plan_many(handle, desc).unwrap();
        handle
    }

    #[test]
    fn test_handles_are_unique_and_tracked() {
        let library = HostFftLibrary::new();
        let a = library.create().unwrap();
        let b = library.create().unwrap();
        assert_ne!(a, b);
        assert!(!a.is_null());
        assert_eq!(library.live_plans(), 2);

        library.destroy(a).unwrap();
        assert_eq!(library.destroy(a), Err(Status::InvalidPlan));
        assert_eq!(library.live_plans(), 1);
    }

    #[test]
    fn test_version() {
        let library = HostFftLibrary::new();
        assert_eq!(library.get_version(), Ok(10_000));
    }

    #[test]
    fn test_work_size_is_one_complex_volume() {
        let library = HostFftLibrary::new();
        let handle = library.create().unwrap();
        let desc = TransformDescriptor::new(&[4, 8], VendorFftType::Z2Z);
        assert_eq!(library.make_plan_many(handle, &desc), Ok(32 * 16));
        assert_eq!(library.get_size(handle), Ok(32 * 16));
    }

    #[test]
    fn test_failed_plan_clears_configuration() {
        let library = HostFftLibrary::new();
        let handle = configured(&library, &TransformDescriptor::new(&[8], VendorFftType::C2C));
        let bad = TransformDescriptor::new(&[0], VendorFftType::C2C);
        assert_eq!(library.make_plan_many(handle, &bad), Err(Status::InvalidSize));
        assert_eq!(library.get_size(handle), Err(Status::InvalidPlan));
    }

    #[test]
    fn test_embed_smaller_than_extent_rejected() {
        let library = HostFftLibrary::new();
        let handle = library.create().unwrap();
        let desc = TransformDescriptor::many(
            2,
            &[4, 8],
            &[4, 6],
            1,
            32,
            &[],
            1,
            0,
            VendorFftType::C2C,
            1,
        );
        assert_eq!(library.make_plan_many(handle, &desc), Err(Status::InvalidValue));
    }

    #[test]
    fn test_exec_without_work_area() {
        let library = HostFftLibrary::new();
        let handle = library.create().unwrap();
        library.set_auto_allocation(handle, false).unwrap();
        library
            .make_plan_many(handle, &TransformDescriptor::new(&[4], VendorFftType::C2C))
            .unwrap();

        let mut data = DeviceBuffer::zeroed(4 * 8);
        let ptr = data.pointer::<Complex32>().raw();
        let status = unsafe { library.exec_c2c(handle, ptr, ptr, FftDirection::Forward) };
        assert_eq!(status, Err(Status::NoWorkspace));
    }

    #[test]
    fn test_exec_type_mismatch() {
        let library = HostFftLibrary::new();
        let handle = configured(&library, &TransformDescriptor::new(&[4], VendorFftType::Z2Z));
        let mut data = DeviceBuffer::zeroed(4 * 8);
        let ptr = data.pointer::<Complex32>().raw();
        let status = unsafe { library.exec_c2c(handle, ptr, ptr, FftDirection::Forward) };
        assert_eq!(status, Err(Status::InvalidType));
    }

    #[test]
    fn test_execution_waits_for_synchronize() {
        let library = HostFftLibrary::new();
        let stream = library.create_stream();
        let handle = configured(&library, &TransformDescriptor::new(&[4], VendorFftType::C2C));
        library.set_stream(handle, stream).unwrap();

        let input = vec![Complex32::new(1.0, 0.0); 4];
        let mut data = DeviceBuffer::from_slice(&input);
        let ptr = data.pointer::<Complex32>().raw();
        unsafe { library.exec_c2c(handle, ptr, ptr, FftDirection::Forward) }.unwrap();

        assert_eq!(library.pending(stream), 1);
        assert_eq!(data.read::<Complex32>(), input);

        library.synchronize(stream).unwrap();
        assert_eq!(library.pending(stream), 0);
        let spectrum = data.read::<Complex32>();
        assert_eq!(spectrum[0], Complex32::new(4.0, 0.0));
        assert!(spectrum[1..].iter().all(|v| v.norm() < 1e-6));
    }

    #[test]
    fn test_set_stream_rejects_unknown_stream() {
        let library = HostFftLibrary::new();
        let handle = library.create().unwrap();
        assert_eq!(
            library.set_stream(handle, StreamRef::from_raw(99)),
            Err(Status::InvalidValue)
        );
    }

    #[test]
    fn test_destroy_stream() {
        let library = HostFftLibrary::new();
        let stream = library.create_stream();
        library.destroy_stream(stream).unwrap();
        assert!(library.synchronize(stream).is_err());
        assert!(library.destroy_stream(StreamRef::DEFAULT).is_err());
    }

    #[test]
    fn test_index_helpers() {
        let mut index = [0usize; 3];
        unravel(23, &[2, 3, 4], &mut index);
        assert_eq!(index, [1, 2, 3]);
        assert_eq!(ravel(&index, &[2, 3, 4]), 23);

        mirror(&mut index, &[2, 3, 4]);
        assert_eq!(index, [1, 1, 1]);
    }
}
