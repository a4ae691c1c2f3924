//! Forward and inverse 2-D transform through the host library, then a
//! metrics dump.

use num_complex::Complex32;
use veda_hipfft::prelude::*;

fn main() -> Result<()> {
    let config = Config::builder().max_rank(2).build()?;
    let library = std::sync::Arc::new(HostFftLibrary::new());
    let adapter = FftAdapter::with_config(library, config)?;

    println!("library version {}", adapter.version()?);

    let n = [8i64, 16];
    let mut plan = adapter.create()?;
    let work_size = plan.configure(&TransformDescriptor::new(&n, VendorFftType::C2C))?;
    plan.set_owned_work_area(DeviceBuffer::zeroed(work_size))?;
    println!("plan {:?}, work area {} bytes", plan.handle(), work_size);

    let volume = (n[0] * n[1]) as usize;
    let signal: Vec<Complex32> = (0..volume)
        .map(|i| Complex32::new((i as f32 * 0.1).sin(), 0.0))
        .collect();
    let mut data = DeviceBuffer::from_slice(&signal);
    let ptr = data.pointer::<Complex32>();

    unsafe {
        plan.execute_c2c(ptr, ptr, FftDirection::Forward)?;
        plan.execute_c2c(ptr, ptr, FftDirection::Inverse)?;
    }
    adapter.synchronize(StreamRef::DEFAULT)?;

    let max_error = signal
        .iter()
        .zip(data.read::<Complex32>())
        .map(|(&x, y)| (x - y / volume as f32).norm())
        .fold(0.0f32, f32::max);
    println!("max round-trip error {max_error:e}");

    plan.destroy()?;

    #[cfg(feature = "telemetry")]
    {
        use veda_hipfft::telemetry::{ConsoleExporter, MetricsExporter};
        ConsoleExporter::new(true).export(&adapter.metrics().snapshot())?;
    }

    Ok(())
}
