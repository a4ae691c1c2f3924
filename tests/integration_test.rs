use std::ffi::c_void;
use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::{Complex32, Complex64};
use veda_hipfft::prelude::*;
use veda_hipfft::{to_vendor_type, LibraryVersion, Precision};

fn host_adapter() -> FftAdapter<HostFftLibrary> {
    FftAdapter::new(HostFftLibrary::new())
}

/// Direct O(n^2) DFT; `sign` is -1 for forward, +1 for inverse.
fn dft(input: &[Complex64], sign: f64) -> Vec<Complex64> {
    let n = input.len();
    (0..n)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .map(|(j, &x)| {
                    x * Complex64::from_polar(1.0, sign * 2.0 * PI * (j * k) as f64 / n as f64)
                })
                .sum()
        })
        .collect()
}

fn ready_plan(
    adapter: &FftAdapter<HostFftLibrary>,
    desc: &TransformDescriptor,
) -> FftPlan<HostFftLibrary> {
    let mut plan = adapter.create().unwrap();
    let work_size = plan.configure(desc).unwrap();
    plan.set_owned_work_area(DeviceBuffer::zeroed(work_size))
        .unwrap();
    plan
}

fn assert_close64(actual: &[Complex64], expected: &[Complex64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((*a - *e).norm() < tol, "index {i}: {a} vs {e}");
    }
}

#[test]
fn test_version_decodes() {
    let adapter = host_adapter();
    let version = adapter.version().unwrap();
    assert_eq!(version, LibraryVersion::new(1, 0, 0));
}

#[test]
fn test_configure_ranks_one_to_three() {
    let adapter = host_adapter();
    for n in [vec![16], vec![4, 8], vec![2, 3, 4]] {
        let mut plan = adapter.create().unwrap();
        let work_size = plan
            .configure(&TransformDescriptor::new(&n, VendorFftType::C2C))
            .unwrap();
        let elements: i64 = n.iter().product();
        assert_eq!(work_size, elements as usize * 8);
        assert_eq!(adapter.get_size(plan.handle()).unwrap(), work_size);
    }
}

#[test]
fn test_rank_zero_fails_with_invalid_argument() {
    let adapter = host_adapter();
    let plan = adapter.create().unwrap();
    let desc = TransformDescriptor::many(0, &[], &[], 1, 0, &[], 1, 0, VendorFftType::C2C, 1);
    let err = adapter.make_plan_many(plan.handle(), &desc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_reconfigure_replaces_shape() {
    let adapter = host_adapter();
    let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[8], VendorFftType::C2C));
    assert_eq!(plan.work_size(), Some(64));

    let work_size = plan
        .configure(&TransformDescriptor::new(&[4, 4], VendorFftType::Z2Z))
        .unwrap();
    assert_eq!(work_size, 256);
    assert_eq!(plan.vendor_type(), Some(VendorFftType::Z2Z));
    assert_eq!(plan.state().name(), "configured");
}

#[test]
fn test_execute_before_work_area() {
    let adapter = host_adapter();
    let mut plan = adapter.create().unwrap();
    plan.configure(&TransformDescriptor::new(&[8], VendorFftType::C2C))
        .unwrap();

    let mut data = DeviceBuffer::zeroed(64);
    let ptr = data.pointer::<Complex32>();

    let err = unsafe { plan.execute_c2c(ptr, ptr, FftDirection::Forward) }.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientWorkArea);

    // Going around the plan, the vendor reports the missing work area itself.
    let err = unsafe { adapter.exec_c2c(plan.handle(), ptr, ptr, FftDirection::Forward) }
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientWorkArea);
    assert!(err.to_string().contains("HIPFFT_NO_WORKSPACE"));
}

#[test]
fn test_destroyed_handle_is_rejected() {
    let adapter = host_adapter();
    let plan = adapter.create().unwrap();
    let raw = plan.into_raw();
    adapter.destroy(raw).unwrap();

    assert_eq!(adapter.destroy(raw).unwrap_err().kind(), ErrorKind::InvalidHandle);
    assert_eq!(adapter.get_size(raw).unwrap_err().kind(), ErrorKind::InvalidHandle);

    let err = adapter.set_stream(raw, StreamRef::DEFAULT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);

    let desc = TransformDescriptor::new(&[8], VendorFftType::C2C);
    let err = adapter.make_plan_many(raw, &desc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);

    let mut data = DeviceBuffer::zeroed(64);
    let err = unsafe { adapter.set_work_area(raw, data.pointer(), 64) }.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);

    let ptr = data.pointer::<Complex32>();
    let err = unsafe { adapter.exec_c2c(raw, ptr, ptr, FftDirection::Forward) }.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);
}

#[test]
fn test_c2c_round_trip() {
    let adapter = host_adapter();
    let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[8], VendorFftType::C2C));

    let input: Vec<Complex32> = (0..8)
        .map(|i| Complex32::new(i as f32 * 0.5 - 1.0, (i % 3) as f32))
        .collect();
    let mut data = DeviceBuffer::from_slice(&input);
    let ptr = data.pointer::<Complex32>();

    unsafe {
        plan.execute_c2c(ptr, ptr, FftDirection::Forward).unwrap();
        plan.execute_c2c(ptr, ptr, FftDirection::Inverse).unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    let output = data.read::<Complex32>();
    for (&x, &y) in input.iter().zip(&output) {
        assert!((x - y / 8.0).norm() < 1e-5, "{x} vs {}", y / 8.0);
    }
}

#[test]
fn test_z2z_matches_direct_dft_2d() {
    let adapter = host_adapter();
    let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[3, 4], VendorFftType::Z2Z));

    let input: Vec<Complex64> = (0..12)
        .map(|i| Complex64::new((i as f64).sin(), (i as f64 * 0.7).cos()))
        .collect();
    let mut src = DeviceBuffer::from_slice(&input);
    let mut dst = DeviceBuffer::zeroed(12 * 16);

    unsafe {
        plan.execute_z2z(src.pointer(), dst.pointer(), FftDirection::Forward)
            .unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    let mut expected = vec![Complex64::new(0.0, 0.0); 12];
    for k1 in 0..3 {
        for k2 in 0..4 {
            let mut acc = Complex64::new(0.0, 0.0);
            for j1 in 0..3 {
                for j2 in 0..4 {
                    let phase = -2.0 * PI * ((j1 * k1) as f64 / 3.0 + (j2 * k2) as f64 / 4.0);
                    acc += input[j1 * 4 + j2] * Complex64::from_polar(1.0, phase);
                }
            }
            expected[k1 * 4 + k2] = acc;
        }
    }
    assert_close64(&dst.read::<Complex64>(), &expected, 1e-9);
    assert_eq!(src.read::<Complex64>(), input);
}

#[test]
fn test_batched_strided_input() {
    let adapter = host_adapter();
    // Two transforms of length 4 reading every other element, 8 apart.
    let desc = TransformDescriptor::many(1, &[4], &[4], 2, 8, &[], 1, 0, VendorFftType::Z2Z, 2);
    let mut plan = ready_plan(&adapter, &desc);

    let input: Vec<Complex64> = (0..16)
        .map(|i| Complex64::new(i as f64, -(i as f64)))
        .collect();
    let mut src = DeviceBuffer::from_slice(&input);
    let mut dst = DeviceBuffer::zeroed(8 * 16);

    unsafe {
        plan.execute_z2z(src.pointer(), dst.pointer(), FftDirection::Forward)
            .unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    let output = dst.read::<Complex64>();
    for batch in 0..2 {
        let signal: Vec<Complex64> = (0..4).map(|i| input[batch * 8 + i * 2]).collect();
        assert_close64(&output[batch * 4..batch * 4 + 4], &dft(&signal, -1.0), 1e-9);
    }
}

#[test]
fn test_layout_builders_strided_both_sides() {
    let adapter = host_adapter();
    // Input packed 5 apart per batch, output written every third element.
    let desc = TransformDescriptor::new(&[4], VendorFftType::Z2Z)
        .with_batch(2)
        .with_input_layout(DataLayout::strided(&[4], 1, 5))
        .with_output_layout(DataLayout::strided(&[4], 3, 12));
    let mut plan = ready_plan(&adapter, &desc);

    let input: Vec<Complex64> = (0..10)
        .map(|i| Complex64::new((i as f64).cos(), 0.5 * i as f64))
        .collect();
    let mut src = DeviceBuffer::from_slice(&input);
    let mut dst = DeviceBuffer::zeroed(24 * 16);

    unsafe {
        plan.execute_z2z(src.pointer(), dst.pointer(), FftDirection::Inverse)
            .unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    let output = dst.read::<Complex64>();
    for batch in 0..2 {
        let expected = dft(&input[batch * 5..batch * 5 + 4], 1.0);
        let actual: Vec<Complex64> = (0..4).map(|i| output[batch * 12 + i * 3]).collect();
        assert_close64(&actual, &expected, 1e-9);
    }
    // Gaps between output elements are left alone.
    assert_eq!(output[1], Complex64::new(0.0, 0.0));
}

#[test]
fn test_real_transforms_round_trip() {
    let adapter = host_adapter();
    let mut forward = ready_plan(&adapter, &TransformDescriptor::new(&[6], VendorFftType::D2Z));
    let mut inverse = ready_plan(&adapter, &TransformDescriptor::new(&[6], VendorFftType::Z2D));

    let signal = [0.5, -1.0, 2.0, 0.25, 3.0, -0.75f64];
    let mut real = DeviceBuffer::from_slice(&signal);
    let mut spectrum = DeviceBuffer::zeroed(4 * 16);

    unsafe {
        forward.execute_d2z(real.pointer(), spectrum.pointer())
            .unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    let complex: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    let expected = dft(&complex, -1.0);
    assert_close64(&spectrum.read::<Complex64>(), &expected[..4], 1e-9);

    unsafe {
        inverse.execute_z2d(spectrum.pointer(), real.pointer())
            .unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    for (x, y) in signal.iter().zip(real.read::<f64>()) {
        assert!((x - y / 6.0).abs() < 1e-9);
    }
}

#[test]
fn test_single_precision_real_2d() {
    let adapter = host_adapter();
    let mut forward = ready_plan(&adapter, &TransformDescriptor::new(&[4, 6], VendorFftType::R2C));
    let mut inverse = ready_plan(&adapter, &TransformDescriptor::new(&[4, 6], VendorFftType::C2R));

    let signal: Vec<f32> = (0..24).map(|i| ((i * 7) % 5) as f32 - 2.0).collect();
    let mut real = DeviceBuffer::from_slice(&signal);
    let mut spectrum = DeviceBuffer::zeroed(4 * 4 * 8);
    let mut restored = DeviceBuffer::zeroed(24 * 4);

    unsafe {
        forward.execute_r2c(real.pointer(), spectrum.pointer())
            .unwrap();
        inverse.execute_c2r(spectrum.pointer(), restored.pointer())
            .unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    for (x, y) in signal.iter().zip(restored.read::<f32>()) {
        assert!((x - y / 24.0).abs() < 1e-4, "{x} vs {}", y / 24.0);
    }
}

#[test]
fn test_every_type_translates_or_is_unsupported() {
    for fft_type in FftType::ALL {
        match to_vendor_type(fft_type) {
            Ok(vendor) => assert_eq!(vendor.precision(), fft_type.precision()),
            Err(err) => {
                assert_eq!(fft_type.precision(), Precision::Half);
                assert_eq!(err.kind(), ErrorKind::UnsupportedType);
            }
        }
    }
}

#[test]
fn test_generic_dispatch_matches_typed_call() {
    let adapter = host_adapter();
    let desc = TransformDescriptor::new(&[5], VendorFftType::C2C);
    let mut typed = ready_plan(&adapter, &desc);
    let mut generic = ready_plan(&adapter, &desc);

    let input: Vec<Complex32> = (0..5).map(|i| Complex32::new(i as f32, 1.0)).collect();
    let mut a = DeviceBuffer::from_slice(&input);
    let mut b = DeviceBuffer::from_slice(&input);

    unsafe {
        let pa = a.pointer::<Complex32>();
        typed.execute_c2c(pa, pa, FftDirection::Inverse).unwrap();
        let pb = b.pointer::<c_void>();
        generic.execute(pb, pb, FftType::C2CInverse).unwrap();
    }
    adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

    assert_eq!(a.read::<Complex32>(), b.read::<Complex32>());
}

#[test]
fn test_generic_dispatch_rejects_half_precision() {
    let adapter = host_adapter();
    let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[4], VendorFftType::C2C));
    let mut data = DeviceBuffer::zeroed(64);
    let ptr = data.pointer::<c_void>();

    let err = unsafe { plan.execute(ptr, ptr, FftType::C2CHalfForward) }.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
}

#[test]
fn test_stream_ordering() {
    let library = Arc::new(HostFftLibrary::new());
    let adapter = FftAdapter::from_shared(Arc::clone(&library));
    let stream = library.create_stream();

    let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[4], VendorFftType::C2C));
    plan.set_stream(stream).unwrap();

    let input: Vec<Complex32> = [1.0, 2.0, 0.0, -1.0]
        .iter()
        .map(|&re| Complex32::new(re, 0.0))
        .collect();
    let mut data = DeviceBuffer::from_slice(&input);
    let ptr = data.pointer::<Complex32>();

    unsafe {
        plan.execute_c2c(ptr, ptr, FftDirection::Forward).unwrap();
        plan.execute_c2c(ptr, ptr, FftDirection::Inverse).unwrap();
    }

    // Nothing runs until the stream is synchronized.
    assert_eq!(library.pending(stream), 2);
    assert_eq!(library.pending(StreamRef::DEFAULT), 0);
    assert_eq!(data.read::<Complex32>(), input);

    library.synchronize(stream).unwrap();
    for (&x, y) in input.iter().zip(data.read::<Complex32>()) {
        assert!((x - y / 4.0).norm() < 1e-5);
    }
}

#[test]
fn test_undersized_work_area_rejected() {
    let adapter = host_adapter();
    let mut plan = adapter.create().unwrap();
    let work_size = plan
        .configure(&TransformDescriptor::new(&[32], VendorFftType::C2C))
        .unwrap();

    let err = plan
        .set_owned_work_area(DeviceBuffer::zeroed(work_size - 1))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientWorkArea { required, provided }
            if required == work_size && provided == work_size - 1
    ));
    assert_eq!(plan.state().name(), "configured");
}

#[test]
fn test_unchecked_config_still_checks_owned_work_area() {
    let config = Config::builder()
        .check_work_area_size(false)
        .build()
        .unwrap();
    let adapter = FftAdapter::with_config(Arc::new(HostFftLibrary::new()), config).unwrap();
    let mut plan = adapter.create().unwrap();
    let work_size = plan
        .configure(&TransformDescriptor::new(&[32], VendorFftType::C2C))
        .unwrap();

    let err = plan
        .set_owned_work_area(DeviceBuffer::zeroed(8))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientWorkArea);
    assert_eq!(plan.state().name(), "configured");

    // The raw binding leaves the size to the caller.
    let mut work = DeviceBuffer::zeroed(8);
    unsafe { adapter.set_work_area(plan.handle(), work.pointer(), 8) }.unwrap();

    plan.set_owned_work_area(DeviceBuffer::zeroed(work_size))
        .unwrap();
    assert_eq!(plan.state().name(), "executable");
}

#[test]
fn test_dropping_plan_with_queued_transform() {
    let library = Arc::new(HostFftLibrary::new());
    let adapter = FftAdapter::from_shared(Arc::clone(&library));
    let stream = library.create_stream();

    let mut data = DeviceBuffer::from_slice(&[Complex32::new(1.0, 0.0); 8]);
    {
        let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[8], VendorFftType::C2C));
        plan.set_stream(stream).unwrap();
        let ptr = data.pointer::<Complex32>();
        unsafe { plan.execute_c2c(ptr, ptr, FftDirection::Forward).unwrap() };
        assert_eq!(library.pending(stream), 1);
    }

    // The plan drained its stream before freeing the work area.
    assert_eq!(library.pending(stream), 0);
    let unrelated = DeviceBuffer::from_slice(&[0x5555_5555_5555_5555u64; 8]);
    adapter.synchronize(stream).unwrap();

    assert!(unrelated.read::<u64>().iter().all(|&w| w == 0x5555_5555_5555_5555));
    let spectrum = data.read::<Complex32>();
    assert_eq!(spectrum[0], Complex32::new(8.0, 0.0));
    assert!(spectrum[1..].iter().all(|v| v.norm() < 1e-6));
}

#[cfg(feature = "telemetry")]
#[test]
fn test_metrics_track_plans() {
    let adapter = host_adapter();
    {
        let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[4], VendorFftType::C2C));
        let mut data = DeviceBuffer::zeroed(32);
        let ptr = data.pointer::<Complex32>();
        unsafe { plan.execute_c2c(ptr, ptr, FftDirection::Forward).unwrap() };
        adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

        let snapshot = adapter.metrics().snapshot();
        assert_eq!(snapshot.live_plans(), 1);
        assert_eq!(snapshot.plans_configured, 1);
        assert_eq!(snapshot.executions, 1);
    }

    let snapshot = adapter.metrics().snapshot();
    assert_eq!(snapshot.live_plans(), 0);
    assert_eq!(snapshot.failures, 0);
}
