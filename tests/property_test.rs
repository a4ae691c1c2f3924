//! Randomized checks of transform identities on the host library.

use num_complex::{Complex32, Complex64};
use proptest::prelude::*;
use veda_hipfft::prelude::*;

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

/// Extents for rank 1 to 3 with a bounded total volume.
fn extents() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..=8, 1..=3)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn c2c_forward_inverse_scales_by_volume(
        n in extents(),
        batch in 1i64..=3,
        seed in prop::collection::vec(-4.0f32..4.0, 2 * 8 * 8 * 8 * 3),
    ) {
        let adapter = FftAdapter::new(HostFftLibrary::new());
        let desc = TransformDescriptor::new(&n, VendorFftType::C2C).with_batch(batch);
        let mut plan = ready_plan(&adapter, &desc);

        let volume: i64 = n.iter().product();
        let len = (volume * batch) as usize;
        let input: Vec<Complex32> = seed
            .chunks_exact(2)
            .take(len)
            .map(|c| Complex32::new(c[0], c[1]))
            .collect();
        let mut data = DeviceBuffer::from_slice(&input);
        let ptr = data.pointer::<Complex32>();

        unsafe {
            plan.execute_c2c(ptr, ptr, FftDirection::Forward).unwrap();
            plan.execute_c2c(ptr, ptr, FftDirection::Inverse).unwrap();
        }
        adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

        let scale = volume as f32;
        for (&x, y) in input.iter().zip(data.read::<Complex32>()) {
            prop_assert!((x - y / scale).norm() < 1e-4, "{} vs {}", x, y / scale);
        }
    }

    #[test]
    fn d2z_z2d_round_trip(
        n in extents(),
        seed in prop::collection::vec(-10.0f64..10.0, 8 * 8 * 8),
    ) {
        let adapter = FftAdapter::new(HostFftLibrary::new());
        let mut forward = ready_plan(&adapter, &TransformDescriptor::new(&n, VendorFftType::D2Z));
        let mut inverse = ready_plan(&adapter, &TransformDescriptor::new(&n, VendorFftType::Z2D));

        let volume: i64 = n.iter().product();
        let mut half = n.clone();
        if let Some(last) = half.last_mut() {
            *last = *last / 2 + 1;
        }
        let spectrum_len: i64 = half.iter().product();

        let signal = &seed[..volume as usize];
        let mut real = DeviceBuffer::from_slice(signal);
        let mut spectrum = DeviceBuffer::zeroed(spectrum_len as usize * 16);
        let mut restored = DeviceBuffer::zeroed(volume as usize * 8);

        unsafe {
            forward.execute_d2z(real.pointer(), spectrum.pointer())
                .unwrap();
            inverse.execute_z2d(spectrum.pointer(), restored.pointer())
                .unwrap();
        }
        adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

        let scale = volume as f64;
        for (x, y) in signal.iter().zip(restored.read::<f64>()) {
            prop_assert!((x - y / scale).abs() < 1e-9);
        }
    }

    #[test]
    fn z2z_is_linear(
        len in 1i64..=16,
        a in prop::collection::vec(-1.0f64..1.0, 32),
        b in prop::collection::vec(-1.0f64..1.0, 32),
        alpha in -3.0f64..3.0,
    ) {
        let adapter = FftAdapter::new(HostFftLibrary::new());
        let mut plan = ready_plan(&adapter, &TransformDescriptor::new(&[len], VendorFftType::Z2Z));
        let len = len as usize;

        let xa: Vec<Complex64> = a
            .chunks_exact(2)
            .take(len)
            .map(|c| Complex64::new(c[0], c[1]))
            .collect();
        let xb: Vec<Complex64> = b
            .chunks_exact(2)
            .take(len)
            .map(|c| Complex64::new(c[0], c[1]))
            .collect();
        let mixed: Vec<Complex64> = xa.iter().zip(&xb).map(|(&p, &q)| p * alpha + q).collect();

        let mut bufs = [
            DeviceBuffer::from_slice(&xa),
            DeviceBuffer::from_slice(&xb),
            DeviceBuffer::from_slice(&mixed),
        ];
        for buf in bufs.iter_mut() {
            let ptr = buf.pointer::<Complex64>();
            unsafe { plan.execute_z2z(ptr, ptr, FftDirection::Forward).unwrap() };
        }
        adapter.library().synchronize(StreamRef::DEFAULT).unwrap();

        let fa = bufs[0].read::<Complex64>();
        let fb = bufs[1].read::<Complex64>();
        let fm = bufs[2].read::<Complex64>();
        for i in 0..len {
            prop_assert!((fa[i] * alpha + fb[i] - fm[i]).norm() < 1e-9);
        }
    }

    #[test]
    fn rank_outside_supported_range_is_invalid(rank in prop_oneof![Just(0usize), 4usize..8]) {
        let adapter = FftAdapter::new(HostFftLibrary::new());
        let plan = adapter.create().unwrap();
        let n = vec![2i64; rank];
        let desc = TransformDescriptor::new(&n, VendorFftType::C2C);
        let err = adapter.make_plan_many(plan.handle(), &desc).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
