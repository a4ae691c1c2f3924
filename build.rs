//! Build script for veda-hipfft.
//!
//! When the `hip` feature is enabled, points the linker at the ROCm
//! installation that provides `libhipfft`.
//!
//! Requirements (hip feature only):
//! - ROCm with hipFFT installed (`ROCM_PATH` set, or `/opt/rocm`)

fn main() {
    #[cfg(feature = "hip")]
    {
        link_hipfft();
    }
}

#[cfg(feature = "hip")]
fn link_hipfft() {
    let rocm_root = std::env::var("ROCM_PATH").unwrap_or_else(|_| "/opt/rocm".to_string());

    println!("cargo:rustc-link-search=native={rocm_root}/lib");
    println!("cargo:rustc-link-lib=dylib=hipfft");
    println!("cargo:rustc-link-lib=dylib=amdhip64");

    println!("cargo:rerun-if-env-changed=ROCM_PATH");
}
