//! Transform vocabulary shared with the rest of the runtime, and its
//! translation into hipFFT terms.

use std::fmt;

use crate::error::{Error, Result};

/// Floating-point precision of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Half,
    Single,
    Double,
}

impl Precision {
    /// Size of one real scalar in bytes.
    pub fn real_size(self) -> usize {
        match self {
            Precision::Half => 2,
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }

    /// Size of one interleaved complex value in bytes.
    pub fn complex_size(self) -> usize {
        2 * self.real_size()
    }
}

/// Element category of a transform's input or output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Real(Precision),
    Complex(Precision),
}

impl ElementKind {
    pub fn is_real(self) -> bool {
        matches!(self, ElementKind::Real(_))
    }
}

/// Forward or inverse selector for complex-to-complex transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FftDirection {
    Forward,
    Inverse,
}

impl FftDirection {
    /// `HIPFFT_FORWARD` / `HIPFFT_BACKWARD`.
    pub fn as_raw(self) -> i32 {
        match self {
            FftDirection::Forward => -1,
            FftDirection::Inverse => 1,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            -1 => Some(FftDirection::Forward),
            1 => Some(FftDirection::Inverse),
            _ => None,
        }
    }
}

/// Runtime-wide transform kinds.
///
/// This vocabulary is shared by every FFT backend of the runtime, so it
/// contains kinds a particular vendor cannot execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FftType {
    C2CForward,
    C2CInverse,
    Z2ZForward,
    Z2ZInverse,
    R2C,
    D2Z,
    C2R,
    Z2D,
    C2CHalfForward,
    C2CHalfInverse,
}

impl FftType {
    pub const ALL: [FftType; 10] = [
        FftType::C2CForward,
        FftType::C2CInverse,
        FftType::Z2ZForward,
        FftType::Z2ZInverse,
        FftType::R2C,
        FftType::D2Z,
        FftType::C2R,
        FftType::Z2D,
        FftType::C2CHalfForward,
        FftType::C2CHalfInverse,
    ];

    /// Direction implied by the kind; `None` for real transforms, whose
    /// direction follows from the element types.
    pub fn direction(self) -> Option<FftDirection> {
        match self {
            FftType::C2CForward | FftType::Z2ZForward | FftType::C2CHalfForward => {
                Some(FftDirection::Forward)
            }
            FftType::C2CInverse | FftType::Z2ZInverse | FftType::C2CHalfInverse => {
                Some(FftDirection::Inverse)
            }
            FftType::R2C | FftType::D2Z | FftType::C2R | FftType::Z2D => None,
        }
    }

    pub fn precision(self) -> Precision {
        match self {
            FftType::C2CForward | FftType::C2CInverse | FftType::R2C | FftType::C2R => {
                Precision::Single
            }
            FftType::Z2ZForward | FftType::Z2ZInverse | FftType::D2Z | FftType::Z2D => {
                Precision::Double
            }
            FftType::C2CHalfForward | FftType::C2CHalfInverse => Precision::Half,
        }
    }

    pub fn input_element(self) -> ElementKind {
        match self {
            FftType::R2C | FftType::D2Z => ElementKind::Real(self.precision()),
            _ => ElementKind::Complex(self.precision()),
        }
    }

    pub fn output_element(self) -> ElementKind {
        match self {
            FftType::C2R | FftType::Z2D => ElementKind::Real(self.precision()),
            _ => ElementKind::Complex(self.precision()),
        }
    }
}

impl fmt::Display for FftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FftType::C2CForward => "C2C forward",
            FftType::C2CInverse => "C2C inverse",
            FftType::Z2ZForward => "Z2Z forward",
            FftType::Z2ZInverse => "Z2Z inverse",
            FftType::R2C => "R2C",
            FftType::D2Z => "D2Z",
            FftType::C2R => "C2R",
            FftType::Z2D => "Z2D",
            FftType::C2CHalfForward => "half-precision C2C forward",
            FftType::C2CHalfInverse => "half-precision C2C inverse",
        };
        f.write_str(name)
    }
}

/// `hipfftType` enumerators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorFftType {
    R2C,
    C2R,
    C2C,
    D2Z,
    Z2D,
    Z2Z,
}

impl VendorFftType {
    pub fn as_raw(self) -> i32 {
        match self {
            VendorFftType::R2C => 0x2a,
            VendorFftType::C2R => 0x2c,
            VendorFftType::C2C => 0x29,
            VendorFftType::D2Z => 0x6a,
            VendorFftType::Z2D => 0x6c,
            VendorFftType::Z2Z => 0x69,
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0x2a => Some(VendorFftType::R2C),
            0x2c => Some(VendorFftType::C2R),
            0x29 => Some(VendorFftType::C2C),
            0x6a => Some(VendorFftType::D2Z),
            0x6c => Some(VendorFftType::Z2D),
            0x69 => Some(VendorFftType::Z2Z),
            _ => None,
        }
    }

    pub fn precision(self) -> Precision {
        match self {
            VendorFftType::R2C | VendorFftType::C2R | VendorFftType::C2C => Precision::Single,
            VendorFftType::D2Z | VendorFftType::Z2D | VendorFftType::Z2Z => Precision::Double,
        }
    }

    pub fn input_element(self) -> ElementKind {
        match self {
            VendorFftType::R2C | VendorFftType::D2Z => ElementKind::Real(self.precision()),
            _ => ElementKind::Complex(self.precision()),
        }
    }

    pub fn output_element(self) -> ElementKind {
        match self {
            VendorFftType::C2R | VendorFftType::Z2D => ElementKind::Real(self.precision()),
            _ => ElementKind::Complex(self.precision()),
        }
    }
}

/// Maps a runtime transform kind onto the hipFFT plan type that executes it.
///
/// Forward and inverse complex kinds share one plan type; the direction is
/// supplied at execution time.
pub fn to_vendor_type(fft_type: FftType) -> Result<VendorFftType> {
    match fft_type {
        FftType::C2CForward | FftType::C2CInverse => Ok(VendorFftType::C2C),
        FftType::Z2ZForward | FftType::Z2ZInverse => Ok(VendorFftType::Z2Z),
        FftType::R2C => Ok(VendorFftType::R2C),
        FftType::D2Z => Ok(VendorFftType::D2Z),
        FftType::C2R => Ok(VendorFftType::C2R),
        FftType::Z2D => Ok(VendorFftType::Z2D),
        FftType::C2CHalfForward | FftType::C2CHalfInverse => Err(Error::unsupported_type(
            format!("{fft_type} has no hipFFT equivalent"),
        )),
    }
}

/// Library version as reported by `hipfftGetVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryVersion {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
}

impl LibraryVersion {
    pub fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self { major, minor, patch }
    }

    /// Decodes the `major * 10000 + minor * 100 + patch` encoding.
    pub fn from_packed(packed: i32) -> Self {
        Self {
            major: packed / 10_000,
            minor: (packed % 10_000) / 100,
            patch: packed % 100,
        }
    }

    pub fn packed(&self) -> i32 {
        self.major * 10_000 + self.minor * 100 + self.patch
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Placement of one side (input or output) of a batched transform.
///
/// An empty `embed` selects the contiguous layout, in which case `stride`
/// and `dist` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataLayout {
    pub embed: Vec<i64>,
    pub stride: i64,
    pub dist: i64,
}

impl DataLayout {
    pub fn contiguous() -> Self {
        Self {
            embed: Vec::new(),
            stride: 1,
            dist: 0,
        }
    }

    pub fn strided(embed: &[i64], stride: i64, dist: i64) -> Self {
        Self {
            embed: embed.to_vec(),
            stride,
            dist,
        }
    }

    pub fn is_contiguous(&self) -> bool {
        self.embed.is_empty()
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::contiguous()
    }
}

/// Everything that determines the shape of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformDescriptor {
    pub rank: usize,
    pub n: Vec<i64>,
    pub input: DataLayout,
    pub output: DataLayout,
    pub fft_type: VendorFftType,
    pub batch: i64,
}

impl TransformDescriptor {
    /// Single contiguous transform over extents `n`.
    pub fn new(n: &[i64], fft_type: VendorFftType) -> Self {
        Self {
            rank: n.len(),
            n: n.to_vec(),
            input: DataLayout::contiguous(),
            output: DataLayout::contiguous(),
            fft_type,
            batch: 1,
        }
    }

    /// Parameter order of `hipfftMakePlanMany`.
    #[allow(clippy::too_many_arguments)]
    pub fn many(
        rank: usize,
        n: &[i64],
        inembed: &[i64],
        istride: i64,
        idist: i64,
        onembed: &[i64],
        ostride: i64,
        odist: i64,
        fft_type: VendorFftType,
        batch: i64,
    ) -> Self {
        Self {
            rank,
            n: n.to_vec(),
            input: DataLayout::strided(inembed, istride, idist),
            output: DataLayout::strided(onembed, ostride, odist),
            fft_type,
            batch,
        }
    }

    pub fn with_input_layout(mut self, layout: DataLayout) -> Self {
        self.input = layout;
        self
    }

    pub fn with_output_layout(mut self, layout: DataLayout) -> Self {
        self.output = layout;
        self
    }

    pub fn with_batch(mut self, batch: i64) -> Self {
        self.batch = batch;
        self
    }

    /// Checks that every dimensional argument agrees with `rank`.
    pub fn validate(&self, max_rank: usize) -> Result<()> {
        if self.rank == 0 || self.rank > max_rank {
            return Err(Error::invalid_argument(format!(
                "rank must be in 1..={max_rank}, got {}",
                self.rank
            )));
        }
        if self.n.len() != self.rank {
            return Err(Error::invalid_argument(format!(
                "rank {} but {} extents",
                self.rank,
                self.n.len()
            )));
        }
        if let Some(bad) = self.n.iter().find(|&&extent| extent <= 0) {
            return Err(Error::invalid_argument(format!(
                "extents must be positive, got {bad}"
            )));
        }
        self.validate_layout("input", &self.input)?;
        self.validate_layout("output", &self.output)?;
        if self.batch < 1 {
            return Err(Error::invalid_argument(format!(
                "batch must be >= 1, got {}",
                self.batch
            )));
        }
        Ok(())
    }

    fn validate_layout(&self, side: &str, layout: &DataLayout) -> Result<()> {
        if layout.is_contiguous() {
            return Ok(());
        }
        if layout.embed.len() != self.rank {
            return Err(Error::invalid_argument(format!(
                "{side} embed has {} entries for rank {}",
                layout.embed.len(),
                self.rank
            )));
        }
        if layout.embed.iter().any(|&e| e <= 0) {
            return Err(Error::invalid_argument(format!(
                "{side} embed entries must be positive"
            )));
        }
        if layout.stride < 1 || layout.dist < 1 {
            return Err(Error::invalid_argument(format!(
                "{side} stride and dist must be >= 1, got {} and {}",
                layout.stride, layout.dist
            )));
        }
        Ok(())
    }

    /// Logical extents of the input side. The complex side of a real
    /// transform keeps only `n / 2 + 1` entries of the last dimension.
    pub fn input_extents(&self) -> Vec<i64> {
        self.side_extents(self.fft_type.input_element())
    }

    pub fn output_extents(&self) -> Vec<i64> {
        self.side_extents(self.fft_type.output_element())
    }

    fn side_extents(&self, element: ElementKind) -> Vec<i64> {
        let real_transform =
            self.fft_type.input_element().is_real() || self.fft_type.output_element().is_real();
        let mut extents = self.n.clone();
        if real_transform && !element.is_real() {
            if let Some(last) = extents.last_mut() {
                *last = *last / 2 + 1;
            }
        }
        extents
    }
}
