//! Platform-tagged pointers and host-backed buffers.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;

/// Where the memory behind a [`Pointer`] lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Host,
    Rocm,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Host => f.write_str("host"),
            Platform::Rocm => f.write_str("ROCm"),
        }
    }
}

/// Raw pointer tagged with the platform it belongs to.
///
/// Non-owning. The tag lets the adapter refuse host memory for a device
/// library and the other way around.
pub struct Pointer<T> {
    raw: *mut T,
    platform: Platform,
    _marker: PhantomData<T>,
}

// Pointers are plain addresses; dereferencing is already unsafe.
unsafe impl<T> Send for Pointer<T> {}
unsafe impl<T> Sync for Pointer<T> {}

impl<T> Pointer<T> {
    pub fn new(raw: *mut T, platform: Platform) -> Self {
        Self {
            raw,
            platform,
            _marker: PhantomData,
        }
    }

    pub fn null(platform: Platform) -> Self {
        Self::new(std::ptr::null_mut(), platform)
    }

    pub fn raw(&self) -> *mut T {
        self.raw
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// Reinterprets the pointee type, keeping the platform tag.
    pub fn cast<U>(self) -> Pointer<U> {
        Pointer::new(self.raw.cast::<U>(), self.platform)
    }

    /// Type-erased view, the form taken by type-generic entry points.
    pub fn erase(self) -> Pointer<c_void> {
        self.cast::<c_void>()
    }
}

impl<T> Clone for Pointer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Pointer<T> {}

impl<T> PartialEq for Pointer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.platform == other.platform
    }
}

impl<T> Eq for Pointer<T> {}

impl<T> fmt::Debug for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pointer({:p} on {})", self.raw, self.platform)
    }
}

/// Owned host allocation used as "device" memory by the host library.
///
/// Storage is kept in 8-byte words so the buffer is aligned for every
/// scalar and complex type the transforms use.
pub struct DeviceBuffer {
    words: Vec<u64>,
    size: usize,
}

impl DeviceBuffer {
    /// Zero-filled buffer of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            words: vec![0u64; size.div_ceil(8)],
            size,
        }
    }

    /// Buffer holding a copy of `data`.
    pub fn from_slice<T: bytemuck::Pod>(data: &[T]) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let mut buffer = Self::zeroed(bytes.len());
        buffer.as_bytes_mut().copy_from_slice(bytes);
        buffer
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.size]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[..size]
    }

    /// Overwrites the start of the buffer with `data`.
    pub fn write<T: bytemuck::Pod>(&mut self, data: &[T]) -> crate::error::Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() > self.size {
            return Err(crate::error::Error::invalid_argument(format!(
                "{} bytes do not fit in a buffer of {} bytes",
                bytes.len(),
                self.size
            )));
        }
        self.as_bytes_mut()[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Copies the whole buffer out as `T` values.
    pub fn read<T: bytemuck::Pod>(&self) -> Vec<T> {
        let count = self.size / std::mem::size_of::<T>();
        let bytes = &self.as_bytes()[..count * std::mem::size_of::<T>()];
        bytemuck::pod_collect_to_vec(bytes)
    }

    /// Pointer to the first element, tagged as host memory.
    pub fn pointer<T>(&mut self) -> Pointer<T> {
        Pointer::new(self.words.as_mut_ptr().cast::<T>(), Platform::Host)
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer").field("size", &self.size).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;

    #[test]
    fn test_buffer_roundtrip() {
        let data = vec![Complex32::new(1.0, -1.0), Complex32::new(0.5, 2.0)];
        let buffer = DeviceBuffer::from_slice(&data);
        assert_eq!(buffer.size(), 16);
        assert_eq!(buffer.read::<Complex32>(), data);
    }

    #[test]
    fn test_write_too_large() {
        let mut buffer = DeviceBuffer::zeroed(4);
        assert!(buffer.write(&[1.0f64]).is_err());
        assert!(buffer.write(&[1.0f32]).is_ok());
        assert_eq!(buffer.read::<f32>(), vec![1.0]);
    }

    #[test]
    fn test_pointer_tags() {
        let mut buffer = DeviceBuffer::zeroed(32);
        let ptr = buffer.pointer::<f64>();
        assert_eq!(ptr.platform(), Platform::Host);
        assert!(!ptr.is_null());
        assert_eq!(ptr.erase().raw() as usize, ptr.raw() as usize);
        assert!(Pointer::<f32>::null(Platform::Rocm).is_null());
    }
}
