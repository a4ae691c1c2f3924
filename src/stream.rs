//! Non-owning reference to a device execution stream.

use std::ffi::c_void;
use std::fmt;

/// Identifies the stream a plan enqueues its kernels onto.
///
/// The adapter never owns streams. For the HIP backend the value is a
/// `hipStream_t`; for the host backend it is an id issued by
/// [`crate::library::HostFftLibrary::create_stream`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamRef(usize);

impl StreamRef {
    /// The null stream.
    pub const DEFAULT: StreamRef = StreamRef(0);

    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn from_ptr(stream: *mut c_void) -> Self {
        Self(stream as usize)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl Default for StreamRef {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("StreamRef(default)")
        } else {
            write!(f, "StreamRef({:#x})", self.0)
        }
    }
}
