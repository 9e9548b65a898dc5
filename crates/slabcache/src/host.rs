//! Host allocator boundary.
//!
//! Pages and oversize buffers come from the C heap (`libc::malloc`), not the
//! std `System` facade: the deallocation escape hatch must free a pointer
//! without knowing its size, which `GlobalAlloc::dealloc` cannot do. malloc's
//! natural alignment satisfies `BLOCK_ALIGNMENT` on every supported target.

use core::ffi::c_void;
use core::ptr::NonNull;

/// Thin wrapper over the process heap.
///
/// Zero-sized; construct freely. The wrapper exists so the pool layers name
/// one collaborator for page acquisition and release instead of scattering
/// raw libc calls.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HostAllocator;

impl HostAllocator {
    pub const fn new() -> Self {
        HostAllocator
    }

    /// Requests `size` bytes from the host. Returns `None` when the host is
    /// exhausted or `size` is zero.
    pub fn alloc(self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        // SAFETY: malloc with a non-zero size; the null case is mapped to
        // `None` by the NonNull constructor.
        let ptr = unsafe { libc::malloc(size) };
        NonNull::new(ptr.cast::<u8>())
    }

    /// Returns an allocation to the host.
    ///
    /// # Safety
    /// `ptr` must be exactly a pointer the host handed out (a page base, an
    /// oversize allocation, or an escape-hatch pointer the caller received
    /// from the host) and must not be used afterwards.
    pub unsafe fn free(self, ptr: NonNull<u8>) {
        // SAFETY: caller guarantees the pointer originated in `malloc`.
        unsafe { libc::free(ptr.as_ptr().cast::<c_void>()) }
    }
}

impl Default for HostAllocator {
    fn default() -> Self {
        Self::new()
    }
}
