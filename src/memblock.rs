//! Caller-owned scratch buffer — the only dynamic storage the codec uses.
//!
//! A [`Memblock`] is created by the caller, owned by the caller, and passed
//! by reference into codec calls; the codec never frees it. When a factory
//! closure produces one on the codec's behalf (see [`default_memblock`]),
//! the codec holds it exclusively for the duration of the call and releases
//! it via its own deallocator on every exit path, including errors.

use std::sync::OnceLock;

/// A raw scratch buffer with an optional deallocation callback.
///
/// Most callers should use [`Memblock::from_vec`] rather than constructing
/// this directly; the raw form exists for embedders who own memory outside
/// Rust's allocator.
pub struct Memblock {
    ptr: *mut u8,
    size: usize,
    dealloc: Option<Box<dyn FnOnce(*mut u8)>>,
}

impl Memblock {
    /// Wraps a caller-owned `Vec<u8>` as a memblock. The `Vec`'s backing
    /// allocation is freed through its own `Drop` when this memblock is
    /// dropped.
    #[must_use]
    pub fn from_vec(mut buf: Vec<u8>) -> Self {
        let ptr = buf.as_mut_ptr();
        let size = buf.len();
        Self {
            ptr,
            size,
            dealloc: Some(Box::new(move |_| drop(buf))),
        }
    }

    /// Wraps a raw pointer/size pair with an explicit deallocator, for
    /// embedders handing the codec externally-owned memory.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `size` bytes for the
    /// lifetime of this `Memblock`, and `dealloc` must be the correct way to
    /// release it.
    #[must_use]
    pub unsafe fn from_raw(
        ptr: *mut u8,
        size: usize,
        dealloc: Option<Box<dyn FnOnce(*mut u8)>>,
    ) -> Self {
        Self { ptr, size, dealloc }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        if self.ptr.is_null() || self.size == 0 {
            &[]
        } else {
            unsafe { core::slice::from_raw_parts(self.ptr, self.size) }
        }
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        if self.ptr.is_null() || self.size == 0 {
            &mut []
        } else {
            unsafe { core::slice::from_raw_parts_mut(self.ptr, self.size) }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.ptr.is_null() && self.size > 0
    }
}

impl Drop for Memblock {
    fn drop(&mut self) {
        if let Some(dealloc) = self.dealloc.take() {
            dealloc(self.ptr);
        }
    }
}

type FactoryFn = dyn Fn(usize) -> Memblock + Send + Sync;

static DEFAULT_FACTORY: OnceLock<Box<FactoryFn>> = OnceLock::new();

/// Installs a process-wide factory used by [`default_memblock`] for codec
/// calls that weren't given an explicit memblock.
///
/// Install once at startup and treat as read-only afterwards: concurrent
/// codec calls on disjoint streams are safe to run in parallel only if this
/// factory is not mutated concurrently with them (§5).
///
/// Returns `false` (and leaves the existing factory in place) if a factory
/// was already installed.
pub fn set_default_memblock_factory<F>(factory: F) -> bool
where
    F: Fn(usize) -> Memblock + Send + Sync + 'static,
{
    DEFAULT_FACTORY.set(Box::new(factory)).is_ok()
}

/// Returns a memblock of at least `size` bytes, via the installed factory if
/// any, otherwise a plain zeroed `Vec<u8>`.
#[must_use]
pub fn default_memblock(size: usize) -> Memblock {
    match DEFAULT_FACTORY.get() {
        Some(factory) => factory(size),
        None => Memblock::from_vec(vec![0u8; size]),
    }
}
