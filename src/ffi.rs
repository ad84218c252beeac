//! C-ABI exports that interpose on the system allocator.
//!
//! Gated behind `features = ["interpose"]`. Build the `cdylib` with the
//! feature and load it with `LD_PRELOAD` to route a program's `malloc`
//! family through the process heap. Never compiled into the crate's own
//! unit tests, which would otherwise replace the test binary's allocator.
//!
//! Only these five symbols are exported. `posix_memalign`, `aligned_alloc`,
//! `memalign`, `valloc` and `pvalloc` still resolve to the C library, whose
//! pointers live in its own heap. Passing such a pointer to `free`, `realloc`
//! or `malloc_usable_size` here is undefined behavior, so a program that
//! uses the aligned family cannot be interposed with this library. Rust code
//! in the same process should install [`crate::BrkMalloc`] as its global
//! allocator, which handles large alignments itself.

use std::ffi::c_void;

use crate::global;

/// `malloc(3)`: null for zero bytes or when the heap cannot grow.
///
/// # Safety
///
/// The returned pointer must be released at most once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
  global::allocate(size).cast()
}

/// `free(3)`: null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this allocator.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  unsafe { global::release(ptr.cast()) }
}

/// `calloc(3)`: null for a zero count, a zero size, or an overflowing product.
///
/// # Safety
///
/// The returned pointer must be released at most once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn calloc(
  nmemb: usize,
  size: usize,
) -> *mut c_void {
  global::allocate_zeroed(nmemb, size).cast()
}

/// `realloc(3)`.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this allocator.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(
  ptr: *mut c_void,
  size: usize,
) -> *mut c_void {
  unsafe { global::resize(ptr.cast(), size).cast() }
}

/// `malloc_usable_size(3)`.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this allocator.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn malloc_usable_size(ptr: *mut c_void) -> usize {
  unsafe { global::usable_size(ptr.cast()) }
}
