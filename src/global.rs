//! The process-wide allocator over the program break.
//!
//! There is exactly one heap per process. It is built by a `const fn`, so it
//! is ready before the first call and is never torn down.

use std::alloc::{GlobalAlloc, Layout};

use crate::{allocator::Allocator, boundary::SbrkBoundary, heap::HeapStats};

static PROCESS_HEAP: Allocator<SbrkBoundary> = Allocator::new(SbrkBoundary);

pub fn process_heap() -> &'static Allocator<SbrkBoundary> {
  &PROCESS_HEAP
}

/// See [`Allocator::allocate`].
pub fn allocate(size: usize) -> *mut u8 {
  PROCESS_HEAP.allocate(size)
}

/// See [`Allocator::release`].
///
/// # Safety
///
/// `ptr` must be null or a live pointer returned by the process heap.
pub unsafe fn release(ptr: *mut u8) {
  unsafe { PROCESS_HEAP.release(ptr) }
}

/// See [`Allocator::allocate_zeroed`].
pub fn allocate_zeroed(
  count: usize,
  element_size: usize,
) -> *mut u8 {
  PROCESS_HEAP.allocate_zeroed(count, element_size)
}

/// See [`Allocator::resize`].
///
/// # Safety
///
/// `ptr` must be null or a live pointer returned by the process heap.
pub unsafe fn resize(
  ptr: *mut u8,
  new_size: usize,
) -> *mut u8 {
  unsafe { PROCESS_HEAP.resize(ptr, new_size) }
}

/// See [`Allocator::usable_size`].
///
/// # Safety
///
/// `ptr` must be null or a live pointer returned by the process heap.
pub unsafe fn usable_size(ptr: *mut u8) -> usize {
  unsafe { PROCESS_HEAP.usable_size(ptr) }
}

pub fn stats() -> HeapStats {
  PROCESS_HEAP.stats()
}

/// The process heap as a Rust global allocator.
///
/// ```ignore
/// #[global_allocator]
/// static GLOBAL: brkalloc::BrkMalloc = brkalloc::BrkMalloc;
/// ```
pub struct BrkMalloc;

unsafe impl GlobalAlloc for BrkMalloc {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    unsafe { PROCESS_HEAP.alloc(layout) }
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
  ) {
    unsafe { PROCESS_HEAP.dealloc(ptr, layout) }
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    unsafe { PROCESS_HEAP.alloc_zeroed(layout) }
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    unsafe { PROCESS_HEAP.realloc(ptr, layout, new_size) }
  }
}
