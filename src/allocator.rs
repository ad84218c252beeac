//! The four allocation entry points over one lock-protected heap.

use std::{
  alloc::{GlobalAlloc, Layout},
  ptr::{self, NonNull},
};

use lock_api::RawMutex as _;

use crate::{
  align::RECORD_ALIGN,
  block::BlockRecord,
  boundary::HeapBoundary,
  error::{HeapError, Result},
  heap::{Heap, HeapStats},
  sync::{Mutex, RawPthreadMutex},
};

/// A heap behind the single lock that serializes every caller.
///
/// Each entry point holds the lock only for its own list work; the guard is
/// dropped on every return path. A contended caller sleeps in the kernel
/// until the holder unlocks. `allocate_zeroed` and `resize` are built
/// from `allocate` and `release` and never touch the list themselves.
pub struct Allocator<B> {
  heap: Mutex<Heap<B>>,
}

impl<B: HeapBoundary> Allocator<B> {
  pub const fn new(boundary: B) -> Self {
    Self {
      heap: Mutex::const_new(RawPthreadMutex::INIT, Heap::new(boundary)),
    }
  }

  /// Returns a region of at least `size` bytes, or null.
  ///
  /// Null means either a zero-size request or an exhausted heap boundary.
  pub fn allocate(
    &self,
    size: usize,
  ) -> *mut u8 {
    self.try_allocate(size).map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  fn try_allocate(
    &self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if size == 0 {
      return Err(HeapError::ZeroSize);
    }

    let mut heap = self.heap.lock();

    if let Some(record) = heap.take_reusable(size) {
      return Ok(BlockRecord::user_ptr(record));
    }

    let record = heap.grow(size)?;
    Ok(BlockRecord::user_ptr(record))
  }

  /// Gives a region back. Null is a no-op.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a live pointer returned by this allocator.
  pub unsafe fn release(
    &self,
    ptr: *mut u8,
  ) {
    let Some(user) = NonNull::new(ptr) else {
      return;
    };

    let mut heap = self.heap.lock();
    unsafe { heap.shrink_if_tail(BlockRecord::from_user_ptr(user)) };
  }

  /// Returns `count * element_size` zeroed bytes, or null on a zero count,
  /// a zero element size, overflow, or exhaustion.
  pub fn allocate_zeroed(
    &self,
    count: usize,
    element_size: usize,
  ) -> *mut u8 {
    self
      .try_allocate_zeroed(count, element_size)
      .map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  fn try_allocate_zeroed(
    &self,
    count: usize,
    element_size: usize,
  ) -> Result<NonNull<u8>> {
    if count == 0 || element_size == 0 {
      return Err(HeapError::ZeroSize);
    }

    let total = count
      .checked_mul(element_size)
      .ok_or(HeapError::Exhausted { requested: usize::MAX })?;

    let user = self.try_allocate(total)?;
    // SAFETY: the region holds at least `total` bytes and belongs to us.
    unsafe { ptr::write_bytes(user.as_ptr(), 0, total) };
    Ok(user)
  }

  /// Resizes the region behind `ptr` to hold `new_size` bytes.
  ///
  /// A null `ptr` behaves like [`Self::allocate`]. A zero `new_size` releases
  /// `ptr` and returns null. A region already large enough is returned as is.
  /// Otherwise the contents move to a new region and the old one is
  /// released; if that allocation fails the old region stays valid and null
  /// is returned.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a live pointer returned by this allocator, and
  /// must not be used concurrently with this call.
  pub unsafe fn resize(
    &self,
    ptr: *mut u8,
    new_size: usize,
  ) -> *mut u8 {
    let Some(user) = NonNull::new(ptr) else {
      return self.allocate(new_size);
    };

    if new_size == 0 {
      unsafe { self.release(ptr) };
      return ptr::null_mut();
    }

    let old_size = unsafe { self.usable_size(user.as_ptr()) };
    if old_size >= new_size {
      return ptr;
    }

    let Ok(moved) = self.try_allocate(new_size) else {
      return ptr::null_mut();
    };

    unsafe {
      ptr::copy_nonoverlapping(user.as_ptr(), moved.as_ptr(), old_size);
      self.release(ptr);
    }

    moved.as_ptr()
  }

  /// Bytes usable behind `ptr`; zero for null.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a live pointer returned by this allocator.
  pub unsafe fn usable_size(
    &self,
    ptr: *mut u8,
  ) -> usize {
    let Some(user) = NonNull::new(ptr) else {
      return 0;
    };

    let heap = self.heap.lock();
    unsafe { heap.usable_size(user) }
  }

  pub fn stats(&self) -> HeapStats {
    self.heap.lock().stats()
  }

  pub fn heap_end(&self) -> *mut u8 {
    self.heap.lock().boundary().current()
  }
}

impl<B: HeapBoundary> Allocator<B> {
  /// Carves a region aligned beyond [`RECORD_ALIGN`] out of a larger block.
  ///
  /// The block's own user pointer is stored in the word just below the
  /// aligned pointer so [`Self::release_over_aligned`] can find it again.
  fn allocate_over_aligned(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    let Some(padded) = layout.size().checked_add(layout.align()) else {
      return ptr::null_mut();
    };

    let raw = self.allocate(padded);
    if raw.is_null() {
      return raw;
    }

    // `raw` is RECORD_ALIGN-aligned and `align` is larger, so the rounded-up
    // pointer leaves at least RECORD_ALIGN bytes below it for the stash.
    let offset = layout.align() - (raw as usize & (layout.align() - 1));
    unsafe {
      let aligned = raw.add(offset);
      aligned.cast::<*mut u8>().sub(1).write(raw);
      aligned
    }
  }

  /// # Safety
  ///
  /// `ptr` must come from [`Self::allocate_over_aligned`].
  unsafe fn release_over_aligned(
    &self,
    ptr: *mut u8,
  ) {
    unsafe {
      let raw = ptr.cast::<*mut u8>().sub(1).read();
      self.release(raw);
    }
  }
}

unsafe impl<B: HeapBoundary> GlobalAlloc for Allocator<B> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > RECORD_ALIGN {
      return self.allocate_over_aligned(layout);
    }
    self.allocate(layout.size())
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
  ) {
    if layout.align() > RECORD_ALIGN {
      return unsafe { self.release_over_aligned(ptr) };
    }
    unsafe { self.release(ptr) }
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > RECORD_ALIGN {
      let ptr = self.allocate_over_aligned(layout);
      if !ptr.is_null() {
        unsafe { ptr::write_bytes(ptr, 0, layout.size()) };
      }
      return ptr;
    }
    self.allocate_zeroed(layout.size(), 1)
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if layout.align() <= RECORD_ALIGN {
      return unsafe { self.resize(ptr, new_size) };
    }

    let Ok(new_layout) = Layout::from_size_align(new_size, layout.align()) else {
      return ptr::null_mut();
    };
    let moved = self.allocate_over_aligned(new_layout);
    if !moved.is_null() {
      unsafe {
        ptr::copy_nonoverlapping(ptr, moved, layout.size().min(new_size));
        self.release_over_aligned(ptr);
      }
    }
    moved
  }
}
