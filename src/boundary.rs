//! The heap boundary: the single monotonic edge the engine grows and retracts.

use std::{alloc, ptr::NonNull};

use crate::{
  align::RECORD_ALIGN,
  error::{HeapError, Result},
};

/// Moves the end of a contiguous heap region.
///
/// Implementations behave like `sbrk(2)`: `extend` returns the previous
/// boundary, so the new bytes start there.
pub trait HeapBoundary {
  fn current(&self) -> *mut u8;

  /// Advances the boundary by `increment` bytes and returns the old boundary.
  ///
  /// # Safety
  ///
  /// The caller must be the only party moving this boundary for the duration
  /// of the call.
  unsafe fn extend(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>>;

  /// Moves the boundary back by `decrement` bytes. Always succeeds.
  ///
  /// # Safety
  ///
  /// The `decrement` bytes below the boundary must belong to the caller and
  /// must not be used again.
  unsafe fn retract(
    &mut self,
    decrement: usize,
  );
}

/// The process program break, driven through `sbrk(2)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SbrkBoundary;

#[cfg(unix)]
impl HeapBoundary for SbrkBoundary {
  fn current(&self) -> *mut u8 {
    // SAFETY: sbrk(0) only queries the break.
    unsafe { libc::sbrk(0) as *mut u8 }
  }

  unsafe fn extend(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>> {
    let exhausted = HeapError::Exhausted {
      requested: increment,
    };

    let increment = libc::intptr_t::try_from(increment).map_err(|_| exhausted)?;
    let address = unsafe { libc::sbrk(increment) };

    if address == usize::MAX as *mut libc::c_void {
      return Err(exhausted);
    }

    NonNull::new(address as *mut u8).ok_or(exhausted)
  }

  unsafe fn retract(
    &mut self,
    decrement: usize,
  ) {
    let Ok(decrement) = libc::intptr_t::try_from(decrement) else {
      return;
    };
    unsafe {
      libc::sbrk(-decrement);
    }
  }
}

/// A simulated break over a fixed-capacity buffer.
///
/// Extending past the capacity fails the same way `sbrk` does when the
/// address space is exhausted. The buffer itself comes from the system
/// allocator and is returned on drop.
pub struct ArenaBoundary {
  base: NonNull<u8>,
  capacity: usize,
  len: usize,
}

// SAFETY: the arena owns its buffer exclusively.
unsafe impl Send for ArenaBoundary {}

impl ArenaBoundary {
  /// Reserves `capacity` bytes for the simulated heap.
  ///
  /// # Panics
  ///
  /// Panics if `capacity` is zero or the system allocator refuses the buffer.
  pub fn with_capacity(capacity: usize) -> Self {
    let layout = Self::layout(capacity);
    // SAFETY: the layout has a non-zero size.
    let base = unsafe { alloc::alloc(layout) };
    let Some(base) = NonNull::new(base) else {
      alloc::handle_alloc_error(layout);
    };

    Self {
      base,
      capacity,
      len: 0,
    }
  }

  pub fn base(&self) -> *mut u8 {
    self.base.as_ptr()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  fn layout(capacity: usize) -> alloc::Layout {
    assert!(capacity > 0, "arena capacity must be non-zero");
    match alloc::Layout::from_size_align(capacity, RECORD_ALIGN) {
      Ok(layout) => layout,
      Err(err) => panic!("invalid arena capacity {capacity}: {err}"),
    }
  }
}

impl HeapBoundary for ArenaBoundary {
  fn current(&self) -> *mut u8 {
    // SAFETY: `len` never exceeds `capacity`.
    unsafe { self.base.as_ptr().add(self.len) }
  }

  unsafe fn extend(
    &mut self,
    increment: usize,
  ) -> Result<NonNull<u8>> {
    let exhausted = HeapError::Exhausted {
      requested: increment,
    };

    let new_len = self.len.checked_add(increment).ok_or(exhausted)?;
    if new_len > self.capacity {
      return Err(exhausted);
    }

    // SAFETY: `len` is within the buffer.
    let previous = unsafe { self.base.add(self.len) };
    self.len = new_len;
    Ok(previous)
  }

  unsafe fn retract(
    &mut self,
    decrement: usize,
  ) {
    self.len = self.len.saturating_sub(decrement);
  }
}

impl Drop for ArenaBoundary {
  fn drop(&mut self) {
    // SAFETY: the buffer was allocated in `with_capacity` with this layout.
    unsafe { alloc::dealloc(self.base.as_ptr(), Self::layout(self.capacity)) };
  }
}
