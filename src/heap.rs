//! The heap manager: first-fit reuse, growth at the boundary, tail retraction.
//!
//! ```text
//!   head                                              tail        boundary
//!    │                                                 │              │
//!    ▼                                                 ▼              ▼
//!   ┌────────┬──────────┬────────┬─────┬────────┬────────────────┐
//!   │ record │  region  │ record │ ... │ record │     region     │
//!   └────────┴──────────┴────────┴─────┴────────┴────────────────┘
//! ```
//!
//! Nothing here locks: [`crate::Allocator`] wraps a `Heap` in the one global
//! lock and every method below runs inside that critical section.

use std::{fmt, ptr::NonNull};

use crate::{
  align,
  block::{BlockRecord, HEADER_SIZE},
  boundary::HeapBoundary,
  error::{HeapError, Result},
  list::BlockList,
};

/// Snapshot of the block list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
  pub blocks: usize,
  pub free_blocks: usize,
  pub bytes_in_use: usize,
  pub bytes_free: usize,
  /// Region bytes plus record headers across every block.
  pub managed_bytes: usize,
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "{} blocks ({} free), {} bytes in use, {} bytes free, {} bytes managed",
      self.blocks, self.free_blocks, self.bytes_in_use, self.bytes_free, self.managed_bytes
    )
  }
}

pub struct Heap<B> {
  blocks: BlockList,
  boundary: B,
}

// SAFETY: the records are only reachable through the heap, which owns the
// boundary they live under.
unsafe impl<B: HeapBoundary + Send> Send for Heap<B> {}

impl<B: HeapBoundary> Heap<B> {
  pub const fn new(boundary: B) -> Self {
    Self {
      blocks: BlockList::new(),
      boundary,
    }
  }

  pub fn boundary(&self) -> &B {
    &self.boundary
  }

  /// First free record large enough for `size` bytes.
  pub fn find_reusable(
    &self,
    size: usize,
  ) -> Option<NonNull<BlockRecord>> {
    // SAFETY: every linked record was initialized by `grow`.
    unsafe { self.blocks.first_fit(size) }
  }

  /// Claims the first reusable record for `size` bytes, handing it over whole.
  pub fn take_reusable(
    &mut self,
    size: usize,
  ) -> Option<NonNull<BlockRecord>> {
    let mut record = self.find_reusable(size)?;
    // SAFETY: the record is linked and initialized; the heap is borrowed mutably.
    unsafe { record.as_mut().free = false };

    if cfg!(any(test, feature = "trace")) {
      log::trace!(
        "reuse: record {:p} ({} bytes) for a {size}-byte request",
        record,
        unsafe { record.as_ref().size }
      );
    }

    Some(record)
  }

  /// Carves a new in-use record for `size` bytes at the boundary.
  pub fn grow(
    &mut self,
    size: usize,
  ) -> Result<NonNull<BlockRecord>> {
    let size = align::checked_align(size).ok_or(HeapError::Exhausted { requested: size })?;
    let padding = align::padding_for(self.boundary.current() as usize);
    let increment = padding
      .checked_add(HEADER_SIZE)
      .and_then(|total| total.checked_add(size))
      .ok_or(HeapError::Exhausted { requested: size })?;

    // SAFETY: the heap is the only party moving its boundary.
    let previous = unsafe { self.boundary.extend(increment) }.inspect_err(|err| {
      if cfg!(any(test, feature = "trace")) {
        log::debug!("grow({size}) failed: {err}");
      }
    })?;

    // SAFETY: `increment` fresh bytes start at `previous`, and `padding`
    // brings the record up to its alignment.
    let record = unsafe { BlockRecord::init(previous.add(padding), size) };
    unsafe { self.blocks.push_back(record) };

    if cfg!(any(test, feature = "trace")) {
      log::trace!(
        "grow: record {:p} for {size} bytes, boundary now {:p}",
        record,
        self.boundary.current()
      );
    }

    Ok(record)
  }

  /// Hands a released record back.
  ///
  /// A record whose region ends exactly at the boundary is unlinked and its
  /// bytes are returned to the boundary; any other record is marked free.
  /// Returns whether the boundary was retracted.
  ///
  /// # Safety
  ///
  /// `record` must be linked in this heap and currently in use.
  pub unsafe fn shrink_if_tail(
    &mut self,
    mut record: NonNull<BlockRecord>,
  ) -> bool {
    let at_boundary = unsafe { BlockRecord::end(record) } == self.boundary.current() as usize;

    // While the heap owns the boundary, only the tail can end at it.
    if !at_boundary || self.blocks.tail() != Some(record) {
      unsafe { record.as_mut().free = true };
      if cfg!(any(test, feature = "trace")) {
        log::trace!("release: record {:p} kept for reuse", record);
      }
      return false;
    }

    let size = unsafe { record.as_ref().size };
    unsafe {
      self.blocks.pop_tail();
      self.boundary.retract(HEADER_SIZE + size);
    }

    if cfg!(any(test, feature = "trace")) {
      log::trace!(
        "release: record {:p} retracted {} bytes, boundary now {:p}",
        record,
        HEADER_SIZE + size,
        self.boundary.current()
      );
    }

    true
  }

  /// Recorded size of the region behind `user`.
  ///
  /// # Safety
  ///
  /// `user` must have been returned by this heap and not yet released.
  pub unsafe fn usable_size(
    &self,
    user: NonNull<u8>,
  ) -> usize {
    unsafe { BlockRecord::from_user_ptr(user).as_ref().size }
  }

  pub fn stats(&self) -> HeapStats {
    let mut stats = HeapStats::default();

    // SAFETY: every linked record was initialized by `grow`.
    for record in unsafe { self.blocks.iter() } {
      let record = unsafe { record.as_ref() };
      stats.blocks += 1;
      stats.managed_bytes += HEADER_SIZE + record.size;
      if record.free {
        stats.free_blocks += 1;
        stats.bytes_free += record.size;
      } else {
        stats.bytes_in_use += record.size;
      }
    }

    stats
  }
}
