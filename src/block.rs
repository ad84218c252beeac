use std::{mem, ptr::NonNull};

use crate::align::RECORD_ALIGN;

/// Size of the record placed in front of every user region.
pub const HEADER_SIZE: usize = mem::size_of::<BlockRecord>();

const _: () = assert!(HEADER_SIZE % RECORD_ALIGN == 0);

/// Metadata prefixed to every region carved out of the heap.
///
/// Records are written once by the heap manager at the address returned by
/// the boundary and are never moved afterwards. `next` follows creation order.
#[repr(C, align(16))]
pub struct BlockRecord {
  pub size: usize,
  pub free: bool,
  pub next: Option<NonNull<BlockRecord>>,
}

impl BlockRecord {
  /// Writes a fresh, in-use record for a region of `size` bytes at `address`.
  ///
  /// # Safety
  ///
  /// `address` must be aligned to [`RECORD_ALIGN`] and valid for writes of
  /// `HEADER_SIZE + size` bytes.
  pub unsafe fn init(
    address: NonNull<u8>,
    size: usize,
  ) -> NonNull<BlockRecord> {
    let record = address.cast::<BlockRecord>();
    unsafe {
      record.write(BlockRecord {
        size,
        free: false,
        next: None,
      });
    }
    record
  }

  pub fn user_ptr(record: NonNull<BlockRecord>) -> NonNull<u8> {
    // SAFETY: the user region always directly follows its record.
    unsafe { record.cast::<u8>().add(HEADER_SIZE) }
  }

  /// Recovers the record from a pointer previously produced by [`Self::user_ptr`].
  ///
  /// # Safety
  ///
  /// `user` must have been returned by this heap and still be managed by it.
  pub unsafe fn from_user_ptr(user: NonNull<u8>) -> NonNull<BlockRecord> {
    unsafe { user.sub(HEADER_SIZE).cast::<BlockRecord>() }
  }

  /// First address past the user region of `record`.
  ///
  /// # Safety
  ///
  /// `record` must point to an initialized record.
  pub unsafe fn end(record: NonNull<BlockRecord>) -> usize {
    let size = unsafe { record.as_ref().size };
    record.as_ptr() as usize + HEADER_SIZE + size
  }
}
