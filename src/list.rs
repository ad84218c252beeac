//! Creation-ordered, singly linked list of block records.

use std::{marker::PhantomData, ptr::NonNull};

use crate::block::BlockRecord;

/// Every record ever carved from the heap that has not been retracted,
/// in creation order. `tail` is the most recently created record and
/// therefore the one with the highest address.
pub struct BlockList {
  head: Option<NonNull<BlockRecord>>,
  tail: Option<NonNull<BlockRecord>>,
}

impl BlockList {
  pub const fn new() -> Self {
    Self {
      head: None,
      tail: None,
    }
  }

  pub fn tail(&self) -> Option<NonNull<BlockRecord>> {
    self.tail
  }

  /// First free record whose region holds at least `size` bytes.
  ///
  /// # Safety
  ///
  /// Every linked record must be initialized.
  pub unsafe fn first_fit(
    &self,
    size: usize,
  ) -> Option<NonNull<BlockRecord>> {
    unsafe { self.iter() }.find(|record| {
      // SAFETY: linked records are initialized.
      let record = unsafe { record.as_ref() };
      record.free && record.size >= size
    })
  }

  /// Appends a freshly initialized record.
  ///
  /// # Safety
  ///
  /// `record` must be initialized, unlinked, and above every linked record.
  pub unsafe fn push_back(
    &mut self,
    mut record: NonNull<BlockRecord>,
  ) {
    unsafe {
      record.as_mut().next = None;

      match self.tail {
        Some(mut tail) => tail.as_mut().next = Some(record),
        None => self.head = Some(record),
      }
    }
    self.tail = Some(record);
  }

  /// Record linked directly before `target`, or `None` if `target` is the head.
  ///
  /// # Safety
  ///
  /// Every linked record must be initialized.
  pub unsafe fn predecessor_of(
    &self,
    target: NonNull<BlockRecord>,
  ) -> Option<NonNull<BlockRecord>> {
    unsafe { self.iter() }.find(|record| {
      // SAFETY: linked records are initialized.
      unsafe { record.as_ref().next == Some(target) }
    })
  }

  /// Unlinks the tail record and returns it.
  ///
  /// # Safety
  ///
  /// Every linked record must be initialized.
  pub unsafe fn pop_tail(&mut self) -> Option<NonNull<BlockRecord>> {
    let tail = self.tail?;

    match unsafe { self.predecessor_of(tail) } {
      Some(mut previous) => {
        unsafe { previous.as_mut().next = None };
        self.tail = Some(previous);
      }
      None => {
        self.head = None;
        self.tail = None;
      }
    }

    Some(tail)
  }

  /// Walks the records from `head` in creation order.
  ///
  /// # Safety
  ///
  /// Every linked record must stay initialized and linked while iterating.
  pub unsafe fn iter(&self) -> Iter<'_> {
    Iter {
      current: self.head,
      _list: PhantomData,
    }
  }
}

impl Default for BlockList {
  fn default() -> Self {
    Self::new()
  }
}

pub struct Iter<'a> {
  current: Option<NonNull<BlockRecord>>,
  _list: PhantomData<&'a BlockList>,
}

impl Iterator for Iter<'_> {
  type Item = NonNull<BlockRecord>;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.current?;
    // SAFETY: upheld by the caller of `BlockList::iter`.
    self.current = unsafe { current.as_ref().next };
    Some(current)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::HEADER_SIZE;

  #[repr(C, align(16))]
  struct Backing([u8; 512]);

  unsafe fn record_at(
    backing: &mut Backing,
    offset: usize,
    size: usize,
  ) -> NonNull<BlockRecord> {
    let base = NonNull::new(backing.0.as_mut_ptr()).unwrap();
    unsafe { BlockRecord::init(base.add(offset), size) }
  }

  #[test]
  fn test_push_back_keeps_creation_order() {
    let mut backing = Backing([0; 512]);
    let mut list = BlockList::new();

    unsafe {
      let a = record_at(&mut backing, 0, 32);
      let b = record_at(&mut backing, HEADER_SIZE + 32, 16);
      list.push_back(a);
      list.push_back(b);

      assert_eq!(list.iter().next(), Some(a));
      assert_eq!(list.tail(), Some(b));
      assert_eq!(list.iter().collect::<Vec<_>>(), vec![a, b]);
      assert_eq!(list.predecessor_of(b), Some(a));
      assert_eq!(list.predecessor_of(a), None);
    }
  }

  #[test]
  fn test_first_fit_takes_first_large_enough() {
    let mut backing = Backing([0; 512]);
    let mut list = BlockList::new();

    unsafe {
      let small = record_at(&mut backing, 0, 16);
      let big = record_at(&mut backing, HEADER_SIZE + 16, 128);
      let medium = record_at(&mut backing, 2 * HEADER_SIZE + 144, 48);
      for record in [small, big, medium] {
        list.push_back(record);
      }

      assert_eq!(list.first_fit(16), None);

      for mut record in [small, big, medium] {
        record.as_mut().free = true;
      }

      assert_eq!(list.first_fit(16), Some(small));
      // First fit, not best fit: `big` comes before the closer `medium`.
      assert_eq!(list.first_fit(40), Some(big));
      assert_eq!(list.first_fit(129), None);
    }
  }

  #[test]
  fn test_pop_tail() {
    let mut backing = Backing([0; 512]);
    let mut list = BlockList::new();

    unsafe {
      assert_eq!(list.pop_tail(), None);

      let a = record_at(&mut backing, 0, 16);
      let b = record_at(&mut backing, HEADER_SIZE + 16, 16);
      list.push_back(a);
      list.push_back(b);

      assert_eq!(list.pop_tail(), Some(b));
      assert_eq!(list.tail(), Some(a));
      assert!(a.as_ref().next.is_none());

      assert_eq!(list.pop_tail(), Some(a));
      assert_eq!(list.iter().next(), None);
      assert_eq!(list.tail(), None);
    }
  }
}
