//! Calls the exported C entry points the way an interposed program would.
//!
//! Only built with `--features interpose`. The test binary then defines
//! `malloc` and friends itself, so every C-level allocation in the process,
//! libc's own included, lands on the process heap. Rust allocations go
//! through `BrkMalloc` so that nothing reaches libc's aligned allocators.
//! Kept to a single test so the harness runs one test thread.

#![cfg(all(unix, feature = "interpose"))]

use std::ptr;

use brkalloc::{BrkMalloc, align, stats, usable_size};
use libc::{c_void, calloc, free, malloc, realloc};

#[global_allocator]
static GLOBAL: BrkMalloc = BrkMalloc;

unsafe extern "C" {
  fn malloc_usable_size(ptr: *mut c_void) -> usize;
}

fn malloc_and_free() {
  unsafe {
    assert!(malloc(0).is_null());
    free(ptr::null_mut());

    let before = stats().bytes_in_use;
    let p = malloc(100).cast::<u8>();
    assert!(!p.is_null());
    assert_eq!(p as usize % 16, 0);

    // The pointer belongs to the process heap, not to libc's.
    assert_eq!(usable_size(p), align!(100));
    assert_eq!(malloc_usable_size(p.cast()), align!(100));
    assert_eq!(stats().bytes_in_use, before + align!(100));

    p.write_bytes(0x5A, 100);
    free(p.cast());
    assert_eq!(stats().bytes_in_use, before);
  }
}

fn calloc_zeroes_and_rejects_overflow() {
  unsafe {
    let dirty = malloc(80).cast::<u8>();
    let pin = malloc(16);
    dirty.write_bytes(0xEE, 80);
    free(dirty.cast());

    let zeroed = calloc(10, 8).cast::<u8>();
    assert!(!zeroed.is_null());
    for i in 0..80 {
      assert_eq!(zeroed.add(i).read(), 0);
    }

    assert!(calloc(0, 8).is_null());
    assert!(calloc(8, 0).is_null());
    assert!(calloc(usize::MAX, 2).is_null());

    free(zeroed.cast());
    free(pin);
  }
}

fn realloc_moves_and_keeps_contents() {
  unsafe {
    let p = realloc(ptr::null_mut(), 40).cast::<u8>();
    assert!(!p.is_null());
    for i in 0..40 {
      p.add(i).write(i as u8);
    }

    assert_eq!(realloc(p.cast(), 16).cast::<u8>(), p);

    let q = realloc(p.cast(), 4000).cast::<u8>();
    assert!(!q.is_null());
    assert!(malloc_usable_size(q.cast()) >= 4000);
    for i in 0..40 {
      assert_eq!(q.add(i).read(), i as u8);
    }

    assert!(realloc(q.cast(), 0).is_null());
  }
}

#[test]
fn exported_entry_points_use_process_heap() {
  malloc_and_free();
  calloc_zeroes_and_rejects_overflow();
  realloc_moves_and_keeps_contents();
}
