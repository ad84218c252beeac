//! Many threads hammering one shared heap.
//!
//! Each thread fills every region it gets with its own pattern, remembers a
//! checksum, and verifies the checksum right before releasing the region.
//! An overlapping region or a trampled record shows up as a mismatch.

use std::{sync::Arc, thread};

use brkalloc::{Allocator, ArenaBoundary};

const THREADS: usize = 8;
const CYCLES: usize = 2_000;
const LIVE: usize = 8;

struct Region {
  ptr: *mut u8,
  len: usize,
  checksum: u64,
}

fn xorshift(state: &mut u64) -> u64 {
  *state ^= *state << 13;
  *state ^= *state >> 7;
  *state ^= *state << 17;
  *state
}

fn checksum(
  ptr: *const u8,
  len: usize,
) -> u64 {
  let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
  bytes
    .iter()
    .fold(0xcbf2_9ce4_8422_2325u64, |hash, &b| (hash ^ b as u64).wrapping_mul(0x100_0000_01b3))
}

fn fill(
  ptr: *mut u8,
  len: usize,
  state: &mut u64,
) -> u64 {
  for i in 0..len {
    unsafe { ptr.add(i).write(xorshift(state) as u8) };
  }
  checksum(ptr, len)
}

fn churn(
  heap: &Allocator<ArenaBoundary>,
  thread_id: usize,
) {
  let mut state = 0x9E37_79B9_7F4A_7C15 ^ (thread_id as u64 + 1);
  let mut live: Vec<Region> = Vec::with_capacity(LIVE);

  for cycle in 0..CYCLES {
    if live.len() == LIVE || (cycle % 3 == 2 && !live.is_empty()) {
      let victim = xorshift(&mut state) as usize % live.len();
      let region = live.swap_remove(victim);
      assert_eq!(
        checksum(region.ptr, region.len),
        region.checksum,
        "thread {thread_id} found a corrupted region at cycle {cycle}"
      );
      unsafe { heap.release(region.ptr) };
    }

    // Thread `t` only ever asks for sizes in (64 * t, 64 * (t + 1)].
    let len = 64 * thread_id + 1 + xorshift(&mut state) as usize % 64;
    let ptr = heap.allocate(len);
    assert!(!ptr.is_null(), "thread {thread_id} ran out of heap");

    let checksum = fill(ptr, len, &mut state);
    live.push(Region { ptr, len, checksum });
  }

  for region in live {
    assert_eq!(checksum(region.ptr, region.len), region.checksum);
    unsafe { heap.release(region.ptr) };
  }
}

#[test_log::test]
fn concurrent_churn_never_overlaps() {
  let heap = Arc::new(Allocator::new(ArenaBoundary::with_capacity(16 << 20)));

  let workers: Vec<_> = (0..THREADS)
    .map(|thread_id| {
      let heap = Arc::clone(&heap);
      thread::spawn(move || churn(&heap, thread_id))
    })
    .collect();

  for worker in workers {
    worker.join().unwrap();
  }

  let stats = heap.stats();
  assert_eq!(stats.bytes_in_use, 0);
  assert_eq!(stats.blocks, stats.free_blocks);
}

#[test_log::test]
fn concurrent_zeroed_and_resize() {
  let heap = Arc::new(Allocator::new(ArenaBoundary::with_capacity(16 << 20)));

  let workers: Vec<_> = (0..4)
    .map(|thread_id| {
      let heap = Arc::clone(&heap);
      thread::spawn(move || {
        for round in 0..500 {
          let count = 1 + (round + thread_id) % 16;
          let p = heap.allocate_zeroed(count, 8);
          assert!(!p.is_null());
          assert_eq!(checksum(p, count * 8), checksum(vec![0u8; count * 8].as_ptr(), count * 8));

          unsafe {
            p.write_bytes(thread_id as u8 + 1, count * 8);
            let q = heap.resize(p, count * 8 + 200);
            assert!(!q.is_null());
            for i in 0..count * 8 {
              assert_eq!(q.add(i).read(), thread_id as u8 + 1);
            }
            heap.release(q);
          }
        }
      })
    })
    .collect();

  for worker in workers {
    worker.join().unwrap();
  }

  assert_eq!(heap.stats().bytes_in_use, 0);
}
