use std::io::Read;

use brkalloc::{HEADER_SIZE, allocate, allocate_zeroed, process_heap, release, resize, stats};

/// Waits until the user presses ENTER when the demo runs with `--step`.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `gdb`, or just watch the program break move between steps.
fn pause(step: bool) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

/// Prints the program break and a summary of the block list.
fn print_heap(label: &str) {
  println!(
    "[{}] PID = {}, program break = {:?}, {}",
    label,
    std::process::id(),
    process_heap().heap_end(),
    stats(),
  );
}

fn main() {
  let step = std::env::args().any(|arg| arg == "--step");

  unsafe {
    print_heap("start");
    pause(step);

    // --------------------------------------------------------------------
    // 1) Three allocations appended at the break.
    // --------------------------------------------------------------------
    let first = allocate(4);
    let second = allocate(12);
    let third = allocate(64);
    println!("\n[1] first = {first:?}, second = {second:?}, third = {third:?}");
    println!(
      "[1] records are {} bytes, so second - first = {}",
      HEADER_SIZE,
      second as usize - first as usize
    );
    (first as *mut u32).write(0xDEADBEEF);
    print_heap("1");
    pause(step);

    // --------------------------------------------------------------------
    // 2) Release an interior block: it stays on the list, marked free.
    // --------------------------------------------------------------------
    release(first);
    print_heap("2");

    let reused = allocate(2);
    println!(
      "[2] allocate(2) = {reused:?}, reused first block? {}",
      reused == first
    );
    pause(step);

    // --------------------------------------------------------------------
    // 3) Release the tail: the break moves back down.
    // --------------------------------------------------------------------
    let before = process_heap().heap_end();
    release(third);
    let after = process_heap().heap_end();
    println!(
      "\n[3] released tail, break {:?} -> {:?} ({} bytes)",
      before,
      after,
      before as usize - after as usize
    );
    pause(step);

    // --------------------------------------------------------------------
    // 4) Zeroed allocation and resize.
    // --------------------------------------------------------------------
    let zeroed = allocate_zeroed(16, 4) as *mut u32;
    println!("\n[4] allocate_zeroed(16, 4)[15] = {}", zeroed.add(15).read());

    let grown = resize(second, 256);
    println!("[4] resize(second, 256) = {grown:?} (was {second:?})");
    print_heap("4");
    pause(step);

    release(grown);
    release(zeroed as *mut u8);
    release(reused);
    print_heap("end");
  }
}
