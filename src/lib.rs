//! # brkalloc - A Program-Break Heap Allocator
//!
//! This crate is a drop-in replacement for the process's general-purpose
//! allocator. It grows the heap with `sbrk(2)`, tracks every region it ever
//! carved in one linked list, and reuses freed regions first-fit.
//!
//! ## Overview
//!
//! ```text
//!   Heap Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌────┬──────┬────┬──────┬────┬──────┬─────────────────────────┐    │
//!   │   │ R1 │ used │ R2 │ free │ R3 │ used │      (not mapped)       │    │
//!   │   └────┴──────┴────┴──────┴────┴──────┴─────────────────────────┘    │
//!   │    ▲                              ▲   ▲                              │
//!   │    │                              │   │                              │
//!   │   head                          tail  Program                        │
//!   │                                       Break                          │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   R = block record. Records are linked head → tail in creation order,
//!   which is also address order because blocks are only ever appended at
//!   the break.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - align! macro and record alignment
//!   ├── block      - BlockRecord and user-pointer recovery
//!   ├── boundary   - HeapBoundary trait, SbrkBoundary, ArenaBoundary
//!   ├── list       - creation-ordered BlockList
//!   ├── heap       - Heap manager: find_reusable, grow, shrink_if_tail
//!   ├── allocator  - Allocator: the lock and the four entry points
//!   ├── global     - process-wide heap and BrkMalloc (unix)
//!   └── ffi        - malloc/free/calloc/realloc exports (feature "interpose")
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brkalloc::{allocate, release};
//!
//! fn main() {
//!     let ptr = allocate(64);
//!     assert!(!ptr.is_null());
//!
//!     unsafe {
//!         ptr.write_bytes(0xAB, 64);
//!         release(ptr);
//!     }
//! }
//! ```
//!
//! Or route every Rust allocation through it:
//!
//! ```rust,ignore
//! #[global_allocator]
//! static GLOBAL: brkalloc::BrkMalloc = brkalloc::BrkMalloc;
//! ```
//!
//! ## How It Works
//!
//! ```text
//!   Single Allocation:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Record       │         User Region            │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │
//!   │  │ free: false     │  │  │                          │  │
//!   │  │ next: None/ptr  │  │  │  N bytes, N = align!(n)  │  │
//!   │  └─────────────────┘  │  │                          │  │
//!   │   HEADER_SIZE bytes   │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! - **allocate**: first free record with `size >= n` is handed over whole;
//!   otherwise the break moves up by `HEADER_SIZE + align!(n)`.
//! - **release**: a record that ends at the break is unlinked and the break
//!   moves back down; any other record is marked free and kept for reuse.
//! - **allocate_zeroed** and **resize** are built from the two above.
//!
//! Every entry point takes one process-wide `pthread` mutex for its
//! critical section; contended callers sleep rather than spin. There are
//! no per-thread caches, size classes, splitting or coalescing.
//!
//! ## Features
//!
//! - `interpose`: export `malloc`, `free`, `calloc`, `realloc` and
//!   `malloc_usable_size` from the `cdylib` for `LD_PRELOAD`.
//! - `trace`: emit engine log records through `log`. Keep it off when the
//!   installed logger allocates from this heap.
//!
//! ## Safety
//!
//! Releasing or resizing a pointer this heap did not hand out, or releasing
//! one twice, is undefined behavior, as with the allocator it replaces.

pub mod align;
mod allocator;
mod block;
pub mod boundary;
mod error;
#[cfg(all(unix, feature = "interpose", not(test)))]
mod ffi;
#[cfg(unix)]
mod global;
mod heap;
mod list;
mod sync;

pub use allocator::Allocator;
pub use block::HEADER_SIZE;
pub use boundary::{ArenaBoundary, HeapBoundary};
#[cfg(unix)]
pub use boundary::SbrkBoundary;
pub use error::HeapError;
#[cfg(unix)]
pub use global::{
  BrkMalloc, allocate, allocate_zeroed, process_heap, release, resize, stats, usable_size,
};
pub use heap::HeapStats;
