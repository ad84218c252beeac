//! The process-wide heap lock.
//!
//! A `pthread_mutex_t` behind `lock_api`, so a contended caller sleeps in the
//! kernel instead of spinning. It is statically initialized, never allocates
//! and is never destroyed.

use std::cell::UnsafeCell;

use lock_api::{GuardNoSend, RawMutex};

pub struct RawPthreadMutex {
  inner: UnsafeCell<libc::pthread_mutex_t>,
}

// SAFETY: pthread mutexes are built to be shared between threads.
unsafe impl Send for RawPthreadMutex {}
unsafe impl Sync for RawPthreadMutex {}

unsafe impl RawMutex for RawPthreadMutex {
  #[allow(clippy::declare_interior_mutable_const)]
  const INIT: Self = Self {
    inner: UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER),
  };

  // pthread requires the unlocking thread to be the one that locked.
  type GuardMarker = GuardNoSend;

  fn lock(&self) {
    let rc = unsafe { libc::pthread_mutex_lock(self.inner.get()) };
    debug_assert_eq!(rc, 0, "pthread_mutex_lock failed");
  }

  fn try_lock(&self) -> bool {
    unsafe { libc::pthread_mutex_trylock(self.inner.get()) == 0 }
  }

  unsafe fn unlock(&self) {
    let rc = unsafe { libc::pthread_mutex_unlock(self.inner.get()) };
    debug_assert_eq!(rc, 0, "pthread_mutex_unlock failed");
  }
}

pub type Mutex<T> = lock_api::Mutex<RawPthreadMutex, T>;
