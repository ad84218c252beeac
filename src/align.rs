/// Alignment of every block record and every user region, in bytes.
pub const RECORD_ALIGN: usize = 16;

/// Rounds a byte count up to the record alignment.
///
/// # Examples
///
/// ```rust
/// use brkalloc::align;
///
/// assert_eq!(align!(1), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(100), 112);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::RECORD_ALIGN - 1) & !($crate::align::RECORD_ALIGN - 1)
  };
}

/// Rounds `value` up to the record alignment, or `None` if that overflows.
pub fn checked_align(value: usize) -> Option<usize> {
  value
    .checked_add(RECORD_ALIGN - 1)
    .map(|v| v & !(RECORD_ALIGN - 1))
}

/// Bytes needed to move `addr` up to the next record boundary.
pub fn padding_for(addr: usize) -> usize {
  addr.wrapping_neg() & (RECORD_ALIGN - 1)
}
