use thiserror::Error;

/// Reasons a request produces no allocation.
///
/// Callers of the C-style entry points only ever see a null pointer; the
/// distinction is kept for the engine's own control flow and its logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
  #[error("zero-size request")]
  ZeroSize,
  #[error("heap boundary could not be extended by {requested} bytes")]
  Exhausted { requested: usize },
}

pub type Result<T> = std::result::Result<T, HeapError>;
