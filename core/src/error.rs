// trolley/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrolleyError {
  /// Caller passed an item index outside the current cart. This is a
  /// programming-contract violation, surfaced as a hard local error rather
  /// than being swallowed.
  #[error("cart item index {index} out of range (cart has {len} items)")]
  IndexOutOfRange { index: usize, len: usize },

  /// A backing-store call failed. Constructed by the persistence gateway for
  /// logging and user notification; never propagated past the store boundary.
  #[error("remote cart operation '{operation}' failed. Source: {source}")]
  RemoteFailure {
    operation: &'static str,
    #[source]
    source: AnyhowError,
  },

  #[error("configuration error: {0}")]
  Config(String),
}

pub type TrolleyResult<T, E = TrolleyError> = std::result::Result<T, E>;
