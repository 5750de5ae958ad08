// trolley/src/core/phase.rs

//! The states of the owner-reconciliation protocol.

/// Where the store currently stands in the owner-reconciliation state
/// machine. Transitions are driven by explicit owner-changed events; each
/// transition bumps the store's epoch counter so that stale in-flight fetch
/// responses can be discarded instead of clobbering newer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
  /// No owner is known. A cart may exist locally only; it is never persisted
  /// while anonymous.
  #[default]
  Anonymous,
  /// An owner just became known; reconciliation against the server-side cart
  /// is in flight.
  Syncing,
  /// Owner known and local state mirrors the server.
  Synced,
  /// The owner was just cleared; local state is already empty and remote
  /// teardown is in flight. Settles back to `Anonymous` once teardown
  /// completes under a still-current epoch.
  SignedOut,
}
