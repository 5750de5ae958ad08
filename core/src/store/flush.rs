// trolley/src/store/flush.rs

//! The debounce/serialization discipline for persistence calls.
//!
//! `FlushScheduler` owns two pieces of machinery:
//!  - a single-slot handle to the pending debounced task, so rapid successive
//!    mutations coalesce into one outstanding flush per quiet window; and
//!  - the write gate, an async mutex serializing persistence calls so at most
//!    one write is in flight per cart. A flush arriving while a write is in
//!    flight waits on the gate and snapshots state afterwards, which is how a
//!    mutation landing mid-write is captured by the next flush instead of
//!    being dropped or raced.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{event, Level};

pub struct FlushScheduler {
  window: Duration,
  /// Pending debounced task, if any. Scheduling a new flush aborts the
  /// previous slot: the timer is reset, not accumulated.
  slot: Mutex<Option<JoinHandle<()>>>,
  /// Serializes persistence calls for this cart.
  gate: Arc<AsyncMutex<()>>,
}

impl FlushScheduler {
  pub fn new(window: Duration) -> Self {
    Self {
      window,
      slot: Mutex::new(None),
      gate: Arc::new(AsyncMutex::new(())),
    }
  }

  /// The write gate. Tasks that must be ordered after any in-flight write
  /// (deletes, immediate flushes) lock this before touching the backend.
  pub fn gate(&self) -> Arc<AsyncMutex<()>> {
    Arc::clone(&self.gate)
  }

  /// Schedules `flush` to run after the debounce window, replacing (and
  /// aborting) any previously scheduled flush. Must be called from within a
  /// tokio runtime.
  pub fn schedule<F>(&self, flush: F)
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let window = self.window;
    let mut slot = self.slot.lock();
    if let Some(previous) = slot.take() {
      previous.abort();
      event!(Level::TRACE, "debounce timer reset, previous slot aborted");
    }
    *slot = Some(tokio::spawn(async move {
      tokio::time::sleep(window).await;
      // Past the quiet window the flush is committed: it runs detached so a
      // later abort of this slot cannot tear a write mid-call. Writes are
      // only ever sequenced, via the gate, never cancelled in flight.
      let committed = tokio::spawn(flush);
      let _ = committed.await;
    }));
  }

  /// Drops the pending debounced flush, if any, without running it. A flush
  /// already past its window is not affected; it is sequenced by the gate.
  pub fn cancel_pending(&self) {
    if let Some(previous) = self.slot.lock().take() {
      previous.abort();
      event!(Level::DEBUG, "pending debounced flush cancelled");
    }
  }

  /// Flush barrier: awaits the pending debounced task (if any), then drains
  /// the write gate so any in-flight write has completed on return. Used for
  /// graceful shutdown and by tests.
  pub async fn wait_idle(&self) {
    let pending = self.slot.lock().take();
    if let Some(handle) = pending {
      // An aborted handle resolves with a cancellation error; either way the
      // slot is drained.
      let _ = handle.await;
    }
    let _guard = self.gate.lock().await;
  }
}
