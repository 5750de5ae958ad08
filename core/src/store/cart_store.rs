// trolley/src/store/cart_store.rs

//! `CartStore<B>`: the authoritative in-process representation of "my cart".
//!
//! All mutation operations are synchronous against in-memory state;
//! persistence is scheduled asynchronously and is optimistic: a failed write
//! is reported but local state is never rolled back. The store is an
//! explicit per-session object, not a hidden global; construct one per
//! session context and hand clones of `shared_state()` to observers.
//!
//! The store must be constructed and used within a tokio runtime; mutations
//! spawn persistence tasks on it.

use crate::core::model::{self, Cart, CartItem, OwnerId};
use crate::core::phase::SyncPhase;
use crate::core::shared::SharedState;
use crate::error::{TrolleyError, TrolleyResult};
use crate::gateway::backend::CartBackend;
use crate::gateway::notify::{LogNotifier, Notifier};
use crate::gateway::persistence::PersistenceGateway;
use crate::store::config::StoreConfig;
use crate::store::flush::FlushScheduler;
use chrono::Utc;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{event, instrument, Level};
use uuid::Uuid;

/// The observable cart state: line items, cart metadata, owner, and where
/// the store stands in the reconciliation protocol.
#[derive(Debug, Clone, Default)]
pub struct CartState {
  /// Ordered line items. Never contains a zero-quantity item.
  pub items: Vec<CartItem>,
  /// `None` until the first add-to-cart creates a cart lazily, and again
  /// after clear-cart or sign-out.
  pub cart: Option<Cart>,
  pub owner: Option<OwnerId>,
  pub phase: SyncPhase,
}

pub struct CartStore<B: CartBackend> {
  pub(crate) state: SharedState<CartState>,
  pub(crate) gateway: Arc<PersistenceGateway<B>>,
  pub(crate) flush: FlushScheduler,
  /// Monotonically increasing fencing token; bumped on every owner
  /// transition. See `store::sync`.
  pub(crate) epoch: Arc<AtomicU64>,
  pub(crate) config: StoreConfig,
}

impl<B: CartBackend> CartStore<B> {
  pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>, config: StoreConfig) -> Self {
    let flush = FlushScheduler::new(config.debounce_window);
    Self {
      state: SharedState::new(CartState::default()),
      gateway: Arc::new(PersistenceGateway::new(backend, notifier)),
      flush,
      epoch: Arc::new(AtomicU64::new(0)),
      config,
    }
  }

  /// Convenience constructor: default config, notices go to the log.
  pub fn with_defaults(backend: Arc<B>) -> Self {
    Self::new(backend, Arc::new(LogNotifier), StoreConfig::default())
  }

  // --- Observable surface ---

  pub fn cart_items(&self) -> Vec<CartItem> {
    self.state.read().items.clone()
  }

  pub fn cart(&self) -> Option<Cart> {
    self.state.read().cart.clone()
  }

  /// Derived: sum of quantities over current items.
  pub fn total_quantity(&self) -> u32 {
    model::total_quantity(&self.state.read().items)
  }

  /// Derived: the cart's recomputed total, 0 when no cart exists.
  pub fn total_price_cents(&self) -> i64 {
    let guard = self.state.read();
    guard.cart.as_ref().map_or(0, |cart| cart.total_price_cents)
  }

  pub fn owner(&self) -> Option<OwnerId> {
    self.state.read().owner
  }

  pub fn sync_phase(&self) -> SyncPhase {
    self.state.read().phase
  }

  /// A cloneable live view of the cart state for observers. Guards obtained
  /// from it must not be held across `.await` points.
  pub fn shared_state(&self) -> SharedState<CartState> {
    self.state.clone()
  }

  // --- Mutation operations ---

  /// Adds `quantity` of `product_id` at the quoted price. If an item with
  /// this product already exists, its quantity grows by `quantity` and its
  /// stored price is overwritten with the latest quote (refreshed, not
  /// re-averaged). Product existence is assumed validated upstream.
  pub fn add_item(&self, product_id: Uuid, unit_price_cents: i64, quantity: u32) {
    debug_assert!(quantity >= 1, "add_item quantity must be positive");
    {
      let mut guard = self.state.write();
      let state = &mut *guard;

      // A mutation while torn down means the session is anonymous again.
      if state.owner.is_none() && state.phase == SyncPhase::SignedOut {
        state.phase = SyncPhase::Anonymous;
      }

      // Lazy cart creation on first add; existing items get stamped.
      if state.cart.is_none() {
        let cart = Cart::new_local(state.owner, &self.config.currency);
        let cart_id = cart.id;
        state.cart = Some(cart);
        for item in &mut state.items {
          item.cart_id = Some(cart_id);
        }
      }
      let cart_id = state.cart.as_ref().map(|cart| cart.id);

      match state.items.iter().position(|item| item.product_id == product_id) {
        Some(existing_idx) => {
          let existing = &mut state.items[existing_idx];
          existing.quantity += quantity;
          existing.unit_price_cents = unit_price_cents;
        }
        None => {
          state
            .items
            .push(CartItem::new(product_id, unit_price_cents, quantity, cart_id));
        }
      }

      recompute_total(state);
    }
    self.schedule_flush();
  }

  /// Removes the item at `index`. If the item carries a persisted id and an
  /// owner is signed in, a delete-by-id call is issued independently of the
  /// debounced upsert path.
  pub fn remove_item(&self, index: usize) -> TrolleyResult<()> {
    let (removed, owner) = {
      let mut guard = self.state.write();
      let len = guard.items.len();
      if index >= len {
        return Err(TrolleyError::IndexOutOfRange { index, len });
      }
      let removed = guard.items.remove(index);
      recompute_total(&mut guard);
      (removed, guard.owner)
    };

    self.spawn_item_delete(&removed, owner);
    self.schedule_flush();
    Ok(())
  }

  /// Increments the item's quantity by 1.
  pub fn increase_quantity(&self, index: usize) -> TrolleyResult<()> {
    {
      let mut guard = self.state.write();
      let len = guard.items.len();
      match guard.items.get_mut(index) {
        Some(item) => item.quantity += 1,
        None => return Err(TrolleyError::IndexOutOfRange { index, len }),
      }
      recompute_total(&mut guard);
    }
    self.schedule_flush();
    Ok(())
  }

  /// Decrements the item's quantity by 1. Decrementing an item at quantity 1
  /// removes it; quantity never reaches 0 while the item is in the list.
  /// Remove-vs-decrement is decided in one critical section.
  pub fn decrease_quantity(&self, index: usize) -> TrolleyResult<()> {
    let removed = {
      let mut guard = self.state.write();
      let state = &mut *guard;
      let len = state.items.len();
      if index >= len {
        return Err(TrolleyError::IndexOutOfRange { index, len });
      }
      let removed = if state.items[index].quantity == 1 {
        let removed = state.items.remove(index);
        Some((removed, state.owner))
      } else {
        state.items[index].quantity -= 1;
        None
      };
      recompute_total(state);
      removed
    };

    if let Some((removed, owner)) = removed {
      self.spawn_item_delete(&removed, owner);
    }
    self.schedule_flush();
    Ok(())
  }

  /// Empties the item list and nulls the cart record synchronously. The
  /// pending debounced flush is cancelled first so it cannot resurrect the
  /// cleared cart; if a server-side cart existed, its deletes are spawned
  /// behind the write gate and therefore run after any in-flight upsert.
  #[instrument(name = "CartStore::clear_cart", skip(self))]
  pub fn clear_cart(&self) {
    self.flush.cancel_pending();

    let (cart, owner) = {
      let mut guard = self.state.write();
      let cart = guard.cart.take();
      guard.items.clear();
      (cart, guard.owner)
    };

    if let (Some(cart), Some(_)) = (cart, owner) {
      let gateway = Arc::clone(&self.gateway);
      let gate = self.flush.gate();
      tokio::spawn(async move {
        let _guard = gate.lock().await;
        let _ = gateway.delete_cart(cart.id).await;
        let _ = gateway.delete_items_by_cart(cart.id).await;
      });
    }
  }

  /// Issues a remote delete-by-id for an item removed from the list, when it
  /// has a persisted id and an owner is signed in.
  fn spawn_item_delete(&self, removed: &CartItem, owner: Option<OwnerId>) {
    if let (Some(item_id), Some(_)) = (removed.id, owner) {
      let gateway = Arc::clone(&self.gateway);
      tokio::spawn(async move {
        let _ = gateway.delete_item(item_id).await;
      });
    }
  }

  // --- Persistence scheduling ---

  /// (Re)schedules the debounced flush carrying whatever state exists when
  /// the window elapses.
  pub(crate) fn schedule_flush(&self) {
    let state = self.state.clone();
    let gateway = Arc::clone(&self.gateway);
    let gate = self.flush.gate();
    self.flush.schedule(run_flush(state, gateway, gate));
  }

  /// Runs one flush immediately through the serialized write path, skipping
  /// the debounce window. Used by the sign-in create path and available for
  /// hosts that need a fresh server cart (e.g. right before checkout).
  pub async fn flush_now(&self) {
    run_flush(self.state.clone(), Arc::clone(&self.gateway), self.flush.gate()).await;
  }

  /// Flush barrier: resolves once no debounced flush is pending and no write
  /// is in flight.
  pub async fn wait_idle(&self) {
    self.flush.wait_idle().await;
  }
}

/// Recomputes the derived cart total from the current items and stamps
/// `updated_at`. Called after every mutation and inside the flush snapshot.
pub(crate) fn recompute_total(state: &mut CartState) {
  let total = model::total_price_cents(&state.items);
  if let Some(cart) = state.cart.as_mut() {
    cart.total_price_cents = total;
    cart.updated_at = Utc::now();
  }
}

/// One persistence pass: waits its turn on the write gate, snapshots state
/// (so mutations that landed during an earlier in-flight write are
/// captured), then issues upsert-cart plus one batch upsert-items call.
/// Anonymous carts stay local; the flush is a no-op without an owner, and
/// while reconciliation is in flight the snapshot is skipped rather than
/// racing the adoption.
async fn run_flush<B: CartBackend>(
  state: SharedState<CartState>,
  gateway: Arc<PersistenceGateway<B>>,
  gate: Arc<AsyncMutex<()>>,
) {
  let _guard = gate.lock().await;

  let snapshot = {
    let mut guard = state.write();
    let state = &mut *guard;
    if state.phase == SyncPhase::Syncing {
      None
    } else {
      match (state.owner, state.cart.as_mut()) {
        (Some(_), Some(cart)) => {
          cart.total_price_cents = model::total_price_cents(&state.items);
          cart.updated_at = Utc::now();
          let cart_id = cart.id;
          for item in &mut state.items {
            item.cart_id = Some(cart_id);
          }
          Some((cart.clone(), state.items.clone()))
        }
        _ => None,
      }
    }
  };

  let Some((cart, items)) = snapshot else {
    event!(Level::TRACE, "flush skipped: no owner, no cart, or mid-sync");
    return;
  };

  let _ = gateway.upsert_cart(&cart).await;
  let _ = gateway.upsert_items(&items).await;
}
