// trolley/src/store/sync.rs

//! The owner-reconciliation state machine.
//!
//! Driven by explicit owner-changed events rather than implicit observer
//! callbacks. Every transition bumps the store's epoch counter; a fetch
//! response is applied only while its epoch is still current, so a slow
//! stale fetch can never overwrite a faster, newer transition. Later
//! triggers always win; syncs are never queued. "Cancellation" means
//! ignoring a late response, not aborting the in-flight request.

use crate::core::model::Cart;
use crate::core::model::OwnerId;
use crate::core::phase::SyncPhase;
use crate::gateway::backend::CartBackend;
use crate::store::cart_store::{recompute_total, CartStore};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{event, instrument, Level};

impl<B: CartBackend> CartStore<B> {
  /// Feeds an authentication transition into the store: `Some` runs the
  /// sign-in reconciliation, `None` the sign-out teardown.
  pub async fn owner_changed(&self, owner: Option<OwnerId>) {
    match owner {
      Some(owner_id) => self.sign_in(owner_id).await,
      None => self.sign_out(),
    }
  }

  /// Reconciles local state against the server cart for `owner_id`.
  ///
  /// - Server cart found: adopt it wholesale; cart metadata and the item
  ///   list are replaced by the fetched records. Items accumulated while
  ///   anonymous are discarded under this policy.
  /// - No server cart but local items exist: the local cart is
  ///   authoritative; the owner is stamped on and the cart is persisted
  ///   immediately through the serialized write path (create path).
  /// - Neither: remain empty.
  ///
  /// Resolves to `Synced` unless a newer transition fenced this one out.
  #[instrument(name = "CartStore::sign_in", skip(self), fields(owner_id = %owner_id))]
  pub async fn sign_in(&self, owner_id: OwnerId) {
    let epoch = self.bump_epoch();
    // A flush debounced while anonymous must not fire once the owner is set
    // mid-sync; it would persist exactly the state adoption is about to
    // replace.
    self.flush.cancel_pending();
    {
      let mut guard = self.state.write();
      guard.owner = Some(owner_id);
      guard.phase = SyncPhase::Syncing;
    }

    let fetched = self.gateway.fetch_cart_by_owner(owner_id).await;
    if !self.epoch_is_current(epoch) {
      event!(Level::INFO, epoch, "discarding stale cart fetch");
      return;
    }

    match fetched {
      Some(server_cart) => {
        let items = self
          .gateway
          .fetch_items_by_cart(server_cart.id)
          .await
          .unwrap_or_default();
        if !self.epoch_is_current(epoch) {
          event!(Level::INFO, epoch, "discarding stale item fetch");
          return;
        }

        let mut guard = self.state.write();
        let state = &mut *guard;
        let cart_id = server_cart.id;
        state.items = items;
        for item in &mut state.items {
          item.cart_id = Some(cart_id);
        }
        state.cart = Some(server_cart);
        recompute_total(state);
        state.phase = SyncPhase::Synced;
        event!(Level::DEBUG, %cart_id, "adopted server cart");
      }
      None => {
        let has_local_items = !self.state.read().items.is_empty();
        if has_local_items {
          {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let cart = state
              .cart
              .get_or_insert_with(|| Cart::new_local(Some(owner_id), &self.config.currency));
            cart.owner_id = Some(owner_id);
            let cart_id = cart.id;
            for item in &mut state.items {
              item.cart_id = Some(cart_id);
            }
            recompute_total(state);
            state.phase = SyncPhase::Synced;
          }
          event!(Level::DEBUG, "no server cart; persisting local cart (create path)");
          self.flush_now().await;
        } else {
          self.state.write().phase = SyncPhase::Synced;
          event!(Level::DEBUG, "no server cart and no local items; synced empty");
        }
      }
    }
  }

  /// Tears down on sign-out. Local state is cleared synchronously, before
  /// any await point, regardless of in-flight writes; a debounced write
  /// still in flight at this instant is best-effort and may be lost (an
  /// accepted data-loss window, deliberately not closed by blocking the
  /// transition). Remote teardown runs behind the write gate; when it
  /// finishes under a still-current epoch the phase settles to `Anonymous`.
  ///
  /// Policy: clear immediately and delete the server-side cart, matching the
  /// storefront's sign-out wiring.
  #[instrument(name = "CartStore::sign_out", skip(self))]
  pub fn sign_out(&self) {
    // Fences any in-flight sign-in fetch.
    let epoch = self.bump_epoch();
    self.flush.cancel_pending();

    let (cart, had_owner) = {
      let mut guard = self.state.write();
      let cart = guard.cart.take();
      guard.items.clear();
      let had_owner = guard.owner.take().is_some();
      guard.phase = SyncPhase::SignedOut;
      (cart, had_owner)
    };

    let state = self.state.clone();
    let epoch_counter = Arc::clone(&self.epoch);
    let gateway = Arc::clone(&self.gateway);
    let gate = self.flush.gate();
    tokio::spawn(async move {
      if let (Some(cart), true) = (cart, had_owner) {
        let _guard = gate.lock().await;
        let _ = gateway.delete_cart(cart.id).await;
        let _ = gateway.delete_items_by_cart(cart.id).await;
      }
      if epoch_counter.load(Ordering::SeqCst) == epoch {
        state.write().phase = SyncPhase::Anonymous;
      }
    });
  }

  pub(crate) fn bump_epoch(&self) -> u64 {
    self.epoch.fetch_add(1, Ordering::SeqCst) + 1
  }

  pub(crate) fn epoch_is_current(&self, epoch: u64) -> bool {
    self.epoch.load(Ordering::SeqCst) == epoch
  }

  /// The current fencing epoch; mostly useful for diagnostics.
  pub fn epoch(&self) -> u64 {
    self.epoch.load(Ordering::SeqCst)
  }
}
