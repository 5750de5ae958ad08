// trolley/src/gateway/persistence.rs

//! `PersistenceGateway<B>`: wraps a `CartBackend` so that every failure is
//! logged, reported through the notifier, and converted to a sentinel value
//! rather than propagated. The gateway never silently retries and never
//! queues failed writes for later replay.
//!
//! Write operations return a boolean ack; callers that need a hard failure
//! signal can inspect it, the cart store deliberately does not.

use crate::core::model::{Cart, CartItem, OwnerId};
use crate::error::TrolleyError;
use crate::gateway::backend::CartBackend;
use crate::gateway::notify::{Notice, Notifier};
use std::sync::Arc;
use tracing::{event, instrument, Level};
use uuid::Uuid;

pub struct PersistenceGateway<B: CartBackend> {
  backend: Arc<B>,
  notifier: Arc<dyn Notifier>,
}

impl<B: CartBackend> PersistenceGateway<B> {
  pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
    Self { backend, notifier }
  }

  /// Reports a failed remote call: logged and pushed through the notifier.
  fn report(&self, operation: &'static str, title: &str, source: anyhow::Error) {
    let err = TrolleyError::RemoteFailure { operation, source };
    event!(Level::WARN, error = %err, "remote cart operation failed");
    self.notifier.notify(Notice::new(title, err.to_string()));
  }

  /// Fetches the cart owned by `owner_id`. `None` covers both "no cart yet"
  /// (a valid empty state, no notice) and a reported remote failure.
  #[instrument(name = "PersistenceGateway::fetch_cart_by_owner", skip(self), fields(owner_id = %owner_id))]
  pub async fn fetch_cart_by_owner(&self, owner_id: OwnerId) -> Option<Cart> {
    match self.backend.fetch_cart_by_owner(owner_id).await {
      Ok(found) => found,
      Err(e) => {
        self.report("fetch-cart-by-owner", "Error syncing cart", e);
        None
      }
    }
  }

  /// Fetches the item list for `cart_id`; `None` only on a reported failure.
  #[instrument(name = "PersistenceGateway::fetch_items_by_cart", skip(self), fields(cart_id = %cart_id))]
  pub async fn fetch_items_by_cart(&self, cart_id: Uuid) -> Option<Vec<CartItem>> {
    match self.backend.fetch_items_by_cart(cart_id).await {
      Ok(items) => Some(items),
      Err(e) => {
        self.report("fetch-items-by-cart", "Error fetching cart items", e);
        None
      }
    }
  }

  #[instrument(name = "PersistenceGateway::upsert_cart", skip_all, fields(cart_id = %cart.id))]
  pub async fn upsert_cart(&self, cart: &Cart) -> bool {
    match self.backend.upsert_cart(cart).await {
      Ok(()) => true,
      Err(e) => {
        self.report("upsert-cart", "Error updating cart", e);
        false
      }
    }
  }

  /// Sends the whole item set as one batch call per flush, never one call
  /// per item.
  #[instrument(name = "PersistenceGateway::upsert_items", skip_all, fields(count = items.len()))]
  pub async fn upsert_items(&self, items: &[CartItem]) -> bool {
    match self.backend.upsert_items(items).await {
      Ok(()) => true,
      Err(e) => {
        self.report("upsert-items", "Error updating cart items", e);
        false
      }
    }
  }

  #[instrument(name = "PersistenceGateway::delete_item", skip(self), fields(item_id = %item_id))]
  pub async fn delete_item(&self, item_id: Uuid) -> bool {
    match self.backend.delete_item(item_id).await {
      Ok(()) => true,
      Err(e) => {
        self.report("delete-item-by-id", "Error removing item from cart", e);
        false
      }
    }
  }

  #[instrument(name = "PersistenceGateway::delete_cart", skip(self), fields(cart_id = %cart_id))]
  pub async fn delete_cart(&self, cart_id: Uuid) -> bool {
    match self.backend.delete_cart(cart_id).await {
      Ok(()) => true,
      Err(e) => {
        self.report("delete-cart", "Error clearing cart", e);
        false
      }
    }
  }

  #[instrument(name = "PersistenceGateway::delete_items_by_cart", skip(self), fields(cart_id = %cart_id))]
  pub async fn delete_items_by_cart(&self, cart_id: Uuid) -> bool {
    match self.backend.delete_items_by_cart(cart_id).await {
      Ok(()) => true,
      Err(e) => {
        self.report("delete-items-by-cart", "Error clearing cart items", e);
        false
      }
    }
  }
}
