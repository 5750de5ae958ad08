// trolley/src/gateway/backend.rs

//! Defines the `CartBackend` trait: the remote operations the storefront's
//! backing store must provide. Each store-level intent maps to exactly one
//! remote call; the trait does not retry, batch across flushes, or queue.

use crate::core::model::{Cart, CartItem, OwnerId};
use async_trait::async_trait;
use uuid::Uuid;

/// Request/response operations against the backing relational store.
///
/// Implementations wrap their transport errors in `anyhow::Error`; the
/// gateway decides how a failure is reported. A fetch finding no record is
/// the `Ok(None)` / empty-vec case, not an error.
#[async_trait]
pub trait CartBackend: Send + Sync + 'static {
  /// Fetches the cart owned by `owner_id`, if one exists.
  async fn fetch_cart_by_owner(&self, owner_id: OwnerId) -> anyhow::Result<Option<Cart>>;

  /// Fetches the ordered item list belonging to `cart_id`.
  async fn fetch_items_by_cart(&self, cart_id: Uuid) -> anyhow::Result<Vec<CartItem>>;

  /// Creates or updates the cart record.
  async fn upsert_cart(&self, cart: &Cart) -> anyhow::Result<()>;

  /// Creates or updates the given items as a single batch call.
  async fn upsert_items(&self, items: &[CartItem]) -> anyhow::Result<()>;

  /// Deletes one persisted item by its store-assigned id.
  async fn delete_item(&self, item_id: Uuid) -> anyhow::Result<()>;

  /// Deletes the cart record.
  async fn delete_cart(&self, cart_id: Uuid) -> anyhow::Result<()>;

  /// Deletes every item belonging to `cart_id`.
  async fn delete_items_by_cart(&self, cart_id: Uuid) -> anyhow::Result<()>;
}
