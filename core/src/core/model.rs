// trolley/src/core/model.rs

//! Cart and cart-item records, plus the derived-total helpers used by the
//! store before every mutation commit and every persistence call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated identity a cart is associated with; absent for
/// anonymous carts.
pub type OwnerId = Uuid;

/// One product line entry within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
  /// Assigned by the backing store; `None` until the item has been persisted.
  pub id: Option<Uuid>,
  /// Foreign key to the owning cart; `None` until a cart exists. The store
  /// stamps this when a cart is created or adopted.
  pub cart_id: Option<Uuid>,
  pub product_id: Uuid,
  /// Unit price quoted at the time of add, in integer cents.
  pub unit_price_cents: i64,
  /// Always `>= 1`. An item whose quantity would reach 0 is removed from the
  /// cart instead; a zero-quantity item is never persisted.
  pub quantity: u32,
}

impl CartItem {
  pub fn new(product_id: Uuid, unit_price_cents: i64, quantity: u32, cart_id: Option<Uuid>) -> Self {
    Self {
      id: None,
      cart_id,
      product_id,
      unit_price_cents,
      quantity,
    }
  }

  pub fn line_total_cents(&self) -> i64 {
    self.unit_price_cents * i64::from(self.quantity)
  }
}

/// The aggregate record of a user's in-progress purchase selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
  pub id: Uuid,
  /// `None` while the cart exists locally only, before an owner is known.
  pub owner_id: Option<OwnerId>,
  pub currency: String,
  /// Derived: must equal the sum of `unit_price_cents * quantity` over the
  /// cart's current items. Recomputed on every mutation and again before
  /// every persistence call.
  pub total_price_cents: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  /// Creates a fresh local cart record. The id is generated client-side so
  /// items can be stamped with it before the record first reaches the
  /// backing store.
  pub fn new_local(owner_id: Option<OwnerId>, currency: &str) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      owner_id,
      currency: currency.to_string(),
      total_price_cents: 0,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Sum of `unit_price_cents * quantity` over `items`.
pub fn total_price_cents(items: &[CartItem]) -> i64 {
  items.iter().map(CartItem::line_total_cents).sum()
}

/// Sum of quantities over `items`.
pub fn total_quantity(items: &[CartItem]) -> u32 {
  items.iter().map(|item| item.quantity).sum()
}
