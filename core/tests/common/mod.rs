// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use trolley::{Cart, CartBackend, CartItem, CartStore, Notice, Notifier, OwnerId, StoreConfig};
use uuid::Uuid;

pub const TEST_DEBOUNCE_MS: u64 = 50;

// --- Scriptable mock backend ---
//
// Carries an in-memory "server" (carts by owner, items by cart), injectable
// delays and failure switches, call counters, and an op log for ordering
// assertions. Tracks concurrent writes so tests can assert the in-flight
// guard actually serializes persistence calls.
#[derive(Default)]
pub struct MockBackend {
  pub server_carts: Mutex<HashMap<OwnerId, Cart>>,
  pub server_items: Mutex<HashMap<Uuid, Vec<CartItem>>>,

  pub fetch_cart_delay: Mutex<HashMap<OwnerId, Duration>>,
  pub write_delay: Mutex<Option<Duration>>,
  pub fail_fetches: AtomicBool,
  pub fail_writes: AtomicBool,

  pub op_log: Mutex<Vec<String>>,
  pub upsert_cart_calls: AtomicUsize,
  pub upsert_items_calls: AtomicUsize,
  pub delete_item_calls: AtomicUsize,
  pub delete_cart_calls: AtomicUsize,
  pub delete_items_by_cart_calls: AtomicUsize,

  pub last_upserted_cart: Mutex<Option<Cart>>,
  pub last_upserted_items: Mutex<Option<Vec<CartItem>>>,
  pub last_deleted_item: Mutex<Option<Uuid>>,

  writes_in_flight: AtomicUsize,
  pub max_writes_in_flight: AtomicUsize,
}

pub struct FlightGuard<'a>(&'a MockBackend);

impl Drop for FlightGuard<'_> {
  fn drop(&mut self) {
    self.0.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
  }
}

impl MockBackend {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  /// Seeds a server-side cart for `owner` with one item per
  /// `(product_id, unit_price_cents, quantity)` tuple; every seeded item
  /// carries a store-assigned id.
  pub fn seed_server_cart(&self, owner: OwnerId, item_specs: &[(Uuid, i64, u32)]) -> Cart {
    let now = Utc::now();
    let cart_id = Uuid::new_v4();
    let items: Vec<CartItem> = item_specs
      .iter()
      .map(|&(product_id, unit_price_cents, quantity)| CartItem {
        id: Some(Uuid::new_v4()),
        cart_id: Some(cart_id),
        product_id,
        unit_price_cents,
        quantity,
      })
      .collect();
    let cart = Cart {
      id: cart_id,
      owner_id: Some(owner),
      currency: "$".to_string(),
      total_price_cents: items.iter().map(|i| i.unit_price_cents * i64::from(i.quantity)).sum(),
      created_at: now,
      updated_at: now,
    };
    self.server_carts.lock().insert(owner, cart.clone());
    self.server_items.lock().insert(cart_id, items);
    cart
  }

  pub fn writes_in_flight(&self) -> usize {
    self.writes_in_flight.load(Ordering::SeqCst)
  }

  fn log(&self, op: &str) {
    self.op_log.lock().push(op.to_string());
  }

  fn enter_write(&self) -> FlightGuard<'_> {
    let now = self.writes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_writes_in_flight.fetch_max(now, Ordering::SeqCst);
    FlightGuard(self)
  }

  async fn apply_write_delay(&self) {
    let delay = *self.write_delay.lock();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
  }
}

#[async_trait]
impl CartBackend for MockBackend {
  async fn fetch_cart_by_owner(&self, owner_id: OwnerId) -> anyhow::Result<Option<Cart>> {
    let delay = self.fetch_cart_delay.lock().get(&owner_id).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    self.log("fetch-cart-by-owner");
    if self.fail_fetches.load(Ordering::SeqCst) {
      anyhow::bail!("backing store unavailable");
    }
    Ok(self.server_carts.lock().get(&owner_id).cloned())
  }

  async fn fetch_items_by_cart(&self, cart_id: Uuid) -> anyhow::Result<Vec<CartItem>> {
    self.log("fetch-items-by-cart");
    if self.fail_fetches.load(Ordering::SeqCst) {
      anyhow::bail!("backing store unavailable");
    }
    Ok(self.server_items.lock().get(&cart_id).cloned().unwrap_or_default())
  }

  async fn upsert_cart(&self, cart: &Cart) -> anyhow::Result<()> {
    let _flight = self.enter_write();
    self.apply_write_delay().await;
    self.log("upsert-cart");
    self.upsert_cart_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      anyhow::bail!("upsert rejected");
    }
    if let Some(owner) = cart.owner_id {
      self.server_carts.lock().insert(owner, cart.clone());
    }
    *self.last_upserted_cart.lock() = Some(cart.clone());
    Ok(())
  }

  async fn upsert_items(&self, items: &[CartItem]) -> anyhow::Result<()> {
    let _flight = self.enter_write();
    self.apply_write_delay().await;
    self.log("upsert-items");
    self.upsert_items_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      anyhow::bail!("upsert rejected");
    }
    if let Some(cart_id) = items.first().and_then(|item| item.cart_id) {
      self.server_items.lock().insert(cart_id, items.to_vec());
    }
    *self.last_upserted_items.lock() = Some(items.to_vec());
    Ok(())
  }

  async fn delete_item(&self, item_id: Uuid) -> anyhow::Result<()> {
    self.log("delete-item-by-id");
    self.delete_item_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      anyhow::bail!("delete rejected");
    }
    for items in self.server_items.lock().values_mut() {
      items.retain(|item| item.id != Some(item_id));
    }
    *self.last_deleted_item.lock() = Some(item_id);
    Ok(())
  }

  async fn delete_cart(&self, cart_id: Uuid) -> anyhow::Result<()> {
    let _flight = self.enter_write();
    self.log("delete-cart");
    self.delete_cart_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      anyhow::bail!("delete rejected");
    }
    self.server_carts.lock().retain(|_, cart| cart.id != cart_id);
    Ok(())
  }

  async fn delete_items_by_cart(&self, cart_id: Uuid) -> anyhow::Result<()> {
    let _flight = self.enter_write();
    self.log("delete-items-by-cart");
    self.delete_items_by_cart_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_writes.load(Ordering::SeqCst) {
      anyhow::bail!("delete rejected");
    }
    self.server_items.lock().remove(&cart_id);
    Ok(())
  }
}

// --- Recording notifier ---
#[derive(Default)]
pub struct RecordingNotifier {
  pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn titles(&self) -> Vec<String> {
    self.notices.lock().iter().map(|n| n.title.clone()).collect()
  }
}

impl Notifier for RecordingNotifier {
  fn notify(&self, notice: Notice) {
    self.notices.lock().push(notice);
  }
}

// --- Store construction helpers ---
pub fn test_config() -> StoreConfig {
  StoreConfig {
    debounce_window: Duration::from_millis(TEST_DEBOUNCE_MS),
    currency: "$".to_string(),
  }
}

pub fn new_store(backend: &Arc<MockBackend>) -> CartStore<MockBackend> {
  CartStore::new(Arc::clone(backend), Arc::new(trolley::LogNotifier), test_config())
}

pub fn new_store_with_notifier(backend: &Arc<MockBackend>) -> (CartStore<MockBackend>, Arc<RecordingNotifier>) {
  let notifier = RecordingNotifier::new();
  let store = CartStore::new(Arc::clone(backend), notifier.clone(), test_config());
  (store, notifier)
}

pub fn pid() -> Uuid {
  Uuid::new_v4()
}

/// Polls `cond` until it holds, sleeping between attempts so the paused test
/// clock can auto-advance background timers. Panics if it never holds.
pub async fn eventually(label: &str, cond: impl Fn() -> bool) {
  for _ in 0..5_000 {
    if cond() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(2)).await;
  }
  panic!("condition never held: {label}");
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
