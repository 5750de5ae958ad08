// src/lib.rs

//! Trolley: an ASYNC cart reconciliation and synchronization engine.
//!
//! Trolley owns the in-process representation of "my cart" for an e-commerce
//! storefront, with:
//!  - Synchronous, optimistic mutation operations (add/remove/quantity
//!    change/clear) that never roll back on persistence failure.
//!  - Debounced, coalesced persistence through a thin gateway over a
//!    pluggable `CartBackend`, with an in-flight write guard so calls for
//!    the same cart never overlap.
//!  - An explicit owner-reconciliation state machine driven by owner-changed
//!    events, fenced by an epoch counter so stale fetch responses are
//!    discarded instead of clobbering newer state.
//!  - Non-fatal failure reporting through a `Notifier` channel (toasts in a
//!    UI host, logs elsewhere).

// Declare modules according to the planned structure
pub mod core;
pub mod error;
pub mod gateway;
pub mod store;

// --- Re-exports for the Public API ---

// Core types that users will interact with frequently
pub use crate::core::model::{Cart, CartItem, OwnerId};
pub use crate::core::phase::SyncPhase;
pub use crate::core::shared::SharedState;

// The gateway seam: implement CartBackend against your backing store.
pub use crate::gateway::backend::CartBackend;
pub use crate::gateway::notify::{LogNotifier, Notice, Notifier};
pub use crate::gateway::persistence::PersistenceGateway;

// The store itself and its configuration.
pub use crate::store::cart_store::{CartState, CartStore};
pub use crate::store::config::StoreConfig;
pub use crate::store::flush::FlushScheduler;

pub use crate::error::{TrolleyError, TrolleyResult};

/*
    Core Workflow:
    1. Implement `CartBackend` for your backing store (one remote call per
       store-level intent).
    2. Construct a `CartStore` per session context with a `Notifier` and a
       `StoreConfig` (or `CartStore::with_defaults`).
    3. Drive mutations from the UI: `add_item`, `remove_item`,
       `increase_quantity`, `decrease_quantity`, `clear_cart`. Each updates
       in-memory state synchronously and schedules a debounced flush.
    4. Feed authentication transitions through `owner_changed(Some(id))` /
       `owner_changed(None)`.
    5. Read `cart_items()`, `cart()`, `total_quantity()`,
       `total_price_cents()` for display, or hold a `shared_state()` clone.
*/
