// trolley/src/store/mod.rs

//! The cart store: authoritative in-process cart state, synchronous
//! optimistic mutations, debounced persistence, and the owner
//! reconciliation state machine.

pub mod cart_store;
pub mod config;
pub mod flush;
mod sync;
