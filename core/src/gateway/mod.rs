// trolley/src/gateway/mod.rs

//! The persistence gateway: a thin translation layer between store-level
//! intents and the remote backing store, with non-fatal failure reporting.

pub mod backend;
pub mod notify;
pub mod persistence;
