// trolley/src/core/mod.rs

//! Core data types shared by the cart store and the persistence gateway.

pub mod model;
pub mod phase;
pub mod shared;
