// trolley/src/store/config.rs

use crate::error::{TrolleyError, TrolleyResult};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_CURRENCY: &str = "$";

#[derive(Debug, Clone)]
pub struct StoreConfig {
  /// Quiet period a mutation burst must see before a flush is issued. The
  /// timer is reset, not accumulated, on each new mutation.
  pub debounce_window: Duration,
  /// Currency stamped onto locally created carts.
  pub currency: String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      debounce_window: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
      currency: DEFAULT_CURRENCY.to_string(),
    }
  }
}

impl StoreConfig {
  pub fn from_env() -> TrolleyResult<Self> {
    dotenv().ok(); // Load .env file if present

    let debounce_ms = env::var("TROLLEY_DEBOUNCE_MS")
      .unwrap_or_else(|_| DEFAULT_DEBOUNCE_MS.to_string())
      .parse::<u64>()
      .map_err(|e| TrolleyError::Config(format!("Invalid TROLLEY_DEBOUNCE_MS: {}", e)))?;

    let currency = env::var("TROLLEY_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());
    if currency.is_empty() {
      return Err(TrolleyError::Config("TROLLEY_CURRENCY must not be empty".to_string()));
    }

    tracing::info!(debounce_ms, currency = %currency, "Cart store configuration loaded.");

    Ok(Self {
      debounce_window: Duration::from_millis(debounce_ms),
      currency,
    })
  }
}
