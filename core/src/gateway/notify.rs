// trolley/src/gateway/notify.rs

//! The non-blocking notification channel for recoverable persistence
//! failures. The storefront surfaces these as toasts; headless hosts log
//! them.

/// A user-facing failure report. Never blocks and never carries control
/// flow: local state is the source of truth regardless of what is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub title: String,
  pub detail: String,
}

impl Notice {
  pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      detail: detail.into(),
    }
  }
}

/// Sink for notices. Implementations must not block.
pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

/// Default sink: writes notices to the `tracing` log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, notice: Notice) {
    tracing::warn!(title = %notice.title, detail = %notice.detail, "cart notice");
  }
}
