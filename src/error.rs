//! Infrastructure errors.
//!
//! Stream failures travel through the typed failure channel
//! ([`Completion::Failure`](crate::subscriber::Completion::Failure)); the
//! types here cover what happens outside a pipeline, such as bringing up a
//! scheduler.

/// A type-erased error, convenient as the unified failure type of pipelines
/// that mix several fallible stages (see
/// [`try_map`](crate::ops::PublisherExt::try_map)).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The worker pool backing a scheduler could not be created.
  #[error("scheduler worker pool could not be started")]
  SchedulerUnavailable(#[source] std::io::Error),

  /// No tokio runtime is reachable from the calling thread.
  #[cfg(feature = "tokio-scheduler")]
  #[error("no tokio runtime is available on this thread")]
  NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn scheduler_error_keeps_source() {
    use std::error::Error as _;

    let err = Error::SchedulerUnavailable(std::io::Error::new(
      std::io::ErrorKind::Other,
      "no threads",
    ));
    assert_eq!(err.to_string(), "scheduler worker pool could not be started");
    assert_eq!(err.source().map(|s| s.to_string()), Some("no threads".to_string()));
  }

  #[rxcombine_macro::test]
  fn box_error_unifies() {
    let e: BoxError = "parse failed".into();
    assert_eq!(e.to_string(), "parse failed");
  }
}
