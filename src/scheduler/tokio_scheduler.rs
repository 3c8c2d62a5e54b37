use tokio::runtime::Handle;

use super::{Duration, Scheduler, TaskHandle, Work};
use crate::error::Error;

/// Runs work as tasks on a tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { TokioScheduler { handle } }

  /// The runtime the calling thread is running on.
  pub fn try_current() -> Result<Self, Error> { Ok(TokioScheduler { handle: Handle::try_current()? }) }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, work: Work, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let task = handle.clone();
    self.handle.spawn(async move {
      if let Some(delay) = delay.filter(|d| !d.is_zero()) {
        tokio::time::sleep(delay).await;
      }
      task.run(work);
    });
    handle
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  async fn runs_on_current_runtime() {
    let scheduler = TokioScheduler::try_current().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();
    scheduler.schedule(
      Box::new(move || {
        let _ = tx.send(7);
      }),
      Some(Duration::from_millis(1)),
    );
    assert_eq!(rx.await.unwrap(), 7);
  }

  #[rxcombine_macro::test]
  fn no_runtime_is_an_error() {
    assert!(matches!(TokioScheduler::try_current(), Err(Error::NoRuntime(_))));
  }
}
