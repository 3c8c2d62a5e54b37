use futures::executor::ThreadPool;
use once_cell::sync::OnceCell;

use super::{Duration, Scheduler, TaskHandle, Work};
use crate::error::Error;

static SHARED_POOL: OnceCell<ThreadPool> = OnceCell::new();

/// Runs work on a `futures` thread pool.
///
/// Delays are awaited with `futures-time` when the `timer` feature is on and
/// block a pool thread otherwise. Work submitted from different threads may
/// interleave; use [`receive_on`](crate::ops::PublisherExt::receive_on) to
/// keep the events of one subscription in order.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

/// Configures a dedicated [`ThreadPoolScheduler`].
#[derive(Default)]
pub struct ThreadPoolSchedulerBuilder {
  pool_size: Option<usize>,
  name_prefix: Option<String>,
}

impl ThreadPoolSchedulerBuilder {
  /// Number of worker threads; defaults to the number of CPUs.
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = Some(size);
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = Some(prefix.into());
    self
  }

  pub fn build(self) -> Result<ThreadPoolScheduler, Error> {
    let mut builder = ThreadPool::builder();
    if let Some(size) = self.pool_size {
      builder.pool_size(size);
    }
    if let Some(prefix) = self.name_prefix {
      builder.name_prefix(prefix);
    }
    let pool = builder.create().map_err(Error::SchedulerUnavailable)?;
    Ok(ThreadPoolScheduler { pool })
  }
}

impl ThreadPoolScheduler {
  /// A scheduler backed by a new pool with default settings.
  pub fn new() -> Result<Self, Error> { Self::builder().build() }

  pub fn builder() -> ThreadPoolSchedulerBuilder { ThreadPoolSchedulerBuilder::default() }

  /// A handle to the process-wide pool, created on first use.
  pub fn shared() -> Result<Self, Error> {
    let pool = SHARED_POOL.get_or_try_init(|| {
      ThreadPool::builder()
        .name_prefix("rxcombine-")
        .create()
        .map_err(Error::SchedulerUnavailable)
    })?;
    Ok(ThreadPoolScheduler { pool: pool.clone() })
  }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule(&self, work: Work, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let task = handle.clone();
    tracing::trace!(?delay, "submitting work to thread pool");
    self.pool.spawn_ok(async move {
      if let Some(delay) = delay.filter(|d| !d.is_zero()) {
        sleep(delay).await;
      }
      task.run(work);
    });
    handle
  }
}

#[cfg(feature = "timer")]
async fn sleep(delay: Duration) {
  futures_time::task::sleep(delay.into()).await;
}

#[cfg(not(feature = "timer"))]
async fn sleep(delay: Duration) { std::thread::sleep(delay) }
