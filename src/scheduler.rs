//! Execution contexts for units of work.
//!
//! A [`Scheduler`] decides where and when a piece of [`Work`] runs. Every
//! thread boundary in a pipeline is an explicit hand-off to one of these,
//! through [`receive_on`](crate::ops::PublisherExt::receive_on),
//! [`subscribe_on`](crate::ops::PublisherExt::subscribe_on) or a timed
//! source such as [`interval`](crate::publisher::interval).
//!
//! | Scheduler | Discipline |
//! |-----------|------------|
//! | [`ImmediateScheduler`] | inline on the calling thread |
//! | [`TestScheduler`] | virtual time, runs only when advanced |
//! | [`ThreadPoolScheduler`] | `futures` thread pool (feature `futures-scheduler`) |
//! | [`TokioScheduler`] | a tokio runtime (feature `tokio-scheduler`) |

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

pub use std::time::Duration;

mod immediate;
mod test_scheduler;
#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use immediate::ImmediateScheduler;
pub use test_scheduler::TestScheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::{ThreadPoolScheduler, ThreadPoolSchedulerBuilder};
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A unit of work handed to a scheduler.
pub type Work = Box<dyn FnOnce() + Send>;

/// Runs work items according to a discipline.
///
/// Schedulers are cheap handles: cloning one yields another handle to the
/// same execution context.
pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Run `work` after `delay` (or as soon as the discipline allows when
  /// `None`). The returned handle cancels the work if it has not started.
  fn schedule(&self, work: Work, delay: Option<Duration>) -> TaskHandle;
}

struct TaskState {
  cancelled: AtomicBool,
  finished: AtomicBool,
}

/// Handle to a scheduled unit of work.
#[derive(Clone)]
pub struct TaskHandle {
  inner: Option<Arc<TaskState>>,
}

impl TaskHandle {
  /// A handle for work that has already run.
  pub fn finished() -> Self { TaskHandle { inner: None } }

  pub(crate) fn new() -> Self {
    TaskHandle {
      inner: Some(Arc::new(TaskState {
        cancelled: AtomicBool::new(false),
        finished: AtomicBool::new(false),
      })),
    }
  }

  /// Prevent the work from running if it has not started yet. Idempotent.
  pub fn cancel(&self) {
    if let Some(state) = &self.inner {
      state.cancelled.store(true, Ordering::Release);
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.inner.as_ref().is_some_and(|s| s.cancelled.load(Ordering::Acquire))
  }

  pub fn is_finished(&self) -> bool {
    self.inner.as_ref().map_or(true, |s| s.finished.load(Ordering::Acquire))
  }

  /// Whether the work can no longer run.
  pub fn is_closed(&self) -> bool { self.is_cancelled() || self.is_finished() }

  /// Run `work` unless the handle was cancelled, then mark it finished.
  pub(crate) fn run(&self, work: Work) {
    if !self.is_cancelled() {
      work();
    }
    if let Some(state) = &self.inner {
      state.finished.store(true, Ordering::Release);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn cancelled_work_does_not_run() {
    let handle = TaskHandle::new();
    handle.cancel();
    let ran = Arc::new(AtomicBool::new(false));
    let r = ran.clone();
    handle.run(Box::new(move || r.store(true, Ordering::SeqCst)));
    assert!(!ran.load(Ordering::SeqCst));
    assert!(handle.is_closed());
  }

  #[rxcombine_macro::test]
  fn finished_handle_is_closed() {
    let handle = TaskHandle::finished();
    assert!(handle.is_finished());
    assert!(!handle.is_cancelled());
    handle.cancel();
    assert!(!handle.is_cancelled());
  }

  #[rxcombine_macro::test]
  fn run_marks_finished() {
    let handle = TaskHandle::new();
    assert!(!handle.is_closed());
    handle.clone().run(Box::new(|| {}));
    assert!(handle.is_finished());
  }
}
