use std::thread;

use super::{Duration, Scheduler, TaskHandle, Work};

/// Runs work inline on the calling thread.
///
/// A delay blocks the caller. Not suited to self-rescheduling sources such as
/// [`interval`](crate::publisher::interval), which would recurse forever.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule(&self, work: Work, delay: Option<Duration>) -> TaskHandle {
    if let Some(delay) = delay.filter(|d| !d.is_zero()) {
      thread::sleep(delay);
    }
    work();
    TaskHandle::finished()
  }
}
