//! Virtual-time scheduler for deterministic tests.
//!
//! Time only moves when the test says so. Work due at the same instant runs
//! in the order it was scheduled.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxcombine::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let ticks = Arc::new(Mutex::new(vec![]));
//! let t = ticks.clone();
//! let _handle = interval(Duration::from_millis(10), scheduler.clone())
//!   .sink_value(move |n| t.lock().unwrap().push(n));
//!
//! scheduler.advance_by(Duration::from_millis(35));
//! assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2]);
//! ```

use std::{cmp::Ordering, collections::BinaryHeap};

use super::{Duration, Scheduler, TaskHandle, Work};
use crate::rc::MutArc;

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  work: Work,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

/// A virtual-time scheduler.
///
/// Clones share the same clock and queue, so a test keeps one handle and
/// passes clones into the pipeline.
#[derive(Clone, Default)]
pub struct TestScheduler {
  state: MutArc<TestSchedulerState>,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Current virtual time, starting at zero.
  pub fn now(&self) -> Duration { self.state.rc_deref_mut().virtual_time }

  /// Number of scheduled tasks that have not run, cancelled ones included.
  pub fn pending_count(&self) -> usize { self.state.rc_deref_mut().task_queue.len() }

  pub fn is_empty(&self) -> bool { self.pending_count() == 0 }

  /// Advance the clock by `duration`, running every task that becomes due.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.now() + duration;
    self.advance_to(target);
  }

  /// Advance the clock to `target`, running every task due at or before it.
  /// Moving backwards is a no-op.
  pub fn advance_to(&self, target: Duration) {
    self.execute_tasks_until(Some(target));
    let mut state = self.state.rc_deref_mut();
    if state.virtual_time < target {
      state.virtual_time = target;
    }
  }

  /// Run the tasks due now without moving the clock.
  pub fn run_due(&self) { self.advance_by(Duration::ZERO) }

  /// Run every pending task, jumping the clock to each one's due time.
  ///
  /// Self-rescheduling work (an interval) keeps this running until it is
  /// cancelled.
  pub fn flush(&self) { self.execute_tasks_until(None) }

  fn execute_tasks_until(&self, target_time: Option<Duration>) {
    loop {
      let task = {
        let mut state = self.state.rc_deref_mut();
        let due = state
          .task_queue
          .peek()
          .is_some_and(|peek| target_time.map_or(true, |limit| peek.scheduled_time <= limit));
        if !due {
          None
        } else {
          let task = state.task_queue.pop();
          if let Some(task) = &task {
            state.virtual_time = task.scheduled_time;
          }
          task
        }
      };
      // The lock is released here: the work may schedule more work.
      let Some(task) = task else { break };
      task.handle.run(task.work);
    }
  }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, work: Work, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut state = self.state.rc_deref_mut();
    let task_id = state.next_task_id;
    state.next_task_id += 1;
    let scheduled_time = state.virtual_time + delay.unwrap_or(Duration::ZERO);
    state.task_queue.push(ScheduledTask { scheduled_time, task_id, work, handle: handle.clone() });
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;

  fn record(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Work {
    let log = log.clone();
    Box::new(move || log.lock().unwrap().push(tag))
  }

  #[rxcombine_macro::test]
  fn advance_by_is_cumulative() {
    let scheduler = TestScheduler::new();
    scheduler.advance_by(Duration::from_millis(100));
    scheduler.advance_by(Duration::from_millis(50));
    assert_eq!(scheduler.now(), Duration::from_millis(150));
  }

  #[rxcombine_macro::test]
  fn flush_on_empty_queue_keeps_time() {
    let scheduler = TestScheduler::new();
    scheduler.flush();
    assert_eq!(scheduler.now(), Duration::ZERO);
  }

  #[rxcombine_macro::test]
  fn immediate_and_delayed() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    scheduler.schedule(record(&log, "immediate"), None);
    scheduler.schedule(record(&log, "delayed"), Some(Duration::from_millis(100)));
    assert_eq!(scheduler.pending_count(), 2);
    assert!(log.lock().unwrap().is_empty());

    scheduler.run_due();
    assert_eq!(*log.lock().unwrap(), vec!["immediate"]);

    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*log.lock().unwrap(), vec!["immediate", "delayed"]);
  }

  #[rxcombine_macro::test]
  fn cancelled_task_is_skipped() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    let handle = scheduler.schedule(record(&log, "x"), Some(Duration::from_millis(100)));
    handle.cancel();
    scheduler.advance_by(Duration::from_millis(150));
    assert!(log.lock().unwrap().is_empty());
    assert!(scheduler.is_empty());
  }

  #[rxcombine_macro::test]
  fn fifo_among_same_instant() {
    let scheduler = TestScheduler::new();
    let order = Arc::new(Mutex::new(vec![]));
    for i in 0..5 {
      let o = order.clone();
      scheduler.schedule(Box::new(move || o.lock().unwrap().push(i)), Some(Duration::from_millis(10)));
    }
    scheduler.advance_to(Duration::from_millis(10));
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
  }

  #[rxcombine_macro::test]
  fn work_may_schedule_more_work() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (s, l) = (scheduler.clone(), log.clone());
    scheduler.schedule(
      Box::new(move || {
        l.lock().unwrap().push("outer");
        s.schedule(record(&l, "inner"), Some(Duration::from_millis(5)));
      }),
      Some(Duration::from_millis(5)),
    );
    scheduler.flush();
    assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    assert_eq!(scheduler.now(), Duration::from_millis(10));
  }
}
