use std::sync::{Arc, Mutex};

use super::{Never, Publisher};
use crate::{
  demand::Demand,
  outlet::{BufferPolicy, Idle, Outlet},
  rc::lock,
  scheduler::{Duration, Scheduler, TaskHandle},
  subscriber::{Completion, Subscriber},
  subscription::Subscription,
};

/// Emits an increasing counter every `period`, starting one period after
/// subscription.
///
/// Ticks that arrive while the subscriber has no outstanding demand are
/// dropped; the counter still advances, so gaps show how many were missed.
/// Runs until cancelled. Needs a scheduler that defers work:
/// [`ImmediateScheduler`](crate::scheduler::ImmediateScheduler) would run
/// the whole unbounded sequence inside `subscribe`.
pub fn interval<Sch: Scheduler>(period: Duration, scheduler: Sch) -> Interval<Sch> {
  Interval { period, scheduler }
}

/// Emits `()` once after `delay`, then finishes.
pub fn timer<Sch: Scheduler>(delay: Duration, scheduler: Sch) -> Timer<Sch> {
  Timer { delay, scheduler }
}

#[derive(Clone)]
pub struct Interval<Sch> {
  period: Duration,
  scheduler: Sch,
}

#[derive(Clone)]
pub struct Timer<Sch> {
  delay: Duration,
  scheduler: Sch,
}

/// Owns the pending scheduled task of a timed source.
struct Ticker<O> {
  outlet: O,
  task: Mutex<Option<TaskHandle>>,
}

impl<O> Ticker<O> {
  fn replace_task(&self, handle: TaskHandle) {
    let mut task = lock(&self.task);
    *task = Some(handle);
  }
}

impl<O: Subscription> Subscription for Ticker<O> {
  fn request(&self, demand: Demand) { self.outlet.request(demand) }

  fn cancel(&self) {
    self.outlet.cancel();
    if let Some(task) = lock(&self.task).take() {
      task.cancel();
    }
  }
}

type IntervalTicker<S> = Ticker<Outlet<S, u64, Never>>;

fn schedule_tick<S, Sch>(ticker: Arc<IntervalTicker<S>>, scheduler: Sch, period: Duration, count: u64)
where
  S: Subscriber<u64, Never>,
  Sch: Scheduler,
{
  let next = ticker.clone();
  let again = scheduler.clone();
  let handle = scheduler.schedule(
    Box::new(move || {
      if next.outlet.is_closed() {
        return;
      }
      if !next.outlet.offer(count) {
        tracing::trace!(tick = count, "interval tick dropped without demand");
      }
      schedule_tick(next, again, period, count + 1);
    }),
    Some(period),
  );
  ticker.replace_task(handle);
  // A cancel that raced the scheduling above found no task to cancel.
  if ticker.outlet.is_closed() {
    ticker.cancel();
  }
}

impl<Sch: Scheduler> Publisher for Interval<Sch> {
  type Output = u64;
  type Failure = Never;

  fn subscribe<S: Subscriber<u64, Never>>(self, subscriber: S) {
    let ticker = Arc::new(Ticker {
      outlet: Outlet::new(subscriber, BufferPolicy::DropNewest, Idle),
      task: Mutex::new(None),
    });
    ticker.outlet.start(ticker.clone());
    if !ticker.outlet.is_closed() {
      schedule_tick(ticker, self.scheduler, self.period, 0);
    }
  }
}

impl<Sch: Scheduler> Publisher for Timer<Sch> {
  type Output = ();
  type Failure = Never;

  fn subscribe<S: Subscriber<(), Never>>(self, subscriber: S) {
    let ticker = Arc::new(Ticker {
      outlet: Outlet::new(subscriber, BufferPolicy::Unbounded, Idle),
      task: Mutex::new(None),
    });
    ticker.outlet.start(ticker.clone());
    let fire = ticker.clone();
    let handle = self.scheduler.schedule(
      Box::new(move || {
        fire.outlet.offer(());
        fire.outlet.finish(Completion::Finished);
      }),
      Some(self.delay),
    );
    ticker.replace_task(handle);
    if ticker.outlet.is_closed() {
      ticker.cancel();
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn ticks_every_period() {
    let scheduler = TestScheduler::new();
    let (probe, handle) = Probe::unlimited();
    interval(Duration::from_millis(10), scheduler.clone()).subscribe(probe);

    scheduler.advance_by(Duration::from_millis(9));
    assert!(handle.values().is_empty());
    scheduler.advance_by(Duration::from_millis(21));
    assert_eq!(handle.values(), vec![0, 1, 2]);
  }

  #[rxcombine_macro::test]
  fn ticks_without_demand_are_dropped() {
    let scheduler = TestScheduler::new();
    let (probe, handle) = Probe::new(Demand::NONE);
    interval(Duration::from_millis(10), scheduler.clone()).subscribe(probe);

    scheduler.advance_by(Duration::from_millis(20));
    handle.request(Demand::max(1));
    assert!(handle.values().is_empty());
    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(handle.values(), vec![2]);
  }

  #[rxcombine_macro::test]
  fn cancel_stops_rescheduling() {
    let scheduler = TestScheduler::new();
    let (probe, handle) = Probe::unlimited();
    interval(Duration::from_millis(10), scheduler.clone()).subscribe(probe);

    scheduler.advance_by(Duration::from_millis(10));
    handle.cancel();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(handle.values(), vec![0]);
    assert!(scheduler.is_empty());
  }

  #[rxcombine_macro::test]
  fn timer_fires_once() {
    let scheduler = TestScheduler::new();
    let (probe, handle) = Probe::new(Demand::NONE);
    timer(Duration::from_millis(5), scheduler.clone()).subscribe(probe);

    scheduler.advance_by(Duration::from_millis(5));
    assert_eq!(handle.value_count(), 0);
    handle.request(Demand::max(1));
    assert_eq!(handle.values(), vec![()]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }
}
