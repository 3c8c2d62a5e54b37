//! Moves delivery of values and completion onto a scheduler.
//!
//! The subscription handshake stays on the subscribing thread, and requests
//! and cancels go straight upstream. Values and the terminal event are
//! queued in arrival order and a single drain task at a time delivers them
//! on the scheduler, so ordering is kept even on a multi-threaded pool.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex, TryLockError},
};

use crate::{
  demand::Demand,
  publisher::Publisher,
  rc::lock,
  scheduler::Scheduler,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

#[derive(Clone)]
pub struct ReceiveOn<P, Sch> {
  pub(crate) source: P,
  pub(crate) scheduler: Sch,
}

impl<P, Sch> Publisher for ReceiveOn<P, Sch>
where
  P: Publisher,
  Sch: Scheduler,
{
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    let mailbox = Arc::new(Mailbox {
      scheduler: self.scheduler,
      state: Mutex::new(MailboxState {
        events: VecDeque::new(),
        scheduled: false,
        upstream: None,
        cancelled: false,
      }),
      downstream: Mutex::new(Some(subscriber)),
    });
    self.source.subscribe(ReceiveOnSubscriber { mailbox });
  }
}

enum Event<Item, Err> {
  Value(Item),
  Completion(Completion<Err>),
}

struct MailboxState<Item, Err> {
  events: VecDeque<Event<Item, Err>>,
  scheduled: bool,
  upstream: Option<AnySubscription>,
  cancelled: bool,
}

pub struct Mailbox<S, Item, Err, Sch> {
  scheduler: Sch,
  state: Mutex<MailboxState<Item, Err>>,
  downstream: Mutex<Option<S>>,
}

impl<S, Item, Err, Sch> Mailbox<S, Item, Err, Sch>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
  Sch: Scheduler,
{
  fn post(self: &Arc<Self>, event: Event<Item, Err>) {
    {
      let mut state = lock(&self.state);
      if state.cancelled {
        return;
      }
      state.events.push_back(event);
      if state.scheduled {
        return;
      }
      state.scheduled = true;
    }
    let mailbox = self.clone();
    self.scheduler.schedule(Box::new(move || mailbox.drain()), None);
  }

  fn drain(&self) {
    loop {
      let (event, upstream) = {
        let mut state = lock(&self.state);
        match state.events.pop_front() {
          Some(event) if !state.cancelled => (event, state.upstream.clone()),
          _ => {
            state.scheduled = false;
            return;
          }
        }
      };
      match event {
        Event::Value(value) => {
          let more = match lock(&self.downstream).as_mut() {
            Some(downstream) => downstream.receive(value),
            None => Demand::NONE,
          };
          match upstream {
            Some(upstream) if !more.is_none() => upstream.request(more),
            _ => {}
          }
        }
        Event::Completion(completion) => {
          lock(&self.state).upstream = None;
          let downstream = lock(&self.downstream).take();
          if let Some(mut downstream) = downstream {
            downstream.receive_completion(completion);
          }
        }
      }
    }
  }
}

impl<S, Item, Err, Sch> Subscription for Mailbox<S, Item, Err, Sch>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
  Sch: Scheduler,
{
  fn request(&self, demand: Demand) {
    let upstream = lock(&self.state).upstream.clone();
    if let Some(upstream) = upstream {
      upstream.request(demand);
    }
  }

  fn cancel(&self) {
    let upstream = {
      let mut state = lock(&self.state);
      if state.cancelled {
        return;
      }
      state.cancelled = true;
      state.events.clear();
      state.upstream.take()
    };
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
    match self.downstream.try_lock() {
      Ok(mut downstream) => drop(downstream.take()),
      Err(TryLockError::Poisoned(poisoned)) => drop(poisoned.into_inner().take()),
      // Cancelled from inside the subscriber; the drain loop stops on its
      // next event.
      Err(TryLockError::WouldBlock) => {}
    }
  }
}

pub struct ReceiveOnSubscriber<S, Item, Err, Sch> {
  mailbox: Arc<Mailbox<S, Item, Err, Sch>>,
}

impl<S, Item, Err, Sch> Subscriber<Item, Err> for ReceiveOnSubscriber<S, Item, Err, Sch>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
  Sch: Scheduler,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    {
      let mut state = lock(&self.mailbox.state);
      if state.cancelled {
        drop(state);
        return subscription.cancel();
      }
      state.upstream = Some(subscription);
    }
    if let Some(downstream) = lock(&self.mailbox.downstream).as_mut() {
      downstream.receive_subscription(self.mailbox.clone());
    }
  }

  fn receive(&mut self, input: Item) -> Demand {
    self.mailbox.post(Event::Value(input));
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.mailbox.post(Event::Completion(completion))
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn delivers_only_when_scheduler_runs() {
    let scheduler = TestScheduler::new();
    let (probe, handle) = Probe::unlimited();
    from_iter(1..=3).receive_on(scheduler.clone()).subscribe(probe);

    assert!(handle.is_subscribed());
    assert!(handle.values().is_empty());
    scheduler.flush();
    assert_eq!(handle.values(), vec![1, 2, 3]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn one_drain_task_for_a_burst() {
    let scheduler = TestScheduler::new();
    let subject = PassthroughSubject::<i32, Never>::new();
    let (probe, handle) = Probe::unlimited();
    subject.clone().receive_on(scheduler.clone()).subscribe(probe);

    subject.send(1);
    subject.send(2);
    subject.send(3);
    assert_eq!(scheduler.pending_count(), 1);
    scheduler.flush();
    assert_eq!(handle.values(), vec![1, 2, 3]);
  }

  #[rxcombine_macro::test]
  fn extra_demand_goes_upstream() {
    let scheduler = TestScheduler::new();
    let (probe, handle) = Probe::with_demand(Demand::max(1), Demand::max(1));
    from_iter(0..4).receive_on(scheduler.clone()).subscribe(probe);
    scheduler.flush();
    assert_eq!(handle.values(), vec![0, 1, 2, 3]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn cancel_discards_queued_events() {
    let scheduler = TestScheduler::new();
    let (probe, handle) = Probe::unlimited();
    from_iter(1..=3).receive_on(scheduler.clone()).subscribe(probe);
    handle.cancel();
    scheduler.flush();
    assert!(handle.values().is_empty());
    assert!(!handle.is_terminated());
  }

  #[cfg(feature = "futures-scheduler")]
  #[rxcombine_macro::test]
  fn hops_to_pool_thread() {
    use std::{sync::mpsc, thread};

    let pool = ThreadPoolScheduler::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let _handle = from_iter(0..3)
      .receive_on(pool)
      .sink_value(move |v| tx.send((v, thread::current().id())).unwrap());

    let received: Vec<_> = (0..3)
      .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
      .collect();
    assert_eq!(received.iter().map(|(v, _)| *v).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(received.iter().all(|(_, id)| *id != thread::current().id()));
  }
}
