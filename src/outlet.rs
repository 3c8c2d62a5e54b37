//! The delivery engine shared by every publisher that buffers or produces.
//!
//! An [`Outlet`] owns one downstream subscriber together with its
//! outstanding demand, a pending queue, and the terminal slot. All delivery
//! goes through a trampolined drain loop: whoever finds the outlet idle
//! claims it and delivers until there is nothing deliverable left, while
//! concurrent or reentrant callers (a `request` made from inside `receive`, a
//! subject `send` made from a subscriber) only update state and leave the
//! work to the active drainer. No lock is held while the subscriber runs.

use std::{collections::VecDeque, sync::Mutex};

use crate::{
  demand::Demand,
  rc::lock,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

/// What an outlet does with a value offered while the subscriber has no
/// unreserved demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum BufferPolicy {
  /// Drop the offered value.
  DropNewest,
  /// Hold only the newest undelivered value.
  KeepLatest,
  /// Queue every value until demand arrives.
  #[default]
  Unbounded,
}

/// A lazily pulled producer, asked for a value only when there is demand.
pub(crate) trait Pull<Item, Err>: Send + 'static {
  fn pull(&mut self) -> Option<Item>;

  /// The terminal event, once the producer has nothing left to give.
  fn exhausted(&mut self) -> Option<Completion<Err>>;
}

/// The producer of outlets that are only fed from outside.
pub(crate) struct Idle;

impl<Item, Err> Pull<Item, Err> for Idle {
  #[inline]
  fn pull(&mut self) -> Option<Item> { None }

  #[inline]
  fn exhausted(&mut self) -> Option<Completion<Err>> { None }
}

struct OutletState<Item, Err, P> {
  demand: Demand,
  queue: VecDeque<Item>,
  terminal: Option<Completion<Err>>,
  policy: BufferPolicy,
  source: P,
  draining: bool,
  closed: bool,
}

enum Step<Item, Err> {
  Value(Item),
  Terminal(Completion<Err>),
  Close,
  Idle,
}

pub(crate) struct Outlet<S, Item, Err, P = Idle> {
  state: Mutex<OutletState<Item, Err, P>>,
  downstream: Mutex<Option<S>>,
}

impl<S, Item, Err, P> Outlet<S, Item, Err, P>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
  P: Pull<Item, Err>,
{
  /// The outlet starts claimed: offers made before [`start`](Self::start)
  /// are queued according to `policy` and delivered afterwards.
  pub(crate) fn new(downstream: S, policy: BufferPolicy, source: P) -> Self {
    Outlet {
      state: Mutex::new(OutletState {
        demand: Demand::NONE,
        queue: VecDeque::new(),
        terminal: None,
        policy,
        source,
        draining: true,
        closed: false,
      }),
      downstream: Mutex::new(Some(downstream)),
    }
  }

  /// Hand `subscription` to the subscriber, then deliver whatever the
  /// handshake made deliverable.
  pub(crate) fn start(&self, subscription: AnySubscription) {
    if let Some(downstream) = lock(&self.downstream).as_mut() {
      downstream.receive_subscription(subscription);
    }
    self.run();
  }

  pub(crate) fn request(&self, demand: Demand) {
    {
      let mut state = lock(&self.state);
      if state.closed || demand.is_none() {
        return;
      }
      state.demand += demand;
      if state.draining {
        return;
      }
      state.draining = true;
    }
    self.run();
  }

  /// Offer a value; returns whether the policy accepted it.
  pub(crate) fn offer(&self, value: Item) -> bool {
    {
      let mut state = lock(&self.state);
      if state.closed || state.terminal.is_some() {
        return false;
      }
      let reserved = state.queue.len();
      match state.policy {
        BufferPolicy::Unbounded => state.queue.push_back(value),
        BufferPolicy::DropNewest => {
          if !state.demand.covers(reserved + 1) {
            return false;
          }
          state.queue.push_back(value);
        }
        BufferPolicy::KeepLatest => {
          // Only the one value queued beyond demand is replaceable.
          if state.demand.covers(reserved) {
            state.queue.push_back(value);
          } else if let Some(last) = state.queue.back_mut() {
            *last = value;
          }
        }
      }
      if state.draining {
        return true;
      }
      state.draining = true;
    }
    self.run();
    true
  }

  /// Record the terminal event. A failure discards queued values; a normal
  /// completion is delivered after them.
  pub(crate) fn finish(&self, completion: Completion<Err>) {
    {
      let mut state = lock(&self.state);
      if state.closed || state.terminal.is_some() {
        return;
      }
      if matches!(completion, Completion::Failure(_)) {
        state.queue.clear();
      }
      state.terminal = Some(completion);
      if state.draining {
        return;
      }
      state.draining = true;
    }
    self.run();
  }

  /// Close the outlet without a terminal event. Idempotent.
  pub(crate) fn cancel(&self) {
    let release = {
      let mut state = lock(&self.state);
      if state.closed {
        return;
      }
      state.closed = true;
      state.queue.clear();
      state.terminal = None;
      if state.draining {
        false
      } else {
        state.draining = true;
        true
      }
    };
    // A running drainer drops the subscriber itself on its next step.
    if release {
      drop(lock(&self.downstream).take());
    }
  }

  /// Demand not yet covered by queued values.
  pub(crate) fn outstanding(&self) -> Demand {
    let state = lock(&self.state);
    state.demand - state.queue.len()
  }

  pub(crate) fn is_closed(&self) -> bool { lock(&self.state).closed }

  fn run(&self) {
    loop {
      match self.next_step() {
        Step::Value(value) => {
          let more = match lock(&self.downstream).as_mut() {
            Some(downstream) => downstream.receive(value),
            None => Demand::NONE,
          };
          if !more.is_none() {
            let mut state = lock(&self.state);
            if !state.closed {
              state.demand += more;
            }
          }
        }
        Step::Terminal(completion) => {
          let downstream = lock(&self.downstream).take();
          if let Some(mut downstream) = downstream {
            downstream.receive_completion(completion);
          }
          return;
        }
        Step::Close => {
          drop(lock(&self.downstream).take());
          return;
        }
        Step::Idle => return,
      }
    }
  }

  fn next_step(&self) -> Step<Item, Err> {
    let mut state = lock(&self.state);
    if state.closed {
      return Step::Close;
    }
    if matches!(state.terminal, Some(Completion::Failure(_))) {
      if let Some(failure) = state.terminal.take() {
        state.closed = true;
        return Step::Terminal(failure);
      }
    }
    if !state.queue.is_empty() {
      if !state.demand.is_none() {
        if let Some(value) = state.queue.pop_front() {
          state.demand -= 1;
          return Step::Value(value);
        }
      }
      state.draining = false;
      return Step::Idle;
    }
    let terminal = match state.terminal.take() {
      Some(terminal) => Some(terminal),
      None => state.source.exhausted(),
    };
    if let Some(terminal) = terminal {
      state.closed = true;
      return Step::Terminal(terminal);
    }
    if !state.demand.is_none() {
      if let Some(value) = state.source.pull() {
        state.demand -= 1;
        return Step::Value(value);
      }
    }
    state.draining = false;
    Step::Idle
  }
}

impl<S, Item, Err, P> Subscription for Outlet<S, Item, Err, P>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
  P: Pull<Item, Err>,
{
  #[inline]
  fn request(&self, demand: Demand) { Outlet::request(self, demand) }

  #[inline]
  fn cancel(&self) { Outlet::cancel(self) }
}

/// The feeding side of an outlet with its subscriber type erased.
pub(crate) trait Conduit<Item, Err>: Send + Sync {
  fn offer(&self, value: Item) -> bool;

  fn finish(&self, completion: Completion<Err>);
}

impl<S, Item, Err> Conduit<Item, Err> for Outlet<S, Item, Err>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  #[inline]
  fn offer(&self, value: Item) -> bool { Outlet::offer(self, value) }

  #[inline]
  fn finish(&self, completion: Completion<Err>) { Outlet::finish(self, completion) }
}
