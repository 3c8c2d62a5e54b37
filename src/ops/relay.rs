//! A downstream link that survives a change of upstream.
//!
//! `catch` and `retry` keep a single subscription towards their subscriber
//! while the publisher behind it is replaced. The relay remembers demand
//! that has not been satisfied yet and re-requests it from each new
//! upstream.

use std::sync::{Mutex, TryLockError};

use crate::{
  demand::Demand,
  rc::lock,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

#[derive(Default)]
struct RelayState {
  upstream: Option<AnySubscription>,
  outstanding: Demand,
  cancelled: bool,
  finished: bool,
}

pub(crate) struct Relay<S> {
  state: Mutex<RelayState>,
  downstream: Mutex<Option<S>>,
}

impl<S> Relay<S> {
  pub(crate) fn new(downstream: S) -> Self {
    Relay { state: Mutex::new(RelayState::default()), downstream: Mutex::new(Some(downstream)) }
  }

  /// Bind a new upstream and ask it for the demand still owed.
  pub(crate) fn attach(&self, upstream: AnySubscription) {
    let owed = {
      let mut state = lock(&self.state);
      if state.cancelled || state.finished {
        None
      } else {
        state.upstream = Some(upstream.clone());
        Some(state.outstanding)
      }
    };
    match owed {
      None => upstream.cancel(),
      Some(demand) if !demand.is_none() => upstream.request(demand),
      Some(_) => {}
    }
  }

  /// Forget the current upstream before switching to another. Returns
  /// `false` if the link is already closed.
  pub(crate) fn detach(&self) -> bool {
    let mut state = lock(&self.state);
    state.upstream = None;
    !state.cancelled && !state.finished
  }

  fn release_if_cancelled(&self) {
    if lock(&self.state).cancelled {
      drop(lock(&self.downstream).take());
    }
  }
}

impl<S> Relay<S> {
  /// Hand the relay itself to the subscriber as its subscription.
  pub(crate) fn start<Item, Err>(self: &std::sync::Arc<Self>)
  where
    S: Subscriber<Item, Err>,
    Item: Send + 'static,
    Err: Send + 'static,
  {
    if let Some(downstream) = lock(&self.downstream).as_mut() {
      downstream.receive_subscription(self.clone());
    }
    self.release_if_cancelled();
  }

  pub(crate) fn deliver<Item, Err>(&self, value: Item) -> Demand
  where
    S: Subscriber<Item, Err>,
  {
    {
      let mut state = lock(&self.state);
      if state.cancelled || state.finished {
        return Demand::NONE;
      }
      state.outstanding -= 1;
    }
    let more = match lock(&self.downstream).as_mut() {
      Some(downstream) => downstream.receive(value),
      None => Demand::NONE,
    };
    {
      let mut state = lock(&self.state);
      if !state.cancelled {
        state.outstanding += more;
      }
    }
    self.release_if_cancelled();
    more
  }

  pub(crate) fn complete<Item, Err>(&self, completion: Completion<Err>)
  where
    S: Subscriber<Item, Err>,
  {
    {
      let mut state = lock(&self.state);
      if state.cancelled || state.finished {
        return;
      }
      state.finished = true;
      state.upstream = None;
    }
    let downstream = lock(&self.downstream).take();
    if let Some(mut downstream) = downstream {
      downstream.receive_completion(completion);
    }
  }
}

impl<S: Send + 'static> Subscription for Relay<S> {
  fn request(&self, demand: Demand) {
    let upstream = {
      let mut state = lock(&self.state);
      if state.cancelled || state.finished {
        return;
      }
      state.outstanding += demand;
      state.upstream.clone()
    };
    if let Some(upstream) = upstream {
      upstream.request(demand);
    }
  }

  fn cancel(&self) {
    let upstream = {
      let mut state = lock(&self.state);
      if state.cancelled || state.finished {
        return;
      }
      state.cancelled = true;
      state.upstream.take()
    };
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
    // The subscriber may be cancelling from inside its own `receive`; in that
    // case the delivering call releases it afterwards.
    match self.downstream.try_lock() {
      Ok(mut downstream) => drop(downstream.take()),
      Err(TryLockError::Poisoned(poisoned)) => drop(poisoned.into_inner().take()),
      Err(TryLockError::WouldBlock) => {}
    }
  }
}
