//! Subjects: publishers with an imperative entry point.
//!
//! A subject broadcasts every value passed to `send` to all of its current
//! subscribers, synchronously and in subscription order. Each subscriber has
//! its own outlet, so its demand is respected individually: what happens to
//! a value a subscriber has not asked for depends on the subject kind.
//!
//! | Subject | Without demand | New subscriber |
//! |---------|----------------|----------------|
//! | [`PassthroughSubject`] | value dropped | sees only later values |
//! | [`CurrentValueSubject`] | newest value kept | gets the current value first |
//!
//! Subjects are also subscribers, so an upstream publisher can drive one.
//! Cloning a subject yields another handle to the same subscriber set.

use std::sync::Arc;

use crate::{
  demand::Demand,
  outlet::{BufferPolicy, Idle, Outlet},
  rc::{MutArc, WeakArc},
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

mod current_value;
mod passthrough;
mod subscribers;

pub use current_value::CurrentValueSubject;
pub use passthrough::PassthroughSubject;
use subscribers::{broadcast_completion, broadcast_value, Subscribers};

/// What a subject remembers of the values it has sent.
pub(crate) trait Replay<Item>: Send + 'static {
  fn record(&mut self, value: &Item);

  /// The value a new subscriber receives before anything else.
  fn replay(&self) -> Option<Item>;
}

impl<Item> Replay<Item> for () {
  #[inline]
  fn record(&mut self, _value: &Item) {}

  #[inline]
  fn replay(&self) -> Option<Item> { None }
}

/// The most recently sent value.
pub(crate) struct Latest<Item>(pub(crate) Item);

impl<Item: Clone + Send + 'static> Replay<Item> for Latest<Item> {
  #[inline]
  fn record(&mut self, value: &Item) { self.0 = value.clone(); }

  #[inline]
  fn replay(&self) -> Option<Item> { Some(self.0.clone()) }
}

pub(crate) struct SubjectState<Item, Err, R> {
  subscribers: Subscribers<Item, Err>,
  completion: Option<Completion<Err>>,
  upstreams: Vec<AnySubscription>,
  pub(crate) replay: R,
}

/// Shared core of every subject kind.
pub(crate) struct SubjectCore<Item, Err, R> {
  pub(crate) state: MutArc<SubjectState<Item, Err, R>>,
  policy: BufferPolicy,
}

impl<Item, Err, R> Clone for SubjectCore<Item, Err, R> {
  fn clone(&self) -> Self { SubjectCore { state: self.state.clone(), policy: self.policy } }
}

impl<Item, Err, R> SubjectCore<Item, Err, R>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  R: Replay<Item>,
{
  pub(crate) fn new(replay: R, policy: BufferPolicy) -> Self {
    SubjectCore {
      state: MutArc::own(SubjectState {
        subscribers: Subscribers::default(),
        completion: None,
        upstreams: vec![],
        replay,
      }),
      policy,
    }
  }

  pub(crate) fn send(&self, value: Item) {
    let links = {
      let mut state = self.state.rc_deref_mut();
      if state.completion.is_some() {
        tracing::trace!("value sent after completion ignored");
        return;
      }
      state.replay.record(&value);
      state.subscribers.snapshot()
    };
    let dropped = broadcast_value(&links, value);
    if dropped > 0 {
      tracing::trace!(dropped, "subscribers without demand skipped a value");
    }
  }

  pub(crate) fn send_completion(&self, completion: Completion<Err>) {
    let (links, upstreams) = {
      let mut state = self.state.rc_deref_mut();
      if state.completion.is_some() {
        return;
      }
      state.completion = Some(completion.clone());
      (state.subscribers.take_all(), std::mem::take(&mut state.upstreams))
    };
    tracing::debug!(
      subscribers = links.len(),
      finished = completion.is_finished(),
      "subject completed"
    );
    for upstream in upstreams {
      upstream.cancel();
    }
    broadcast_completion(links, completion);
  }

  pub(crate) fn subscriber_count(&self) -> usize { self.state.rc_deref_mut().subscribers.len() }

  pub(crate) fn attach<S: Subscriber<Item, Err>>(&self, subscriber: S) {
    let outlet = Arc::new(Outlet::new(subscriber, self.policy, Idle));
    let registered = {
      let mut state = self.state.rc_deref_mut();
      match state.completion.clone() {
        Some(completion) => Err(completion),
        None => Ok((state.subscribers.add(outlet.clone()), state.replay.replay())),
      }
    };
    match registered {
      Ok((id, replay)) => {
        if let Some(value) = replay {
          outlet.offer(value);
        }
        let subscription =
          SubjectSubscription { outlet: outlet.clone(), subject: self.state.downgrade(), id };
        outlet.start(Arc::new(subscription));
      }
      Err(completion) => {
        outlet.start(outlet.clone());
        outlet.finish(completion);
      }
    }
  }

  pub(crate) fn add_upstream(&self, subscription: AnySubscription) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.completion.is_none() {
        state.upstreams.push(subscription.clone());
        drop(state);
        return subscription.request(Demand::Unlimited);
      }
    }
    subscription.cancel();
  }
}

/// One subscriber's link to a subject.
struct SubjectSubscription<S, Item, Err, R> {
  outlet: Arc<Outlet<S, Item, Err>>,
  subject: WeakArc<SubjectState<Item, Err, R>>,
  id: usize,
}

impl<S, Item, Err, R> Subscription for SubjectSubscription<S, Item, Err, R>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
  R: Send + 'static,
{
  #[inline]
  fn request(&self, demand: Demand) { self.outlet.request(demand) }

  fn cancel(&self) {
    self.outlet.cancel();
    let removed = self.subject.upgrade().and_then(|subject| {
      let mut state = subject.rc_deref_mut();
      state.subscribers.remove(self.id)
    });
    drop(removed);
  }
}

/// Implements `Publisher`, `Subscriber` and `Clone` for a subject newtype
/// around `SubjectCore`.
macro_rules! impl_subject {
  ($name:ident) => {
    impl<Item, Err> Clone for $name<Item, Err> {
      fn clone(&self) -> Self { $name { core: self.core.clone() } }
    }

    impl<Item, Err> $crate::publisher::Publisher for $name<Item, Err>
    where
      Item: Clone + Send + 'static,
      Err: Clone + Send + 'static,
    {
      type Output = Item;
      type Failure = Err;

      fn subscribe<S: $crate::subscriber::Subscriber<Item, Err>>(self, subscriber: S) {
        self.core.attach(subscriber)
      }
    }

    impl<Item, Err> $crate::subscriber::Subscriber<Item, Err> for $name<Item, Err>
    where
      Item: Clone + Send + 'static,
      Err: Clone + Send + 'static,
    {
      fn receive_subscription(&mut self, subscription: $crate::subscription::AnySubscription) {
        self.core.add_upstream(subscription)
      }

      fn receive(&mut self, input: Item) -> $crate::demand::Demand {
        self.core.send(input);
        $crate::demand::Demand::NONE
      }

      fn receive_completion(&mut self, completion: $crate::subscriber::Completion<Err>) {
        self.core.send_completion(completion)
      }
    }
  };
}
pub(crate) use impl_subject;

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn broadcast_follows_subscription_order() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let order = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
    let (o1, o2) = (order.clone(), order.clone());
    let _a = subject.clone().sink_value(move |v| o1.lock().unwrap().push(("a", v)));
    let _b = subject.clone().sink_value(move |v| o2.lock().unwrap().push(("b", v)));

    subject.send(1);
    subject.send(2);
    assert_eq!(*order.lock().unwrap(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
  }

  #[rxcombine_macro::test]
  fn completion_is_delivered_once_and_replayed_to_late_subscribers() {
    let subject = PassthroughSubject::<i32, &str>::new();
    let (early, early_handle) = Probe::unlimited();
    subject.clone().subscribe(early);

    subject.send_completion(Completion::Failure("closed"));
    subject.send_completion(Completion::Finished);
    subject.send(1);

    let (late, late_handle) = Probe::new(Demand::NONE);
    subject.clone().subscribe(late);

    assert!(early_handle.values().is_empty());
    assert_eq!(early_handle.completion(), Some(Completion::Failure("closed")));
    assert_eq!(late_handle.completion(), Some(Completion::Failure("closed")));
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxcombine_macro::test]
  fn upstream_drives_subject() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (probe, handle) = Probe::unlimited();
    subject.clone().subscribe(probe);

    from_iter(1..=3).subscribe(subject.clone());
    assert_eq!(handle.values(), vec![1, 2, 3]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn send_from_inside_a_subscriber_is_queued() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let echo = subject.clone();
    let seen = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
    let s = seen.clone();
    let _handle = subject.clone().sink_value(move |v| {
      s.lock().unwrap().push(v);
      if v < 3 {
        echo.send(v + 1);
      }
    });

    subject.send(1);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
  }
}
