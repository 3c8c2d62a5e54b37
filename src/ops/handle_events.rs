//! Side-effect hooks on every protocol event, and the `log` operator built
//! on them.

use std::{fmt::Debug, sync::Arc};

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

type Hook = Box<dyn FnMut() + Send>;
type ValueHook<Item> = Box<dyn FnMut(&Item) + Send>;
type CompletionHook<Err> = Box<dyn FnMut(&Completion<Err>) + Send>;
type CancelHook = Arc<dyn Fn() + Send + Sync>;
type RequestHook = Arc<dyn Fn(Demand) + Send + Sync>;

/// Closures run by [`handle_events`](crate::ops::PublisherExt::handle_events)
/// as events pass through. Every hook is optional.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxcombine::prelude::*;
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let s = seen.clone();
/// let (probe, _handle) = Probe::unlimited();
/// from_iter(1..=3)
///   .handle_events(EventHooks::new().on_value(move |v: &i32| s.lock().unwrap().push(*v)))
///   .subscribe(probe);
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
/// ```
pub struct EventHooks<Item, Err> {
  on_subscription: Option<Hook>,
  on_value: Option<ValueHook<Item>>,
  on_completion: Option<CompletionHook<Err>>,
  on_cancel: Option<CancelHook>,
  on_request: Option<RequestHook>,
}

impl<Item, Err> Default for EventHooks<Item, Err> {
  fn default() -> Self {
    EventHooks {
      on_subscription: None,
      on_value: None,
      on_completion: None,
      on_cancel: None,
      on_request: None,
    }
  }
}

impl<Item, Err> EventHooks<Item, Err> {
  pub fn new() -> Self { Self::default() }

  pub fn on_subscription(mut self, f: impl FnMut() + Send + 'static) -> Self {
    self.on_subscription = Some(Box::new(f));
    self
  }

  pub fn on_value(mut self, f: impl FnMut(&Item) + Send + 'static) -> Self {
    self.on_value = Some(Box::new(f));
    self
  }

  pub fn on_completion(mut self, f: impl FnMut(&Completion<Err>) + Send + 'static) -> Self {
    self.on_completion = Some(Box::new(f));
    self
  }

  pub fn on_cancel(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
    self.on_cancel = Some(Arc::new(f));
    self
  }

  pub fn on_request(mut self, f: impl Fn(Demand) + Send + Sync + 'static) -> Self {
    self.on_request = Some(Arc::new(f));
    self
  }
}

impl<Item: Debug, Err: Debug> EventHooks<Item, Err> {
  /// Hooks that report every event at `debug` level, tagged with `prefix`.
  pub(crate) fn logging(prefix: impl Into<Arc<str>>) -> Self {
    let prefix: Arc<str> = prefix.into();
    let (p1, p2, p3, p4, p5) =
      (prefix.clone(), prefix.clone(), prefix.clone(), prefix.clone(), prefix);
    EventHooks::new()
      .on_subscription(move || tracing::debug!(target: "rxcombine::log", "{p1}: receive subscription"))
      .on_value(move |v| tracing::debug!(target: "rxcombine::log", "{p2}: receive value: {v:?}"))
      .on_completion(move |c| match c {
        Completion::Finished => tracing::debug!(target: "rxcombine::log", "{p3}: receive finished"),
        Completion::Failure(e) => {
          tracing::debug!(target: "rxcombine::log", "{p3}: receive failure: {e:?}")
        }
      })
      .on_cancel(move || tracing::debug!(target: "rxcombine::log", "{p4}: receive cancel"))
      .on_request(move |d| tracing::debug!(target: "rxcombine::log", "{p5}: request {d}"))
  }
}

pub struct HandleEvents<P: Publisher> {
  pub(crate) source: P,
  pub(crate) hooks: EventHooks<P::Output, P::Failure>,
}

impl<P: Publisher> Publisher for HandleEvents<P> {
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    self
      .source
      .subscribe(HandleEventsSubscriber { downstream: subscriber, hooks: self.hooks })
  }
}

pub struct HandleEventsSubscriber<S, Item, Err> {
  downstream: S,
  hooks: EventHooks<Item, Err>,
}

struct HookedSubscription {
  inner: AnySubscription,
  on_cancel: Option<CancelHook>,
  on_request: Option<RequestHook>,
}

impl Subscription for HookedSubscription {
  fn request(&self, demand: Demand) {
    if let Some(hook) = &self.on_request {
      hook(demand);
    }
    self.inner.request(demand)
  }

  fn cancel(&self) {
    if let Some(hook) = &self.on_cancel {
      hook();
    }
    self.inner.cancel()
  }
}

impl<Item, Err, S> Subscriber<Item, Err> for HandleEventsSubscriber<S, Item, Err>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    if let Some(hook) = self.hooks.on_subscription.as_mut() {
      hook();
    }
    let hooks = (self.hooks.on_cancel.take(), self.hooks.on_request.take());
    let subscription: AnySubscription = match hooks {
      (None, None) => subscription,
      (on_cancel, on_request) => {
        Arc::new(HookedSubscription { inner: subscription, on_cancel, on_request })
      }
    };
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    if let Some(hook) = self.hooks.on_value.as_mut() {
      hook(&input);
    }
    self.downstream.receive(input)
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    if let Some(hook) = self.hooks.on_completion.as_mut() {
      hook(&completion);
    }
    self.downstream.receive_completion(completion)
  }
}
