//! Fan-in of several publishers into one subscriber.
//!
//! [`FanIn`] is the shared core of `merge`, `merge_many` and `flat_map`: it
//! owns one [`Outlet`] towards the subscriber and an id-keyed set of inner
//! subscriptions. Demand from the subscriber is forwarded to every bound
//! inner publisher, so values that arrive faster than they are requested are
//! buffered by the outlet. The stream finishes once the set of inner
//! publishers is sealed and all of them have finished; the first failure
//! cancels everything else and is delivered right away.

use std::sync::{Arc, Mutex};

use crate::{
  demand::Demand,
  outlet::{BufferPolicy, Idle, Outlet},
  publisher::Publisher,
  rc::lock,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, DynamicSubscriptions, Subscription},
};

#[derive(Default)]
struct Links {
  inners: DynamicSubscriptions<Option<AnySubscription>>,
  outer: Option<AnySubscription>,
  sealed: bool,
  done: bool,
}

fn request_bound(links: &Mutex<Links>, demand: Demand) {
  let bound = lock(links).inners.bound();
  for inner in bound {
    inner.request(demand);
  }
}

/// Passes demand returned from `receive` on to the inner publishers.
pub(crate) struct Forward<S> {
  downstream: S,
  links: Arc<Mutex<Links>>,
}

impl<Item, Err, S> Subscriber<Item, Err> for Forward<S>
where
  S: Subscriber<Item, Err>,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    let more = self.downstream.receive(input);
    if !more.is_none() {
      request_bound(&self.links, more);
    }
    more
  }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.downstream.receive_completion(completion)
  }
}

pub(crate) struct FanIn<S, Item, Err> {
  outlet: Outlet<Forward<S>, Item, Err>,
  links: Arc<Mutex<Links>>,
}

impl<S, Item, Err> FanIn<S, Item, Err>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  pub(crate) fn new(downstream: S) -> Arc<Self> {
    let links = Arc::new(Mutex::new(Links::default()));
    let forward = Forward { downstream, links: links.clone() };
    Arc::new(FanIn { outlet: Outlet::new(forward, BufferPolicy::Unbounded, Idle), links })
  }

  pub(crate) fn start(self: &Arc<Self>) { self.outlet.start(self.clone()) }

  /// Register a new inner publisher. `None` once the fan-in has terminated.
  pub(crate) fn reserve(&self) -> Option<usize> {
    let mut links = lock(&self.links);
    if links.done {
      return None;
    }
    Some(links.inners.add(None))
  }

  fn bind(&self, id: usize, subscription: AnySubscription) {
    let accepted = {
      let mut links = lock(&self.links);
      let links = &mut *links;
      match links.inners.get_mut(id) {
        Some(slot) if !links.done => {
          *slot = Some(subscription.clone());
          true
        }
        _ => false,
      }
    };
    if !accepted {
      return subscription.cancel();
    }
    let owed = self.outlet.outstanding();
    if !owed.is_none() {
      subscription.request(owed);
    }
  }

  /// Bind the subscription of the publisher that produces inner publishers,
  /// asking it for the first `initial` of them.
  pub(crate) fn attach_outer(&self, subscription: AnySubscription, initial: Demand) {
    let accepted = {
      let mut links = lock(&self.links);
      if links.done {
        false
      } else {
        links.outer = Some(subscription.clone());
        true
      }
    };
    if !accepted {
      subscription.cancel();
    } else if !initial.is_none() {
      subscription.request(initial);
    }
  }

  fn inner_finished(&self, id: usize) {
    let (finished, outer) = {
      let mut links = lock(&self.links);
      if links.done || links.inners.remove(id).is_none() {
        return;
      }
      tracing::debug!(inner = id, remaining = links.inners.len(), "inner publisher finished");
      if links.sealed && links.inners.is_empty() {
        links.done = true;
        links.outer = None;
        (true, None)
      } else if links.sealed {
        (false, None)
      } else {
        (false, links.outer.clone())
      }
    };
    if finished {
      self.outlet.finish(Completion::Finished);
    } else if let Some(outer) = outer {
      // A slot became free for the next inner publisher.
      outer.request(Demand::max(1));
    }
  }

  /// No more inner publishers will be added.
  pub(crate) fn seal(&self) {
    {
      let mut links = lock(&self.links);
      if links.done {
        return;
      }
      links.sealed = true;
      links.outer = None;
      if !links.inners.is_empty() {
        return;
      }
      links.done = true;
    }
    self.outlet.finish(Completion::Finished);
  }

  pub(crate) fn fail(&self, error: Err) {
    let (inners, outer) = {
      let mut links = lock(&self.links);
      if links.done {
        return;
      }
      links.done = true;
      (links.inners.take_bound(), links.outer.take())
    };
    tracing::debug!(cancelled = inners.len(), "inner publisher failed, cancelling the rest");
    for inner in inners.into_iter().chain(outer) {
      inner.cancel();
    }
    self.outlet.finish(Completion::Failure(error));
  }
}

impl<S, Item, Err> Subscription for FanIn<S, Item, Err>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn request(&self, demand: Demand) {
    self.outlet.request(demand);
    request_bound(&self.links, demand);
  }

  fn cancel(&self) {
    let (inners, outer) = {
      let mut links = lock(&self.links);
      links.done = true;
      (links.inners.take_bound(), links.outer.take())
    };
    for inner in inners.into_iter().chain(outer) {
      inner.cancel();
    }
    self.outlet.cancel();
  }
}

pub(crate) struct InnerSubscriber<S, Item, Err> {
  fan: Arc<FanIn<S, Item, Err>>,
  id: usize,
}

impl<S, Item, Err> InnerSubscriber<S, Item, Err> {
  pub(crate) fn new(fan: Arc<FanIn<S, Item, Err>>, id: usize) -> Self { InnerSubscriber { fan, id } }
}

impl<S, Item, Err> Subscriber<Item, Err> for InnerSubscriber<S, Item, Err>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.fan.bind(self.id, subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    self.fan.outlet.offer(input);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    match completion {
      Completion::Finished => self.fan.inner_finished(self.id),
      Completion::Failure(error) => self.fan.fail(error),
    }
  }
}

/// Values of two publishers interleaved as they arrive.
#[derive(Clone)]
pub struct Merge<A, B> {
  pub(crate) first: A,
  pub(crate) second: B,
}

impl<A, B> Publisher for Merge<A, B>
where
  A: Publisher,
  B: Publisher<Output = A::Output, Failure = A::Failure>,
{
  type Output = A::Output;
  type Failure = A::Failure;

  fn subscribe<S: Subscriber<A::Output, A::Failure>>(self, subscriber: S) {
    let fan = FanIn::new(subscriber);
    fan.start();
    if let Some(id) = fan.reserve() {
      self.first.subscribe(InnerSubscriber::new(fan.clone(), id));
    }
    if let Some(id) = fan.reserve() {
      self.second.subscribe(InnerSubscriber::new(fan.clone(), id));
    }
    fan.seal();
  }
}

/// Values of any number of publishers of one type, interleaved.
#[derive(Clone)]
pub struct MergeMany<P> {
  pub(crate) sources: Vec<P>,
}

/// Merge every publisher in `sources`. An empty list finishes immediately.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let (probe, handle) = Probe::unlimited();
/// merge_many(vec![just(1), just(2), just(3)]).subscribe(probe);
/// assert_eq!(handle.values(), vec![1, 2, 3]);
/// ```
pub fn merge_many<P: Publisher>(sources: Vec<P>) -> MergeMany<P> { MergeMany { sources } }

impl<P: Publisher> Publisher for MergeMany<P> {
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    let fan = FanIn::new(subscriber);
    fan.start();
    for source in self.sources {
      let Some(id) = fan.reserve() else { break };
      source.subscribe(InnerSubscriber::new(fan.clone(), id));
    }
    fan.seal();
  }
}
