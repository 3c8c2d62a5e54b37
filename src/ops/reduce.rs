use std::sync::{Arc, Mutex};

use crate::{
  demand::Demand,
  outlet::{BufferPolicy, Idle, Outlet},
  publisher::Publisher,
  rc::lock,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

#[derive(Clone)]
pub struct Reduce<P, Acc, F> {
  pub(crate) source: P,
  pub(crate) initial: Acc,
  pub(crate) func: F,
}

/// `collect` is a reduce that pushes every value into a `Vec`.
pub type Collect<P, Item> = Reduce<P, Vec<Item>, fn(Vec<Item>, Item) -> Vec<Item>>;

pub(crate) fn push<Item>(mut acc: Vec<Item>, item: Item) -> Vec<Item> {
  acc.push(item);
  acc
}

impl<P, Acc, F> Publisher for Reduce<P, Acc, F>
where
  P: Publisher,
  Acc: Send + 'static,
  F: FnMut(Acc, P::Output) -> Acc + Send + 'static,
{
  type Output = Acc;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<Acc, P::Failure>>(self, subscriber: S) {
    let link = Arc::new(ReduceLink {
      outlet: Outlet::new(subscriber, BufferPolicy::Unbounded, Idle),
      upstream: Mutex::new(None),
    });
    self.source.subscribe(ReduceSubscriber { link, acc: Some(self.initial), func: self.func })
  }
}

/// The subscription handed downstream: demand goes to the outlet holding the
/// final value, cancellation reaches the upstream too.
struct ReduceLink<S, Acc, Err> {
  outlet: Outlet<S, Acc, Err>,
  upstream: Mutex<Option<AnySubscription>>,
}

impl<S, Acc, Err> Subscription for ReduceLink<S, Acc, Err>
where
  S: Subscriber<Acc, Err>,
  Acc: Send + 'static,
  Err: Send + 'static,
{
  fn request(&self, demand: Demand) { self.outlet.request(demand) }

  fn cancel(&self) {
    self.outlet.cancel();
    let upstream = lock(&self.upstream).take();
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}

pub struct ReduceSubscriber<S, Acc, Err, F> {
  link: Arc<ReduceLink<S, Acc, Err>>,
  acc: Option<Acc>,
  func: F,
}

impl<Item, Err, S, Acc, F> Subscriber<Item, Err> for ReduceSubscriber<S, Acc, Err, F>
where
  S: Subscriber<Acc, Err>,
  Acc: Send + 'static,
  Err: Send + 'static,
  F: FnMut(Acc, Item) -> Acc + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    *lock(&self.link.upstream) = Some(subscription.clone());
    self.link.outlet.start(self.link.clone());
    if self.link.outlet.is_closed() {
      subscription.cancel();
    } else {
      subscription.request(Demand::Unlimited);
    }
  }

  fn receive(&mut self, input: Item) -> Demand {
    if let Some(acc) = self.acc.take() {
      self.acc = Some((self.func)(acc, input));
    }
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    lock(&self.link.upstream).take();
    if completion.is_finished() {
      if let Some(acc) = self.acc.take() {
        self.link.outlet.offer(acc);
      }
    }
    self.link.outlet.finish(completion);
  }
}
