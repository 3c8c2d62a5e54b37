use std::sync::Arc;

use crate::{
  demand::Demand,
  publisher::Publisher,
  scheduler::Scheduler,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

/// Performs the subscribe call, and every later request and cancel, on a
/// scheduler. Where values are delivered is up to the source.
#[derive(Clone)]
pub struct SubscribeOn<P, Sch> {
  pub(crate) source: P,
  pub(crate) scheduler: Sch,
}

impl<P, Sch> Publisher for SubscribeOn<P, Sch>
where
  P: Publisher + Send + 'static,
  Sch: Scheduler,
{
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    let source = self.source;
    let scheduler = self.scheduler.clone();
    self.scheduler.schedule(
      Box::new(move || source.subscribe(SubscribeOnSubscriber { downstream: subscriber, scheduler })),
      None,
    );
  }
}

pub struct SubscribeOnSubscriber<S, Sch> {
  downstream: S,
  scheduler: Sch,
}

impl<Item, Err, S, Sch> Subscriber<Item, Err> for SubscribeOnSubscriber<S, Sch>
where
  S: Subscriber<Item, Err>,
  Sch: Scheduler,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    let scheduled = ScheduledSubscription { inner: subscription, scheduler: self.scheduler.clone() };
    self.downstream.receive_subscription(Arc::new(scheduled))
  }

  #[inline]
  fn receive(&mut self, input: Item) -> Demand { self.downstream.receive(input) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.downstream.receive_completion(completion)
  }
}

struct ScheduledSubscription<Sch> {
  inner: AnySubscription,
  scheduler: Sch,
}

impl<Sch: Scheduler> Subscription for ScheduledSubscription<Sch> {
  fn request(&self, demand: Demand) {
    let inner = self.inner.clone();
    self.scheduler.schedule(Box::new(move || inner.request(demand)), None);
  }

  fn cancel(&self) {
    let inner = self.inner.clone();
    self.scheduler.schedule(Box::new(move || inner.cancel()), None);
  }
}
