use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct Skip<P> {
  pub(crate) source: P,
  pub(crate) count: usize,
}

impl<P: Publisher> Publisher for Skip<P> {
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    self.source.subscribe(SkipSubscriber { downstream: subscriber, remaining: self.count })
  }
}

pub struct SkipSubscriber<S> {
  downstream: S,
  remaining: usize,
}

impl<Item, Err, S> Subscriber<Item, Err> for SkipSubscriber<S>
where
  S: Subscriber<Item, Err>,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    if self.remaining > 0 {
      self.remaining -= 1;
      Demand::max(1)
    } else {
      self.downstream.receive(input)
    }
  }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.downstream.receive_completion(completion)
  }
}
