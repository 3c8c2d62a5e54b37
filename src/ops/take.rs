use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct Take<P> {
  pub(crate) source: P,
  pub(crate) count: usize,
}

impl<P: Publisher> Publisher for Take<P> {
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    self.source.subscribe(TakeSubscriber {
      downstream: Some(subscriber),
      remaining: self.count,
      upstream: None,
    })
  }
}

pub struct TakeSubscriber<S> {
  downstream: Option<S>,
  remaining: usize,
  upstream: Option<AnySubscription>,
}

impl<S> TakeSubscriber<S> {
  fn finish<Item, Err>(&mut self)
  where
    S: Subscriber<Item, Err>,
  {
    if let Some(upstream) = self.upstream.take() {
      upstream.cancel();
    }
    if let Some(mut downstream) = self.downstream.take() {
      downstream.receive_completion(Completion::Finished);
    }
  }
}

impl<Item, Err, S> Subscriber<Item, Err> for TakeSubscriber<S>
where
  S: Subscriber<Item, Err>,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.upstream = Some(subscription.clone());
    if let Some(downstream) = self.downstream.as_mut() {
      downstream.receive_subscription(subscription);
    }
    if self.remaining == 0 {
      self.finish::<Item, Err>();
    }
  }

  fn receive(&mut self, input: Item) -> Demand {
    let Some(downstream) = self.downstream.as_mut() else {
      return Demand::NONE;
    };
    self.remaining = self.remaining.saturating_sub(1);
    let more = downstream.receive(input);
    if self.remaining == 0 {
      self.finish::<Item, Err>();
      return Demand::NONE;
    }
    more
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.upstream = None;
    if let Some(mut downstream) = self.downstream.take() {
      downstream.receive_completion(completion);
    }
  }
}
