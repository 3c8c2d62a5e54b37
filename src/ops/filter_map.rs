use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct FilterMap<P, F> {
  pub(crate) source: P,
  pub(crate) func: F,
}

impl<P, F, T> Publisher for FilterMap<P, F>
where
  P: Publisher,
  F: FnMut(P::Output) -> Option<T> + Send + 'static,
  T: Send + 'static,
{
  type Output = T;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<T, P::Failure>>(self, subscriber: S) {
    self.source.subscribe(FilterMapSubscriber { downstream: subscriber, func: self.func })
  }
}

pub struct FilterMapSubscriber<S, F> {
  downstream: S,
  func: F,
}

impl<In, Out, Err, S, F> Subscriber<In, Err> for FilterMapSubscriber<S, F>
where
  S: Subscriber<Out, Err>,
  F: FnMut(In) -> Option<Out> + Send + 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: In) -> Demand {
    match (self.func)(input) {
      Some(value) => self.downstream.receive(value),
      None => Demand::max(1),
    }
  }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.downstream.receive_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn parses_what_it_can() {
    let (probe, handle) = Probe::with_demand(Demand::max(1), Demand::max(1));
    from_iter(vec!["1", "a", "2", "b", "3"])
      .filter_map(|s| s.parse::<i32>().ok())
      .subscribe(probe);
    assert_eq!(handle.values(), vec![1, 2, 3]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }
}
