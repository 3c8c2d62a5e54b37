use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct Map<P, F> {
  pub(crate) source: P,
  pub(crate) func: F,
}

impl<P, F, T> Publisher for Map<P, F>
where
  P: Publisher,
  F: FnMut(P::Output) -> T + Send + 'static,
  T: Send + 'static,
{
  type Output = T;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<T, P::Failure>>(self, subscriber: S) {
    self.source.subscribe(MapSubscriber { downstream: subscriber, func: self.func })
  }
}

pub struct MapSubscriber<S, F> {
  downstream: S,
  func: F,
}

impl<In, Out, Err, S, F> Subscriber<In, Err> for MapSubscriber<S, F>
where
  S: Subscriber<Out, Err>,
  F: FnMut(In) -> Out + Send + 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: In) -> Demand { self.downstream.receive((self.func)(input)) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.downstream.receive_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn doubles_values() {
    let (probe, handle) = Probe::unlimited();
    from_iter(vec![1, 2, 3]).map(|x| x * 2).subscribe(probe);
    assert_eq!(handle.values(), vec![2, 4, 6]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn forwards_demand_one_to_one() {
    let (probe, handle) = Probe::new(Demand::max(2));
    from_iter(0..).map(|x| x.to_string()).subscribe(probe);
    assert_eq!(handle.values(), vec!["0", "1"]);
    handle.request(Demand::max(1));
    assert_eq!(handle.values(), vec!["0", "1", "2"]);
  }

  #[rxcombine_macro::test]
  fn failure_passes_through() {
    let (probe, handle) = Probe::unlimited();
    fail::<i32, _>("boom").map(|x| x + 1).subscribe(probe);
    assert_eq!(handle.completion(), Some(Completion::Failure("boom")));
  }
}
