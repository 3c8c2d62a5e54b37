use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct Filter<P, F> {
  pub(crate) source: P,
  pub(crate) predicate: F,
}

impl<P, F> Publisher for Filter<P, F>
where
  P: Publisher,
  F: FnMut(&P::Output) -> bool + Send + 'static,
{
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    self
      .source
      .subscribe(FilterSubscriber { downstream: subscriber, predicate: self.predicate })
  }
}

pub struct FilterSubscriber<S, F> {
  downstream: S,
  predicate: F,
}

impl<Item, Err, S, F> Subscriber<Item, Err> for FilterSubscriber<S, F>
where
  S: Subscriber<Item, Err>,
  F: FnMut(&Item) -> bool + Send + 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    if (self.predicate)(&input) {
      self.downstream.receive(input)
    } else {
      // Replace the element the downstream asked for but will not get.
      Demand::max(1)
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
  fn keeps_matching_values() {
    let (probe, handle) = Probe::unlimited();
    from_iter(1..=6).filter(|v| v % 2 == 0).subscribe(probe);
    assert_eq!(handle.values(), vec![2, 4, 6]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn rejected_values_do_not_consume_demand() {
    let (probe, handle) = Probe::new(Demand::max(2));
    from_iter(1..).filter(|v| v % 3 == 0).subscribe(probe);
    assert_eq!(handle.values(), vec![3, 6]);
    assert_eq!(handle.outstanding(), Demand::NONE);
  }
}
