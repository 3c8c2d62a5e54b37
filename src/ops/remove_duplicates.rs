use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct RemoveDuplicates<P> {
  pub(crate) source: P,
}

impl<P> Publisher for RemoveDuplicates<P>
where
  P: Publisher,
  P::Output: PartialEq + Clone,
{
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    self.source.subscribe(RemoveDuplicatesSubscriber { downstream: subscriber, last: None })
  }
}

pub struct RemoveDuplicatesSubscriber<S, Item> {
  downstream: S,
  last: Option<Item>,
}

impl<Item, Err, S> Subscriber<Item, Err> for RemoveDuplicatesSubscriber<S, Item>
where
  S: Subscriber<Item, Err>,
  Item: PartialEq + Clone + Send + 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    if self.last.as_ref() == Some(&input) {
      return Demand::max(1);
    }
    self.last = Some(input.clone());
    self.downstream.receive(input)
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
  fn drops_consecutive_repeats() {
    let (probe, handle) = Probe::unlimited();
    from_iter(vec![1, 1, 2, 2, 2, 1, 3, 3]).remove_duplicates().subscribe(probe);
    assert_eq!(handle.values(), vec![1, 2, 1, 3]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn repeats_do_not_consume_demand() {
    let (probe, handle) = Probe::new(Demand::max(2));
    from_iter(vec!["a", "a", "a", "b", "c"]).remove_duplicates().subscribe(probe);
    assert_eq!(handle.values(), vec!["a", "b"]);
    assert!(!handle.is_terminated());
  }
}
