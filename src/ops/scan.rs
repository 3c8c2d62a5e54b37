use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct Scan<P, Acc, F> {
  pub(crate) source: P,
  pub(crate) initial: Acc,
  pub(crate) func: F,
}

impl<P, Acc, F> Publisher for Scan<P, Acc, F>
where
  P: Publisher,
  Acc: Clone + Send + 'static,
  F: FnMut(Acc, P::Output) -> Acc + Send + 'static,
{
  type Output = Acc;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<Acc, P::Failure>>(self, subscriber: S) {
    self.source.subscribe(ScanSubscriber {
      downstream: subscriber,
      acc: Some(self.initial),
      func: self.func,
    })
  }
}

pub struct ScanSubscriber<S, Acc, F> {
  downstream: S,
  acc: Option<Acc>,
  func: F,
}

impl<Item, Err, S, Acc, F> Subscriber<Item, Err> for ScanSubscriber<S, Acc, F>
where
  S: Subscriber<Acc, Err>,
  Acc: Clone + Send + 'static,
  F: FnMut(Acc, Item) -> Acc + Send + 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    let Some(acc) = self.acc.take() else {
      return Demand::NONE;
    };
    let next = (self.func)(acc, input);
    self.acc = Some(next.clone());
    self.downstream.receive(next)
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
  fn running_sum() {
    let (probe, handle) = Probe::unlimited();
    from_iter(1..=4).scan(0, |acc, v| acc + v).subscribe(probe);
    assert_eq!(handle.values(), vec![1, 3, 6, 10]);
  }

  #[rxcombine_macro::test]
  fn accumulator_type_differs() {
    let (probe, handle) = Probe::new(Demand::max(2));
    from_iter(vec!['a', 'b', 'c']).scan(String::new(), |mut s, c| {
      s.push(c);
      s
    })
    .subscribe(probe);
    assert_eq!(handle.values(), vec!["a".to_string(), "ab".to_string()]);
  }
}
