use std::{iter::Peekable, sync::Arc};

use super::{Never, Publisher};
use crate::{
  outlet::{BufferPolicy, Outlet, Pull},
  subscriber::{Completion, Subscriber},
};

/// Creates a publisher that emits the items of an iterator.
///
/// Items are pulled lazily: the iterator advances only when the subscriber
/// has outstanding demand, so an infinite iterator is fine as long as demand
/// is bounded. The stream finishes as soon as the iterator is known to be
/// exhausted, even without demand.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let (probe, handle) = Probe::new(Demand::max(3));
/// from_iter(0..).subscribe(probe);
/// assert_eq!(handle.values(), vec![0, 1, 2]);
/// ```
pub fn from_iter<I>(iter: I) -> Sequence<I>
where
  I: IntoIterator,
{
  Sequence(iter)
}

#[derive(Clone, Debug)]
pub struct Sequence<I>(I);

struct IterPull<I: Iterator>(Peekable<I>);

impl<I> Pull<I::Item, Never> for IterPull<I>
where
  I: Iterator + Send + 'static,
  I::Item: Send + 'static,
{
  #[inline]
  fn pull(&mut self) -> Option<I::Item> { self.0.next() }

  fn exhausted(&mut self) -> Option<Completion<Never>> {
    self.0.peek().is_none().then_some(Completion::Finished)
  }
}

impl<I> Publisher for Sequence<I>
where
  I: IntoIterator,
  I::IntoIter: Send + 'static,
  I::Item: Send + 'static,
{
  type Output = I::Item;
  type Failure = Never;

  fn subscribe<S: Subscriber<I::Item, Never>>(self, subscriber: S) {
    let source = IterPull(self.0.into_iter().peekable());
    let outlet = Arc::new(Outlet::new(subscriber, BufferPolicy::Unbounded, source));
    outlet.start(outlet.clone());
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn demand_bounds_delivery() {
    let (probe, handle) = Probe::new(Demand::max(2));
    from_iter(vec![1, 2, 3, 4]).subscribe(probe);
    assert_eq!(handle.values(), vec![1, 2]);
    assert!(!handle.is_terminated());

    handle.request(Demand::max(1));
    assert_eq!(handle.values(), vec![1, 2, 3]);

    handle.request(Demand::max(1));
    assert_eq!(handle.values(), vec![1, 2, 3, 4]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn empty_iterator_finishes_immediately() {
    let (probe, handle) = Probe::<i32, Never>::new(Demand::NONE);
    from_iter(Vec::<i32>::new()).subscribe(probe);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn each_subscription_restarts() {
    let source = from_iter(1..=2);
    let (first, a) = Probe::unlimited();
    let (second, b) = Probe::unlimited();
    source.clone().subscribe(first);
    source.subscribe(second);
    assert_eq!(a.values(), vec![1, 2]);
    assert_eq!(b.values(), vec![1, 2]);
  }

  #[rxcombine_macro::test]
  fn cancel_stops_pulling() {
    let (probe, handle) = Probe::new(Demand::max(1));
    from_iter(0..).subscribe(probe);
    handle.cancel();
    handle.request(Demand::max(5));
    assert_eq!(handle.values(), vec![0]);
    assert!(!handle.is_terminated());
  }
}
