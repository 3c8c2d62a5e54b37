use super::SubjectCore;
use crate::{outlet::BufferPolicy, subscriber::Completion};

/// A subject that forwards values to the subscribers present at the time
/// of `send`, without replay.
///
/// A subscriber with no outstanding demand misses the value.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let subject = PassthroughSubject::<&str, Never>::new();
/// subject.send("lost");
///
/// let (probe, handle) = Probe::unlimited();
/// subject.clone().subscribe(probe);
/// subject.send("seen");
/// assert_eq!(handle.values(), vec!["seen"]);
/// ```
pub struct PassthroughSubject<Item, Err> {
  core: SubjectCore<Item, Err, ()>,
}

impl<Item, Err> PassthroughSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new() -> Self { PassthroughSubject { core: SubjectCore::new((), BufferPolicy::DropNewest) } }

  /// Deliver `value` to every subscriber that has demand for it.
  #[inline]
  pub fn send(&self, value: Item) { self.core.send(value) }

  /// Terminate every subscriber. Later sends are ignored and later
  /// subscribers receive `completion` right away.
  #[inline]
  pub fn send_completion(&self, completion: Completion<Err>) { self.core.send_completion(completion) }

  /// Number of live subscribers.
  #[inline]
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }
}

impl<Item, Err> Default for PassthroughSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

super::impl_subject!(PassthroughSubject);

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn late_subscriber_sees_no_replay() {
    let subject = PassthroughSubject::<&str, Never>::new();
    subject.send("A");
    let (probe, handle) = Probe::unlimited();
    subject.clone().subscribe(probe);
    subject.send("B");
    assert_eq!(handle.values(), vec!["B"]);
  }

  #[rxcombine_macro::test]
  fn drops_values_without_demand() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (probe, handle) = Probe::new(Demand::NONE);
    subject.clone().subscribe(probe);

    subject.send(1);
    handle.request(Demand::max(1));
    subject.send(2);
    subject.send(3);
    assert_eq!(handle.values(), vec![2]);
  }

  #[rxcombine_macro::test]
  fn each_subscriber_has_its_own_demand() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (eager, eager_handle) = Probe::unlimited();
    let (lazy, lazy_handle) = Probe::new(Demand::max(1));
    subject.clone().subscribe(eager);
    subject.clone().subscribe(lazy);

    subject.send(1);
    subject.send(2);
    assert_eq!(eager_handle.values(), vec![1, 2]);
    assert_eq!(lazy_handle.values(), vec![1]);
  }

  #[rxcombine_macro::test]
  fn cancel_removes_subscriber() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (probe, handle) = Probe::unlimited();
    subject.clone().subscribe(probe);
    assert_eq!(subject.subscriber_count(), 1);

    handle.cancel();
    handle.cancel();
    assert_eq!(subject.subscriber_count(), 0);
    subject.send(1);
    assert!(handle.values().is_empty());
  }
}
