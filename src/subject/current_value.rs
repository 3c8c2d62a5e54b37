use super::{Latest, SubjectCore};
use crate::{outlet::BufferPolicy, subscriber::Completion};

/// A subject that holds a current value.
///
/// New subscribers receive the current value on their first request, then
/// every later value. A subscriber without demand keeps only the newest
/// value it has not received yet.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let subject = CurrentValueSubject::<&str, Never>::new("init");
/// subject.send("A");
///
/// let (probe, handle) = Probe::unlimited();
/// subject.clone().subscribe(probe);
/// subject.send("B");
/// assert_eq!(handle.values(), vec!["A", "B"]);
/// assert_eq!(subject.value(), "B");
/// ```
pub struct CurrentValueSubject<Item, Err> {
  core: SubjectCore<Item, Err, Latest<Item>>,
}

impl<Item, Err> CurrentValueSubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  pub fn new(value: Item) -> Self {
    CurrentValueSubject { core: SubjectCore::new(Latest(value), BufferPolicy::KeepLatest) }
  }

  /// The most recently sent value, or the initial one.
  pub fn value(&self) -> Item { self.core.state.rc_deref_mut().replay.0.clone() }

  /// Store `value` and deliver it to every subscriber.
  #[inline]
  pub fn send(&self, value: Item) { self.core.send(value) }

  #[inline]
  pub fn send_completion(&self, completion: Completion<Err>) { self.core.send_completion(completion) }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }
}

super::impl_subject!(CurrentValueSubject);
