use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
  outlet::Conduit,
  subscriber::Completion,
  subscription::DynamicSubscriptions,
};

/// The feeding side of one subscriber's outlet.
pub(crate) type Link<Item, Err> = Arc<dyn Conduit<Item, Err>>;

/// A point-in-time copy of the subscriber set, delivered to outside the
/// subject's lock.
pub(crate) type Snapshot<Item, Err> = SmallVec<[Link<Item, Err>; 4]>;

/// Subscribers of a subject, in subscription order.
pub(crate) struct Subscribers<Item, Err> {
  inner: DynamicSubscriptions<Link<Item, Err>>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { inner: DynamicSubscriptions::default() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  #[inline]
  pub(crate) fn add(&mut self, link: Link<Item, Err>) -> usize { self.inner.add(link) }

  #[inline]
  pub(crate) fn remove(&mut self, id: usize) -> Option<Link<Item, Err>> { self.inner.remove(id) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.inner.len() }

  pub(crate) fn snapshot(&self) -> Snapshot<Item, Err> { self.inner.iter().cloned().collect() }

  /// Empty the set; the caller terminates the returned links.
  pub(crate) fn take_all(&mut self) -> Snapshot<Item, Err> { self.inner.drain().collect() }
}

/// Offer `value` to every link, cloning for all but the last. Returns how
/// many links dropped it for lack of demand.
pub(crate) fn broadcast_value<Item: Clone, Err>(links: &[Link<Item, Err>], value: Item) -> usize {
  let Some((last, rest)) = links.split_last() else { return 0 };
  let mut dropped = rest.iter().filter(|link| !link.offer(value.clone())).count();
  if !last.offer(value) {
    dropped += 1;
  }
  dropped
}

pub(crate) fn broadcast_completion<Item, Err: Clone>(
  links: Snapshot<Item, Err>, completion: Completion<Err>,
) {
  let mut iter = links.into_iter().peekable();
  while let Some(link) = iter.next() {
    if iter.peek().is_some() {
      link.finish(completion.clone());
    } else {
      link.finish(completion);
      break;
    }
  }
}
