use smallvec::SmallVec;

use super::AnySubscription;

/// Id-keyed storage for a changing set of links.
///
/// Subjects keep their subscribers here and the fan-in operators keep their
/// upstream subscriptions here. Ids are handed out in increasing order and
/// never reused, so iteration order is insertion order.
pub(crate) struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  /// Add an item and return its unique id.
  pub(crate) fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub(crate) fn get_mut(&mut self, id: usize) -> Option<&mut U> {
    self.items.iter_mut().find(|(i, _)| *i == id).map(|(_, item)| item)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.items.is_empty() }

  #[inline]
  pub(crate) fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }

  #[inline]
  pub(crate) fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, item)| item) }
}

impl DynamicSubscriptions<Option<AnySubscription>> {
  /// Clone out every bound subscription, in insertion order.
  pub(crate) fn bound(&self) -> SmallVec<[AnySubscription; 4]> {
    self.iter().flatten().cloned().collect()
  }

  /// Empty the container, returning the bound subscriptions so the caller can
  /// cancel them once its own lock is released.
  pub(crate) fn take_bound(&mut self) -> SmallVec<[AnySubscription; 4]> {
    self.drain().flatten().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::empty;

  #[rxcombine_macro::test]
  fn ids_are_never_reused() {
    let mut subs = DynamicSubscriptions::default();
    let a = subs.add('a');
    subs.remove(a);
    let b = subs.add('b');
    assert_ne!(a, b);
    assert!(subs.get_mut(b).is_some());
    assert!(subs.get_mut(a).is_none());
  }

  #[rxcombine_macro::test]
  fn iteration_follows_insertion() {
    let mut subs = DynamicSubscriptions::default();
    subs.add(1);
    let second = subs.add(2);
    subs.add(3);
    subs.remove(second);
    subs.add(4);
    assert_eq!(subs.iter().copied().collect::<Vec<_>>(), vec![1, 3, 4]);
    assert_eq!(subs.len(), 3);
  }

  #[rxcombine_macro::test]
  fn get_mut_binds_slot() {
    let mut subs: DynamicSubscriptions<Option<AnySubscription>> = DynamicSubscriptions::default();
    let id = subs.add(None);
    subs.add(None);
    assert!(subs.bound().is_empty());
    *subs.get_mut(id).expect("slot exists") = Some(empty());
    assert_eq!(subs.bound().len(), 1);
    assert_eq!(subs.take_bound().len(), 1);
    assert!(subs.is_empty());
  }
}
