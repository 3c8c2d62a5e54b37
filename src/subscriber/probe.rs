use super::{Completion, Subscriber};
use crate::{demand::Demand, rc::MutArc, subscription::AnySubscription};

struct ProbeRecord<Item, Err> {
  subscription: Option<AnySubscription>,
  subscriptions_received: usize,
  outstanding: Demand,
  values: Vec<Item>,
  completion: Option<Completion<Err>>,
}

/// A recording subscriber with manual demand.
///
/// `Probe` requests `initial` demand on subscription and `per_value` more
/// after every value; everything else is driven through its
/// [`ProbeHandle`]. It checks the subscription protocol as it goes and panics
/// on a violation: a second subscription, a value without outstanding
/// demand, a value after completion, or a second completion. Those are
/// defects in the publisher, not recoverable failures.
///
/// ```rust
/// use rxcombine::prelude::*;
///
/// let (probe, handle) = Probe::new(Demand::max(2));
/// from_iter(1..=5).subscribe(probe);
/// assert_eq!(handle.values(), vec![1, 2]);
///
/// handle.request(Demand::max(10));
/// assert_eq!(handle.values(), vec![1, 2, 3, 4, 5]);
/// assert_eq!(handle.completion(), Some(Completion::Finished));
/// ```
pub struct Probe<Item, Err> {
  record: MutArc<ProbeRecord<Item, Err>>,
  initial: Demand,
  per_value: Demand,
}

/// Inspects and drives a [`Probe`] after it has been subscribed.
pub struct ProbeHandle<Item, Err> {
  record: MutArc<ProbeRecord<Item, Err>>,
}

impl<Item, Err> Probe<Item, Err> {
  /// A probe that requests `initial` once and nothing per value.
  pub fn new(initial: Demand) -> (Self, ProbeHandle<Item, Err>) {
    Self::with_demand(initial, Demand::NONE)
  }

  /// A probe that requests `initial` once and `per_value` after each value.
  pub fn with_demand(initial: Demand, per_value: Demand) -> (Self, ProbeHandle<Item, Err>) {
    let record = MutArc::own(ProbeRecord {
      subscription: None,
      subscriptions_received: 0,
      outstanding: Demand::NONE,
      values: vec![],
      completion: None,
    });
    let handle = ProbeHandle { record: record.clone() };
    (Probe { record, initial, per_value }, handle)
  }

  /// A probe that requests unlimited demand.
  pub fn unlimited() -> (Self, ProbeHandle<Item, Err>) { Self::new(Demand::Unlimited) }
}

impl<Item, Err> Subscriber<Item, Err> for Probe<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    {
      let mut record = self.record.rc_deref_mut();
      record.subscriptions_received += 1;
      assert_eq!(record.subscriptions_received, 1, "subscription received more than once");
      record.subscription = Some(subscription.clone());
      record.outstanding += self.initial;
    }
    if !self.initial.is_none() {
      subscription.request(self.initial);
    }
  }

  fn receive(&mut self, input: Item) -> Demand {
    let mut record = self.record.rc_deref_mut();
    assert!(record.completion.is_none(), "value received after completion");
    assert!(!record.outstanding.is_none(), "value received without outstanding demand");
    record.outstanding -= 1;
    record.outstanding += self.per_value;
    record.values.push(input);
    self.per_value
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    let mut record = self.record.rc_deref_mut();
    assert!(record.completion.is_none(), "completion received more than once");
    record.completion = Some(completion);
    record.subscription = None;
  }
}

impl<Item, Err> ProbeHandle<Item, Err> {
  /// Request more elements through the recorded subscription.
  pub fn request(&self, demand: Demand) {
    let subscription = {
      let mut record = self.record.rc_deref_mut();
      if record.completion.is_some() {
        return;
      }
      record.outstanding += demand;
      record.subscription.clone()
    };
    if let Some(subscription) = subscription {
      subscription.request(demand);
    }
  }

  /// Cancel the recorded subscription.
  pub fn cancel(&self) {
    let subscription = self.record.rc_deref_mut().subscription.take();
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }

  pub fn is_subscribed(&self) -> bool { self.record.rc_deref_mut().subscriptions_received > 0 }

  /// Demand requested but not yet satisfied.
  pub fn outstanding(&self) -> Demand { self.record.rc_deref_mut().outstanding }

  pub fn value_count(&self) -> usize { self.record.rc_deref_mut().values.len() }

  pub fn is_terminated(&self) -> bool { self.record.rc_deref_mut().completion.is_some() }

  /// Remove and return the values received so far.
  pub fn take_values(&self) -> Vec<Item> { std::mem::take(&mut self.record.rc_deref_mut().values) }
}

impl<Item: Clone, Err> ProbeHandle<Item, Err> {
  pub fn values(&self) -> Vec<Item> { self.record.rc_deref_mut().values.clone() }
}

impl<Item, Err: Clone> ProbeHandle<Item, Err> {
  pub fn completion(&self) -> Option<Completion<Err>> {
    self.record.rc_deref_mut().completion.clone()
  }
}

impl<Item, Err> Clone for ProbeHandle<Item, Err> {
  fn clone(&self) -> Self { ProbeHandle { record: self.record.clone() } }
}
