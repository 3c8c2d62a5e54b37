use std::sync::{Arc, Mutex};

use super::{Completion, Subscriber};
use crate::{
  demand::Demand,
  rc::lock,
  subscription::{AnySubscription, Cancellable},
};

/// A closure-driven subscriber that requests unlimited demand.
///
/// Created by [`PublisherExt::sink`](crate::ops::PublisherExt::sink) and
/// [`PublisherExt::sink_value`](crate::ops::PublisherExt::sink_value).
pub struct Sink<FV, FC> {
  on_value: FV,
  on_completion: Option<FC>,
  handle: Cancellable,
}

impl<FV, FC> Sink<FV, FC> {
  pub fn new(on_value: FV, on_completion: FC, handle: Cancellable) -> Self {
    Sink { on_value, on_completion: Some(on_completion), handle }
  }
}

impl<Item, Err, FV, FC> Subscriber<Item, Err> for Sink<FV, FC>
where
  FV: FnMut(Item) + Send + 'static,
  FC: FnOnce(Completion<Err>) + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    if self.handle.attach(subscription.clone()) {
      subscription.request(Demand::Unlimited);
    }
  }

  #[inline]
  fn receive(&mut self, input: Item) -> Demand {
    (self.on_value)(input);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.handle.release();
    if let Some(on_completion) = self.on_completion.take() {
      on_completion(completion);
    }
  }
}

/// Writes every value into a shared target through a setter.
///
/// The setter stands in for a writable member reference: it is bound at
/// subscription time and decides which part of the target a value updates.
pub struct Assign<T, F> {
  target: Arc<Mutex<T>>,
  setter: F,
  handle: Cancellable,
}

impl<T, F> Assign<T, F> {
  pub fn new(target: Arc<Mutex<T>>, setter: F, handle: Cancellable) -> Self {
    Assign { target, setter, handle }
  }
}

impl<Item, Err, T, F> Subscriber<Item, Err> for Assign<T, F>
where
  T: Send + 'static,
  F: FnMut(&mut T, Item) + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    if self.handle.attach(subscription.clone()) {
      subscription.request(Demand::Unlimited);
    }
  }

  fn receive(&mut self, input: Item) -> Demand {
    (self.setter)(&mut lock(&self.target), input);
    Demand::NONE
  }

  fn receive_completion(&mut self, _completion: Completion<Err>) { self.handle.release(); }
}
