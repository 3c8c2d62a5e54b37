use std::marker::PhantomData;

use crate::{
  demand::Demand,
  publisher::{Never, Publisher},
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct MapError<P, F> {
  pub(crate) source: P,
  pub(crate) func: F,
}

impl<P, F, E> Publisher for MapError<P, F>
where
  P: Publisher,
  F: FnOnce(P::Failure) -> E + Send + 'static,
  E: Send + 'static,
{
  type Output = P::Output;
  type Failure = E;

  fn subscribe<S: Subscriber<P::Output, E>>(self, subscriber: S) {
    self
      .source
      .subscribe(MapErrorSubscriber { downstream: subscriber, func: Some(self.func) })
  }
}

pub struct MapErrorSubscriber<S, F> {
  downstream: S,
  func: Option<F>,
}

impl<Item, Err, E, S, F> Subscriber<Item, Err> for MapErrorSubscriber<S, F>
where
  S: Subscriber<Item, E>,
  F: FnOnce(Err) -> E + Send + 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: Item) -> Demand { self.downstream.receive(input) }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    let completion = match completion {
      Completion::Finished => Completion::Finished,
      Completion::Failure(error) => match self.func.take() {
        Some(func) => Completion::Failure(func(error)),
        None => return,
      },
    };
    self.downstream.receive_completion(completion)
  }
}

/// Retypes the failure of a publisher that cannot fail.
pub struct SetFailureType<P, E> {
  pub(crate) source: P,
  pub(crate) _p: PhantomData<fn() -> E>,
}

impl<P: Clone, E> Clone for SetFailureType<P, E> {
  fn clone(&self) -> Self { SetFailureType { source: self.source.clone(), _p: PhantomData } }
}

impl<P, E> Publisher for SetFailureType<P, E>
where
  P: Publisher<Failure = Never>,
  E: Send + 'static,
{
  type Output = P::Output;
  type Failure = E;

  fn subscribe<S: Subscriber<P::Output, E>>(self, subscriber: S) {
    self.source.subscribe(SetFailureTypeSubscriber { downstream: subscriber, _p: PhantomData })
  }
}

pub struct SetFailureTypeSubscriber<S, E> {
  downstream: S,
  _p: PhantomData<fn() -> E>,
}

impl<Item, E, S> Subscriber<Item, Never> for SetFailureTypeSubscriber<S, E>
where
  S: Subscriber<Item, E>,
  E: 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: Item) -> Demand { self.downstream.receive(input) }

  fn receive_completion(&mut self, completion: Completion<Never>) {
    match completion {
      Completion::Finished => self.downstream.receive_completion(Completion::Finished),
      Completion::Failure(never) => match never {},
    }
  }
}
