use std::marker::PhantomData;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

pub struct TryMap<P, F, E> {
  pub(crate) source: P,
  pub(crate) func: F,
  pub(crate) _p: PhantomData<fn() -> E>,
}

impl<P: Clone, F: Clone, E> Clone for TryMap<P, F, E> {
  fn clone(&self) -> Self {
    TryMap { source: self.source.clone(), func: self.func.clone(), _p: PhantomData }
  }
}

impl<P, F, T, E> Publisher for TryMap<P, F, E>
where
  P: Publisher,
  P::Failure: Into<E>,
  F: FnMut(P::Output) -> Result<T, E> + Send + 'static,
  T: Send + 'static,
  E: Send + 'static,
{
  type Output = T;
  type Failure = E;

  fn subscribe<S: Subscriber<T, E>>(self, subscriber: S) {
    self.source.subscribe(TryMapSubscriber {
      downstream: Some(subscriber),
      func: self.func,
      upstream: None,
    })
  }
}

pub struct TryMapSubscriber<S, F> {
  downstream: Option<S>,
  func: F,
  upstream: Option<AnySubscription>,
}

impl<In, Out, Err, E, S, F> Subscriber<In, Err> for TryMapSubscriber<S, F>
where
  Err: Into<E>,
  S: Subscriber<Out, E>,
  F: FnMut(In) -> Result<Out, E> + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.upstream = Some(subscription.clone());
    if let Some(downstream) = self.downstream.as_mut() {
      downstream.receive_subscription(subscription);
    }
  }

  fn receive(&mut self, input: In) -> Demand {
    let Some(downstream) = self.downstream.as_mut() else {
      return Demand::NONE;
    };
    match (self.func)(input) {
      Ok(value) => downstream.receive(value),
      Err(error) => {
        if let Some(upstream) = self.upstream.take() {
          upstream.cancel();
        }
        if let Some(mut downstream) = self.downstream.take() {
          downstream.receive_completion(Completion::Failure(error));
        }
        Demand::NONE
      }
    }
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.upstream = None;
    if let Some(mut downstream) = self.downstream.take() {
      downstream.receive_completion(completion.map_failure(Into::into));
    }
  }
}
