use std::{marker::PhantomData, sync::Arc};

use super::relay::Relay;
use crate::{
  demand::Demand,
  publisher::{Just, Publisher},
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

#[derive(Clone)]
pub struct Catch<P, F> {
  pub(crate) source: P,
  pub(crate) handler: F,
}

/// `replace_error` is a catch whose fallback emits a single value.
pub type ReplaceError<P> = Catch<
  P,
  Box<dyn FnOnce(<P as Publisher>::Failure) -> Just<<P as Publisher>::Output> + Send>,
>;

impl<P, F, Q> Publisher for Catch<P, F>
where
  P: Publisher,
  F: FnOnce(P::Failure) -> Q + Send + 'static,
  Q: Publisher<Output = P::Output> + 'static,
{
  type Output = P::Output;
  type Failure = Q::Failure;

  fn subscribe<S: Subscriber<P::Output, Q::Failure>>(self, subscriber: S) {
    let relay = Arc::new(Relay::new(subscriber));
    relay.start::<P::Output, Q::Failure>();
    self.source.subscribe(CatchSubscriber {
      relay,
      handler: Some(self.handler),
      _p: PhantomData::<fn() -> Q>,
    });
  }
}

pub struct CatchSubscriber<S, F, Q> {
  relay: Arc<Relay<S>>,
  handler: Option<F>,
  _p: PhantomData<fn() -> Q>,
}

impl<Item, Err, S, F, Q> Subscriber<Item, Err> for CatchSubscriber<S, F, Q>
where
  Item: Send + 'static,
  S: Subscriber<Item, Q::Failure>,
  F: FnOnce(Err) -> Q + Send + 'static,
  Q: Publisher<Output = Item> + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.relay.attach(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand {
    self.relay.deliver::<Item, Q::Failure>(input)
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    match completion {
      Completion::Finished => self.relay.complete::<Item, Q::Failure>(Completion::Finished),
      Completion::Failure(error) => {
        let Some(handler) = self.handler.take() else { return };
        if !self.relay.detach() {
          return;
        }
        tracing::debug!("upstream failed, switching to fallback publisher");
        handler(error).subscribe(Fallback { relay: self.relay.clone() });
      }
    }
  }
}

/// Forwards everything from the fallback publisher into the relay.
pub(crate) struct Fallback<S> {
  pub(crate) relay: Arc<Relay<S>>,
}

impl<Item, Err, S> Subscriber<Item, Err> for Fallback<S>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.relay.attach(subscription)
  }

  fn receive(&mut self, input: Item) -> Demand { self.relay.deliver::<Item, Err>(input) }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.relay.complete::<Item, Err>(completion)
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn switches_to_fallback() {
    let subject = PassthroughSubject::<i32, &str>::new();
    let (probe, handle) = Probe::unlimited();
    subject.clone().catch(|_| from_iter(vec![8, 9])).subscribe(probe);

    subject.send(1);
    subject.send_completion(Completion::Failure("boom"));
    assert_eq!(handle.values(), vec![1, 8, 9]);
    assert_eq!(handle.completion(), Some(Completion::<Never>::Finished));
  }

  #[rxcombine_macro::test]
  fn outstanding_demand_carries_over() {
    let subject = PassthroughSubject::<i32, &str>::new();
    let (probe, handle) = Probe::new(Demand::max(3));
    subject.clone().catch(|_| from_iter(10..)).subscribe(probe);

    subject.send(1);
    subject.send_completion(Completion::Failure("boom"));
    assert_eq!(handle.values(), vec![1, 10, 11]);
    assert!(!handle.is_terminated());
  }

  #[rxcombine_macro::test]
  fn replace_error_emits_fallback_value() {
    let (probe, handle) = Probe::unlimited();
    from_iter(vec![1, 2])
      .set_failure_type::<&str>()
      .merge(fail("boom"))
      .replace_error(-1)
      .subscribe(probe);
    assert_eq!(handle.values(), vec![1, 2, -1]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn fallback_failure_is_final() {
    let (probe, handle) = Probe::unlimited();
    fail::<i32, _>("first").catch(|e| fail::<i32, _>(format!("{e} then second"))).subscribe(probe);
    assert_eq!(handle.completion(), Some(Completion::Failure("first then second".to_string())));
  }

  #[rxcombine_macro::test]
  fn cancel_reaches_current_upstream() {
    let subject = PassthroughSubject::<i32, &str>::new();
    let fallback = PassthroughSubject::<i32, Never>::new();
    let (probe, handle) = Probe::unlimited();
    let f = fallback.clone();
    subject.clone().catch(move |_| f).subscribe(probe);

    subject.send_completion(Completion::Failure("boom"));
    assert_eq!(fallback.subscriber_count(), 1);
    handle.cancel();
    assert_eq!(fallback.subscriber_count(), 0);
  }
}
