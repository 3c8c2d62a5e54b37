use std::sync::Arc;

use super::merge::{FanIn, InnerSubscriber};
use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

/// Maps every upstream value to a publisher and merges their output.
///
/// At most `max_publishers` inner publishers are subscribed at once: the
/// upstream is asked for that many values up front, and for one more each
/// time an inner publisher finishes.
#[derive(Clone)]
pub struct FlatMap<P, F> {
  pub(crate) source: P,
  pub(crate) func: F,
  pub(crate) max_publishers: Demand,
}

impl<P, F, Q> Publisher for FlatMap<P, F>
where
  P: Publisher,
  F: FnMut(P::Output) -> Q + Send + 'static,
  Q: Publisher<Failure = P::Failure>,
{
  type Output = Q::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<Q::Output, P::Failure>>(self, subscriber: S) {
    let fan = FanIn::new(subscriber);
    fan.start();
    self.source.subscribe(OuterSubscriber {
      fan,
      func: self.func,
      max_publishers: self.max_publishers,
    });
  }
}

pub struct OuterSubscriber<S, F, Item, Err> {
  fan: Arc<FanIn<S, Item, Err>>,
  func: F,
  max_publishers: Demand,
}

impl<In, Item, Err, S, F, Q> Subscriber<In, Err> for OuterSubscriber<S, F, Item, Err>
where
  S: Subscriber<Item, Err>,
  Item: Send + 'static,
  Err: Send + 'static,
  F: FnMut(In) -> Q + Send + 'static,
  Q: Publisher<Output = Item, Failure = Err>,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.fan.attach_outer(subscription, self.max_publishers)
  }

  fn receive(&mut self, input: In) -> Demand {
    let Some(id) = self.fan.reserve() else {
      return Demand::NONE;
    };
    tracing::debug!(inner = id, "subscribing inner publisher");
    (self.func)(input).subscribe(InnerSubscriber::new(self.fan.clone(), id));
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    match completion {
      Completion::Finished => self.fan.seal(),
      Completion::Failure(error) => self.fan.fail(error),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn flattens_inner_publishers() {
    let (probe, handle) = Probe::unlimited();
    from_iter(1..=3)
      .flat_map(Demand::Unlimited, |n| from_iter(0..n))
      .subscribe(probe);
    assert_eq!(handle.values(), vec![0, 0, 1, 0, 1, 2]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn inner_lifecycle_is_traced() {
    use std::sync::{Arc, Mutex};

    struct Messages(Arc<Mutex<Vec<String>>>);

    struct Message<'a>(&'a mut String);

    impl tracing::field::Visit for Message<'_> {
      fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
          *self.0 = format!("{value:?}");
        }
      }
    }

    impl tracing::Subscriber for Messages {
      fn enabled(&self, _: &tracing::Metadata<'_>) -> bool { true }
      fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        tracing::span::Id::from_u64(1)
      }
      fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
      fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
      fn event(&self, event: &tracing::Event<'_>) {
        let mut message = String::new();
        event.record(&mut Message(&mut message));
        self.0.lock().unwrap().push(message);
      }
      fn enter(&self, _: &tracing::span::Id) {}
      fn exit(&self, _: &tracing::span::Id) {}
    }

    let messages = Arc::new(Mutex::new(vec![]));
    let (probe, handle) = Probe::unlimited();
    tracing::subscriber::with_default(Messages(messages.clone()), || {
      from_iter(1..=2)
        .flat_map(Demand::Unlimited, |n| from_iter(0..n))
        .subscribe(probe);
    });

    assert_eq!(handle.values(), vec![0, 0, 1]);
    let lifecycle: Vec<_> = messages
      .lock()
      .unwrap()
      .iter()
      .filter(|m| m.contains("inner publisher"))
      .cloned()
      .collect();
    assert_eq!(
      lifecycle,
      vec![
        "subscribing inner publisher",
        "inner publisher finished",
        "subscribing inner publisher",
        "inner publisher finished",
      ]
    );
  }

  #[rxcombine_macro::test]
  fn limits_concurrent_inners() {
    let inners: Vec<PassthroughSubject<i32, Never>> =
      (0..3).map(|_| PassthroughSubject::new()).collect();
    let pool = inners.clone();
    let (probe, handle) = Probe::unlimited();
    from_iter(0..3usize).flat_map(2, move |i| pool[i].clone()).subscribe(probe);

    let counts = || inners.iter().map(|s| s.subscriber_count()).collect::<Vec<_>>();
    assert_eq!(counts(), vec![1, 1, 0]);

    inners[0].send(10);
    inners[0].send_completion(Completion::Finished);
    assert_eq!(counts(), vec![0, 1, 1]);

    inners[2].send(30);
    inners[1].send_completion(Completion::Finished);
    assert!(!handle.is_terminated());
    inners[2].send_completion(Completion::Finished);

    assert_eq!(handle.values(), vec![10, 30]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[rxcombine_macro::test]
  fn inner_failure_ends_everything() {
    let outer = PassthroughSubject::<i32, i32>::new();
    let (probe, handle) = Probe::unlimited();
    outer
      .clone()
      .flat_map(Demand::Unlimited, |n| {
        if n < 0 {
          fail::<i32, i32>(n).erase()
        } else {
          just(n).set_failure_type::<i32>().erase()
        }
      })
      .subscribe(probe);

    outer.send(1);
    outer.send(-1);
    assert_eq!(outer.subscriber_count(), 0);
    outer.send(2);
    assert_eq!(handle.values(), vec![1]);
    assert_eq!(handle.completion(), Some(Completion::Failure(-1)));
  }
}
