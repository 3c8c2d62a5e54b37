//! Subscriber trait and the built-in subscribers.
//!
//! A subscriber receives, in order: exactly one subscription, zero or more
//! values (never more than it demanded), and at most one [`Completion`].

use crate::{demand::Demand, subscription::AnySubscription};

mod probe;
mod sink;

pub use probe::{Probe, ProbeHandle};
pub use sink::{Assign, Sink};

/// The terminal event of a stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Completion<E> {
  /// The stream ended normally.
  Finished,
  /// The stream ended with an error.
  Failure(E),
}

impl<E> Completion<E> {
  #[inline]
  pub fn is_finished(&self) -> bool { matches!(self, Completion::Finished) }

  #[inline]
  pub fn failure(&self) -> Option<&E> {
    match self {
      Completion::Finished => None,
      Completion::Failure(e) => Some(e),
    }
  }

  /// Translate the failure, keeping `Finished` as is.
  pub fn map_failure<F>(self, f: impl FnOnce(E) -> F) -> Completion<F> {
    match self {
      Completion::Finished => Completion::Finished,
      Completion::Failure(e) => Completion::Failure(f(e)),
    }
  }

  pub fn into_result(self) -> Result<(), E> {
    match self {
      Completion::Finished => Ok(()),
      Completion::Failure(e) => Err(e),
    }
  }
}

impl<E> From<Result<(), E>> for Completion<E> {
  fn from(result: Result<(), E>) -> Self {
    match result {
      Ok(()) => Completion::Finished,
      Err(e) => Completion::Failure(e),
    }
  }
}

/// Subscriber trait: the consumer side of a stream.
///
/// The publisher calls [`receive_subscription`](Self::receive_subscription)
/// exactly once, before anything else. The subscriber then requests demand
/// through the subscription. Each [`receive`](Self::receive) returns an extra
/// demand which the publisher adds to the outstanding demand; return
/// [`Demand::NONE`] to leave it unchanged.
///
/// Subscribers may be driven from scheduler threads, so they must be `Send`.
pub trait Subscriber<Input, Failure>: Send + 'static {
  fn receive_subscription(&mut self, subscription: AnySubscription);

  fn receive(&mut self, input: Input) -> Demand;

  fn receive_completion(&mut self, completion: Completion<Failure>);
}

/// A type-erased subscriber.
pub type BoxedSubscriber<Input, Failure> = Box<dyn Subscriber<Input, Failure>>;

impl<Input: 'static, Failure: 'static> Subscriber<Input, Failure>
  for Box<dyn Subscriber<Input, Failure>>
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    (**self).receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: Input) -> Demand { (**self).receive(input) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Failure>) {
    (**self).receive_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn completion_helpers() {
    let done: Completion<&str> = Completion::Finished;
    assert!(done.is_finished());
    assert_eq!(done.failure(), None);

    let failed = Completion::Failure("boom");
    assert_eq!(failed.failure(), Some(&"boom"));
    assert_eq!(failed.clone().map_failure(str::len), Completion::Failure(4));
    assert_eq!(failed.into_result(), Err("boom"));
    assert_eq!(Completion::<()>::from(Ok(())), Completion::Finished);
  }
}
