//! Retry operator implementation
//!
//! `retry` re-subscribes to its source when it fails, as long as the retry
//! policy allows. The subscriber keeps one subscription across attempts and
//! the demand it has not been served yet is requested again from each new
//! attempt. Values delivered before a failure are not replayed.
//!
//! # Examples
//!
//! Simple retry with count:
//!
//! ```rust
//! use std::sync::{
//!   atomic::{AtomicUsize, Ordering},
//!   Arc,
//! };
//!
//! use rxcombine::prelude::*;
//!
//! let attempts = Arc::new(AtomicUsize::new(0));
//! let a = attempts.clone();
//! let flaky = deferred(move || {
//!   let n = a.fetch_add(1, Ordering::SeqCst);
//!   Promise::new(move |r: Resolver<usize, &str>| {
//!     r.resolve(if n < 2 { Err("not yet") } else { Ok(n) })
//!   })
//! });
//!
//! let (probe, handle) = Probe::unlimited();
//! flaky.retry(3).subscribe(probe);
//! assert_eq!(handle.values(), vec![2]);
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! ```
//!
//! Custom retry policy based on the error:
//!
//! ```rust
//! use rxcombine::{ops::retry::RetryPolicy, prelude::*};
//!
//! #[derive(Clone)]
//! struct HttpRetryPolicy {
//!   max_retries: usize,
//! }
//!
//! impl RetryPolicy<u16> for HttpRetryPolicy {
//!   fn should_retry(&self, status: &u16, attempt: usize) -> bool {
//!     attempt < self.max_retries && matches!(status, 429 | 500..=599)
//!   }
//! }
//!
//! let (probe, handle) = Probe::<(), u16>::unlimited();
//! fail(404u16).retry(HttpRetryPolicy { max_retries: 3 }).subscribe(probe);
//! assert_eq!(handle.completion(), Some(Completion::Failure(404)));
//! ```

use std::sync::{Arc, Mutex};

use super::relay::Relay;
use crate::{
  demand::Demand,
  publisher::Publisher,
  rc::lock,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

/// Policy for determining whether to retry an error.
///
/// Implemented for `usize` (a plain retry count) and [`RetryConfig`].
pub trait RetryPolicy<Err>: Clone {
  /// Whether to re-subscribe after `err`.
  ///
  /// `attempt` is the number of retries already made: 0 on the first
  /// failure.
  fn should_retry(&self, err: &Err, attempt: usize) -> bool;

  /// Whether a successfully delivered value resets the attempt counter.
  ///
  /// Useful for long-lived connections, where a value proves the connection
  /// healthy again.
  fn reset_on_success(&self) -> bool { false }
}

impl<Err> RetryPolicy<Err> for usize {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool { attempt < *self }
}

/// A configuration struct for Retry.
///
/// ```rust
/// use rxcombine::ops::retry::RetryConfig;
///
/// let config = RetryConfig::new().count(5).reset_on_success();
/// ```
#[derive(Clone, Debug, Default)]
pub struct RetryConfig {
  count: Option<usize>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Creates a configuration that retries forever.
  pub fn new() -> Self { Self::default() }

  /// Sets the maximum number of retry attempts.
  ///
  /// `count(3)` allows for 3 retries, so at most 4 subscriptions in total.
  pub fn count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  /// Resets the retry count whenever a value is delivered.
  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }
}

impl<Err> RetryPolicy<Err> for RetryConfig {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool {
    self.count.map_or(true, |count| attempt < count)
  }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

#[derive(Clone)]
pub struct Retry<P, Pol> {
  pub(crate) source: P,
  pub(crate) policy: Pol,
}

impl<P, Pol> Publisher for Retry<P, Pol>
where
  P: Publisher + Clone + Send + 'static,
  Pol: RetryPolicy<P::Failure> + Send + 'static,
{
  type Output = P::Output;
  type Failure = P::Failure;

  fn subscribe<S: Subscriber<P::Output, P::Failure>>(self, subscriber: S) {
    let relay = Arc::new(Relay::new(subscriber));
    relay.start::<P::Output, P::Failure>();
    let driver = Arc::new(RetryDriver {
      source: Mutex::new(self.source),
      relay,
      pending: Mutex::new(Pending::default()),
    });
    driver.launch(self.policy, 0);
  }
}

struct Pending<Pol> {
  next: Option<(Pol, usize)>,
  running: bool,
}

impl<Pol> Default for Pending<Pol> {
  fn default() -> Self { Pending { next: None, running: false } }
}

/// Subscribes attempts one after another. A source that fails inside
/// `subscribe` only queues the next attempt; the outermost `launch` call
/// runs it, so synchronous failures never nest.
struct RetryDriver<P, Pol, S> {
  source: Mutex<P>,
  relay: Arc<Relay<S>>,
  pending: Mutex<Pending<Pol>>,
}

impl<P, Pol, S> RetryDriver<P, Pol, S>
where
  P: Publisher + Clone + Send + 'static,
  Pol: RetryPolicy<P::Failure> + Send + 'static,
  S: Subscriber<P::Output, P::Failure>,
{
  fn launch(self: &Arc<Self>, policy: Pol, attempt: usize) {
    {
      let mut pending = lock(&self.pending);
      pending.next = Some((policy, attempt));
      if pending.running {
        return;
      }
      pending.running = true;
    }
    loop {
      let (policy, attempt) = {
        let mut pending = lock(&self.pending);
        match pending.next.take() {
          Some(next) => next,
          None => {
            pending.running = false;
            return;
          }
        }
      };
      let source = lock(&self.source).clone();
      source.subscribe(RetrySubscriber { driver: self.clone(), policy, attempt });
    }
  }
}

pub struct RetrySubscriber<P, Pol, S> {
  driver: Arc<RetryDriver<P, Pol, S>>,
  policy: Pol,
  attempt: usize,
}

impl<P, Pol, S> Subscriber<P::Output, P::Failure> for RetrySubscriber<P, Pol, S>
where
  P: Publisher + Clone + Send + 'static,
  Pol: RetryPolicy<P::Failure> + Send + 'static,
  S: Subscriber<P::Output, P::Failure>,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.driver.relay.attach(subscription)
  }

  fn receive(&mut self, input: P::Output) -> Demand {
    if self.policy.reset_on_success() {
      self.attempt = 0;
    }
    self.driver.relay.deliver::<P::Output, P::Failure>(input)
  }

  fn receive_completion(&mut self, completion: Completion<P::Failure>) {
    let relay = &self.driver.relay;
    let error = match completion {
      Completion::Failure(error) => error,
      Completion::Finished => {
        return relay.complete::<P::Output, P::Failure>(Completion::Finished);
      }
    };
    if !self.policy.should_retry(&error, self.attempt) {
      return relay.complete::<P::Output, P::Failure>(Completion::Failure(error));
    }
    if !relay.detach() {
      return;
    }
    let attempt = self.attempt + 1;
    tracing::debug!(attempt, "source failed, re-subscribing");
    self.driver.launch(self.policy.clone(), attempt);
  }
}
