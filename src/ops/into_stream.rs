//! Bridges a publisher into a `futures::Stream`.
//!
//! The stream is the subscriber: it requests one value each time it is
//! polled and finds nothing buffered, so an async consumer drives the
//! pipeline at its own pace.
//!
//! ```rust
//! use futures::{executor::block_on, StreamExt};
//! use rxcombine::prelude::*;
//!
//! let stream = from_iter(vec![1, 2, 3]).map(|v| v * 10).into_stream();
//! let values: Vec<_> = block_on(stream.collect());
//! assert_eq!(values, vec![Ok(10), Ok(20), Ok(30)]);
//! ```
//!
//! A failure is yielded as the last item, as `Err`.

use std::{
  collections::VecDeque,
  pin::Pin,
  sync::{Arc, Mutex},
  task::{Context, Poll, Waker},
};

use futures::stream::Stream;

use crate::{
  demand::Demand,
  publisher::Publisher,
  rc::lock,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

struct StreamState<Item, Err> {
  queue: VecDeque<Result<Item, Err>>,
  waker: Option<Waker>,
  upstream: Option<AnySubscription>,
  requested: bool,
  closed: bool,
}

impl<Item, Err> StreamState<Item, Err> {
  fn wake(&mut self) {
    if let Some(waker) = self.waker.take() {
      waker.wake();
    }
  }
}

/// A `Stream` of `Result<Output, Failure>` fed by a publisher.
///
/// Dropping the stream cancels the subscription.
pub struct IntoStream<Item, Err> {
  state: Arc<Mutex<StreamState<Item, Err>>>,
}

impl<Item: Send + 'static, Err: Send + 'static> IntoStream<Item, Err> {
  pub(crate) fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Output = Item, Failure = Err>,
  {
    let state = Arc::new(Mutex::new(StreamState {
      queue: VecDeque::new(),
      waker: None,
      upstream: None,
      requested: false,
      closed: false,
    }));
    publisher.subscribe(StreamSubscriber { state: state.clone() });
    IntoStream { state }
  }
}

impl<Item, Err> Stream for IntoStream<Item, Err> {
  type Item = Result<Item, Err>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let upstream = {
      let mut state = lock(&self.state);
      if let Some(item) = state.queue.pop_front() {
        return Poll::Ready(Some(item));
      }
      if state.closed {
        return Poll::Ready(None);
      }
      state.waker = Some(cx.waker().clone());
      if state.requested {
        return Poll::Pending;
      }
      match state.upstream.clone() {
        Some(upstream) => {
          state.requested = true;
          upstream
        }
        None => return Poll::Pending,
      }
    };
    upstream.request(Demand::max(1));

    // A synchronous source answers inside `request`.
    let mut state = lock(&self.state);
    match state.queue.pop_front() {
      Some(item) => Poll::Ready(Some(item)),
      None if state.closed => Poll::Ready(None),
      None => Poll::Pending,
    }
  }
}

impl<Item, Err> Drop for IntoStream<Item, Err> {
  fn drop(&mut self) {
    let upstream = {
      let mut state = lock(&self.state);
      state.closed = true;
      state.queue.clear();
      state.upstream.take()
    };
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}

struct StreamSubscriber<Item, Err> {
  state: Arc<Mutex<StreamState<Item, Err>>>,
}

impl<Item, Err> Subscriber<Item, Err> for StreamSubscriber<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    let mut state = lock(&self.state);
    if state.closed {
      drop(state);
      return subscription.cancel();
    }
    state.upstream = Some(subscription);
    state.wake();
  }

  fn receive(&mut self, input: Item) -> Demand {
    let mut state = lock(&self.state);
    state.requested = false;
    state.queue.push_back(Ok(input));
    state.wake();
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    let mut state = lock(&self.state);
    if let Completion::Failure(error) = completion {
      state.queue.push_back(Err(error));
    }
    state.closed = true;
    state.upstream = None;
    state.wake();
  }
}
