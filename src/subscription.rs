//! Subscriptions and cancellation handles.
//!
//! A [`Subscription`] is the live link between one publisher and one
//! subscriber. The subscriber uses it to request more elements and to cancel.
//! Both operations are idempotent once the link is closed.

use std::sync::Arc;

use crate::{demand::Demand, rc::MutArc};

mod dynamic;
pub(crate) use dynamic::DynamicSubscriptions;

/// The subscriber's side of a publisher/subscriber link.
pub trait Subscription: Send + Sync {
  /// Add `demand` to the outstanding demand of this link.
  fn request(&self, demand: Demand);

  /// Stop all future delivery. No completion is sent.
  fn cancel(&self);
}

/// Shared handle to a subscription, as handed to subscribers.
pub type AnySubscription = Arc<dyn Subscription>;

/// A subscription that ignores every call.
///
/// Used by publishers that terminate before any demand matters, such as a
/// `take(0)` that still owes its subscriber a handshake.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl Subscription for EmptySubscription {
  #[inline]
  fn request(&self, _demand: Demand) {}

  #[inline]
  fn cancel(&self) {}
}

/// An [`AnySubscription`] that does nothing.
pub fn empty() -> AnySubscription { Arc::new(EmptySubscription) }

#[derive(Default)]
struct CancelSlot {
  subscription: Option<AnySubscription>,
  cancelled: bool,
  closed: bool,
}

/// Handle returned by sinks to cancel the pipeline they terminate.
///
/// Dropping a `Cancellable` leaves the pipeline running, exactly like
/// forgetting to unsubscribe. Call [`Cancellable::cancel_when_dropped`] to get
/// RAII behaviour instead.
///
/// The handle may exist before its subscription does (for example when the
/// subscribe step was handed to a scheduler); cancelling early cancels the
/// subscription as soon as it arrives.
#[derive(Clone, Default)]
pub struct Cancellable(MutArc<CancelSlot>);

impl Cancellable {
  /// Cancel the underlying subscription. Idempotent.
  pub fn cancel(&self) {
    let subscription = {
      let mut slot = self.0.rc_deref_mut();
      if slot.closed {
        return;
      }
      slot.cancelled = true;
      slot.closed = true;
      slot.subscription.take()
    };
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }

  /// Whether [`cancel`](Self::cancel) was called before the pipeline ended.
  pub fn is_cancelled(&self) -> bool { self.0.rc_deref_mut().cancelled }

  /// Whether the pipeline has ended, by cancellation or by a terminal event.
  pub fn is_closed(&self) -> bool { self.0.rc_deref_mut().closed }

  /// Activates "RAII" behavior: the subscription is cancelled as soon as the
  /// returned guard goes out of scope.
  ///
  /// **Attention:** If you don't bind the guard to a variable, the pipeline is
  /// cancelled immediately.
  pub fn cancel_when_dropped(self) -> CancelGuard { CancelGuard(Some(self)) }

  /// Bind the subscription. Returns `false` (and cancels `subscription`) if
  /// the handle was already cancelled.
  pub(crate) fn attach(&self, subscription: AnySubscription) -> bool {
    {
      let mut slot = self.0.rc_deref_mut();
      if !slot.closed {
        slot.subscription = Some(subscription);
        return true;
      }
    }
    subscription.cancel();
    false
  }

  /// Drop the subscription after a terminal event.
  pub(crate) fn release(&self) {
    let released = {
      let mut slot = self.0.rc_deref_mut();
      slot.closed = true;
      slot.subscription.take()
    };
    drop(released);
  }
}

/// Cancels its [`Cancellable`] when dropped.
#[must_use]
pub struct CancelGuard(Option<Cancellable>);

impl CancelGuard {
  /// Consumes the guard without cancelling.
  pub fn into_inner(mut self) -> Cancellable { self.0.take().unwrap_or_default() }
}

impl Drop for CancelGuard {
  #[inline]
  fn drop(&mut self) {
    if let Some(handle) = self.0.take() {
      handle.cancel();
    }
  }
}
