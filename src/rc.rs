use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Shared, mutable state behind an `Arc<Mutex<T>>`.
///
/// Every stage of a pipeline may be driven from a scheduler thread, so all
/// shared state lives behind this pointer. Poisoned locks are recovered: a
/// panicking subscriber must not wedge the rest of the pipeline.
pub struct MutArc<T>(Arc<Mutex<T>>);

/// Non-owning counterpart of [`MutArc`].
pub struct WeakArc<T>(Weak<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn rc_deref_mut(&self) -> MutexGuard<'_, T> { lock(&self.0) }

  #[inline]
  pub fn downgrade(&self) -> WeakArc<T> { WeakArc(Arc::downgrade(&self.0)) }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> WeakArc<T> {
  #[inline]
  pub fn upgrade(&self) -> Option<MutArc<T>> { self.0.upgrade().map(MutArc) }
}

impl<T: Default> Default for MutArc<T> {
  fn default() -> Self { Self::own(T::default()) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for WeakArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

/// Lock a mutex, recovering the guard if another holder panicked.
#[inline]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxcombine_macro::test]
  fn clones_share_state() {
    let a = MutArc::own(1);
    let b = a.clone();
    *b.rc_deref_mut() += 1;
    assert_eq!(*a.rc_deref_mut(), 2);
    assert!(a.ptr_eq(&b));
  }

  #[rxcombine_macro::test]
  fn weak_does_not_keep_alive() {
    let a = MutArc::own(vec![1]);
    let weak = a.downgrade();
    assert!(weak.upgrade().is_some());
    drop(a);
    assert!(weak.upgrade().is_none());
  }

  #[rxcombine_macro::test]
  fn poisoned_lock_is_recovered() {
    let a = MutArc::own(0);
    let b = a.clone();
    let _ = std::thread::spawn(move || {
      let _guard = b.rc_deref_mut();
      panic!("poison");
    })
    .join();
    *a.rc_deref_mut() = 7;
    assert_eq!(*a.rc_deref_mut(), 7);
  }
}
