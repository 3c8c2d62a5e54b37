//! Demand: the subscriber-controlled backpressure signal.
//!
//! A subscriber tells its publisher how many more elements it is willing to
//! accept. Demands accumulate: requesting more adds to what is outstanding
//! and never resets it. [`Demand::Unlimited`] absorbs every addition and
//! every subtraction.

use std::{
  fmt::{Display, Formatter},
  ops::{Add, AddAssign, Sub, SubAssign},
};

/// How many elements a subscriber is willing to receive.
///
/// `Max(n)` orders by `n`; `Unlimited` is greater than any `Max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Demand {
  /// At most this many elements.
  Max(usize),
  /// No limit.
  Unlimited,
}

impl Demand {
  /// No elements.
  pub const NONE: Demand = Demand::Max(0);
  pub const UNLIMITED: Demand = Demand::Unlimited;

  #[inline]
  pub const fn max(n: usize) -> Self { Demand::Max(n) }

  #[inline]
  pub const fn none() -> Self { Demand::NONE }

  #[inline]
  pub const fn unlimited() -> Self { Demand::Unlimited }

  #[inline]
  pub fn is_none(&self) -> bool { matches!(self, Demand::Max(0)) }

  #[inline]
  pub fn is_unlimited(&self) -> bool { matches!(self, Demand::Unlimited) }

  /// The bounded count, or `None` when unlimited.
  #[inline]
  pub fn as_max(&self) -> Option<usize> {
    match self {
      Demand::Max(n) => Some(*n),
      Demand::Unlimited => None,
    }
  }

  /// Whether `count` more elements fit into this demand.
  #[inline]
  pub fn covers(&self, count: usize) -> bool {
    match self {
      Demand::Max(n) => count <= *n,
      Demand::Unlimited => true,
    }
  }
}

impl Default for Demand {
  fn default() -> Self { Demand::NONE }
}

impl From<usize> for Demand {
  fn from(n: usize) -> Self { Demand::Max(n) }
}

impl Add for Demand {
  type Output = Demand;

  fn add(self, rhs: Demand) -> Demand {
    match (self, rhs) {
      (Demand::Max(a), Demand::Max(b)) => Demand::Max(a.saturating_add(b)),
      _ => Demand::Unlimited,
    }
  }
}

impl Add<usize> for Demand {
  type Output = Demand;

  fn add(self, rhs: usize) -> Demand { self + Demand::Max(rhs) }
}

impl AddAssign for Demand {
  fn add_assign(&mut self, rhs: Demand) { *self = *self + rhs; }
}

impl AddAssign<usize> for Demand {
  fn add_assign(&mut self, rhs: usize) { *self = *self + rhs; }
}

impl Sub<usize> for Demand {
  type Output = Demand;

  fn sub(self, rhs: usize) -> Demand {
    match self {
      Demand::Max(n) => Demand::Max(n.saturating_sub(rhs)),
      Demand::Unlimited => Demand::Unlimited,
    }
  }
}

impl SubAssign<usize> for Demand {
  fn sub_assign(&mut self, rhs: usize) { *self = *self - rhs; }
}

impl Display for Demand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Demand::Max(n) => write!(f, "max({n})"),
      Demand::Unlimited => f.write_str("unlimited"),
    }
  }
}
