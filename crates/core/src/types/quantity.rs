//! Line-item quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Number of units of one product in the cart.
///
/// A cart line never holds zero units: decrementing the last unit yields
/// `None`, which callers treat as "remove the line". Deserializing `0` fails,
/// so a persisted cart with an empty line is rejected as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, returning `None` for zero.
    #[must_use]
    pub const fn new(count: u32) -> Option<Self> {
        match NonZeroU32::new(count) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Get the unit count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// One more unit. Saturates at `u32::MAX`.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One fewer unit, or `None` when this was the last one.
    #[must_use]
    pub const fn decrement(self) -> Option<Self> {
        Self::new(self.0.get() - 1)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}
