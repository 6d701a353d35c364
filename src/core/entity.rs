//! Entity identification.
//!
//! The bus and dispatcher never own entities. Events and telegrams refer to
//! them by `EntityId` only, so an entity can be removed from the world while
//! telegrams addressed to it are still queued; those are simply dropped at
//! delivery time.
//!
//! ```
//! use rust_gamebus::core::EntityId;
//!
//! let guard = EntityId::new(7);
//! assert_eq!(guard.raw(), 7);
//! assert_eq!(format!("{}", guard), "Entity(7)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for any simulation entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
