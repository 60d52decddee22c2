//! Human-facing order numbers.
//!
//! Order numbers look like `ORD-1718035200123-9f2c4a1e`: the checkout's wall
//! clock in unix milliseconds followed by eight hex digits of a random v4 UUID.
//! The timestamp keeps them roughly sortable for support staff; the random
//! suffix keeps two checkouts in the same millisecond from colliding.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique, human-readable order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Prefix shared by every generated order number.
    pub const PREFIX: &'static str = "ORD-";

    /// Generate a fresh order number for a checkout happening at `at`.
    #[must_use]
    pub fn generate(at: DateTime<Utc>) -> Self {
        let entropy = Uuid::new_v4().simple().to_string();
        let suffix = entropy.get(..8).unwrap_or(&entropy);
        Self(format!("{}{}-{suffix}", Self::PREFIX, at.timestamp_millis()))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
