//! Status enums for orders.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a captured order.
///
/// Orders are immutable once persisted, so every record read back from
/// storage is `Confirmed`. The enum exists so the confirmation and history
/// views have a typed value to render and so stored documents carry an
/// explicit status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Confirmed,
}

impl OrderStatus {
    /// Label shown next to the order.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
        }
    }
}
