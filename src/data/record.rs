//! Persisted measurement records.

use chrono::{DateTime, Utc};

/// A measurement as persisted by the store.
///
/// Immutable once written except for deletion by id; queried newest
/// first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementRecord {
    /// Store-assigned row id.
    pub id: i64,
    /// Owning user id.
    pub user_id: i64,
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// Derived body-mass index (0.0 when height was unknown).
    pub bmi: f64,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
}
