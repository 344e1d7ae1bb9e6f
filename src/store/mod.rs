//! Measurement persistence.
//!
//! The ingestion pipeline depends only on the [`PersistenceGateway`]
//! contract; [`SqliteStore`] is the bundled implementation.

pub mod export;
pub mod sqlite;

pub use export::export_csv;
pub use sqlite::SqliteStore;

use crate::data::{MeasurementRecord, StoredProfile, UserProfile};
use crate::error::Result;

/// Append-only record store consumed by the ingestion pipeline.
///
/// Each operation succeeds or fails atomically per call; a failed write
/// means the in-flight measurement is not recorded.
pub trait PersistenceGateway: Send + Sync {
    /// Append a measurement. The store assigns the id and timestamp.
    fn insert_measurement(
        &self,
        user_id: i64,
        weight_kg: f64,
        bmi: f64,
    ) -> Result<MeasurementRecord>;

    /// The `limit` most recent measurements for a user, newest first.
    fn recent_measurements(&self, user_id: i64, limit: usize) -> Result<Vec<MeasurementRecord>>;

    /// Delete a measurement by id.
    fn delete_measurement(&self, id: i64) -> Result<()>;

    /// Read the stored user profile, if one has been saved.
    fn profile(&self) -> Result<Option<StoredProfile>>;

    /// Create or replace the user profile, returning its user id.
    fn save_profile(&self, profile: &UserProfile) -> Result<i64>;
}
