//! Data structures for scale measurements and users.

pub mod measurement;
pub mod profile;
pub mod record;

pub use measurement::{Measurement, WeightUnit};
pub use profile::{StoredProfile, UserProfile};
pub use record::MeasurementRecord;
