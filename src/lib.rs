// Allow holding locks across await points - we use parking_lot which is designed for this
#![allow(clippy::await_holding_lock)]
// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # bodyscale-ble
//!
//! A cross-platform Rust library for ingesting weight measurements from
//! Bluetooth Low Energy body-composition scales.
//!
//! The library covers the full weigh-in pipeline: scale discovery, GATT
//! service negotiation (standard Weight Scale service with a Body
//! Composition fallback), vendor frame decoding, BMI derivation, and
//! persistence of accepted measurements.
//!
//! ## Features
//!
//! - **Scale Discovery**: Find scales advertising either supported service
//! - **Service Fallback**: Weight Scale (0x181D) first, Body Composition (0x181B) second
//! - **Frame Decoding**: Vendor binary frames to weight values in kg or lbs
//! - **BMI Metrics**: BMI computation and health-category classification
//! - **Local History**: SQLite-backed measurement store with CSV export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bodyscale_ble::{
//!     FirstDiscovered, PersistenceGateway, Result, ScaleManager, SqliteStore, UserProfile,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = Arc::new(SqliteStore::open("weights.db")?);
//!     store.save_profile(&UserProfile::new("Alex", 180))?;
//!
//!     let manager = ScaleManager::new(store).await?;
//!
//!     // Step on the scale; the first accepted measurement is persisted.
//!     let record = manager.weigh_once(&FirstDiscovered).await?;
//!     println!("{:.1} kg, BMI {:.1}", record.weight_kg, record.bmi);
//!
//!     Ok(())
//! }
//! ```
//!
//! There is no timeout built into negotiation: an unresponsive scale keeps
//! the caller suspended. Wrap `weigh_once` in `tokio::time::timeout` to
//! impose a deadline over the whole locate/negotiate/subscribe sequence.
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod data;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod protocol;
pub mod store;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};
pub use manager::{run_weigh_session, ScaleManager};
pub use metrics::{bmi, BmiCategory};
pub use utils::{kilograms_to_pounds, pounds_to_kilograms};

// Re-export commonly used types from submodules
pub use ble::locator::{
    ChooserVerdict, DeviceChooser, DeviceLocator, FirstDiscovered, ScaleAdvertisement, ScaleDevice,
};
pub use ble::negotiator::{ConnectionNegotiator, ConnectionSession, NegotiationState};
pub use ble::subscription::{subscribe, Teardown};
pub use ble::transport::{PeripheralTransport, ScaleTransport};
pub use data::{Measurement, MeasurementRecord, StoredProfile, UserProfile, WeightUnit};
pub use store::{export_csv, PersistenceGateway, SqliteStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<ScaleManager>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<Measurement>();
        let _ = std::any::TypeId::of::<MeasurementRecord>();
        let _ = std::any::TypeId::of::<UserProfile>();
        let _ = std::any::TypeId::of::<BmiCategory>();
        let _ = std::any::TypeId::of::<SqliteStore>();
    }

    #[test]
    fn test_weight_conversion() {
        assert!((kilograms_to_pounds(100.0) - 220.462).abs() < 0.001);
        assert!((pounds_to_kilograms(220.462) - 100.0).abs() < 0.001);
    }
}
