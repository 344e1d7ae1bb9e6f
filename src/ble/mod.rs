//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy functionality for
//! discovering scales, negotiating a measurement characteristic, and
//! managing the notification subscription lifecycle.

pub mod locator;
pub mod negotiator;
pub mod subscription;
pub mod transport;
pub mod uuids;

pub use locator::{DeviceChooser, DeviceLocator, ScaleAdvertisement, ScaleDevice};
pub use negotiator::{ConnectionNegotiator, ConnectionSession, NegotiationState};
pub use subscription::{subscribe, Teardown};
pub use transport::{PeripheralTransport, ScaleTransport};
pub use uuids::*;
