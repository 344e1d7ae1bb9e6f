//! BLE Service and Characteristic UUIDs.
//!
//! Contains the UUID constants for the two GATT service variants a
//! supported scale may expose, in negotiation priority order.

use uuid::Uuid;

// Weight Scale Service (Standard BLE, primary)
/// Standard BLE Weight Scale Service UUID (0x181D).
pub const WEIGHT_SCALE_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_181d_0000_1000_8000_00805f9b34fb);
/// Weight Measurement characteristic UUID (0x2A9D, Notify).
pub const WEIGHT_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a9d_0000_1000_8000_00805f9b34fb);

// Body Composition Service (Standard BLE, fallback)
/// Standard BLE Body Composition Service UUID (0x181B).
pub const BODY_COMPOSITION_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_181b_0000_1000_8000_00805f9b34fb);
/// Body Composition Measurement characteristic UUID (0x2A9C, Notify).
pub const BODY_COMPOSITION_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a9c_0000_1000_8000_00805f9b34fb);

/// A GATT service and its paired measurement characteristic.
///
/// The two supported pairs are mutually exclusive alternatives; a
/// negotiation binds to exactly one of them, never a mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServicePair {
    /// The service UUID.
    pub service: Uuid,
    /// The measurement characteristic within that service.
    pub characteristic: Uuid,
}

/// Candidate pairs in fixed priority order: Weight Scale first, Body
/// Composition second. The order is not configurable.
pub const SERVICE_CANDIDATES: [ServicePair; 2] = [
    ServicePair {
        service: WEIGHT_SCALE_SERVICE_UUID,
        characteristic: WEIGHT_MEASUREMENT_UUID,
    },
    ServicePair {
        service: BODY_COMPOSITION_SERVICE_UUID,
        characteristic: BODY_COMPOSITION_MEASUREMENT_UUID,
    },
];

/// Check if a service UUID belongs to a supported scale service.
pub fn is_scale_service(uuid: &Uuid) -> bool {
    *uuid == WEIGHT_SCALE_SERVICE_UUID || *uuid == BODY_COMPOSITION_SERVICE_UUID
}
