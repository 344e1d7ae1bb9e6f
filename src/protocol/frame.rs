//! Weight measurement frame decoding.
//!
//! Decodes the vendor binary frame delivered by one notification event:
//!
//! | Offset | Size | Meaning |
//! |--------|------|---------|
//! | 0      | 1    | flags; bit 0 = units (0 = kg, 1 = lbs) |
//! | 1-2    | 2    | raw weight, unsigned 16-bit little-endian |
//!
//! Decoding is a pure function. Malformed frames decode to `None` and
//! are never an error.

use crate::data::{Measurement, WeightUnit};
use crate::utils::round_hundredths;

/// Minimum frame length: flag byte plus the 16-bit raw weight.
pub const MIN_FRAME_LEN: usize = 3;

/// Flag bit 0: raw weight is pound-flagged rather than kilograms.
pub const FLAG_UNIT_POUNDS: u8 = 0b0000_0001;

/// Flag bit 1: frame carries an appended timestamp field.
///
/// Not parsed further; for this device family the optional fields are
/// appended after the weight, so their presence does not move
/// [`WEIGHT_OFFSET`]. Other vendor variants may not share this layout.
pub const FLAG_TIMESTAMP_PRESENT: u8 = 0b0000_0010;

/// Flag bit 2: frame carries an appended user-identifier field.
///
/// Not parsed further; see [`FLAG_TIMESTAMP_PRESENT`] for the layout
/// assumption.
pub const FLAG_USER_ID_PRESENT: u8 = 0b0000_0100;

/// Offset of the 16-bit little-endian raw weight field.
pub const WEIGHT_OFFSET: usize = 1;

/// Kilogram resolution of the raw weight field.
const KG_RESOLUTION: f64 = 0.005;

/// Pound-flagged resolution.
///
/// The device family scales pound-flagged values by 0.01 rather than a
/// pounds-correct conversion from the kilogram multiplier. Preserved as
/// observed; intended vendor semantics are unclear.
const LBS_RESOLUTION: f64 = 0.01;

/// Decode one notification frame into a measurement.
///
/// Returns `None` for frames shorter than [`MIN_FRAME_LEN`] and for a
/// zero raw weight (an empty-platform beacon, not a measurement).
/// Weight is rounded half-away-from-zero to two decimals.
///
/// The wire protocol carries no stability bit, so `stable` is `true`
/// for every decoded frame. A future variant with a genuine stability
/// flag extends the flag-byte parsing here.
///
/// # Example
///
/// ```
/// use bodyscale_ble::protocol::frame;
/// use bodyscale_ble::WeightUnit;
///
/// let m = frame::decode(&[0x00, 0x58, 0x02]).unwrap();
/// assert_eq!(m.weight_kg, 3.00);
/// assert_eq!(m.unit, WeightUnit::Kilograms);
/// ```
pub fn decode(frame: &[u8]) -> Option<Measurement> {
    if frame.len() < MIN_FRAME_LEN {
        return None;
    }

    let flags = frame[0];
    let raw = u16::from_le_bytes([frame[WEIGHT_OFFSET], frame[WEIGHT_OFFSET + 1]]);

    if raw == 0 {
        return None;
    }

    let (unit, resolution) = if flags & FLAG_UNIT_POUNDS != 0 {
        (WeightUnit::Pounds, LBS_RESOLUTION)
    } else {
        (WeightUnit::Kilograms, KG_RESOLUTION)
    };

    Some(Measurement {
        weight_kg: round_hundredths(raw as f64 * resolution),
        unit,
        stable: true,
    })
}
