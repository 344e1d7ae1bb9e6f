//! Decoded weight measurements.

use crate::utils::kilograms_to_pounds;

/// Unit flagged in the measurement frame.
///
/// Reflects a flag bit in the frame, not an independent measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightUnit {
    /// Kilograms.
    #[default]
    Kilograms,
    /// Pounds.
    Pounds,
}

impl WeightUnit {
    /// Short display suffix ("kg" or "lbs").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kilograms => "kg",
            Self::Pounds => "lbs",
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded weight measurement.
///
/// Produced per accepted frame and consumed immediately; the pipeline
/// retains nothing beyond the persistence handoff.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    /// Weight value; always positive for a decoded measurement.
    pub weight_kg: f64,
    /// Unit flag from the frame.
    pub unit: WeightUnit,
    /// Whether the reading is stable. The supported wire protocol
    /// carries no stability bit, so this is always `true`.
    pub stable: bool,
}

impl Measurement {
    /// Weight converted to pounds for display.
    pub fn weight_lbs(&self) -> f64 {
        kilograms_to_pounds(self.weight_kg)
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.weight_kg, self.unit)
    }
}
