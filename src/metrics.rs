//! Body-mass-index derivation and classification.
//!
//! Pure synchronous computations invoked from within the notification
//! continuation; nothing here suspends.

use crate::utils::round_tenths;

/// Compute body-mass index from weight and height.
///
/// Returns `0.0` as an "unknown" sentinel when either input is absent or
/// non-positive; this is not an error. Otherwise
/// `weight_kg / (height_cm / 100)^2`, rounded to one decimal place.
///
/// # Example
///
/// ```
/// use bodyscale_ble::bmi;
///
/// assert_eq!(bmi(70.0, 175.0), 22.9);
/// assert_eq!(bmi(0.0, 175.0), 0.0);
/// assert_eq!(bmi(70.0, 0.0), 0.0);
/// ```
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return 0.0;
    }

    let height_m = height_cm / 100.0;
    round_tenths(weight_kg / (height_m * height_m))
}

/// Health category for a BMI value.
///
/// Thresholds are fixed boundaries, lower-inclusive on the upper cutoff:
/// a BMI of exactly 25.0 is `Overweight`, not `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BmiCategory {
    /// BMI below 18.5.
    Underweight,
    /// BMI in [18.5, 25).
    Normal,
    /// BMI in [25, 30).
    Overweight,
    /// BMI of 30 or above.
    Obese,
}

impl BmiCategory {
    /// Classify a BMI value.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }

    /// Color tag for presentation layers.
    pub fn color_tag(&self) -> &'static str {
        match self {
            Self::Underweight => "blue",
            Self::Normal => "green",
            Self::Overweight => "orange",
            Self::Obese => "red",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
