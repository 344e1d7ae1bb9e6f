//! Utility functions for the bodyscale-ble crate.

/// Pounds per kilogram.
const LBS_PER_KG: f64 = 2.20462;

/// Convert kilograms to pounds.
///
/// # Example
///
/// ```
/// use bodyscale_ble::kilograms_to_pounds;
///
/// let lbs = kilograms_to_pounds(100.0);
/// assert!((lbs - 220.462).abs() < 0.001);
/// ```
#[inline]
pub fn kilograms_to_pounds(kg: f64) -> f64 {
    kg * LBS_PER_KG
}

/// Convert pounds to kilograms.
///
/// # Example
///
/// ```
/// use bodyscale_ble::pounds_to_kilograms;
///
/// let kg = pounds_to_kilograms(220.462);
/// assert!((kg - 100.0).abs() < 0.001);
/// ```
#[inline]
pub fn pounds_to_kilograms(lbs: f64) -> f64 {
    lbs / LBS_PER_KG
}

/// Round to two decimal places, half away from zero.
#[inline]
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal place, half away from zero.
#[inline]
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_conversion_roundtrip() {
        let original = 72.5;
        let converted = pounds_to_kilograms(kilograms_to_pounds(original));
        assert!((converted - original).abs() < 0.0001);
    }

    #[test]
    fn test_round_hundredths() {
        assert_eq!(round_hundredths(2.375), 2.38);
        assert_eq!(round_hundredths(2.374), 2.37);
        assert_eq!(round_hundredths(3.0), 3.0);
        assert_eq!(round_hundredths(-2.375), -2.38);
    }

    #[test]
    fn test_round_tenths() {
        assert_eq!(round_tenths(22.857), 22.9);
        assert_eq!(round_tenths(0.734), 0.7);
        // 2.25 is exactly representable, so this exercises half-away-from-zero
        assert_eq!(round_tenths(2.25), 2.3);
    }
}
