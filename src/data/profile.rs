//! User profile data.

/// Profile of the person being weighed.
///
/// Height is required for BMI computation; without a positive height the
/// metric is a sentinel zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserProfile {
    /// Display name.
    pub name: String,
    /// Height in centimeters.
    pub height_cm: u16,
    /// Optional target weight in kilograms.
    pub target_weight_kg: Option<f64>,
}

impl UserProfile {
    /// Create a profile without a target weight.
    pub fn new(name: impl Into<String>, height_cm: u16) -> Self {
        Self {
            name: name.into(),
            height_cm,
            target_weight_kg: None,
        }
    }

    /// Set the target weight.
    pub fn with_target(mut self, target_weight_kg: f64) -> Self {
        self.target_weight_kg = Some(target_weight_kg);
        self
    }
}

/// A profile as persisted, with its store-assigned user id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredProfile {
    /// Store-assigned user id.
    pub id: i64,
    /// The profile itself.
    pub profile: UserProfile,
}
