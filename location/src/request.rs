use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Trade-off between precision and power for a location request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Most accurate fix available, typically GPS.
    #[default]
    HighAccuracy,
    /// Block-level accuracy.
    BalancedPowerAccuracy,
    /// City-level accuracy.
    LowPower,
    /// Only fixes other applications already requested.
    Passive,
}

/// Parameters of a location request.
///
/// Serializable so platform bridges can receive it as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRequest {
    /// Accuracy priority.
    pub priority: Priority,
    /// Desired interval between updates.
    #[serde(with = "millis")]
    pub interval: Duration,
    /// Number of updates after which the request ends, if bounded.
    pub max_updates: Option<u32>,
}

impl LocationRequest {
    /// A high-accuracy request for exactly one fix.
    #[must_use]
    pub const fn one_shot_high_accuracy() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval: Duration::ZERO,
            max_updates: Some(1),
        }
    }
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::one_shot_high_accuracy()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
