use std::time::Duration;

use geolocatr_location::LocationRequest;
use geolocatr_notification::DeepLink;
use serde::{Deserialize, Serialize};

/// Tunables of the [`Coordinator`](crate::Coordinator).
///
/// Every field has a default, so partial JSON is accepted:
///
/// ```
/// let config = geolocatr::CoordinatorConfig::from_json(r#"{"reminder_delay": 30}"#).unwrap();
/// assert_eq!(config.reminder_delay.as_secs(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Delay between scheduling a reminder and its notification, in seconds.
    #[serde(with = "seconds")]
    pub reminder_delay: Duration,
    /// Title of the reminder notification.
    pub reminder_title: String,
    /// Body of the reminder notification; the coordinate is appended.
    pub reminder_body: String,
    /// Base URI of links that reopen the location screen.
    pub deep_link_base: String,
    /// Request used for both the settings check and the location fix.
    pub location_request: LocationRequest,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reminder_delay: Duration::from_secs(10),
            reminder_title: "Geolocatr".to_owned(),
            reminder_body: "Check out where you were".to_owned(),
            deep_link_base: DeepLink::DEFAULT_BASE.to_owned(),
            location_request: LocationRequest::one_shot_high_accuracy(),
        }
    }
}

impl CoordinatorConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is malformed or has fields of the wrong type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
