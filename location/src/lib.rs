//! Device location acquisition.
//!
//! This crate wraps a platform location provider behind [`LocationProvider`]
//! and builds the two pieces the location feature needs on top of it:
//! [`SettingsResolver`], which checks whether the device settings can
//! satisfy a high-accuracy request, and [`LocationAcquisitionEngine`], which
//! owns the lifecycle of a single-shot request.

#![warn(missing_docs)]

mod engine;
mod request;
mod settings;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use engine::{LocationAcquisitionEngine, LocationRequestLifecycle};
pub use request::{LocationRequest, Priority};
pub use settings::{
    ResolutionHandle, ResolutionResult, SettingsCheck, SettingsOutcome, SettingsResolver,
    SettingsStates,
};

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.latitude, self.longitude)
    }
}

/// A fix delivered by the location provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Altitude in meters above sea level, if available.
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters, if available.
    pub horizontal_accuracy: Option<f64>,
    /// Timestamp as Unix epoch milliseconds.
    pub timestamp: u64,
}

impl Location {
    /// The position of this fix.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl From<Coordinate> for Location {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            altitude: None,
            horizontal_accuracy: None,
            timestamp: 0,
        }
    }
}

/// Why a provider refused a location registration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    /// The app may not read the device position.
    #[error("missing location permission")]
    PermissionDenied,
    /// Positioning is switched off on the device.
    #[error("location is switched off")]
    ServiceDisabled,
}

/// Result type for location operations.
pub type LocationResult<T> = Result<T, LocationError>;

/// Identifies one registration with a [`LocationProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receives fixes from a [`LocationProvider`].
pub trait LocationCallback: Send + Sync {
    /// Called with each location the provider produces for this registration.
    fn on_location_result(&self, location: Location);
}

/// Platform location provider.
///
/// Providers must not hold internal locks while invoking a
/// [`LocationCallback`]: callbacks may unregister themselves.
pub trait LocationProvider: Send + Sync {
    /// Asks whether the current device settings can satisfy `request`.
    fn check_settings<'a>(&'a self, request: &'a LocationRequest)
    -> BoxFuture<'a, SettingsOutcome>;

    /// Registers `callback` for updates matching `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider refuses the registration.
    fn request_location_updates(
        &self,
        request: &LocationRequest,
        callback: Arc<dyn LocationCallback>,
    ) -> LocationResult<SubscriptionId>;

    /// Removes a registration. Unknown ids are ignored.
    fn remove_location_updates(&self, subscription: SubscriptionId);
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
