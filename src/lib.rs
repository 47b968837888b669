//! # Geolocatr
//!
//! Location acquisition and settings resolution for a map screen.
//!
//! A [`Coordinator`] sits between the screen and the platform. It gates
//! location and notification access behind runtime permissions, checks that
//! device settings can produce a high-accuracy fix, requests exactly one fix
//! at a time, turns the fix into address lines and schedules reminders that
//! link back to the position. The screen observes three last-write-wins
//! values: the coordinate, its address and whether location is available.
//!
//! Every platform service is a trait supplied by the host:
//!
//! - [`permission::PermissionProvider`]: runtime permission checks and prompts.
//! - [`location::LocationProvider`]: settings checks and location updates.
//! - [`geocode::Geocoder`]: reverse geocoding.
//! - [`notification::NotificationScheduler`]: deferred reminders.
//! - [`CoordinatorDelegate`]: rationale messages and the settings dialog.
//!
//! ## Features
//!
//! - `preferences` (default): the map layer toggles in [`preferences`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let coordinator = geolocatr::Coordinator::builder()
//!     .location_provider(provider)
//!     .geocoder(geocoder)
//!     .scheduler(scheduler)
//!     .delegate(screen)
//!     .build()?;
//! tokio::spawn(coordinator.address_updates());
//!
//! coordinator.on_screen_start().await;
//! coordinator.request_location().await;
//! let mut address = coordinator.subscribe_address();
//! ```

mod config;
mod coordinator;
mod signals;

pub use config::CoordinatorConfig;
pub use coordinator::{
    Coordinator, CoordinatorBuilder, CoordinatorDelegate, CoordinatorError, LogDelegate,
    RationaleTopic,
};

pub use geolocatr_geocode as geocode;
pub use geolocatr_location as location;
pub use geolocatr_notification as notification;
pub use geolocatr_permission as permission;

#[cfg(feature = "preferences")]
pub use geolocatr_preferences as preferences;
