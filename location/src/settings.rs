use std::sync::Arc;

use log::{debug, warn};

use crate::{LocationProvider, LocationRequest};

/// Which positioning sources the device settings currently allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SettingsStates {
    /// Satellite positioning is enabled and usable.
    pub gps_usable: bool,
    /// Network (Wi-Fi/cell) positioning is enabled and usable.
    pub network_location_usable: bool,
}

impl SettingsStates {
    /// Whether any positioning source is usable.
    #[must_use]
    pub const fn is_location_usable(&self) -> bool {
        self.gps_usable || self.network_location_usable
    }
}

/// Opaque platform token used to launch a settings-resolution dialog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionHandle(String);

impl ResolutionHandle {
    /// Wraps a platform token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The platform token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Answer of a settings-satisfaction query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOutcome {
    /// The settings satisfy the request.
    Satisfied(SettingsStates),
    /// The settings can be fixed by a user-facing system dialog.
    ResolutionRequired(ResolutionHandle),
    /// The settings cannot satisfy the request.
    Unsatisfiable(String),
}

/// How an interactive settings-resolution dialog ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionResult {
    /// The user confirmed; carries the settings the dialog reported, if any.
    Completed(Option<SettingsStates>),
    /// The user dismissed the dialog.
    Cancelled,
}

/// Result of [`SettingsResolver::check_availability`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsCheck {
    /// Whether a high-accuracy request can be satisfied right now.
    pub available: bool,
    /// Set when the caller should launch the resolution dialog.
    pub resolution: Option<ResolutionHandle>,
}

/// Checks whether device settings can satisfy the location request.
///
/// Availability is only ever `true` after an explicit success from the
/// provider or from a completed resolution dialog.
pub struct SettingsResolver {
    provider: Arc<dyn LocationProvider>,
    request: LocationRequest,
}

impl std::fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl SettingsResolver {
    /// Creates a resolver that checks `request` against `provider`.
    pub fn new(provider: Arc<dyn LocationProvider>, request: LocationRequest) -> Self {
        Self { provider, request }
    }

    /// Queries the provider.
    pub async fn check_availability(&self) -> SettingsCheck {
        match self.provider.check_settings(&self.request).await {
            SettingsOutcome::Satisfied(states) => {
                debug!("location settings satisfied: {states:?}");
                SettingsCheck {
                    available: states.is_location_usable(),
                    resolution: None,
                }
            }
            SettingsOutcome::ResolutionRequired(handle) => {
                debug!("location settings need resolution");
                SettingsCheck {
                    available: false,
                    resolution: Some(handle),
                }
            }
            SettingsOutcome::Unsatisfiable(reason) => {
                warn!("location settings cannot be satisfied: {reason}");
                SettingsCheck {
                    available: false,
                    resolution: None,
                }
            }
        }
    }

    /// Re-derives availability from the outcome of a resolution dialog.
    #[must_use]
    pub fn resolve_from_user_interaction(&self, result: ResolutionResult) -> bool {
        match result {
            ResolutionResult::Completed(Some(states)) => states.is_location_usable(),
            ResolutionResult::Completed(None) | ResolutionResult::Cancelled => false,
        }
    }
}
