//! Runtime permission classification.
//!
//! This crate models the permissions the location feature depends on, the
//! platform collaborator that reports and prompts for them, and the
//! [`PermissionGate`] that decides what the caller should do next.

#![warn(missing_docs)]

mod gate;

/// Platform-specific implementations.
pub mod sys;

use futures::future::BoxFuture;

pub use gate::{GateAction, PermissionGate};

/// Types of permissions that can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Permission {
    /// Precise (GPS-grade) location.
    FineLocation,
    /// Approximate (network-grade) location.
    CoarseLocation,
    /// Posting user-visible notifications.
    PostNotifications,
}

impl Permission {
    /// The platform identifier of this permission.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Self::CoarseLocation => "android.permission.ACCESS_COARSE_LOCATION",
            Self::PostNotifications => "android.permission.POST_NOTIFICATIONS",
        }
    }
}

/// The current state of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PermissionState {
    /// The user has not been asked yet, or dismissed the prompt.
    #[default]
    Unknown,
    /// Permission has been granted by the user.
    Granted,
    /// The user declined once but may be asked again after a rationale.
    DeniedSoft,
    /// The platform will no longer prompt for this permission.
    DeniedPermanently,
}

/// Platform permission subsystem.
///
/// Implementations wrap whatever the host offers (an Android activity, a
/// desktop portal, a test double). `request_permissions` resolves once the
/// user has answered the prompt.
pub trait PermissionProvider: Send + Sync {
    /// Whether `permission` is currently granted.
    fn has_permission(&self, permission: Permission) -> bool;

    /// Whether the platform wants a rationale shown before asking again.
    fn should_show_rationale(&self, permission: Permission) -> bool;

    /// Prompt for `permissions` and report the resulting state of each.
    fn request_permissions<'a>(
        &'a self,
        permissions: &'a [Permission],
    ) -> BoxFuture<'a, Vec<(Permission, PermissionState)>>;
}
