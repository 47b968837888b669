//! Hosts without runtime permission prompts.
//!
//! On traditional desktop systems location and notification access is
//! handled at the OS or sandbox level, so the application simply has it.

use futures::future::BoxFuture;

use crate::{Permission, PermissionProvider, PermissionState};

/// Provider that reports every permission as granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPermissions;

impl PermissionProvider for HostPermissions {
    fn has_permission(&self, _permission: Permission) -> bool {
        true
    }

    fn should_show_rationale(&self, _permission: Permission) -> bool {
        false
    }

    fn request_permissions<'a>(
        &'a self,
        permissions: &'a [Permission],
    ) -> BoxFuture<'a, Vec<(Permission, PermissionState)>> {
        Box::pin(async move {
            permissions
                .iter()
                .map(|permission| (*permission, PermissionState::Granted))
                .collect()
        })
    }
}
