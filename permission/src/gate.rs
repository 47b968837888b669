use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::{Permission, PermissionProvider, PermissionState};

const LOCATION: &[Permission] = &[Permission::FineLocation, Permission::CoarseLocation];
const NOTIFICATIONS: &[Permission] = &[Permission::PostNotifications];

/// What the caller should do after consulting a [`PermissionGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateAction {
    /// A guarded permission is granted; go ahead.
    ProceedToAcquire,
    /// The user declined before; explain instead of prompting silently.
    ShowRationale,
    /// Prompt the user, then evaluate again with the outcome.
    RequestPermission,
}

/// Classifies the grant state of a permission group into a [`GateAction`].
///
/// A gate guards a group of alternatives: holding any one of them is enough
/// to proceed. Once a permanent denial has been observed the gate remembers
/// it and stops suggesting prompts.
#[derive(Debug)]
pub struct PermissionGate {
    permissions: &'static [Permission],
    permanently_denied: AtomicBool,
}

impl PermissionGate {
    /// Creates a gate over `permissions`.
    #[must_use]
    pub const fn new(permissions: &'static [Permission]) -> Self {
        Self {
            permissions,
            permanently_denied: AtomicBool::new(false),
        }
    }

    /// Gate for fine or coarse location.
    #[must_use]
    pub const fn location() -> Self {
        Self::new(LOCATION)
    }

    /// Gate for posting notifications.
    #[must_use]
    pub const fn notifications() -> Self {
        Self::new(NOTIFICATIONS)
    }

    /// The permissions this gate guards.
    #[must_use]
    pub const fn permissions(&self) -> &'static [Permission] {
        self.permissions
    }

    /// Whether a permanent denial has been observed.
    #[must_use]
    pub fn is_permanently_denied(&self) -> bool {
        self.permanently_denied.load(Ordering::Acquire)
    }

    /// Decides the next step from the current grant and the rationale flag.
    pub fn evaluate(&self, current: PermissionState, rationale_shown: bool) -> GateAction {
        match current {
            PermissionState::Granted => return GateAction::ProceedToAcquire,
            PermissionState::DeniedPermanently => {
                self.permanently_denied.store(true, Ordering::Release);
            }
            PermissionState::Unknown | PermissionState::DeniedSoft => {}
        }

        let action = if self.is_permanently_denied()
            || rationale_shown
            || current == PermissionState::DeniedSoft
        {
            GateAction::ShowRationale
        } else {
            GateAction::RequestPermission
        };
        debug!("permission gate {current:?} (rationale: {rationale_shown}) -> {action:?}");
        action
    }

    /// Reads the current grant state and rationale flag from `provider`.
    pub fn assess(&self, provider: &dyn PermissionProvider) -> (PermissionState, bool) {
        let granted = self
            .permissions
            .iter()
            .any(|permission| provider.has_permission(*permission));
        let rationale = self
            .permissions
            .iter()
            .any(|permission| provider.should_show_rationale(*permission));

        let state = if granted {
            PermissionState::Granted
        } else if self.is_permanently_denied() {
            PermissionState::DeniedPermanently
        } else {
            PermissionState::Unknown
        };
        (state, rationale)
    }

    /// Shorthand for [`assess`](Self::assess) followed by [`evaluate`](Self::evaluate).
    pub fn check(&self, provider: &dyn PermissionProvider) -> GateAction {
        let (state, rationale) = self.assess(provider);
        self.evaluate(state, rationale)
    }

    /// Folds the answers of a prompt into one state for this group.
    ///
    /// Answers for permissions outside the group are ignored. A permanent
    /// denial of any member is latched.
    pub fn record(&self, results: &[(Permission, PermissionState)]) -> PermissionState {
        let answers: Vec<PermissionState> = results
            .iter()
            .filter(|(permission, _)| self.permissions.contains(permission))
            .map(|(_, state)| *state)
            .collect();

        if answers.contains(&PermissionState::DeniedPermanently) {
            self.permanently_denied.store(true, Ordering::Release);
        }

        if answers.contains(&PermissionState::Granted) {
            PermissionState::Granted
        } else if answers.contains(&PermissionState::DeniedPermanently) {
            PermissionState::DeniedPermanently
        } else if answers.contains(&PermissionState::DeniedSoft) {
            PermissionState::DeniedSoft
        } else {
            PermissionState::Unknown
        }
    }
}
