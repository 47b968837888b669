//! Deferred location reminders.
//!
//! The location feature hands a [`PendingNotification`] to a platform
//! [`NotificationScheduler`]; when the reminder fires and the user opens it,
//! the platform re-enters the feature through the [`DeepLink`] it carries.

#![warn(missing_docs)]

mod deep_link;

use std::time::Duration;

use geolocatr_location::Coordinate;
use url::Url;

pub use deep_link::{DeepLink, DeepLinkError};

/// User-visible content of a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Notification {
    title: String,
    body: String,
    deep_link: Option<Url>,
}

impl Notification {
    /// Creates an empty notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the link opened when the user taps the notification.
    #[must_use]
    pub fn deep_link(mut self, url: Url) -> Self {
        self.deep_link = Some(url);
        self
    }

    /// The title.
    #[must_use]
    pub fn title_text(&self) -> &str {
        &self.title
    }

    /// The body text.
    #[must_use]
    pub fn body_text(&self) -> &str {
        &self.body
    }

    /// The link opened on tap, if any.
    #[must_use]
    pub const fn link(&self) -> Option<&Url> {
        self.deep_link.as_ref()
    }
}

/// A reminder waiting to be handed to the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNotification {
    /// Position the reminder refers to.
    pub coordinate: Coordinate,
    /// How long after scheduling the reminder fires.
    pub trigger_delay: Duration,
    /// What the user sees.
    pub notification: Notification,
}

/// Errors reported by a [`NotificationScheduler`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    /// Posting notifications is not permitted.
    #[error("notification permission denied")]
    PermissionDenied,
    /// The platform refused to schedule the alarm.
    #[error("failed to schedule notification: {0}")]
    ScheduleFailed(String),
}

/// Platform alarm/notification subsystem.
///
/// Ownership of the reminder passes to the scheduler.
pub trait NotificationScheduler: Send + Sync {
    /// Arranges for `pending` to be shown after its trigger delay.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the alarm.
    fn schedule(&self, pending: PendingNotification) -> Result<(), NotificationError>;
}
