//! Persistent UI toggles for the location screen.
//!
//! The map layer switches (traffic, my-location) live in an opaque
//! key/value store owned by the platform. [`MapPreferences`] gives them
//! names and defaults.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use log::warn;

/// Errors that can occur when accessing preferences.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    /// Invalid input (e.g. empty key).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The underlying store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Asynchronous boolean key/value store.
pub trait PreferenceStore: Send + Sync {
    /// Reads `key`; `None` if it was never written.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<bool>, PreferenceError>>;

    /// Writes `key`.
    fn set<'a>(&'a self, key: &'a str, value: bool) -> BoxFuture<'a, Result<(), PreferenceError>>;
}

/// In-process store, used by hosts without a platform store and by tests.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, bool>>,
}

impl MemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn validate(key: &str) -> Result<(), PreferenceError> {
    if key.is_empty() {
        return Err(PreferenceError::InvalidInput("key cannot be empty".into()));
    }
    Ok(())
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<bool>, PreferenceError>> {
        Box::pin(async move {
            validate(key)?;
            let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(values.get(key).copied())
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: bool) -> BoxFuture<'a, Result<(), PreferenceError>> {
        Box::pin(async move {
            validate(key)?;
            self.values
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.to_owned(), value);
            Ok(())
        })
    }
}

/// The map layer toggles shown on the location screen.
#[derive(Debug)]
pub struct MapPreferences<S> {
    store: S,
}

impl<S: PreferenceStore> MapPreferences<S> {
    /// Key of the traffic layer toggle.
    pub const TRAFFIC_KEY: &'static str = "isTrafficEnabled";
    /// Key of the my-location layer toggle.
    pub const MY_LOCATION_KEY: &'static str = "isLocationEnabled";

    /// Wraps `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Whether the traffic layer is shown. Defaults to `false`.
    pub async fn traffic_enabled(&self) -> bool {
        self.read(Self::TRAFFIC_KEY).await
    }

    /// Shows or hides the traffic layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub async fn set_traffic_enabled(&self, enabled: bool) -> Result<(), PreferenceError> {
        self.store.set(Self::TRAFFIC_KEY, enabled).await
    }

    /// Whether the my-location layer is shown. Defaults to `false`.
    pub async fn my_location_enabled(&self) -> bool {
        self.read(Self::MY_LOCATION_KEY).await
    }

    /// Shows or hides the my-location layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub async fn set_my_location_enabled(&self, enabled: bool) -> Result<(), PreferenceError> {
        self.store.set(Self::MY_LOCATION_KEY, enabled).await
    }

    async fn read(&self, key: &str) -> bool {
        match self.store.get(key).await {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                warn!("failed to read preference {key}: {err}");
                false
            }
        }
    }
}
