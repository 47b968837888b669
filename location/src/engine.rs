use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use log::{debug, warn};

use crate::{
    Location, LocationCallback, LocationProvider, LocationRequest, SubscriptionId, lock,
};

/// Lifecycle of the single-shot request owned by a [`LocationAcquisitionEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocationRequestLifecycle {
    /// No request has been started.
    #[default]
    Idle,
    /// A request was issued and is being registered with the provider.
    Requesting,
    /// The provider accepted the request; waiting for the fix.
    Listening,
    /// The request ended, either by delivering its fix or by `stop()`.
    Stopped,
}

impl LocationRequestLifecycle {
    /// Whether a fix may still be delivered.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Requesting | Self::Listening)
    }
}

#[derive(Debug, Default)]
struct EngineState {
    lifecycle: LocationRequestLifecycle,
    generation: u64,
    subscription: Option<SubscriptionId>,
}

type FixHandler = Box<dyn Fn(Location) + Send + Sync>;

/// Owns at most one live single-shot location request.
///
/// Every `start` supersedes the previous request, and every request delivers
/// at most one fix. Fixes arriving for a superseded or stopped request are
/// dropped, so nothing reaches the handler after [`stop`](Self::stop)
/// returns.
pub struct LocationAcquisitionEngine {
    provider: Arc<dyn LocationProvider>,
    request: LocationRequest,
    state: Arc<Mutex<EngineState>>,
}

impl fmt::Debug for LocationAcquisitionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationAcquisitionEngine")
            .field("request", &self.request)
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

impl LocationAcquisitionEngine {
    /// Creates an engine issuing `request` to `provider`.
    pub fn new(provider: Arc<dyn LocationProvider>, request: LocationRequest) -> Self {
        Self {
            provider,
            request,
            state: Arc::new(Mutex::new(EngineState::default())),
        }
    }

    /// Creates an engine issuing one-shot high-accuracy requests.
    pub fn one_shot_high_accuracy(provider: Arc<dyn LocationProvider>) -> Self {
        Self::new(provider, LocationRequest::one_shot_high_accuracy())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> LocationRequestLifecycle {
        lock(&self.state).lifecycle
    }

    /// Starts a request, replacing any request that is still live.
    ///
    /// `on_fix` runs at most once, on the provider's callback thread, while
    /// the engine's state is locked. It must not call back into the engine.
    pub fn start<F>(&self, on_fix: F)
    where
        F: Fn(Location) + Send + Sync + 'static,
    {
        let generation = {
            let mut state = lock(&self.state);
            if let Some(previous) = state.subscription.take() {
                debug!("replacing live location request {previous:?}");
                self.provider.remove_location_updates(previous);
            }
            state.generation += 1;
            state.lifecycle = LocationRequestLifecycle::Requesting;
            state.generation
        };

        let callback = Arc::new(OneShotCallback {
            state: Arc::downgrade(&self.state),
            provider: Arc::downgrade(&self.provider),
            generation,
            on_fix: Box::new(on_fix),
        });

        // Registration runs unlocked: providers may deliver synchronously.
        match self
            .provider
            .request_location_updates(&self.request, callback)
        {
            Ok(subscription) => {
                let mut state = lock(&self.state);
                if state.generation == generation
                    && state.lifecycle == LocationRequestLifecycle::Requesting
                {
                    state.lifecycle = LocationRequestLifecycle::Listening;
                    state.subscription = Some(subscription);
                    debug!("location request {subscription:?} listening");
                } else {
                    self.provider.remove_location_updates(subscription);
                }
            }
            Err(err) => {
                warn!("location request rejected: {err}");
                let mut state = lock(&self.state);
                if state.generation == generation {
                    state.lifecycle = LocationRequestLifecycle::Stopped;
                }
            }
        }
    }

    /// Ends the current request, if any. Idempotent.
    ///
    /// The provider registration is removed before this returns.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.lifecycle = LocationRequestLifecycle::Stopped;
        if let Some(subscription) = state.subscription.take() {
            debug!("stopping location request {subscription:?}");
            self.provider.remove_location_updates(subscription);
        }
    }
}

impl Drop for LocationAcquisitionEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

struct OneShotCallback {
    state: Weak<Mutex<EngineState>>,
    provider: Weak<dyn LocationProvider>,
    generation: u64,
    on_fix: FixHandler,
}

impl LocationCallback for OneShotCallback {
    fn on_location_result(&self, location: Location) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = lock(&state);
        if state.generation != self.generation || !state.lifecycle.is_active() {
            debug!("dropping fix for a finished location request");
            return;
        }

        state.lifecycle = LocationRequestLifecycle::Stopped;
        if let Some(subscription) = state.subscription.take() {
            if let Some(provider) = self.provider.upgrade() {
                provider.remove_location_updates(subscription);
            }
        }
        (self.on_fix)(location);
    }
}
