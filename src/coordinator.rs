use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{self, BoxFuture};
use geolocatr_geocode::{AddressText, Geocoder, ReverseGeocoder};
use geolocatr_location::{
    Coordinate, LocationAcquisitionEngine, LocationProvider, LocationRequestLifecycle,
    ResolutionHandle, ResolutionResult, SettingsResolver,
};
use geolocatr_notification::{
    DeepLink, DeepLinkError, Notification, NotificationScheduler, PendingNotification,
};
use geolocatr_permission::{
    GateAction, PermissionGate, PermissionProvider, PermissionState, sys::HostPermissions,
};
use log::{debug, error, info};
use tokio::sync::watch;
use url::Url;

use crate::config::CoordinatorConfig;
use crate::signals::Signals;

/// What a rationale shown by the [`CoordinatorDelegate`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RationaleTopic {
    /// Location access, needed to find the device position.
    Location,
    /// Posting notifications, needed for reminders.
    Notifications,
}

impl RationaleTopic {
    /// Default message explaining why the permission is needed.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Location => "We must access your location to plot where you are",
            Self::Notifications => "We need to post notifications to remind you of this place",
        }
    }
}

/// The UI side of the coordinator.
///
/// Both methods are fire-and-forget: the delegate shows something and
/// returns. The outcome of a settings resolution comes back through
/// [`Coordinator::on_settings_resolution_result`].
pub trait CoordinatorDelegate: Send + Sync {
    /// Explains why a permission is needed.
    fn show_rationale(&self, topic: RationaleTopic);

    /// Launches the system dialog that lets the user fix location settings.
    fn launch_settings_resolution(&self, handle: ResolutionHandle);
}

/// Delegate used when the host does not supply one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelegate;

impl CoordinatorDelegate for LogDelegate {
    fn show_rationale(&self, topic: RationaleTopic) {
        info!("{}", topic.message());
    }

    fn launch_settings_resolution(&self, handle: ResolutionHandle) {
        info!("location settings need attention ({})", handle.as_str());
    }
}

/// Errors raised while assembling a [`Coordinator`].
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A required collaborator was not supplied to the builder.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
    /// The configured deep link base is unusable.
    #[error(transparent)]
    DeepLink(#[from] DeepLinkError),
}

/// Builder for [`Coordinator`].
///
/// The location provider, geocoder and notification scheduler are required.
/// Permissions default to [`HostPermissions`] and the delegate to
/// [`LogDelegate`].
#[derive(Default)]
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    permissions: Option<Arc<dyn PermissionProvider>>,
    location: Option<Arc<dyn LocationProvider>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    scheduler: Option<Arc<dyn NotificationScheduler>>,
    delegate: Option<Arc<dyn CoordinatorDelegate>>,
}

impl fmt::Debug for CoordinatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorBuilder")
            .field("config", &self.config)
            .field("permissions", &self.permissions.is_some())
            .field("location", &self.location.is_some())
            .field("geocoder", &self.geocoder.is_some())
            .field("scheduler", &self.scheduler.is_some())
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

impl CoordinatorBuilder {
    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the runtime permission provider.
    #[must_use]
    pub fn permissions(mut self, provider: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = Some(provider);
        self
    }

    /// Sets the location provider.
    #[must_use]
    pub fn location_provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location = Some(provider);
        self
    }

    /// Sets the reverse geocoder.
    #[must_use]
    pub fn geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Sets the reminder scheduler.
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn NotificationScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Sets the UI delegate.
    #[must_use]
    pub fn delegate(mut self, delegate: Arc<dyn CoordinatorDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Assembles the coordinator.
    ///
    /// # Errors
    ///
    /// Returns an error if a required collaborator is missing or the
    /// configured deep link base is not a hierarchical URI.
    pub fn build(self) -> Result<Coordinator, CoordinatorError> {
        let location = self
            .location
            .ok_or(CoordinatorError::MissingCollaborator("location provider"))?;
        let geocoder = self
            .geocoder
            .ok_or(CoordinatorError::MissingCollaborator("geocoder"))?;
        let scheduler = self
            .scheduler
            .ok_or(CoordinatorError::MissingCollaborator("notification scheduler"))?;
        let deep_link = DeepLink::new(&self.config.deep_link_base)?;
        let request = self.config.location_request.clone();

        Ok(Coordinator {
            inner: Arc::new(Inner {
                permissions: self.permissions.unwrap_or_else(|| {
                    let host: Arc<dyn PermissionProvider> = Arc::new(HostPermissions);
                    host
                }),
                location_gate: PermissionGate::location(),
                notification_gate: PermissionGate::notifications(),
                settings: SettingsResolver::new(location.clone(), request.clone()),
                engine: LocationAcquisitionEngine::new(location, request),
                geocoder: Arc::new(ReverseGeocoder::new(geocoder)),
                scheduler,
                delegate: self.delegate.unwrap_or_else(|| {
                    let delegate: Arc<dyn CoordinatorDelegate> = Arc::new(LogDelegate);
                    delegate
                }),
                deep_link,
                signals: Arc::new(Signals::default()),
                session: Mutex::new(Session::default()),
                config: self.config,
            }),
        })
    }
}

/// Drives the location screen.
///
/// The coordinator owns the current coordinate, its address and whether
/// device settings allow a high-accuracy fix. The UI reads these through
/// snapshots or `subscribe_*` receivers and forwards its lifecycle and user
/// actions to the methods below. Failures never surface as errors: they show
/// up as unchanged or fail-safe values and as returned [`GateAction`]s.
///
/// Lock order is session, then engine, then signals. Fix callbacks only
/// take the last two.
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    config: CoordinatorConfig,
    permissions: Arc<dyn PermissionProvider>,
    location_gate: PermissionGate,
    notification_gate: PermissionGate,
    settings: SettingsResolver,
    engine: LocationAcquisitionEngine,
    geocoder: Arc<ReverseGeocoder>,
    scheduler: Arc<dyn NotificationScheduler>,
    delegate: Arc<dyn CoordinatorDelegate>,
    deep_link: DeepLink,
    signals: Arc<Signals>,
    session: Mutex<Session>,
}

/// Screen visibility. `epoch` advances on every stop so that work begun in
/// an earlier session can tell it is stale.
#[derive(Debug, Default)]
struct Session {
    active: bool,
    epoch: u64,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.inner.config)
            .field("session", &*self.inner.session())
            .field("engine", &self.inner.engine)
            .field("signals", &self.inner.signals)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Starts building a coordinator.
    #[must_use]
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Codec for the links carried by reminders.
    #[must_use]
    pub fn deep_link(&self) -> &DeepLink {
        &self.inner.deep_link
    }

    /// Latest coordinate, if any.
    #[must_use]
    pub fn location(&self) -> Option<Coordinate> {
        self.inner.signals.location()
    }

    /// Latest address of [`location`](Self::location).
    #[must_use]
    pub fn address(&self) -> AddressText {
        self.inner.signals.address()
    }

    /// Whether device settings allow a high-accuracy fix.
    #[must_use]
    pub fn location_available(&self) -> bool {
        self.inner.signals.available()
    }

    /// Watches the coordinate.
    #[must_use]
    pub fn subscribe_location(&self) -> watch::Receiver<Option<Coordinate>> {
        self.inner.signals.subscribe_location()
    }

    /// Watches the address.
    #[must_use]
    pub fn subscribe_address(&self) -> watch::Receiver<AddressText> {
        self.inner.signals.subscribe_address()
    }

    /// Watches settings availability.
    #[must_use]
    pub fn subscribe_location_available(&self) -> watch::Receiver<bool> {
        self.inner.signals.subscribe_available()
    }

    /// State of the underlying location request.
    #[must_use]
    pub fn lifecycle(&self) -> LocationRequestLifecycle {
        self.inner.engine.lifecycle()
    }

    /// The screen became visible: re-checks device settings.
    ///
    /// On a recoverable failure the delegate is asked to launch the
    /// resolution dialog. A result that arrives after
    /// [`on_screen_stop`](Self::on_screen_stop) is discarded.
    pub async fn on_screen_start(&self) {
        let epoch = {
            let mut session = self.inner.session();
            session.active = true;
            self.inner.signals.request_address_refresh();
            session.epoch
        };
        debug!("screen started (session {epoch})");

        let check = self.inner.settings.check_availability().await;
        {
            let session = self.inner.session();
            if !session.active || session.epoch != epoch {
                debug!("discarding settings check from session {epoch}");
                return;
            }
            self.inner.signals.publish_available(check.available);
        }

        if let Some(handle) = check.resolution {
            self.inner.delegate.launch_settings_resolution(handle);
        }
    }

    /// The screen was hidden: ends any live location request.
    ///
    /// After this returns no fix, settings result or permission result from
    /// before the stop changes the coordinator's state.
    pub fn on_screen_stop(&self) {
        let mut session = self.inner.session();
        session.active = false;
        session.epoch += 1;
        self.inner.engine.stop();
        debug!("screen stopped (session {})", session.epoch);
    }

    /// Asks for one high-accuracy fix.
    ///
    /// If location permission is missing the user is prompted once and the
    /// gate is evaluated again with the answer. Returns the gate's final
    /// decision: [`GateAction::ProceedToAcquire`] when permission allows a
    /// request, [`GateAction::ShowRationale`] when the delegate was asked to
    /// explain, and [`GateAction::RequestPermission`] when the prompt was
    /// dismissed without an answer.
    ///
    /// A request is only started if the screen has not stopped since the
    /// call began; otherwise `ProceedToAcquire` is returned with nothing
    /// started and [`lifecycle`](Self::lifecycle) stays
    /// [`LocationRequestLifecycle::Stopped`].
    pub async fn request_location(&self) -> GateAction {
        let inner = &self.inner;
        let epoch = inner.session().epoch;

        let action = inner.decide(&inner.location_gate).await;
        match action {
            GateAction::ProceedToAcquire => {
                if !inner.start_acquisition(epoch) {
                    debug!("screen stopped while waiting for location permission");
                }
            }
            GateAction::ShowRationale => inner.delegate.show_rationale(RationaleTopic::Location),
            GateAction::RequestPermission => debug!("location permission prompt dismissed"),
        }
        action
    }

    /// Feeds back the outcome of the resolution dialog launched by the
    /// delegate. Ignored while the screen is stopped.
    pub fn on_settings_resolution_result(&self, result: ResolutionResult) {
        let session = self.inner.session();
        if !session.active {
            debug!("ignoring settings resolution while the screen is stopped");
            return;
        }
        let available = self.inner.settings.resolve_from_user_interaction(result);
        self.inner.signals.publish_available(available);
    }

    /// Overwrites the current coordinate, e.g. with a position restored from
    /// a reminder. A later fix replaces it.
    pub fn seed_starting_location(&self, coordinate: Coordinate) {
        self.inner.signals.publish_location(coordinate);
    }

    /// Seeds the coordinate carried by a reminder link.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the coordinate untouched, if `url` is not a
    /// location link under the configured base.
    pub fn handle_deep_link(&self, url: &Url) -> Result<Coordinate, DeepLinkError> {
        let coordinate = self.inner.deep_link.parse(url)?;
        self.seed_starting_location(coordinate);
        Ok(coordinate)
    }

    /// Schedules a reminder for `coordinate`, prompting for notification
    /// permission if needed. Returns the action finally taken, as
    /// [`request_location`](Self::request_location) does.
    pub async fn schedule_reminder(&self, coordinate: Coordinate) -> GateAction {
        let inner = &self.inner;
        let action = inner.decide(&inner.notification_gate).await;
        match action {
            GateAction::ProceedToAcquire => inner.schedule(coordinate),
            GateAction::ShowRationale => {
                inner.delegate.show_rationale(RationaleTopic::Notifications);
            }
            GateAction::RequestPermission => debug!("notification permission prompt dismissed"),
        }
        action
    }

    /// Keeps the address in step with the coordinate.
    ///
    /// The host spawns the returned future on its executor. It resolves the
    /// current coordinate, then every later one, and again each time the
    /// screen starts. An address is dropped if its coordinate changed during
    /// the lookup or the screen stopped or restarted meanwhile. The future
    /// ends once the coordinator is dropped and never keeps it alive.
    pub fn address_updates(&self) -> BoxFuture<'static, ()> {
        let geocoder = Arc::clone(&self.inner.geocoder);
        let inner = Arc::downgrade(&self.inner);
        let mut locations = self.inner.signals.subscribe_location();
        let mut refreshes = self.inner.signals.subscribe_refresh();

        Box::pin(async move {
            loop {
                refreshes.borrow_and_update();
                let coordinate = *locations.borrow_and_update();
                let Some(mark) = inner.upgrade().map(|inner| inner.session_mark()) else {
                    break;
                };

                let address = geocoder.resolve(coordinate).await;

                let Some(target) = inner.upgrade() else {
                    break;
                };
                if !target.publish_address(mark, &locations, address) {
                    debug!("dropping address resolved for {coordinate:?}");
                }
                drop(target);

                let (woken, _) = future::select(
                    Box::pin(locations.changed()),
                    Box::pin(refreshes.changed()),
                )
                .await
                .factor_first();
                if woken.is_err() {
                    break;
                }
            }
            debug!("address updates finished");
        })
    }
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Screen session a lookup started in.
    fn session_mark(&self) -> (u64, bool) {
        let session = self.session();
        (session.epoch, session.active)
    }

    /// Publishes `address` unless the screen stopped or restarted since
    /// `mark` or the coordinate moved on.
    fn publish_address(
        &self,
        mark: (u64, bool),
        locations: &watch::Receiver<Option<Coordinate>>,
        address: AddressText,
    ) -> bool {
        let session = self.session();
        if (session.epoch, session.active) != mark {
            return false;
        }
        self.signals.publish_address_for(locations, address)
    }

    /// Runs `gate`, prompting at most once and evaluating again with the
    /// answer.
    async fn decide(&self, gate: &PermissionGate) -> GateAction {
        let action = gate.check(&*self.permissions);
        if action != GateAction::RequestPermission {
            return action;
        }

        let names: Vec<&str> = gate
            .permissions()
            .iter()
            .map(|permission| permission.name())
            .collect();
        debug!("prompting for {}", names.join(", "));
        let results = self
            .permissions
            .request_permissions(gate.permissions())
            .await;
        let answer = gate.record(&results);
        let (current, rationale) = gate.assess(&*self.permissions);
        let current = if current == PermissionState::Granted {
            current
        } else {
            answer
        };
        gate.evaluate(current, rationale)
    }

    /// Starts the engine unless the screen stopped since `epoch`.
    fn start_acquisition(&self, epoch: u64) -> bool {
        let session = self.session();
        if session.epoch != epoch {
            return false;
        }
        let signals = Arc::downgrade(&self.signals);
        self.engine.start(move |fix| {
            if let Some(signals) = signals.upgrade() {
                signals.publish_location(fix.coordinate());
            }
        });
        drop(session);
        true
    }

    fn schedule(&self, coordinate: Coordinate) {
        let config = &self.config;
        let notification = Notification::new()
            .title(config.reminder_title.as_str())
            .body(format!("{} ({coordinate})", config.reminder_body))
            .deep_link(self.deep_link.format(coordinate));
        let pending = PendingNotification {
            coordinate,
            trigger_delay: config.reminder_delay,
            notification,
        };
        match self.scheduler.schedule(pending) {
            Ok(()) => info!(
                "reminder for {coordinate} scheduled in {:?}",
                config.reminder_delay
            ),
            Err(err) => error!("failed to schedule reminder: {err}"),
        }
    }
}
