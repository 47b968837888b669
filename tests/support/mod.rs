//! Scriptable stand-ins for the platform collaborators.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use geolocatr::geocode::{AddressResult, Geocoder, LookupError};
use geolocatr::location::{
    Coordinate, Location, LocationCallback, LocationError, LocationProvider, LocationRequest,
    LocationResult, ResolutionHandle, SettingsOutcome, SettingsStates, SubscriptionId,
};
use geolocatr::notification::{NotificationError, NotificationScheduler, PendingNotification};
use geolocatr::permission::{Permission, PermissionProvider, PermissionState};
use geolocatr::{Coordinator, CoordinatorDelegate, RationaleTopic};

pub const SINGAPORE: Coordinate = Coordinate::new(1.35, 103.87);
pub const BOULDER: Coordinate = Coordinate::new(40.0, -105.0);

pub const USABLE: SettingsStates = SettingsStates {
    gps_usable: true,
    network_location_usable: true,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn fix(coordinate: Coordinate) -> Location {
    Location {
        horizontal_accuracy: Some(5.0),
        timestamp: 1_700_000_000_000,
        ..Location::from(coordinate)
    }
}

/// Waits until `condition` holds on the latest value of `receiver`.
pub async fn settle<T, F>(receiver: &mut tokio::sync::watch::Receiver<T>, condition: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), receiver.wait_for(condition))
        .await
        .expect("value did not settle in time")
        .expect("coordinator dropped")
        .clone()
}

/// Runtime permissions with a scripted prompt answer.
#[derive(Default)]
pub struct FakePermissions {
    granted: Mutex<HashSet<Permission>>,
    rationale: Mutex<HashSet<Permission>>,
    answer: Mutex<PermissionState>,
    answers: Option<async_channel::Receiver<PermissionState>>,
    prompts: AtomicUsize,
}

impl FakePermissions {
    pub fn granted() -> Self {
        let permissions = Self::default();
        lock(&permissions.granted).extend([
            Permission::FineLocation,
            Permission::CoarseLocation,
            Permission::PostNotifications,
        ]);
        permissions
    }

    /// Nothing granted; every prompt is answered with `answer`.
    pub fn answering(answer: PermissionState) -> Self {
        let permissions = Self::default();
        *lock(&permissions.answer) = answer;
        permissions
    }

    /// Nothing granted; each prompt waits for an answer on `answers`.
    pub fn answered_by(answers: async_channel::Receiver<PermissionState>) -> Self {
        Self {
            answers: Some(answers),
            ..Self::default()
        }
    }

    pub fn with_rationale(self, permission: Permission) -> Self {
        lock(&self.rationale).insert(permission);
        self
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    fn scripted_answer(&self) -> PermissionState {
        *lock(&self.answer)
    }
}

impl PermissionProvider for FakePermissions {
    fn has_permission(&self, permission: Permission) -> bool {
        lock(&self.granted).contains(&permission)
    }

    fn should_show_rationale(&self, permission: Permission) -> bool {
        lock(&self.rationale).contains(&permission)
    }

    fn request_permissions<'a>(
        &'a self,
        permissions: &'a [Permission],
    ) -> BoxFuture<'a, Vec<(Permission, PermissionState)>> {
        Box::pin(async move {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            let state = match &self.answers {
                Some(answers) => answers.recv().await.unwrap_or_default(),
                None => self.scripted_answer(),
            };
            match state {
                PermissionState::Granted => lock(&self.granted).extend(permissions),
                PermissionState::DeniedSoft => lock(&self.rationale).extend(permissions),
                PermissionState::Unknown | PermissionState::DeniedPermanently => {}
            }
            permissions
                .iter()
                .map(|permission| (*permission, state))
                .collect()
        })
    }
}

/// Location provider whose settings answer and fixes are driven by the test.
pub struct FakeLocation {
    settings: Mutex<SettingsOutcome>,
    feed: Option<async_channel::Receiver<SettingsOutcome>>,
    live: Mutex<HashMap<u64, Arc<dyn LocationCallback>>>,
    every: Mutex<Vec<Arc<dyn LocationCallback>>>,
    next_id: AtomicU64,
    refuse: AtomicBool,
    registrations: AtomicUsize,
}

impl FakeLocation {
    pub fn new(settings: SettingsOutcome) -> Self {
        Self {
            settings: Mutex::new(settings),
            feed: None,
            live: Mutex::default(),
            every: Mutex::default(),
            next_id: AtomicU64::new(1),
            refuse: AtomicBool::new(false),
            registrations: AtomicUsize::new(0),
        }
    }

    pub fn usable() -> Self {
        Self::new(SettingsOutcome::Satisfied(USABLE))
    }

    /// Each settings check waits for an answer on `feed`.
    pub fn fed_by(feed: async_channel::Receiver<SettingsOutcome>) -> Self {
        Self {
            feed: Some(feed),
            ..Self::usable()
        }
    }

    pub fn set_settings(&self, settings: SettingsOutcome) {
        *lock(&self.settings) = settings;
    }

    pub fn refuse_registrations(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    /// Delivers `location` to every live registration.
    pub fn deliver(&self, location: &Location) {
        let callbacks: Vec<_> = lock(&self.live).values().cloned().collect();
        for callback in callbacks {
            callback.on_location_result(location.clone());
        }
    }

    /// Delivers `location` to every callback ever registered, as a platform
    /// does when a result races with its removal.
    pub fn deliver_late(&self, location: &Location) {
        let callbacks = lock(&self.every).clone();
        for callback in callbacks {
            callback.on_location_result(location.clone());
        }
    }

    pub fn live(&self) -> usize {
        lock(&self.live).len()
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    fn current_settings(&self) -> SettingsOutcome {
        lock(&self.settings).clone()
    }
}

impl LocationProvider for FakeLocation {
    fn check_settings<'a>(
        &'a self,
        _request: &'a LocationRequest,
    ) -> BoxFuture<'a, SettingsOutcome> {
        Box::pin(async move {
            match &self.feed {
                Some(feed) => feed
                    .recv()
                    .await
                    .unwrap_or_else(|_| SettingsOutcome::Unsatisfiable("feed closed".into())),
                None => self.current_settings(),
            }
        })
    }

    fn request_location_updates(
        &self,
        request: &LocationRequest,
        callback: Arc<dyn LocationCallback>,
    ) -> LocationResult<SubscriptionId> {
        assert_eq!(request.max_updates, Some(1));
        if self.refuse.load(Ordering::SeqCst) {
            return Err(LocationError::PermissionDenied);
        }
        self.registrations.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.every).push(Arc::clone(&callback));
        lock(&self.live).insert(id, callback);
        Ok(SubscriptionId(id))
    }

    fn remove_location_updates(&self, subscription: SubscriptionId) {
        lock(&self.live).remove(&subscription.0);
    }
}

/// Geocoder with a fixed gazetteer.
#[derive(Default)]
pub struct FakeGeocoder {
    places: Mutex<Vec<(Coordinate, Vec<String>)>>,
    failing: AtomicBool,
    hold: Option<async_channel::Receiver<()>>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn with_place(self, coordinate: Coordinate, lines: &[&str]) -> Self {
        lock(&self.places).push((
            coordinate,
            lines.iter().map(|line| (*line).to_owned()).collect(),
        ));
        self
    }

    /// Each lookup waits for a release on `hold` before answering.
    pub fn held_by(self, hold: async_channel::Receiver<()>) -> Self {
        Self {
            hold: Some(hold),
            ..self
        }
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, target: Coordinate, max_results: usize) -> Vec<AddressResult> {
        lock(&self.places)
            .iter()
            .filter(|(coordinate, _)| *coordinate == target)
            .take(max_results)
            .map(|(_, lines)| AddressResult::from_lines(lines.clone()))
            .collect()
    }
}

impl Geocoder for FakeGeocoder {
    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        max_results: usize,
    ) -> BoxFuture<'_, Result<Vec<AddressResult>, LookupError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = &self.hold {
                let _ = hold.recv().await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(LookupError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "geocoder offline",
                )));
            }
            Ok(self.lookup(Coordinate::new(latitude, longitude), max_results))
        })
    }
}

#[derive(Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<PendingNotification>>,
    failure: Mutex<Option<NotificationError>>,
}

impl RecordingScheduler {
    pub fn fail_with(&self, error: NotificationError) {
        *lock(&self.failure) = Some(error);
    }

    pub fn scheduled(&self) -> Vec<PendingNotification> {
        lock(&self.scheduled).clone()
    }
}

impl NotificationScheduler for RecordingScheduler {
    fn schedule(&self, pending: PendingNotification) -> Result<(), NotificationError> {
        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }
        lock(&self.scheduled).push(pending);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDelegate {
    rationales: Mutex<Vec<RationaleTopic>>,
    resolutions: Mutex<Vec<ResolutionHandle>>,
}

impl RecordingDelegate {
    pub fn rationales(&self) -> Vec<RationaleTopic> {
        lock(&self.rationales).clone()
    }

    pub fn resolutions(&self) -> Vec<ResolutionHandle> {
        lock(&self.resolutions).clone()
    }
}

impl CoordinatorDelegate for RecordingDelegate {
    fn show_rationale(&self, topic: RationaleTopic) {
        lock(&self.rationales).push(topic);
    }

    fn launch_settings_resolution(&self, handle: ResolutionHandle) {
        lock(&self.resolutions).push(handle);
    }
}

/// A coordinator wired to fakes the test keeps handles to.
pub struct Harness {
    pub permissions: Arc<FakePermissions>,
    pub location: Arc<FakeLocation>,
    pub geocoder: Arc<FakeGeocoder>,
    pub scheduler: Arc<RecordingScheduler>,
    pub delegate: Arc<RecordingDelegate>,
    pub coordinator: Coordinator,
}

impl Harness {
    pub fn new(permissions: FakePermissions, location: FakeLocation, geocoder: FakeGeocoder) -> Self {
        let permissions = Arc::new(permissions);
        let location = Arc::new(location);
        let geocoder = Arc::new(geocoder);
        let scheduler = Arc::new(RecordingScheduler::default());
        let delegate = Arc::new(RecordingDelegate::default());
        let coordinator = Coordinator::builder()
            .permissions(permissions.clone())
            .location_provider(location.clone())
            .geocoder(geocoder.clone())
            .scheduler(scheduler.clone())
            .delegate(delegate.clone())
            .build()
            .expect("all collaborators supplied");
        Self {
            permissions,
            location,
            geocoder,
            scheduler,
            delegate,
            coordinator,
        }
    }

    /// Permissions granted, settings usable, Singapore in the gazetteer.
    pub fn ready() -> Self {
        Self::new(
            FakePermissions::granted(),
            FakeLocation::usable(),
            FakeGeocoder::default().with_place(SINGAPORE, &["Singapore"]),
        )
    }
}
