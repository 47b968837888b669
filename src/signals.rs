use std::sync::{Mutex, PoisonError};

use geolocatr_geocode::AddressText;
use geolocatr_location::Coordinate;
use log::info;
use tokio::sync::watch;

/// The coordinator's three observable values.
///
/// Each is a last-write-wins cell: readers see the latest value, never a
/// backlog, and equal writes do not wake subscribers. All writes go through
/// one gate so they apply in a single total order.
#[derive(Debug)]
pub(crate) struct Signals {
    gate: Mutex<()>,
    location: watch::Sender<Option<Coordinate>>,
    address: watch::Sender<AddressText>,
    available: watch::Sender<bool>,
    refresh: watch::Sender<u64>,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            gate: Mutex::new(()),
            location: watch::channel(None).0,
            address: watch::channel(AddressText::empty()).0,
            available: watch::channel(false).0,
            refresh: watch::channel(0).0,
        }
    }
}

impl Signals {
    pub(crate) fn location(&self) -> Option<Coordinate> {
        *self.location.borrow()
    }

    pub(crate) fn address(&self) -> AddressText {
        self.address.borrow().clone()
    }

    pub(crate) fn available(&self) -> bool {
        *self.available.borrow()
    }

    pub(crate) fn subscribe_location(&self) -> watch::Receiver<Option<Coordinate>> {
        self.location.subscribe()
    }

    pub(crate) fn subscribe_address(&self) -> watch::Receiver<AddressText> {
        self.address.subscribe()
    }

    pub(crate) fn subscribe_available(&self) -> watch::Receiver<bool> {
        self.available.subscribe()
    }

    pub(crate) fn subscribe_refresh(&self) -> watch::Receiver<u64> {
        self.refresh.subscribe()
    }

    /// Asks address subscribers to resolve the current coordinate again.
    pub(crate) fn request_address_refresh(&self) {
        self.refresh.send_modify(|round| *round += 1);
    }

    pub(crate) fn publish_location(&self, coordinate: Coordinate) {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if replace(&self.location, Some(coordinate)) {
            info!("location updated to {coordinate}");
        }
    }

    pub(crate) fn publish_available(&self, available: bool) {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        replace(&self.available, available);
    }

    /// Publishes `address` only if `derived_from` has not seen a newer
    /// location since the address was computed from it.
    pub(crate) fn publish_address_for(
        &self,
        derived_from: &watch::Receiver<Option<Coordinate>>,
        address: AddressText,
    ) -> bool {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if !matches!(derived_from.has_changed(), Ok(false)) {
            return false;
        }
        replace(&self.address, address);
        true
    }
}

fn replace<T: PartialEq>(sender: &watch::Sender<T>, value: T) -> bool {
    sender.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    })
}
