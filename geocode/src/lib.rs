//! Reverse geocoding.
//!
//! Turns a [`Coordinate`] into the address lines of the closest match
//! reported by a platform [`Geocoder`]. Lookup failures never escape: they
//! are logged and resolve to an empty [`AddressText`].

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use geolocatr_location::Coordinate;
use log::{debug, warn};

/// One match returned by a [`Geocoder`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressResult {
    /// Address lines, most specific first.
    pub lines: Vec<String>,
}

impl AddressResult {
    /// A result made of the given lines only.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Errors a [`Geocoder`] may report.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The lookup failed on I/O (network, backend service).
    #[error("geocoder I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// No geocoder backend is present on this device.
    #[error("geocoder not available")]
    NotAvailable,
}

/// Platform reverse-geocoding service.
pub trait Geocoder: Send + Sync {
    /// Returns up to `max_results` matches for the given position.
    fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        max_results: usize,
    ) -> BoxFuture<'_, Result<Vec<AddressResult>, LookupError>>;
}

/// Display text of a resolved address.
///
/// Empty means "not found" or "not resolved yet".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressText(Vec<String>);

impl AddressText {
    /// The empty address.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// An address made of the given lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(lines.into_iter().map(Into::into).collect())
    }

    /// The address lines in order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.0
    }

    /// Whether there is nothing to display.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AddressText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("\n"))
    }
}

/// Resolves coordinates into [`AddressText`] through a [`Geocoder`].
pub struct ReverseGeocoder {
    geocoder: Arc<dyn Geocoder>,
}

impl fmt::Debug for ReverseGeocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseGeocoder").finish_non_exhaustive()
    }
}

impl ReverseGeocoder {
    /// Wraps a platform geocoder.
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolves `coordinate` to the lines of the first match.
    ///
    /// `None`, failed lookups and empty result sets all yield the empty
    /// address. Nothing is retried.
    pub async fn resolve(&self, coordinate: Option<Coordinate>) -> AddressText {
        let Some(coordinate) = coordinate else {
            return AddressText::empty();
        };

        match self
            .geocoder
            .reverse_geocode(coordinate.latitude, coordinate.longitude, 1)
            .await
        {
            Ok(results) => results.into_iter().next().map_or_else(
                || {
                    debug!("no address found for {coordinate}");
                    AddressText::empty()
                },
                |first| AddressText(first.lines),
            ),
            Err(err) => {
                warn!("error getting address for {coordinate}: {err}");
                AddressText::empty()
            }
        }
    }
}
