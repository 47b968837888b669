use geolocatr_location::Coordinate;
use url::Url;

const ROUTE_LOCATION: &str = "location";
const ARG_LATITUDE: &str = "lat";
const ARG_LONGITUDE: &str = "long";

/// Errors produced while building or reading deep links.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeepLinkError {
    /// The base URI could not be parsed.
    #[error("invalid deep link base: {0}")]
    InvalidBase(#[from] url::ParseError),
    /// The base URI cannot carry path segments.
    #[error("deep link base cannot carry a path: {0}")]
    OpaqueBase(String),
    /// The link points at another scheme, host or route.
    #[error("not a location link: {0}")]
    ForeignLink(String),
    /// The latitude or longitude segment is not a valid coordinate.
    #[error("invalid coordinate in link: {0}")]
    InvalidCoordinate(String),
}

/// Codec for links of the form `{base}/location/{lat}/{long}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    base: Url,
}

impl DeepLink {
    /// Base URI used by the app's location screen.
    pub const DEFAULT_BASE: &'static str = "https://geolocatr.labs.csci448.mines.edu";

    /// Creates a codec rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not a hierarchical URI.
    pub fn new(base: &str) -> Result<Self, DeepLinkError> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(DeepLinkError::OpaqueBase(base.into()));
        }
        Ok(Self { base })
    }

    /// The base URI.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Route pattern with placeholders, for registering with a router.
    #[must_use]
    pub fn pattern(&self) -> String {
        format!(
            "{}/{ROUTE_LOCATION}/{{{ARG_LATITUDE}}}/{{{ARG_LONGITUDE}}}",
            self.base.as_str().trim_end_matches('/')
        )
    }

    /// Link that reopens the location screen at `coordinate`.
    #[must_use]
    pub fn format(&self, coordinate: Coordinate) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(ROUTE_LOCATION)
                .push(&coordinate.latitude.to_string())
                .push(&coordinate.longitude.to_string());
        }
        url
    }

    /// Extracts the coordinate carried by `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` does not belong to this base or carries
    /// something other than a finite, in-range coordinate.
    pub fn parse(&self, url: &Url) -> Result<Coordinate, DeepLinkError> {
        let foreign = || DeepLinkError::ForeignLink(url.to_string());
        if url.scheme() != self.base.scheme()
            || url.host_str() != self.base.host_str()
            || url.port_or_known_default() != self.base.port_or_known_default()
        {
            return Err(foreign());
        }

        let prefix: Vec<&str> = self
            .base
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(foreign)?
            .filter(|s| !s.is_empty())
            .collect();

        let Some(rest) = segments.strip_prefix(prefix.as_slice()) else {
            return Err(foreign());
        };
        let [route, latitude, longitude] = rest else {
            return Err(foreign());
        };
        if *route != ROUTE_LOCATION {
            return Err(foreign());
        }

        let latitude = parse_degrees(latitude, 90.0)?;
        let longitude = parse_degrees(longitude, 180.0)?;
        Ok(Coordinate::new(latitude, longitude))
    }
}

impl Default for DeepLink {
    fn default() -> Self {
        Self {
            base: Url::parse(Self::DEFAULT_BASE).expect("DEFAULT_BASE is a valid URL"),
        }
    }
}

fn parse_degrees(segment: &str, limit: f64) -> Result<f64, DeepLinkError> {
    segment
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= limit)
        .ok_or_else(|| DeepLinkError::InvalidCoordinate(segment.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_location_route() {
        let link = DeepLink::default().format(Coordinate::new(40.0, -105.25));
        assert_eq!(
            link.as_str(),
            "https://geolocatr.labs.csci448.mines.edu/location/40/-105.25"
        );
    }

    #[test]
    fn pattern_has_placeholders() {
        assert_eq!(
            DeepLink::default().pattern(),
            "https://geolocatr.labs.csci448.mines.edu/location/{lat}/{long}"
        );
    }

    #[test]
    fn reads_back_formatted_link() {
        let codec = DeepLink::default();
        let coordinate = Coordinate::new(1.35, 103.87);
        assert_eq!(codec.parse(&codec.format(coordinate)), Ok(coordinate));
    }

    #[test]
    fn reads_platform_double_formatting() {
        let url =
            Url::parse("https://geolocatr.labs.csci448.mines.edu/location/40.0/-105.0").unwrap();
        assert_eq!(
            DeepLink::default().parse(&url),
            Ok(Coordinate::new(40.0, -105.0))
        );
    }

    #[test]
    fn honours_base_path() {
        let codec = DeepLink::new("geolocatr://app/v1/").unwrap();
        assert_eq!(codec.base().path(), "/v1/");
        let url = codec.format(Coordinate::new(-33.9, 18.4));
        assert_eq!(url.as_str(), "geolocatr://app/v1/location/-33.9/18.4");
        assert_eq!(codec.parse(&url), Ok(Coordinate::new(-33.9, 18.4)));
    }

    #[test]
    fn explicit_default_port_is_the_same_origin() {
        let url =
            Url::parse("https://geolocatr.labs.csci448.mines.edu:443/location/1.5/2.5").unwrap();
        assert_eq!(
            DeepLink::default().parse(&url),
            Ok(Coordinate::new(1.5, 2.5))
        );
    }

    #[test]
    fn rejects_other_hosts_and_routes() {
        let codec = DeepLink::default();
        for link in [
            "https://example.com/location/1/2",
            "http://geolocatr.labs.csci448.mines.edu/location/1/2",
            "https://geolocatr.labs.csci448.mines.edu:8443/location/1/2",
            "https://geolocatr.labs.csci448.mines.edu/settings/1/2",
            "https://geolocatr.labs.csci448.mines.edu/location/1",
        ] {
            let url = Url::parse(link).unwrap();
            assert!(matches!(
                codec.parse(&url),
                Err(DeepLinkError::ForeignLink(_))
            ));
        }
    }

    #[test]
    fn rejects_unparseable_placeholders() {
        let codec = DeepLink::default();
        for link in [
            "https://geolocatr.labs.csci448.mines.edu/location/%7Blat%7D/%7Blong%7D",
            "https://geolocatr.labs.csci448.mines.edu/location/91/0",
            "https://geolocatr.labs.csci448.mines.edu/location/NaN/0",
        ] {
            let url = Url::parse(link).unwrap();
            assert!(matches!(
                codec.parse(&url),
                Err(DeepLinkError::InvalidCoordinate(_))
            ));
        }
    }

    #[test]
    fn opaque_base_is_rejected() {
        assert!(matches!(
            DeepLink::new("mailto:someone@example.com"),
            Err(DeepLinkError::OpaqueBase(_))
        ));
    }
}
