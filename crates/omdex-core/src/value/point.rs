use serde::{Deserialize, Serialize};
use std::fmt;

///
/// GeoPoint
///
/// A longitude/latitude pair. Latitude is capped at the web-mercator limit
/// rather than the ±90° pole, matching what geo indexes actually accept.
///

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const MAX_LATITUDE: f64 = 85.051_128_78;
    pub const MAX_LONGITUDE: f64 = 180.0;

    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Both coordinates finite and inside the indexable envelope.
    #[must_use]
    pub fn in_bounds(self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && self.longitude.abs() <= Self::MAX_LONGITUDE
            && self.latitude.abs() <= Self::MAX_LATITUDE
    }

    /// Parse the stored `"lon,lat"` form.
    pub fn parse(s: &str) -> Result<Self, String> {
        let Some((lon, lat)) = s.split_once(',') else {
            return Err(format!("geo point missing comma separator: {s}"));
        };

        let longitude = lon
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("geo point longitude: {e}"))?;
        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("geo point latitude: {e}"))?;

        Ok(Self {
            longitude,
            latitude,
        })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((longitude, latitude): (f64, f64)) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

///
/// TESTS
///
