//! Geographic primitives: validated coordinates and great-circle distance.
//!
//! [`distance_km`] is the single distance function used by pricing, matching
//! and dispatch. It returns the unrounded Haversine distance; rounding is left
//! to whoever displays the value (see [`round_to`]).

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Fields are public so records deserialized from the driver store can carry
/// coordinates straight through; [`Coordinate::validate`] checks the range
/// invariant and every distance computation calls it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting values outside [-90, 90] / [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check the latitude/longitude range invariant. NaN is out of range.
    pub fn validate(&self) -> Result<()> {
        let lat_ok = (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(DispatchError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = DispatchError;

    /// Parse `"lat,lon"` in decimal degrees. Malformed text fails with
    /// [`DispatchError::UnparsableCoordinate`], out-of-range values with
    /// [`DispatchError::InvalidCoordinate`].
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DispatchError::UnparsableCoordinate(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let latitude = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let longitude = lon.trim().parse::<f64>().map_err(|_| invalid())?;
        Self::new(latitude, longitude)
    }
}

fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // Clamp: rounding can push h a hair past 1.0 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two coordinates in kilometres.
///
/// Fails with [`DispatchError::InvalidCoordinate`] if either input is out of
/// range. The result is never negative and is not rounded.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> Result<f64> {
    a.validate()?;
    b.validate()?;
    Ok(haversine_km(a, b))
}

/// Round `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
