//! Home reference and LLA to NED linearization.
//!
//! Positions are converted with a first order (Taylor) expansion about the
//! home point. Accuracy degrades with distance from home: this is not meant for
//! long range navigation (hundreds of km).
use log::{info, warn};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEGENERATE_COORDINATE_THRESHOLD, EARTH_SEMI_MAJOR_AXIS_WGS84},
    samples::GpsPosition,
    sanity::is_sane,
};

/// Fixed geodetic point about which local navigation coordinates are linearized.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HomeReference {
    /// Latitude (decimal degrees)
    pub latitude: f64,
    /// Longitude (decimal degrees)
    pub longitude: f64,
    /// Altitude above mean sea level (m)
    pub altitude: f64,
    /// Local magnetic field, NED frame
    pub magnetic_field: Vector3<f64>,
    /// Home has been set by the operator (or autonomously).
    /// Position is never trusted while this is false.
    pub set: bool,
}

impl HomeReference {
    /// Builds a [HomeReference] that is flagged as set.
    pub fn new(latitude: f64, longitude: f64, altitude: f64, magnetic_field: Vector3<f64>) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            magnetic_field,
            set: true,
        }
    }

    /// Returns true when all components are finite
    pub fn is_sane(&self) -> bool {
        is_sane(self.latitude)
            && is_sane(self.longitude)
            && is_sane(self.altitude)
            && self.magnetic_field.iter().all(|b| is_sane(*b))
    }
}

/// Scale factors from (dLat [rad], dLon [rad], dAlt [m]) to NED meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearizationMatrix([f64; 3]);

impl LinearizationMatrix {
    /// Computes [LinearizationMatrix] at this [HomeReference]
    pub fn new(home: &HomeReference) -> Self {
        let r_n = EARTH_SEMI_MAJOR_AXIS_WGS84 + home.altitude;
        let lat_rad = home.latitude.to_radians();
        Self([r_n, r_n * lat_rad.cos(), -1.0])
    }

    /// Meters per radian of latitude
    pub fn north(&self) -> f64 {
        self.0[0]
    }

    /// Meters per radian of longitude, at home latitude
    pub fn east(&self) -> f64 {
        self.0[1]
    }

    /// Down per meter of altitude
    pub fn down(&self) -> f64 {
        self.0[2]
    }
}

/// Converts a GPS position to NED delta (m) relative to `home`.
/// Altitude is corrected by the geoid separation.
pub fn to_ned(
    position: &GpsPosition,
    home: &HomeReference,
    matrix: &LinearizationMatrix,
) -> Vector3<f64> {
    let d_lat = (position.latitude - home.latitude).to_radians();
    let d_lon = (position.longitude - home.longitude).to_radians();
    let d_alt = position.altitude + position.geoid_separation - home.altitude;
    Vector3::new(
        matrix.north() * d_lat,
        matrix.east() * d_lon,
        matrix.down() * d_alt,
    )
}

/// Returns true for a (0, 0, 0) "no fix" report.
pub(crate) fn is_degenerate(position: &GpsPosition) -> bool {
    position.latitude.abs() <= DEGENERATE_COORDINATE_THRESHOLD
        && position.longitude.abs() <= DEGENERATE_COORDINATE_THRESHOLD
        && position.altitude.abs() <= DEGENERATE_COORDINATE_THRESHOLD
}

/// [Linearizer] owns the current [HomeReference] and its [LinearizationMatrix].
#[derive(Default, Debug, Clone)]
pub struct Linearizer {
    home: Option<HomeReference>,
    matrix: Option<LinearizationMatrix>,
}

impl Linearizer {
    /// Proposes a new [HomeReference]. Returns true when it got accepted.
    /// Non finite references are rejected and the previous reference
    /// and matrix are retained.
    pub fn update(&mut self, home: HomeReference) -> bool {
        if !home.is_sane() {
            warn!("rejected non finite home reference: {:?}", home);
            return false;
        }
        let matrix = LinearizationMatrix::new(&home);
        info!(
            "home reference lat={:.7}° lon={:.7}° alt={:.3}m set={}",
            home.latitude, home.longitude, home.altitude, home.set
        );
        self.home = Some(home);
        self.matrix = Some(matrix);
        true
    }

    /// Current [HomeReference]
    pub fn home(&self) -> Option<&HomeReference> {
        self.home.as_ref()
    }

    /// Current [LinearizationMatrix]
    pub fn matrix(&self) -> Option<&LinearizationMatrix> {
        self.matrix.as_ref()
    }

    /// Returns true when positions may be linearized: home is set and finite.
    pub fn is_valid(&self) -> bool {
        self.home.map(|home| home.set).unwrap_or(false) && self.matrix.is_some()
    }

    /// Linearizes this position about home, when [Self::is_valid].
    pub fn to_ned(&self, position: &GpsPosition) -> Option<Vector3<f64>> {
        if !self.is_valid() {
            return None;
        }
        let (home, matrix) = (self.home.as_ref()?, self.matrix.as_ref()?);
        Some(to_ned(position, home, matrix))
    }
}
