//! Raw sensor samples, as delivered by the sensor bus.
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::home::HomeReference;

/// Three axis sample (gyroscope, accelerometer, magnetometer) in body frame.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triaxial {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Triaxial {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// GPS geodetic position report
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsPosition {
    /// Latitude (decimal degrees)
    pub latitude: f64,
    /// Longitude (decimal degrees)
    pub longitude: f64,
    /// Altitude above mean sea level (m)
    pub altitude: f64,
    /// Geoid separation: ellipsoid height minus mean sea level height (m)
    pub geoid_separation: f64,
}

/// GPS velocity report, NED frame (m.s⁻¹)
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsVelocity {
    pub north: f64,
    pub east: f64,
    pub down: f64,
}

impl GpsVelocity {
    pub fn components(&self) -> [f64; 3] {
        [self.north, self.east, self.down]
    }
}

/// Barometric altitude sample (m)
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BaroSample {
    pub altitude: f64,
}

/// Airspeed probe sample
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AirspeedSample {
    /// Calibrated airspeed (m.s⁻¹)
    pub calibrated_airspeed: f64,
    /// Sensor reports itself as connected
    pub connected: bool,
}

/// Latest-value access to the sensor bus, polled once per estimation cycle.
/// [None] means no sample was ever published on that channel.
/// Implementations are called from the estimation worker and must not block.
pub trait SensorSource: Send {
    fn gyroscope(&self) -> Option<Triaxial>;
    fn accelerometer(&self) -> Option<Triaxial>;
    fn magnetometer(&self) -> Option<Triaxial>;
    fn gps_position(&self) -> Option<GpsPosition>;
    fn gps_velocity(&self) -> Option<GpsVelocity>;
    fn barometer(&self) -> Option<BaroSample>;
    fn airspeed(&self) -> Option<AirspeedSample>;
    /// [HomeReference] known at start-up, if any. Read once, when the estimator
    /// is built: later changes are posted with `on_home_reference_changed`.
    fn home_reference(&self) -> Option<HomeReference>;
}
