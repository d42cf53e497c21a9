use log::debug;
use num_traits::Float;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{channel::SensorChannel, error::Error};

/// Returns true when this value is finite (neither NaN nor ±∞).
pub fn is_sane<T: Float>(value: T) -> bool {
    value.is_finite()
}

/// Inclusive validity range, applied to every scalar component of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Builds [Bounds] from `min` and `max`
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Builds symmetric [Bounds] `[-abs, +abs]`
    pub const fn symmetric(abs: f64) -> Self {
        Self {
            min: -abs,
            max: abs,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

const fn default_gyroscope() -> Option<Bounds> {
    // ±2000°/s
    Some(Bounds::symmetric(35.0))
}

const fn default_accelerometer() -> Option<Bounds> {
    // ±16 g
    Some(Bounds::symmetric(160.0))
}

const fn default_magnetometer() -> Option<Bounds> {
    None
}

const fn default_velocity() -> Option<Bounds> {
    Some(Bounds::symmetric(300.0))
}

const fn default_barometer() -> Option<Bounds> {
    Some(Bounds::new(-1000.0, 20000.0))
}

const fn default_airspeed() -> Option<Bounds> {
    Some(Bounds::new(0.0, 300.0))
}

const fn default_altitude() -> Option<Bounds> {
    Some(Bounds::new(-1000.0, 50000.0))
}

/// Per channel sanity bounds. [None] means finiteness is the only criterion.
/// These are calibration values: tune them to the sensor suite in use.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SanityBounds {
    /// Angular rate, rad.s⁻¹
    #[cfg_attr(feature = "serde", serde(default = "default_gyroscope"))]
    pub gyroscope: Option<Bounds>,
    /// Specific force, m.s⁻²
    #[cfg_attr(feature = "serde", serde(default = "default_accelerometer"))]
    pub accelerometer: Option<Bounds>,
    #[cfg_attr(feature = "serde", serde(default = "default_magnetometer"))]
    pub magnetometer: Option<Bounds>,
    /// NED velocity, m.s⁻¹
    #[cfg_attr(feature = "serde", serde(default = "default_velocity"))]
    pub velocity: Option<Bounds>,
    /// Barometric altitude, m
    #[cfg_attr(feature = "serde", serde(default = "default_barometer"))]
    pub barometer: Option<Bounds>,
    /// Calibrated airspeed, m.s⁻¹
    #[cfg_attr(feature = "serde", serde(default = "default_airspeed"))]
    pub airspeed: Option<Bounds>,
    /// GPS altitude above mean sea level, m.
    /// Latitude and longitude are always checked against their geodetic range.
    #[cfg_attr(feature = "serde", serde(default = "default_altitude"))]
    pub altitude: Option<Bounds>,
}

impl Default for SanityBounds {
    fn default() -> Self {
        Self {
            gyroscope: default_gyroscope(),
            accelerometer: default_accelerometer(),
            magnetometer: default_magnetometer(),
            velocity: default_velocity(),
            barometer: default_barometer(),
            airspeed: default_airspeed(),
            altitude: default_altitude(),
        }
    }
}

impl SanityBounds {
    /// Returns the [Bounds] applying to this channel
    pub fn bounds(&self, channel: SensorChannel) -> Option<Bounds> {
        match channel {
            SensorChannel::Gyroscope => self.gyroscope,
            SensorChannel::Accelerometer => self.accelerometer,
            SensorChannel::Magnetometer => self.magnetometer,
            SensorChannel::Position => self.altitude,
            SensorChannel::Velocity => self.velocity,
            SensorChannel::Barometer => self.barometer,
            SensorChannel::Airspeed => self.airspeed,
        }
    }

    /// Returns true if every component is sane and within this channel's [Bounds].
    /// A single failing component disqualifies the whole sample.
    pub fn admits(&self, channel: SensorChannel, components: &[f64]) -> bool {
        let bounds = self.bounds(channel);
        let admitted = components.iter().all(|value| {
            is_sane(*value)
                && bounds
                    .map(|bounds| bounds.contains(*value))
                    .unwrap_or(true)
        });
        if !admitted {
            debug!("{} sample rejected: {:?}", channel, components);
        }
        admitted
    }

    /// Geodetic sanity: latitude and longitude (decimal degrees) in range, altitude
    /// within [SanityBounds::altitude].
    pub fn admits_geodetic(&self, latitude: f64, longitude: f64, altitude: f64) -> bool {
        let admitted = is_sane(latitude)
            && is_sane(longitude)
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !admitted {
            debug!(
                "position sample rejected: lat={} lon={}",
                latitude, longitude
            );
            return false;
        }
        self.admits(SensorChannel::Position, &[altitude])
    }

    /// Verifies every [Bounds] is well formed
    pub fn validate(&self) -> Result<(), Error> {
        for channel in SensorChannel::ALL {
            if let Some(bounds) = self.bounds(channel) {
                if bounds.min.is_nan() || bounds.max.is_nan() || bounds.min > bounds.max {
                    return Err(Error::InvalidBounds(channel));
                }
            }
        }
        Ok(())
    }
}
