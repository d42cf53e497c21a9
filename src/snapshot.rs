use hifitime::{Duration, Epoch};
use log::debug;
use nalgebra::{UnitQuaternion, Vector3};

use crate::{
    channel::{SensorChannel, SensorSet},
    home::{is_degenerate, Linearizer},
    samples::SensorSource,
    sanity::{is_sane, SanityBounds},
};

/// Per cycle view of the vehicle state.
///
/// Built fresh at the start of every estimation cycle from the drained dirty
/// set, then handed to each filter unit in chain order. A field is [Some] only
/// when it holds a valid value for this cycle: filters must not assume a
/// channel is present and may invalidate or overwrite any field.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    /// Cycle [Epoch]
    pub t: Epoch,
    /// Time elapsed since previous cycle
    pub dt: Duration,
    /// Angular rate (rad.s⁻¹, body)
    pub gyroscope: Option<Vector3<f64>>,
    /// Specific force (m.s⁻², body)
    pub accelerometer: Option<Vector3<f64>>,
    /// Magnetic field (body)
    pub magnetometer: Option<Vector3<f64>>,
    /// Position relative to home (NED, m)
    pub position: Option<Vector3<f64>>,
    /// Velocity (NED, m.s⁻¹)
    pub velocity: Option<Vector3<f64>>,
    /// Barometric altitude (m)
    pub barometer: Option<f64>,
    /// Calibrated airspeed (m.s⁻¹)
    pub airspeed: Option<f64>,
    /// Attitude estimate (body to NED), produced by attitude filters
    pub attitude: Option<UnitQuaternion<f64>>,
}

impl StateSnapshot {
    /// Populates a [StateSnapshot] with the channels of this `drained` set.
    /// Each channel is read from the [SensorSource] and admitted only when all its
    /// components pass the [SanityBounds]. Channels that fail are simply left
    /// invalid for this cycle.
    pub fn build(
        drained: SensorSet,
        source: &dyn SensorSource,
        sanity: &SanityBounds,
        linearizer: &Linearizer,
    ) -> Self {
        let mut s = Self::default();

        for channel in drained.iter() {
            match channel {
                SensorChannel::Gyroscope => {
                    s.gyroscope = source
                        .gyroscope()
                        .filter(|sample| sanity.admits(channel, &sample.components()))
                        .map(|sample| sample.to_vector());
                },
                SensorChannel::Accelerometer => {
                    s.accelerometer = source
                        .accelerometer()
                        .filter(|sample| sanity.admits(channel, &sample.components()))
                        .map(|sample| sample.to_vector());
                },
                SensorChannel::Magnetometer => {
                    s.magnetometer = source
                        .magnetometer()
                        .filter(|sample| sanity.admits(channel, &sample.components()))
                        .map(|sample| sample.to_vector());
                },
                SensorChannel::Velocity => {
                    s.velocity = source
                        .gps_velocity()
                        .filter(|sample| sanity.admits(channel, &sample.components()))
                        .map(|sample| Vector3::new(sample.north, sample.east, sample.down));
                },
                SensorChannel::Barometer => {
                    s.barometer = source
                        .barometer()
                        .filter(|sample| sanity.admits(channel, &[sample.altitude]))
                        .map(|sample| sample.altitude);
                },
                SensorChannel::Airspeed => {
                    s.airspeed = source
                        .airspeed()
                        .filter(|sample| {
                            if !sample.connected {
                                debug!("airspeed sensor disconnected");
                            }
                            sample.connected
                                && sanity.admits(channel, &[sample.calibrated_airspeed])
                        })
                        .map(|sample| sample.calibrated_airspeed);
                },
                SensorChannel::Position => {
                    if !linearizer.is_valid() {
                        debug!("position ignored: no valid home reference");
                        continue;
                    }
                    s.position = source
                        .gps_position()
                        .filter(|sample| {
                            sanity.admits_geodetic(
                                sample.latitude,
                                sample.longitude,
                                sample.altitude,
                            ) && is_sane(sample.geoid_separation)
                                && !is_degenerate(sample)
                        })
                        .and_then(|sample| linearizer.to_ned(&sample));
                },
            }
        }
        s
    }

    /// Returns the [SensorSet] of channels that are valid in this snapshot.
    pub fn updated(&self) -> SensorSet {
        let mut set = SensorSet::empty();
        if self.gyroscope.is_some() {
            set.insert(SensorChannel::Gyroscope);
        }
        if self.accelerometer.is_some() {
            set.insert(SensorChannel::Accelerometer);
        }
        if self.magnetometer.is_some() {
            set.insert(SensorChannel::Magnetometer);
        }
        if self.position.is_some() {
            set.insert(SensorChannel::Position);
        }
        if self.velocity.is_some() {
            set.insert(SensorChannel::Velocity);
        }
        if self.barometer.is_some() {
            set.insert(SensorChannel::Barometer);
        }
        if self.airspeed.is_some() {
            set.insert(SensorChannel::Airspeed);
        }
        set
    }

    /// Marks this channel invalid for the remainder of the cycle.
    pub fn invalidate(&mut self, channel: SensorChannel) {
        match channel {
            SensorChannel::Gyroscope => self.gyroscope = None,
            SensorChannel::Accelerometer => self.accelerometer = None,
            SensorChannel::Magnetometer => self.magnetometer = None,
            SensorChannel::Position => self.position = None,
            SensorChannel::Velocity => self.velocity = None,
            SensorChannel::Barometer => self.barometer = None,
            SensorChannel::Airspeed => self.airspeed = None,
        }
    }
}
