use hifitime::Duration;
use log::debug;
use nalgebra::{UnitQuaternion, Vector3};

use crate::{error::Error, filter::Filter, sanity::is_sane, snapshot::StateSnapshot};

/// Complementary attitude filter.
///
/// Gyro rates are integrated at high frequency while the accelerometer (tilt)
/// and optionally the magnetometer (heading) slowly pull the attitude back,
/// through proportional feedback on the direction errors.
/// Accelerometer convention: specific force, a level vehicle at rest
/// measures (0, 0, -g).
#[derive(Debug, Clone)]
pub struct ComplementaryFilter {
    accel_gain: f64,
    mag_gain: Option<f64>,
    attitude: Option<UnitQuaternion<f64>>,
    /// Time elapsed since the last integrated gyro sample
    elapsed: Duration,
}

impl ComplementaryFilter {
    /// Builds a new [ComplementaryFilter]. Heading is corrected only when
    /// `mag_gain` is provided.
    pub fn new(accel_gain: f64, mag_gain: Option<f64>) -> Self {
        Self {
            accel_gain,
            mag_gain,
            attitude: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Current attitude (body to NED)
    pub fn attitude(&self) -> Option<UnitQuaternion<f64>> {
        self.attitude
    }

    /// Coarse attitude from a single accelerometer (and magnetometer) reading
    fn align(accel: &Vector3<f64>, mag: Option<&Vector3<f64>>) -> Option<UnitQuaternion<f64>> {
        if accel.norm() <= f64::EPSILON {
            return None;
        }
        let roll = (-accel[1]).atan2(-accel[2]);
        let pitch = accel[0].atan2((accel[1].powi(2) + accel[2].powi(2)).sqrt());
        let tilt = UnitQuaternion::from_euler_angles(roll, pitch, 0.0);

        let yaw = match mag {
            Some(mag) => {
                let leveled = tilt * mag;
                (-leveled[1]).atan2(leveled[0])
            },
            None => 0.0,
        };
        Some(UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    /// Heading error, expressed in body frame
    fn heading_error(attitude: &UnitQuaternion<f64>, mag: &Vector3<f64>) -> Vector3<f64> {
        let measured = mag.normalize();
        let h = attitude * measured;
        // reference field: horizontal part due north
        let reference = Vector3::new((h[0].powi(2) + h[1].powi(2)).sqrt(), 0.0, h[2]);
        let predicted = attitude.inverse() * reference;
        measured.cross(&predicted)
    }
}

impl Filter for ComplementaryFilter {
    fn initialize(&mut self) -> Result<(), Error> {
        self.attitude = None;
        self.elapsed = Duration::ZERO;
        Ok(())
    }

    fn update(&mut self, snapshot: &mut StateSnapshot) -> Result<(), Error> {
        self.elapsed += snapshot.dt;

        let mag = match self.mag_gain {
            Some(_) => snapshot.magnetometer.filter(|m| m.norm() > f64::EPSILON),
            None => None,
        };

        let attitude = match self.attitude {
            Some(attitude) => attitude,
            None => {
                if let Some(accel) = snapshot.accelerometer {
                    self.attitude = Self::align(&accel, mag.as_ref());
                    if self.attitude.is_some() {
                        debug!("attitude aligned");
                    }
                    self.elapsed = Duration::ZERO;
                }
                snapshot.attitude = self.attitude;
                return Ok(());
            },
        };

        let gyro = match snapshot.gyroscope {
            Some(gyro) => gyro,
            None => {
                snapshot.attitude = Some(attitude);
                return Ok(());
            },
        };

        let mut omega = gyro;

        if let Some(accel) = snapshot.accelerometer {
            if accel.norm() > f64::EPSILON {
                let measured = accel.normalize();
                let predicted = attitude.inverse() * Vector3::new(0.0, 0.0, -1.0);
                omega += measured.cross(&predicted) * self.accel_gain;
            }
        }

        if let (Some(mag), Some(gain)) = (mag, self.mag_gain) {
            omega += Self::heading_error(&attitude, &mag) * gain;
        }

        // cycles without gyro data are integrated at the next gyro sample
        let dt = self.elapsed.to_seconds();
        self.elapsed = Duration::ZERO;

        let updated = if dt > 0.0 {
            attitude * UnitQuaternion::from_scaled_axis(omega * dt)
        } else {
            attitude
        };

        if !omega.iter().all(|w| is_sane(*w)) || !updated.coords.iter().all(|q| is_sane(*q)) {
            self.attitude = None;
            snapshot.attitude = None;
            return Err(Error::Diverged);
        }

        self.attitude = Some(updated);
        snapshot.attitude = self.attitude;
        Ok(())
    }
}
