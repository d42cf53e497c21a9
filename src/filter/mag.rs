use log::debug;

use crate::{error::Error, filter::Filter, home::HomeReference, snapshot::StateSnapshot};

/// Magnetometer plausibility gate.
///
/// Compares the norm of the measured field to the norm of the local field
/// declared by the [HomeReference] (same unit expected). Readings deviating by
/// more than the relative tolerance are dropped for this cycle: they are most
/// likely disturbed by nearby currents or ferrous material.
#[derive(Debug, Clone)]
pub struct MagFilter {
    tolerance: f64,
    expected_norm: Option<f64>,
}

impl MagFilter {
    /// Builds a new [MagFilter] with relative `tolerance` (0.2 = ±20 %)
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            expected_norm: None,
        }
    }
}

impl Filter for MagFilter {
    fn initialize(&mut self) -> Result<(), Error> {
        self.expected_norm = None;
        Ok(())
    }

    fn update(&mut self, snapshot: &mut StateSnapshot) -> Result<(), Error> {
        let (mag, expected) = match (snapshot.magnetometer, self.expected_norm) {
            (Some(mag), Some(expected)) => (mag, expected),
            // nothing to compare against: pass through
            _ => return Ok(()),
        };

        let deviation = (mag.norm() / expected - 1.0).abs();
        if deviation > self.tolerance {
            debug!("magnetometer rejected: |B| deviates by {:.1}%", deviation * 100.0);
            snapshot.magnetometer = None;
        }
        Ok(())
    }

    fn on_home_changed(&mut self, home: &HomeReference) {
        let norm = home.magnetic_field.norm();
        self.expected_norm = if norm > 0.0 { Some(norm) } else { None };
    }
}
