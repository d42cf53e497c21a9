use log::{debug, info};

use crate::{
    averager::Averager,
    error::Error,
    filter::{Filter, FilterKind},
    snapshot::StateSnapshot,
};

/// Barometric altitude filter.
///
/// The first samples are averaged to learn the barometric offset, and the
/// barometer is withheld from the snapshot until then. Afterwards the published
/// barometer is the altitude relative to that offset. Whenever a valid position
/// is available, the offset slowly tracks the GPS altitude to cancel drift.
#[derive(Debug, Clone)]
pub struct BaroFilter {
    averager: Averager,
    init_samples: u64,
    rebias_rate: f64,
    offset: Option<f64>,
}

impl BaroFilter {
    /// Builds a new [BaroFilter].
    /// - init_samples: number of samples averaged to learn the offset
    /// - rebias_rate: per cycle weight of the GPS altitude in the offset, in [0, 1]
    pub fn new(init_samples: u64, rebias_rate: f64) -> Self {
        Self {
            init_samples,
            rebias_rate,
            offset: None,
            averager: Averager::default(),
        }
    }

    /// Learned barometric offset
    pub fn offset(&self) -> Option<f64> {
        self.offset
    }
}

impl Filter for BaroFilter {
    fn initialize(&mut self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.rebias_rate) {
            return Err(Error::FilterInitialization(FilterKind::Barometer));
        }
        self.averager.reset();
        self.offset = None;
        Ok(())
    }

    fn update(&mut self, snapshot: &mut StateSnapshot) -> Result<(), Error> {
        let altitude = match snapshot.barometer {
            Some(altitude) => altitude,
            None => return Ok(()),
        };

        let offset = match self.offset {
            Some(offset) => offset,
            None => {
                self.averager.add(altitude);
                snapshot.barometer = None;
                if self.averager.count() >= self.init_samples.max(1) {
                    let offset = self.averager.mean().unwrap_or(altitude);
                    info!("barometric offset {:.3}m", offset);
                    self.offset = Some(offset);
                } else {
                    debug!("baro offset init {}/{}", self.averager.count(), self.init_samples);
                }
                return Ok(());
            },
        };

        let offset = match snapshot.position {
            // NED: altitude above home is -down
            Some(position) => {
                (1.0 - self.rebias_rate) * offset + self.rebias_rate * (altitude + position[2])
            },
            None => offset,
        };

        self.offset = Some(offset);
        snapshot.barometer = Some(altitude - offset);
        Ok(())
    }
}
