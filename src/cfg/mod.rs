use hifitime::Duration;
use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::DEFAULT_TIMEOUT_MS,
    error::Error,
    filter::FilterKind,
    sanity::SanityBounds,
};

fn default_timeout() -> Duration {
    Duration::from_milliseconds(DEFAULT_TIMEOUT_MS)
}

fn default_filters() -> Vec<FilterKind> {
    vec![
        FilterKind::Magnetometer,
        FilterKind::Barometer,
        FilterKind::ComplementaryMag,
    ]
}

fn default_sanity() -> SanityBounds {
    SanityBounds::default()
}

fn default_cf_accel_gain() -> f64 {
    0.5
}

fn default_cf_mag_gain() -> f64 {
    0.1
}

fn default_mag_tolerance() -> f64 {
    0.2
}

fn default_baro_init_samples() -> u64 {
    100
}

fn default_baro_rebias_rate() -> f64 {
    1.0E-3
}

/// Tuning of the builtin filter units
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterOpts {
    /// Complementary filter: accelerometer (tilt) feedback gain (s⁻¹)
    #[cfg_attr(feature = "serde", serde(default = "default_cf_accel_gain"))]
    pub cf_accel_gain: f64,
    /// Complementary filter: magnetometer (heading) feedback gain (s⁻¹)
    #[cfg_attr(feature = "serde", serde(default = "default_cf_mag_gain"))]
    pub cf_mag_gain: f64,
    /// Magnetometer gate: max. relative deviation of |B| from the home field
    #[cfg_attr(feature = "serde", serde(default = "default_mag_tolerance"))]
    pub mag_tolerance: f64,
    /// Barometer: number of samples averaged to learn the offset
    #[cfg_attr(feature = "serde", serde(default = "default_baro_init_samples"))]
    pub baro_init_samples: u64,
    /// Barometer: per cycle weight of the GPS altitude in the offset
    #[cfg_attr(feature = "serde", serde(default = "default_baro_rebias_rate"))]
    pub baro_rebias_rate: f64,
}

impl Default for FilterOpts {
    fn default() -> Self {
        Self {
            cf_accel_gain: default_cf_accel_gain(),
            cf_mag_gain: default_cf_mag_gain(),
            mag_tolerance: default_mag_tolerance(),
            baro_init_samples: default_baro_init_samples(),
            baro_rebias_rate: default_baro_rebias_rate(),
        }
    }
}

/// Estimation [Config]uration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Maximal time between two cycles. A cycle that runs because this
    /// elapsed without any new sensor data raises the health alarm.
    #[cfg_attr(feature = "serde", serde(default = "default_timeout"))]
    pub timeout: Duration,
    /// Filter units, in chain order. Start-up only.
    #[cfg_attr(feature = "serde", serde(default = "default_filters"))]
    pub filters: Vec<FilterKind>,
    /// Per channel [SanityBounds]
    #[cfg_attr(feature = "serde", serde(default = "default_sanity"))]
    pub sanity: SanityBounds,
    /// Builtin [FilterOpts]
    #[cfg_attr(feature = "serde", serde(default))]
    pub filter_opts: FilterOpts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            filters: default_filters(),
            sanity: default_sanity(),
            filter_opts: FilterOpts::default(),
        }
    }
}

impl Config {
    /// Copies and returns [Config] with updated timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut s = self.clone();
        s.timeout = timeout;
        s
    }

    /// Copies and returns [Config] with updated filter chain
    pub fn with_filters(&self, filters: &[FilterKind]) -> Self {
        let mut s = self.clone();
        s.filters = filters.to_vec();
        s
    }

    /// Copies and returns [Config] with updated [SanityBounds]
    pub fn with_sanity(&self, sanity: SanityBounds) -> Self {
        let mut s = self.clone();
        s.sanity = sanity;
        s
    }

    /// Timeout, as [std::time::Duration]. Only meaningful on a validated [Config].
    pub(crate) fn std_timeout(&self) -> std::time::Duration {
        let nanos = u64::try_from(self.timeout.total_nanoseconds()).unwrap_or(0);
        std::time::Duration::from_nanos(nanos)
    }

    /// Verifies this [Config] is usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.timeout <= Duration::ZERO
            || u64::try_from(self.timeout.total_nanoseconds()).is_err()
        {
            return Err(Error::InvalidTimeout);
        }
        if self.filters.is_empty() {
            return Err(Error::EmptyFilterChain);
        }
        if let Some(kind) = self.filters.iter().duplicates().next() {
            return Err(Error::DuplicateFilter(*kind));
        }
        self.sanity.validate()
    }
}
