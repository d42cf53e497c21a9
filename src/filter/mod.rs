//! Filter units and the [FilterChain] that drives them.
use itertools::Itertools;
use log::{error, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::Error, home::HomeReference, snapshot::StateSnapshot};

mod baro;
mod complementary;
mod mag;
mod stationary;

pub use baro::BaroFilter;
pub use complementary::ComplementaryFilter;
pub use mag::MagFilter;
pub use stationary::StationaryFilter;

use crate::cfg::FilterOpts;

/// Contract every filter unit satisfies.
///
/// Units are owned by the [FilterChain] and only ever invoked from the
/// estimation worker, so private state needs no synchronization.
pub trait Filter: Send {
    /// Prepares internal state. Called once, at start-up.
    fn initialize(&mut self) -> Result<(), Error>;

    /// Processes one cycle. Reads the valid fields of the [StateSnapshot] and may
    /// overwrite or invalidate any of them: downstream units see the result.
    fn update(&mut self, snapshot: &mut StateSnapshot) -> Result<(), Error>;

    /// A new [HomeReference] got accepted. Units holding position dependent state
    /// should re-bias or reset it here.
    fn on_home_changed(&mut self, home: &HomeReference) {
        let _ = home;
    }
}

/// Filter unit variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterKind {
    /// Magnetometer plausibility gate
    #[cfg_attr(feature = "serde", serde(alias = "mag"))]
    Magnetometer,
    /// Barometric offset / altitude filter
    #[cfg_attr(feature = "serde", serde(alias = "baro"))]
    Barometer,
    /// Forces a stationary vehicle (bench operation)
    Stationary,
    /// Complementary attitude filter (gyro + accelerometer)
    #[cfg_attr(feature = "serde", serde(alias = "cf"))]
    Complementary,
    /// Complementary attitude filter with magnetometer heading
    #[cfg_attr(feature = "serde", serde(alias = "cfm"))]
    ComplementaryMag,
    /// 13 state EKF
    Ekf13,
    /// 16 state EKF
    Ekf16,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Magnetometer => write!(f, "mag"),
            Self::Barometer => write!(f, "baro"),
            Self::Stationary => write!(f, "stationary"),
            Self::Complementary => write!(f, "cf"),
            Self::ComplementaryMag => write!(f, "cfm"),
            Self::Ekf13 => write!(f, "ekf13"),
            Self::Ekf16 => write!(f, "ekf16"),
        }
    }
}

impl std::str::FromStr for FilterKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mag" | "magnetometer" => Ok(Self::Magnetometer),
            "baro" | "barometer" => Ok(Self::Barometer),
            "stationary" => Ok(Self::Stationary),
            "cf" | "complementary" => Ok(Self::Complementary),
            "cfm" | "complementarymag" => Ok(Self::ComplementaryMag),
            "ekf13" => Ok(Self::Ekf13),
            "ekf16" => Ok(Self::Ekf16),
            _ => Err(Error::UnknownFilter),
        }
    }
}

/// Builds filter units from their [FilterKind].
pub trait FilterProvider {
    /// Returns a new unit of this kind, [None] when this provider cannot build it.
    fn provide(&self, kind: FilterKind) -> Option<Box<dyn Filter>>;
}

/// [FilterProvider] for the lightweight units shipped with this crate.
/// EKF units are not part of it: wrap it in your own provider to add them.
#[derive(Debug, Default, Clone)]
pub struct BuiltinFilters {
    opts: FilterOpts,
}

impl BuiltinFilters {
    pub fn new(opts: FilterOpts) -> Self {
        Self { opts }
    }
}

impl FilterProvider for BuiltinFilters {
    fn provide(&self, kind: FilterKind) -> Option<Box<dyn Filter>> {
        match kind {
            FilterKind::Magnetometer => Some(Box::new(MagFilter::new(self.opts.mag_tolerance))),
            FilterKind::Barometer => Some(Box::new(BaroFilter::new(
                self.opts.baro_init_samples,
                self.opts.baro_rebias_rate,
            ))),
            FilterKind::Stationary => Some(Box::new(StationaryFilter::default())),
            FilterKind::Complementary => Some(Box::new(ComplementaryFilter::new(
                self.opts.cf_accel_gain,
                None,
            ))),
            FilterKind::ComplementaryMag => Some(Box::new(ComplementaryFilter::new(
                self.opts.cf_accel_gain,
                Some(self.opts.cf_mag_gain),
            ))),
            FilterKind::Ekf13 | FilterKind::Ekf16 => None,
        }
    }
}

struct Unit {
    kind: FilterKind,
    filter: Box<dyn Filter>,
}

/// Ordered sequence of filter units.
///
/// Units run strictly in sequence, in configuration order: a unit sees every
/// modification its predecessors made to the [StateSnapshot]. A failing unit
/// never interrupts the traversal.
pub struct FilterChain {
    units: Vec<Unit>,
    init_failures: Vec<FilterKind>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("units", &self.kinds().collect::<Vec<_>>())
            .field("init_failures", &self.init_failures)
            .finish()
    }
}

impl FilterChain {
    /// Builds and initializes the [FilterChain], in this order.
    /// Initialization failures are reported but the unit remains in the chain.
    pub fn build(kinds: &[FilterKind], provider: &dyn FilterProvider) -> Result<Self, Error> {
        if kinds.is_empty() {
            return Err(Error::EmptyFilterChain);
        }
        if let Some(kind) = kinds.iter().duplicates().next() {
            return Err(Error::DuplicateFilter(*kind));
        }

        let mut units = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let filter = provider
                .provide(*kind)
                .ok_or(Error::FilterUnavailable(*kind))?;
            units.push(Unit {
                kind: *kind,
                filter,
            });
        }

        let mut init_failures = Vec::new();
        for unit in units.iter_mut() {
            if let Err(e) = unit.filter.initialize() {
                error!("{} initialization failure: {}", unit.kind, e);
                init_failures.push(unit.kind);
            }
        }

        info!("filter chain: {}", kinds.iter().join(" -> "));

        Ok(Self {
            units,
            init_failures,
        })
    }

    /// Runs one cycle through every unit, in order.
    /// Returns the units that reported a failure, with their [Error].
    pub fn update(&mut self, snapshot: &mut StateSnapshot) -> Vec<(FilterKind, Error)> {
        let mut failures = Vec::new();
        for unit in self.units.iter_mut() {
            if let Err(e) = unit.filter.update(snapshot) {
                error!("{} update failure: {}", unit.kind, e);
                failures.push((unit.kind, e));
            }
        }
        failures
    }

    /// Forwards a new [HomeReference] to every unit
    pub fn on_home_changed(&mut self, home: &HomeReference) {
        for unit in self.units.iter_mut() {
            unit.filter.on_home_changed(home);
        }
    }

    /// [FilterKind]s in chain order
    pub fn kinds(&self) -> impl Iterator<Item = FilterKind> + '_ {
        self.units.iter().map(|unit| unit.kind)
    }

    /// Units that failed to initialize and run in degraded mode
    pub fn init_failures(&self) -> &[FilterKind] {
        &self.init_failures
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
