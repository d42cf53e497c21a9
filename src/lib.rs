#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod aggregator;
mod alarm;
mod averager;
mod cfg;
mod channel;
mod constants;
mod error;
mod estimator;
mod filter;
mod home;
mod samples;
mod sanity;
mod scheduler;
mod snapshot;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::aggregator::SensorAggregator;
    pub use crate::alarm::{AlarmSeverity, AlarmSink, HealthAlarm};
    pub use crate::cfg::{Config, FilterOpts};
    pub use crate::channel::{SensorChannel, SensorSet};
    pub use crate::error::Error;
    pub use crate::estimator::{CycleReport, EstimatePublisher, StateEstimation};
    pub use crate::filter::{
        BaroFilter, BuiltinFilters, ComplementaryFilter, Filter, FilterChain, FilterKind,
        FilterProvider, MagFilter, StationaryFilter,
    };
    pub use crate::home::{HomeReference, LinearizationMatrix, Linearizer};
    pub use crate::samples::{
        AirspeedSample, BaroSample, GpsPosition, GpsVelocity, SensorSource, Triaxial,
    };
    pub use crate::sanity::{Bounds, SanityBounds};
    pub use crate::scheduler::Trigger;
    pub use crate::snapshot::StateSnapshot;
    // re-export
    pub use hifitime::{Duration, Epoch};
    pub use nalgebra::{UnitQuaternion, Vector3};
}

// pub export
pub use error::Error;
