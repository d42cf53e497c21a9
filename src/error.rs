use thiserror::Error;

use crate::{channel::SensorChannel, filter::FilterKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The [FilterProvider](crate::prelude::FilterProvider) in use cannot build
    /// this kind of unit. EKF variants must be supplied externally.
    #[error("filter unit {0} is not available from this provider")]
    FilterUnavailable(FilterKind),

    /// Each unit may appear only once in the chain.
    #[error("filter unit {0} appears more than once in the chain")]
    DuplicateFilter(FilterKind),

    #[error("filter chain is empty")]
    EmptyFilterChain,

    /// A unit failed to prepare its internal state. Non fatal: the unit
    /// still takes part in every cycle.
    #[error("filter unit {0} failed to initialize")]
    FilterInitialization(FilterKind),

    /// A filter unit requires a channel that is not valid for this cycle.
    #[error("missing {0} sample")]
    MissingSample(SensorChannel),

    /// A filter unit diverged (non finite internal state).
    #[error("filter unit diverged")]
    Diverged,

    #[error("timeout must be strictly positive and representable in nanoseconds")]
    InvalidTimeout,

    #[error("invalid sanity bounds for {0}: min > max")]
    InvalidBounds(SensorChannel),

    #[error("unknown filter unit")]
    UnknownFilter,

    #[error("unknown sensor channel")]
    UnknownChannel,

    #[error("estimation worker is already running")]
    AlreadyRunning,

    #[error("failed to spawn estimation worker")]
    WorkerSpawn,

    #[error("estimation worker panicked")]
    WorkerPanic,
}
