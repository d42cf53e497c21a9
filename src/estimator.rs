//! Estimation front end: [StateEstimation] ties the sensor aggregator, the
//! scheduler and the filter chain together.
use std::{
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Instant,
};

use hifitime::{Duration, Epoch};
use log::{debug, error, info, warn};

use crate::{
    aggregator::SensorAggregator,
    alarm::{AlarmSeverity, AlarmSink, HealthAlarm},
    cfg::Config,
    channel::{SensorChannel, SensorSet},
    error::Error,
    filter::{BuiltinFilters, FilterChain, FilterKind, FilterProvider},
    home::{HomeReference, Linearizer},
    samples::SensorSource,
    sanity::SanityBounds,
    scheduler::{EstimationScheduler, Trigger},
    snapshot::StateSnapshot,
};

/// Receives the final [StateSnapshot] of every cycle.
pub trait EstimatePublisher: Send {
    /// Publishes the outcome of this estimation cycle.
    fn publish(&mut self, cycle: u64, state: &StateSnapshot);
}

/// Summary of one estimation cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Cycle number, starting at 1
    pub cycle: u64,
    /// What triggered this cycle
    pub trigger: Trigger,
    /// Channels drained from the dirty set
    pub drained: SensorSet,
    /// Channels that passed the sanity gate
    pub admitted: SensorSet,
    /// Units that failed during this cycle
    pub failures: Vec<(FilterKind, Error)>,
    /// Alarm state at the end of this cycle
    pub alarm: Option<AlarmSeverity>,
}

/// Requests posted from other contexts, applied at the next cycle start.
#[derive(Default)]
struct Pending {
    home: Mutex<Option<HomeReference>>,
    settings: Mutex<Option<Config>>,
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

fn post<T>(slot: &Mutex<Option<T>>, value: T) {
    match slot.lock() {
        Ok(mut guard) => *guard = Some(value),
        Err(poisoned) => *poisoned.into_inner() = Some(value),
    }
}

/// Everything the estimation worker owns.
struct Worker {
    cycle: u64,
    last_cycle: Option<Instant>,
    filters: Vec<FilterKind>,
    sanity: SanityBounds,
    chain: FilterChain,
    linearizer: Linearizer,
    alarm: HealthAlarm,
    scheduler: EstimationScheduler,
    aggregator: SensorAggregator,
    source: Box<dyn SensorSource>,
    publisher: Box<dyn EstimatePublisher>,
    pending: Arc<Pending>,
}

impl Worker {
    fn apply_pending(&mut self) {
        if let Some(cfg) = take(&self.pending.settings) {
            if cfg.filters != self.filters {
                warn!("filter chain can only be defined at start-up: new chain ignored");
            }
            self.sanity = cfg.sanity;
            self.scheduler.set_timeout(cfg.std_timeout());
            info!("settings updated (timeout={})", cfg.timeout);
        }

        if let Some(home) = take(&self.pending.home) {
            if self.linearizer.update(home) {
                self.chain.on_home_changed(&home);
            }
        }
    }

    fn elapsed(&mut self) -> Duration {
        let now = Instant::now();
        let dt = self
            .last_cycle
            .map(|last| Duration::from_seconds(now.duration_since(last).as_secs_f64()))
            .unwrap_or_default();
        self.last_cycle = Some(now);
        dt
    }

    fn run_cycle(&mut self, trigger: Trigger) -> CycleReport {
        self.scheduler.discard_pending();
        self.apply_pending();

        let drained = self.aggregator.drain_for_cycle();
        self.cycle += 1;

        debug!("cycle #{} ({}): drained={}", self.cycle, trigger, drained);
        if drained.is_empty() {
            self.alarm.raise(AlarmSeverity::Warning);
        }

        let mut snapshot = StateSnapshot::build(
            drained,
            self.source.as_ref(),
            &self.sanity,
            &self.linearizer,
        );
        snapshot.t = Epoch::now().unwrap_or_default();
        snapshot.dt = self.elapsed();

        let admitted = snapshot.updated();
        if admitted != drained {
            debug!("cycle #{}: admitted={}", self.cycle, admitted);
        }

        let failures = self.chain.update(&mut snapshot);
        if !failures.is_empty() {
            self.alarm.raise(AlarmSeverity::Error);
        } else if !drained.is_empty() {
            self.alarm.clear();
        }

        self.publisher.publish(self.cycle, &snapshot);

        CycleReport {
            trigger,
            drained,
            admitted,
            failures,
            cycle: self.cycle,
            alarm: self.alarm.severity(),
        }
    }

    /// Worker main loop, returns once shutdown is requested.
    fn run(mut self) -> Self {
        info!("estimation worker started");
        loop {
            if self.aggregator.shutdown_requested() {
                break;
            }
            let trigger = self.scheduler.wait();
            if trigger == Trigger::Shutdown || self.aggregator.shutdown_requested() {
                break;
            }
            if trigger == Trigger::Update && self.aggregator.pending().is_empty() {
                // notification consumed by the previous cycle already
                continue;
            }
            self.run_cycle(trigger);
        }
        info!("estimation worker stopped after {} cycles", self.cycle);
        self
    }
}

enum State {
    Idle(Box<Worker>),
    Running(JoinHandle<Box<Worker>>),
    Poisoned,
}

/// [StateEstimation] is the state estimation front end.
///
/// Sensor producers notify new samples through [Self::on_sensor_updated] (or a
/// cloned [SensorAggregator] handle). Each estimation cycle then drains the
/// updated channels, builds a sanity checked [StateSnapshot] and runs it
/// through the [FilterChain]. Cycles run either on a background worker
/// ([Self::start]) or synchronously ([Self::run_cycle]).
pub struct StateEstimation {
    aggregator: SensorAggregator,
    pending: Arc<Pending>,
    state: State,
}

impl StateEstimation {
    /// Builds a new [StateEstimation] with the units of this [FilterProvider].
    ///
    /// Fails when the [Config] is invalid, or when a configured unit is
    /// not available. Unit initialization failures are not fatal.
    pub fn new(
        cfg: Config,
        provider: &dyn FilterProvider,
        source: Box<dyn SensorSource>,
        alarm: Box<dyn AlarmSink>,
        publisher: Box<dyn EstimatePublisher>,
    ) -> Result<Self, Error> {
        cfg.validate()?;

        let mut chain = FilterChain::build(&cfg.filters, provider)?;

        let mut linearizer = Linearizer::default();
        match source.home_reference() {
            Some(home) => {
                if linearizer.update(home) {
                    chain.on_home_changed(&home);
                }
            },
            None => debug!("no home reference at start-up"),
        }

        let (aggregator, wake) = SensorAggregator::new();
        let pending = Arc::new(Pending::default());

        let worker = Worker {
            chain,
            linearizer,
            source,
            publisher,
            cycle: 0,
            last_cycle: None,
            sanity: cfg.sanity,
            filters: cfg.filters.clone(),
            alarm: HealthAlarm::new(alarm),
            scheduler: EstimationScheduler::new(wake, cfg.std_timeout()),
            aggregator: aggregator.clone(),
            pending: Arc::clone(&pending),
        };

        Ok(Self {
            aggregator,
            pending,
            state: State::Idle(Box::new(worker)),
        })
    }

    /// Builds a new [StateEstimation] from the [BuiltinFilters] only.
    pub fn builtin(
        cfg: Config,
        source: Box<dyn SensorSource>,
        alarm: Box<dyn AlarmSink>,
        publisher: Box<dyn EstimatePublisher>,
    ) -> Result<Self, Error> {
        let provider = BuiltinFilters::new(cfg.filter_opts.clone());
        Self::new(cfg, &provider, source, alarm, publisher)
    }

    /// Notifies a new sample on this [SensorChannel]. Never blocks.
    pub fn on_sensor_updated(&self, channel: SensorChannel) {
        self.aggregator.on_sensor_updated(channel);
    }

    /// Returns a [SensorAggregator] handle, to notify from other contexts.
    pub fn aggregator(&self) -> SensorAggregator {
        self.aggregator.clone()
    }

    /// Posts a new [HomeReference]. It is validated and takes effect at the
    /// next cycle start; an invalid reference leaves the current one in place.
    pub fn on_home_reference_changed(&self, home: HomeReference) {
        post(&self.pending.home, home);
    }

    /// Posts new settings. Sanity bounds and timeout take effect at the next
    /// cycle start. The filter chain cannot change after start-up.
    pub fn on_filter_settings_changed(&self, cfg: Config) {
        match cfg.validate() {
            Ok(()) => post(&self.pending.settings, cfg),
            Err(e) => error!("rejected filter settings: {}", e),
        }
    }

    /// Runs one estimation cycle synchronously, in the calling context.
    /// Fails with [Error::AlreadyRunning] while the background worker runs.
    pub fn run_cycle(&mut self, trigger: Trigger) -> Result<CycleReport, Error> {
        match &mut self.state {
            State::Idle(worker) => Ok(worker.run_cycle(trigger)),
            State::Running(_) => Err(Error::AlreadyRunning),
            State::Poisoned => Err(Error::WorkerPanic),
        }
    }

    /// Spawns the background estimation worker.
    pub fn start(&mut self) -> Result<(), Error> {
        let worker = match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Idle(worker) => worker,
            State::Running(handle) => {
                self.state = State::Running(handle);
                return Err(Error::AlreadyRunning);
            },
            State::Poisoned => return Err(Error::WorkerPanic),
        };

        self.aggregator.clear_shutdown();

        // the worker is lost if spawning fails
        let handle = thread::Builder::new()
            .name("state-estimation".to_string())
            .spawn(move || {
                let worker = *worker;
                Box::new(worker.run())
            })
            .map_err(|e| {
                error!("failed to spawn estimation worker: {}", e);
                Error::WorkerSpawn
            })?;

        self.state = State::Running(handle);
        Ok(())
    }

    /// Stops the background worker, once its current cycle completes.
    /// No-op when the worker is not running.
    pub fn stop(&mut self) -> Result<(), Error> {
        match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Running(handle) => {
                self.aggregator.request_shutdown();
                let worker = handle.join().map_err(|_| {
                    error!("estimation worker panicked");
                    Error::WorkerPanic
                })?;
                self.aggregator.clear_shutdown();
                self.state = State::Idle(worker);
                Ok(())
            },
            State::Idle(worker) => {
                self.state = State::Idle(worker);
                Ok(())
            },
            State::Poisoned => Err(Error::WorkerPanic),
        }
    }

    /// Returns true while the background worker runs
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Filter chain, in order. [None] while the worker runs.
    pub fn filters(&self) -> Option<Vec<FilterKind>> {
        match &self.state {
            State::Idle(worker) => Some(worker.chain.kinds().collect()),
            _ => None,
        }
    }

    /// Current [HomeReference]. [None] while the worker runs.
    pub fn home(&self) -> Option<HomeReference> {
        match &self.state {
            State::Idle(worker) => worker.linearizer.home().copied(),
            _ => None,
        }
    }
}

impl Drop for StateEstimation {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.stop() {
                error!("{}", e);
            }
        }
    }
}
