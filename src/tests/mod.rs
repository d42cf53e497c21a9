mod chain;

use crate::prelude::{
    AirspeedSample, AlarmSeverity, AlarmSink, BaroSample, BuiltinFilters, Error,
    EstimatePublisher, Filter, FilterKind, FilterProvider, GpsPosition, GpsVelocity,
    HomeReference, SensorSource, StateSnapshot, Triaxial, Vector3,
};

use log::LevelFilter;
use std::{
    sync::{Arc, Mutex, Once},
    time::Instant,
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Latest sample of every channel
#[derive(Default, Debug, Clone)]
pub struct Samples {
    pub gyroscope: Option<Triaxial>,
    pub accelerometer: Option<Triaxial>,
    pub magnetometer: Option<Triaxial>,
    pub gps_position: Option<GpsPosition>,
    pub gps_velocity: Option<GpsVelocity>,
    pub barometer: Option<BaroSample>,
    pub airspeed: Option<AirspeedSample>,
    pub home: Option<HomeReference>,
}

/// Shared sensor bus: tests keep a clone to publish samples.
#[derive(Default, Clone)]
pub struct TestSource(Arc<Mutex<Samples>>);

impl TestSource {
    pub fn set<F: FnOnce(&mut Samples)>(&self, f: F) {
        f(&mut self.0.lock().unwrap());
    }
}

impl SensorSource for TestSource {
    fn gyroscope(&self) -> Option<Triaxial> {
        self.0.lock().unwrap().gyroscope
    }
    fn accelerometer(&self) -> Option<Triaxial> {
        self.0.lock().unwrap().accelerometer
    }
    fn magnetometer(&self) -> Option<Triaxial> {
        self.0.lock().unwrap().magnetometer
    }
    fn gps_position(&self) -> Option<GpsPosition> {
        self.0.lock().unwrap().gps_position
    }
    fn gps_velocity(&self) -> Option<GpsVelocity> {
        self.0.lock().unwrap().gps_velocity
    }
    fn barometer(&self) -> Option<BaroSample> {
        self.0.lock().unwrap().barometer
    }
    fn airspeed(&self) -> Option<AirspeedSample> {
        self.0.lock().unwrap().airspeed
    }
    fn home_reference(&self) -> Option<HomeReference> {
        self.0.lock().unwrap().home
    }
}

/// Records alarm calls
#[derive(Default, Clone)]
pub struct AlarmRecorder(Arc<Mutex<Vec<Option<AlarmSeverity>>>>);

impl AlarmRecorder {
    /// Alarm state, as last signaled
    pub fn state(&self) -> Option<AlarmSeverity> {
        self.0.lock().unwrap().last().copied().flatten()
    }

    pub fn calls(&self) -> Vec<Option<AlarmSeverity>> {
        self.0.lock().unwrap().clone()
    }
}

impl AlarmSink for AlarmRecorder {
    fn raise(&mut self, severity: AlarmSeverity) {
        self.0.lock().unwrap().push(Some(severity));
    }
    fn clear(&mut self) {
        self.0.lock().unwrap().push(None);
    }
}

/// Records published estimates, with their publication [Instant]
#[derive(Default, Clone)]
pub struct PublishRecorder(Arc<Mutex<Vec<(u64, StateSnapshot)>>>, Arc<Mutex<Vec<Instant>>>);

impl PublishRecorder {
    pub fn published(&self) -> Vec<(u64, StateSnapshot)> {
        self.0.lock().unwrap().clone()
    }

    pub fn instants(&self) -> Vec<Instant> {
        self.1.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<StateSnapshot> {
        self.0.lock().unwrap().last().map(|(_, s)| s.clone())
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl EstimatePublisher for PublishRecorder {
    fn publish(&mut self, cycle: u64, state: &StateSnapshot) {
        self.1.lock().unwrap().push(Instant::now());
        self.0.lock().unwrap().push((cycle, state.clone()));
    }
}

/// Shared log of filter invocations: (unit, event)
pub type Journal = Arc<Mutex<Vec<(FilterKind, &'static str)>>>;

/// Scripted filter unit
pub struct ScriptedFilter {
    kind: FilterKind,
    journal: Journal,
    fail_init: bool,
    fail_update: bool,
    action: fn(&mut StateSnapshot) -> Result<(), Error>,
}

impl ScriptedFilter {
    pub fn new(kind: FilterKind, journal: Journal) -> Self {
        Self {
            kind,
            journal,
            fail_init: false,
            fail_update: false,
            action: |_| Ok(()),
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_update(mut self) -> Self {
        self.fail_update = true;
        self
    }

    pub fn with_action(mut self, action: fn(&mut StateSnapshot) -> Result<(), Error>) -> Self {
        self.action = action;
        self
    }

    fn log(&self, event: &'static str) {
        self.journal.lock().unwrap().push((self.kind, event));
    }
}

impl Filter for ScriptedFilter {
    fn initialize(&mut self) -> Result<(), Error> {
        self.log("init");
        if self.fail_init {
            Err(Error::FilterInitialization(self.kind))
        } else {
            Ok(())
        }
    }

    fn update(&mut self, snapshot: &mut StateSnapshot) -> Result<(), Error> {
        self.log("update");
        if self.fail_update {
            return Err(Error::Diverged);
        }
        (self.action)(snapshot)
    }

    fn on_home_changed(&mut self, _: &HomeReference) {
        self.log("home");
    }
}

/// [FilterProvider] serving [ScriptedFilter]s, through a factory.
/// Kinds the factory does not serve fall back to the [BuiltinFilters].
pub struct TestProvider {
    pub journal: Journal,
    factory: fn(FilterKind, Journal) -> Option<ScriptedFilter>,
}

impl TestProvider {
    pub fn new(factory: fn(FilterKind, Journal) -> Option<ScriptedFilter>) -> Self {
        Self {
            factory,
            journal: Journal::default(),
        }
    }

    /// Serves a plain [ScriptedFilter] for every kind
    pub fn scripted() -> Self {
        Self::new(|kind, journal| Some(ScriptedFilter::new(kind, journal)))
    }

    pub fn journal(&self) -> Vec<(FilterKind, &'static str)> {
        self.journal.lock().unwrap().clone()
    }
}

impl FilterProvider for TestProvider {
    fn provide(&self, kind: FilterKind) -> Option<Box<dyn Filter>> {
        match (self.factory)(kind, Arc::clone(&self.journal)) {
            Some(filter) => Some(Box::new(filter)),
            None => BuiltinFilters::default().provide(kind),
        }
    }
}

/// Home reference used throughout the tests
pub fn test_home() -> HomeReference {
    HomeReference::new(45.0, 5.0, 200.0, Vector3::new(0.22, 0.0, 0.42))
}
