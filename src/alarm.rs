use log::{info, warn};

/// Health alarm severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlarmSeverity {
    /// No sensor data within the timeout window
    Warning,
    /// A filter unit failed during this cycle
    Error,
}

impl std::fmt::Display for AlarmSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Alarm publication, implemented by the host (telemetry, system alarms..).
pub trait AlarmSink: Send {
    fn raise(&mut self, severity: AlarmSeverity);
    fn clear(&mut self);
}

/// [HealthAlarm] is the liveness signal of the estimation pipeline.
/// It forwards state transitions to its [AlarmSink].
pub struct HealthAlarm {
    severity: Option<AlarmSeverity>,
    sink: Box<dyn AlarmSink>,
}

impl HealthAlarm {
    pub fn new(sink: Box<dyn AlarmSink>) -> Self {
        Self {
            sink,
            severity: None,
        }
    }

    /// Raises (or re-raises with a new severity) this alarm
    pub fn raise(&mut self, severity: AlarmSeverity) {
        if self.severity != Some(severity) {
            warn!("estimation health alarm: {}", severity);
            self.severity = Some(severity);
            self.sink.raise(severity);
        }
    }

    pub fn clear(&mut self) {
        if self.severity.is_some() {
            info!("estimation health alarm cleared");
            self.severity = None;
            self.sink.clear();
        }
    }

    pub fn is_raised(&self) -> bool {
        self.severity.is_some()
    }

    /// Current severity, [None] when cleared
    pub fn severity(&self) -> Option<AlarmSeverity> {
        self.severity
    }
}

#[cfg(test)]
mod test {
    use super::{AlarmSeverity, AlarmSink, HealthAlarm};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Calls(Arc<Mutex<Vec<Option<AlarmSeverity>>>>);

    impl AlarmSink for Calls {
        fn raise(&mut self, severity: AlarmSeverity) {
            self.0.lock().unwrap().push(Some(severity));
        }
        fn clear(&mut self) {
            self.0.lock().unwrap().push(None);
        }
    }

    #[test]
    fn transitions_only() {
        let calls = Calls::default();
        let mut alarm = HealthAlarm::new(Box::new(calls.clone()));

        alarm.clear();
        alarm.raise(AlarmSeverity::Warning);
        alarm.raise(AlarmSeverity::Warning);
        assert!(alarm.is_raised());
        alarm.raise(AlarmSeverity::Error);
        alarm.clear();
        alarm.clear();
        assert!(!alarm.is_raised());

        assert_eq!(
            *calls.0.lock().unwrap(),
            vec![
                Some(AlarmSeverity::Warning),
                Some(AlarmSeverity::Error),
                None
            ]
        );
    }
}
