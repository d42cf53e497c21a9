use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::aggregator::WakeReceiver;

/// Reason an estimation cycle runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A sensor notified new data
    Update,
    /// Timeout elapsed without any notification
    Timeout,
    /// Every notifier is gone: the worker should exit
    Shutdown,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Timeout => write!(f, "timeout"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// [EstimationScheduler] blocks the estimation worker until whichever comes first:
/// a sensor update request or the timeout.
///
/// Every wait starts a fresh timeout: a cycle triggered early by sensor data
/// restarts the timeout window from that point.
#[derive(Debug)]
pub struct EstimationScheduler {
    wake: WakeReceiver,
    timeout: Duration,
}

impl EstimationScheduler {
    pub(crate) fn new(wake: WakeReceiver, timeout: Duration) -> Self {
        Self { wake, timeout }
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Waits for the next [Trigger]
    pub fn wait(&self) -> Trigger {
        match self.wake.recv_timeout(self.timeout) {
            Ok(()) => Trigger::Update,
            Err(RecvTimeoutError::Timeout) => Trigger::Timeout,
            Err(RecvTimeoutError::Disconnected) => Trigger::Shutdown,
        }
    }

    /// Discards a pending wake-up, if any
    pub(crate) fn discard_pending(&self) {
        let _ = self.wake.try_recv();
    }
}
