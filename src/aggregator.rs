use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::channel::{SensorChannel, SensorSet};

/// Receiving end of the scheduler wake-up signal
pub(crate) type WakeReceiver = Receiver<()>;

/// [SensorAggregator] tracks which [SensorChannel]s published a sample that
/// has not been consumed by an estimation cycle yet (the dirty set).
///
/// It is a cheap handle: clone it into every sensor producer context.
/// Notifying never blocks. Wake-ups are debounced: however many notifications
/// arrive between two cycles, at most one wake-up is pending.
#[derive(Debug, Clone)]
pub struct SensorAggregator {
    dirty: Arc<AtomicU8>,
    shutdown: Arc<AtomicBool>,
    wake: Sender<()>,
}

impl SensorAggregator {
    /// Builds a new [SensorAggregator] and the wake-up receiver the scheduler waits on.
    pub(crate) fn new() -> (Self, WakeReceiver) {
        let (wake, wake_rx) = bounded(1);
        (
            Self {
                wake,
                dirty: Arc::new(AtomicU8::new(0)),
                shutdown: Arc::new(AtomicBool::new(false)),
            },
            wake_rx,
        )
    }

    /// Tags this channel as updated and requests an estimation cycle
    /// as soon as possible.
    pub fn on_sensor_updated(&self, channel: SensorChannel) {
        self.dirty.fetch_or(channel.bit(), Ordering::AcqRel);
        self.notify();
    }

    /// Atomically reads and clears the dirty set. Channels tagged after this
    /// call belong to the next cycle.
    pub fn drain_for_cycle(&self) -> SensorSet {
        SensorSet::from_bits(self.dirty.swap(0, Ordering::AcqRel))
    }

    /// Channels currently pending, without consuming them
    pub fn pending(&self) -> SensorSet {
        SensorSet::from_bits(self.dirty.load(Ordering::Acquire))
    }

    /// Wakes up the scheduler
    fn notify(&self) {
        match self.wake.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {},
            // worker is gone: nothing to wake up
            Err(TrySendError::Disconnected(())) => {},
        }
    }

    /// Requests the worker to exit once the current cycle completes
    pub(crate) fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.notify();
    }

    pub(crate) fn clear_shutdown(&self) {
        self.shutdown.store(false, Ordering::Release);
    }

    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
