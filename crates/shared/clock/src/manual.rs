use aegis_core::Timestamp;
use aegis_ports::Clock;
use chrono::{Duration, Utc};
use parking_lot::RwLock;

/// Fixed clock - time only advances when explicitly moved
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Frozen at the given time
    pub fn at(time: Timestamp) -> Self {
        Self {
            current_time: RwLock::new(time),
        }
    }

    /// Frozen at the current wall time
    pub fn frozen_now() -> Self {
        Self::at(Utc::now())
    }

    /// Jump forward (or backward with a negative duration)
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_time.write();
        *current += duration;
    }

    pub fn set(&self, time: Timestamp) {
        *self.current_time.write() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current_time.read()
    }
}
