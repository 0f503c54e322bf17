use aegis_core::Timestamp;
use aegis_ports::Clock;
use chrono::Utc;

/// Wall-clock time in UTC
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_tracks_utc() {
        let before = Utc::now();
        let reading = SystemClock.now();
        let after = Utc::now();

        assert!(before <= reading && reading <= after);
    }
}
