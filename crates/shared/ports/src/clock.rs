use aegis_core::Timestamp;

/// Source of "now" for hedge timestamps, event times and option expiries.
///
/// The calculation core never reads wall time directly; the composition
/// root injects a system clock in production and a manual one in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
