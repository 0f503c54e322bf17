//! Aegis Clock Infrastructure
//!
//! Time sources for the hedging engine:
//!
//! - [`SystemClock`]: wall-clock time for production
//! - [`ManualClock`]: frozen time that only moves when advanced, so hedge
//!   timestamps and option expiries are reproducible in tests
//!
//! ## Usage
//!
//! ```ignore
//! use aegis_clock::{ManualClock, Clock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::at(start);
//! clock.advance(Duration::minutes(5)); // Jump forward
//! assert_eq!(clock.now(), start + Duration::minutes(5));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use aegis_ports::Clock;
