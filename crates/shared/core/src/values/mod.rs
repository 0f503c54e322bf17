use chrono::{DateTime, Utc};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Asset ticker (e.g. "BTC", "ETH")
pub type Asset = String;

/// Days in a year used to convert expiries to year fractions
pub const DAYS_PER_YEAR: f64 = 365.0;
