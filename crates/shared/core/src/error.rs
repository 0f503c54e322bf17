//! Error taxonomy shared by every Aegis crate

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bad caller input; never retried
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Misaligned series: {0}")]
    MisalignedSeries(String),

    #[error("Degenerate variance: {0}")]
    DegenerateVariance(String),

    #[error("Unknown strategy: {0}")]
    InvalidStrategy(String),

    /// Collaborator fetch failure, isolated per asset by the scheduler
    #[error("Data unavailable for {asset}: {reason}")]
    DataUnavailable { asset: String, reason: String },
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    pub fn unavailable(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::DataUnavailable {
            asset: asset.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying later with more (or fresher) data could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData { .. } | Error::MisalignedSeries(_) | Error::DataUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
