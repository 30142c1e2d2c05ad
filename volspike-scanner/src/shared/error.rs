use crate::shared::config::ConfigError;
use thiserror::Error;
use volspike_data::error::DataError;
use volspike_notify::error::NotifyError;

/// All errors that can end a scan run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(
        "found {found} of {required} required trading days within {lookback} days before the reference date"
    )]
    InsufficientTradingDays {
        found: usize,
        required: usize,
        lookback: u64,
    },

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("delivery: {0}")]
    Notify(#[from] NotifyError),
}
