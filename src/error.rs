//! Error taxonomy shared by the inference client, the alert dispatchers and
//! the monitor loop.

use thiserror::Error;

/// Errors surfaced to the operator. None of them are retried.
#[derive(Debug, Error)]
pub enum EscaprError {
    /// The inference server could not be reached.
    #[error("inference server unreachable: {0}")]
    Network(String),

    /// The inference server answered with an error status or malformed data.
    #[error("inference server error: {0}")]
    Service(String),

    /// The paging endpoint could not be reached or rejected the event.
    #[error("alert delivery failed: {0}")]
    Delivery(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("pipeline is already running")]
    PipelineAlreadyRunning,

    #[error("pipeline is not running; call start() first")]
    PipelineNotRunning,
}

pub type Result<T> = std::result::Result<T, EscaprError>;
