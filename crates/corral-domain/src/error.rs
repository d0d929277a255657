use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Store error: {0}")]
    StoreError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum TelemetryParseError {
    #[error("Datagram is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Invalid telemetry JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Telemetry uid is empty")]
    EmptyUid,

    #[error("Telemetry data has no position")]
    MissingPosition,
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Subscriber channel is closed")]
    ChannelClosed,
}
