use crate::ids::{BeaconId, SatelliteId, MAX_ID_LEN};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("identifier `{0}` is longer than {} bytes", MAX_ID_LEN)]
    IdTooLong(String),

    #[error("a beacon with id {0} is already registered")]
    DuplicateBeacon(BeaconId),

    #[error("a satellite with id {0} is already registered")]
    DuplicateSatellite(SatelliteId),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
