use crate::error::SimError;
use arrayvec::ArrayString;
use core::fmt::{self, Write};
use serde::{Deserialize, Serialize};

/// Maximum length in bytes of a beacon or satellite identifier.
pub const MAX_ID_LEN: usize = 48;

type IdBuffer = ArrayString<MAX_ID_LEN>;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(IdBuffer);

        impl $name {
            pub fn new(id: &str) -> Result<Self, SimError> {
                IdBuffer::from(id)
                    .map($name)
                    .map_err(|_| SimError::IdTooLong(id.to_owned()))
            }

            /// Sequential identifier such as `Beacon_7`.
            pub fn numbered(sequence: u64) -> Self {
                let mut buffer = IdBuffer::new();
                // A u64 is at most 20 digits, always fits next to the prefix.
                let _ = write!(buffer, "{}_{}", $prefix, sequence);
                $name(buffer)
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

entity_id!(
    /// Identity of a beacon; the only value a satellite lock can be held by.
    BeaconId,
    "Beacon"
);

entity_id!(
    /// Identity of a relay satellite.
    SatelliteId,
    "Satellite"
);

static_assertions::const_assert!(MAX_ID_LEN >= "Satellite_".len() + 20);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_ids() {
        assert_eq!(BeaconId::numbered(3).as_str(), "Beacon_3");
        assert_eq!(SatelliteId::numbered(u64::MAX).to_string(), "Satellite_18446744073709551615");
    }

    #[test]
    fn test_id_too_long_rejected() {
        let long = "x".repeat(MAX_ID_LEN + 1);
        assert!(matches!(BeaconId::new(&long), Err(SimError::IdTooLong(_))));
        assert!(BeaconId::new("buoy-north").is_ok());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = BeaconId::new("B1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"B1\"");
        let back: BeaconId = serde_json::from_str("\"B1\"").unwrap();
        assert_eq!(back, id);
    }
}
