//! Persisted record wire format.
//!
//! One JSON object per storage key: the snapshot's fields at the top level,
//! plus the reserved `_savedAt` key (epoch milliseconds) when an expiry
//! policy is configured.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::error::PersistError;
use crate::snapshot::Snapshot;

/// Reserved top-level key holding the save timestamp.
pub const SAVED_AT_KEY: &str = "_savedAt";

/// A parsed persisted record: the snapshot plus the optional save timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Snapshot,
    pub saved_at: Option<u64>,
}

impl Record {
    /// Parse a raw stored string.
    ///
    /// The `_savedAt` key is stripped from the field values whether or not
    /// it holds a usable timestamp, so a reserved key never leaks into the
    /// form. Anything that is not a JSON object is a corrupt record.
    pub fn parse(raw: &str) -> Result<Record, PersistError> {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|err| PersistError::CorruptRecord(err.to_string()))?;

        let mut values = match parsed {
            Value::Object(map) => map,
            other => {
                return Err(PersistError::CorruptRecord(format!(
                    "expected a JSON object, got {}",
                    other
                )))
            }
        };

        let saved_at = values.remove(SAVED_AT_KEY).and_then(|v| v.as_u64());

        Ok(Record { values, saved_at })
    }

    /// Encode a snapshot for storage, stamping `saved_at` when present.
    pub fn encode(values: &Snapshot, saved_at: Option<u64>) -> String {
        let mut object = values.clone();
        if let Some(timestamp) = saved_at {
            object.insert(SAVED_AT_KEY.to_string(), Value::from(timestamp));
        }
        Value::Object(object).to_string()
    }

    /// Whether the record's age exceeds `timeout` as of `now_ms`.
    ///
    /// Records without a timestamp never expire.
    pub fn is_expired(&self, timeout: Duration, now_ms: u64) -> bool {
        match self.saved_at {
            Some(saved_at) => now_ms.saturating_sub(saved_at) > timeout.as_millis() as u64,
            None => false,
        }
    }
}

/// Current time as epoch milliseconds.
pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
