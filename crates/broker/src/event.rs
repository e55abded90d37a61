use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// A domain event in broker wire form.
///
/// The payload travels as raw JSON so the client can buffer and replay
/// events without knowing their shape. Subjects are derived from the
/// event type, e.g. an `order.reserved` event is published on the
/// `order.reserved` subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Serialize the record for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a wire frame back into a record.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Deserialize the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_roundtrip_preserves_payload() {
        let record = EventRecord::new(
            "order.reserved",
            json!({"order_id": "o-1", "vendor_id": "v-1", "quantity": 3}),
        );

        let bytes = record.to_bytes().unwrap();
        let decoded = EventRecord::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(decoded.payload["quantity"], 3);
    }

    #[test]
    fn payload_decodes_into_typed_struct() {
        #[derive(Deserialize)]
        struct Reserved {
            order_id: String,
        }

        let record = EventRecord::new("order.reserved", json!({"order_id": "o-42"}));
        let reserved: Reserved = record.payload_as().unwrap();
        assert_eq!(reserved.order_id, "o-42");
    }

    #[test]
    fn malformed_frames_fail_to_decode() {
        assert!(EventRecord::from_bytes(b"{not json").is_err());
    }
}
