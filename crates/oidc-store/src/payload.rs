//! Record payloads.
//!
//! A payload is an arbitrary JSON object supplied by the caller. The store
//! never interprets its contents except for three optional fields used to
//! derive secondary indices (`grantId`, `userCode`, `uid`) and the
//! `consumed` field it surfaces itself on reads of consumed records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Payload field naming the grant a record belongs to.
pub const FIELD_GRANT_ID: &str = "grantId";
/// Payload field carrying a user-facing device code.
pub const FIELD_USER_CODE: &str = "userCode";
/// Payload field carrying a session uid.
pub const FIELD_UID: &str = "uid";
/// Field surfaced on reads once a record has been consumed.
pub const FIELD_CONSUMED: &str = "consumed";

/// An opaque caller-supplied JSON object stored as a record's payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPayload(Map<String, Value>);

impl RecordPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::serialization(format!(
                "payload must be a JSON object, got {other}"
            ))),
        }
    }

    /// Parses a payload from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the input is not a JSON object.
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Serializes the payload for storage.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Inserts a field, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The grant this record belongs to, if any.
    #[must_use]
    pub fn grant_id(&self) -> Option<&str> {
        self.0.get(FIELD_GRANT_ID).and_then(Value::as_str)
    }

    /// The user-facing device code naming this record, if any.
    #[must_use]
    pub fn user_code(&self) -> Option<&str> {
        self.0.get(FIELD_USER_CODE).and_then(Value::as_str)
    }

    /// The session uid naming this record, if any.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.0.get(FIELD_UID).and_then(Value::as_str)
    }

    /// The consumed-at timestamp (unix seconds) surfaced by the store, if
    /// the record has been consumed.
    #[must_use]
    pub fn consumed(&self) -> Option<i64> {
        self.0.get(FIELD_CONSUMED).and_then(Value::as_i64)
    }

    /// Surfaces the consumed marker on a payload returned from a read.
    ///
    /// Only the store sets this; it is not part of the caller's payload.
    pub fn set_consumed(&mut self, unix_seconds: i64) {
        self.0
            .insert(FIELD_CONSUMED.to_string(), Value::from(unix_seconds));
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RecordPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<RecordPayload> for Value {
    fn from(payload: RecordPayload) -> Self {
        Value::Object(payload.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> RecordPayload {
        RecordPayload::from_value(value).unwrap()
    }

    #[test]
    fn test_index_field_accessors() {
        let p = payload(json!({
            "grantId": "g-1",
            "userCode": "WDJB-MJHT",
            "uid": "sess-uid",
            "unrelated": 42,
        }));
        assert_eq!(p.grant_id(), Some("g-1"));
        assert_eq!(p.user_code(), Some("WDJB-MJHT"));
        assert_eq!(p.uid(), Some("sess-uid"));

        let empty = RecordPayload::new();
        assert_eq!(empty.grant_id(), None);
        assert_eq!(empty.user_code(), None);
        assert_eq!(empty.uid(), None);
    }

    #[test]
    fn test_non_string_index_fields_are_ignored() {
        let p = payload(json!({ "grantId": 7 }));
        assert_eq!(p.grant_id(), None);
    }

    #[test]
    fn test_json_round_trip() {
        let p = payload(json!({ "a": [1, 2, 3], "b": { "c": null } }));
        let raw = p.to_json().unwrap();
        let back = RecordPayload::from_json(&raw).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = RecordPayload::from_value(json!("scalar")).unwrap_err();
        assert!(err.is_serialization());

        let err = RecordPayload::from_json("[1,2]").unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_consumed_marker() {
        let mut p = payload(json!({ "token": "t" }));
        assert_eq!(p.consumed(), None);
        p.set_consumed(1_700_000_000);
        assert_eq!(p.consumed(), Some(1_700_000_000));
        assert_eq!(p.get(FIELD_CONSUMED), Some(&json!(1_700_000_000)));
    }
}
