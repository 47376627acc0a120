//! Typed entity payloads
//!
//! The extraction service returns, per entity name, a list of loosely typed
//! JSON objects. [`EntityKind::parse`] turns one of those lists into a typed
//! value, or explains why it could not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Entities keyed by name, as returned by the extraction service
pub type EntityMap = BTreeMap<String, Vec<EntityPayload>>;

/// One extracted occurrence of an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Normalized>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EntityPayload {
    /// Payload carrying only a `value` field
    #[allow(dead_code)] // Used in tests
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Duration payload with its normalized value in seconds
    #[allow(dead_code)] // Used in tests
    pub fn seconds(seconds: f64) -> Self {
        Self {
            normalized: Some(Normalized {
                value: Some(Value::from(seconds)),
                unit: Some("second".to_string()),
            }),
            ..Self::default()
        }
    }
}

/// Unit-normalized form of a measured entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum EntityError {
    #[error("expected exactly one occurrence, got {0}")]
    NotSingle(usize),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("field {0} is not a number")]
    NotANumber(&'static str),
    #[error("field {0} is not a string")]
    NotAString(&'static str),
    #[error("value out of range: {0}")]
    OutOfRange(f64),
    #[error("unparseable datetime {0:?}")]
    BadDatetime(String),
}

/// How a given entity name should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// `normalized.value` holds seconds
    Duration,
    /// `value` holds a number, rounded to the nearest integer
    Quantity,
    /// Same shape as `Quantity`; the unit is not inspected
    Distance,
    /// `value` holds an RFC 3339 timestamp
    DateTime,
}

/// Result of parsing one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entity {
    Duration(Duration),
    Quantity(i64),
    Distance(i64),
    DateTime(DateTime<Utc>),
}

impl EntityKind {
    pub fn parse(self, payloads: &[EntityPayload]) -> Result<Entity, EntityError> {
        let [payload] = payloads else {
            return Err(EntityError::NotSingle(payloads.len()));
        };
        match self {
            EntityKind::Duration => {
                let seconds = payload
                    .normalized
                    .as_ref()
                    .and_then(|n| n.value.as_ref())
                    .ok_or(EntityError::MissingField("normalized.value"))?
                    .as_f64()
                    .ok_or(EntityError::NotANumber("normalized.value"))?;
                let seconds = seconds.round();
                if !(0.0..=f64::from(u32::MAX)).contains(&seconds) {
                    return Err(EntityError::OutOfRange(seconds));
                }
                Ok(Entity::Duration(Duration::from_secs_f64(seconds)))
            }
            EntityKind::Quantity => rounded_value(payload).map(Entity::Quantity),
            EntityKind::Distance => rounded_value(payload).map(Entity::Distance),
            EntityKind::DateTime => {
                let raw = payload
                    .value
                    .as_ref()
                    .ok_or(EntityError::MissingField("value"))?
                    .as_str()
                    .ok_or(EntityError::NotAString("value"))?;
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| Entity::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|_| EntityError::BadDatetime(raw.to_string()))
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn rounded_value(payload: &EntityPayload) -> Result<i64, EntityError> {
    let number = payload
        .value
        .as_ref()
        .ok_or(EntityError::MissingField("value"))?
        .as_f64()
        .ok_or(EntityError::NotANumber("value"))?
        .round();
    // i64::MAX is not exactly representable; stay well inside it
    if !number.is_finite() || number.abs() >= 9.0e18 {
        return Err(EntityError::OutOfRange(number));
    }
    Ok(number as i64)
}
