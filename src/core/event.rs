//! Activity events retained by the heat-map.
//!
//! An [`ActivityEvent`] is immutable once created and always satisfies its
//! invariants: `end_time >= start_time`, intensity and confidence in `[0, 1]`,
//! finite metric values. Producers hand in a [`RawActivityEvent`], which is
//! validated at the store boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reasons an event is refused at the store boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidEventError {
    #[error("event ends before it starts ({start} > {end})")]
    InvertedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("event field `{field}` is not a finite number")]
    NonFinite { field: String },

    #[error("event category must not be empty")]
    EmptyCategory,
}

/// An unvalidated observation as supplied by a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawActivityEvent {
    /// Opaque activity tag, e.g. "typing" or "tool-use"
    pub category: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Activity strength; clamped into [0, 1]
    pub intensity: f64,
    /// Detection confidence; clamped into [0, 1]
    pub confidence: f64,
    /// Open-ended named measurements
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// A validated activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawActivityEvent")]
pub struct ActivityEvent {
    category: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    intensity: f64,
    confidence: f64,
    metrics: BTreeMap<String, f64>,
}

impl ActivityEvent {
    /// Create an event with no metrics.
    pub fn new(
        category: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        intensity: f64,
        confidence: f64,
    ) -> Result<Self, InvalidEventError> {
        Self::try_from(RawActivityEvent {
            category: category.into(),
            start_time,
            end_time,
            intensity,
            confidence,
            metrics: BTreeMap::new(),
        })
    }

    /// Return a copy of this event carrying an extra metric.
    pub fn with_metric(
        mut self,
        name: impl Into<String>,
        value: f64,
    ) -> Result<Self, InvalidEventError> {
        let name = name.into();
        if !value.is_finite() {
            return Err(InvalidEventError::NonFinite {
                field: format!("metrics.{name}"),
            });
        }
        self.metrics.insert(name, value);
        Ok(self)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    /// Look up a single metric by name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Length of the covered interval.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Check if a timestamp falls within `[start_time, end_time]`.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start_time && timestamp <= self.end_time
    }

    /// Re-check the invariants of an already constructed event.
    pub(crate) fn check(&self) -> Result<(), InvalidEventError> {
        if self.category.is_empty() {
            return Err(InvalidEventError::EmptyCategory);
        }
        if self.end_time < self.start_time {
            return Err(InvalidEventError::InvertedRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(())
    }
}

impl TryFrom<RawActivityEvent> for ActivityEvent {
    type Error = InvalidEventError;

    fn try_from(raw: RawActivityEvent) -> Result<Self, Self::Error> {
        if raw.category.trim().is_empty() {
            return Err(InvalidEventError::EmptyCategory);
        }
        if raw.end_time < raw.start_time {
            return Err(InvalidEventError::InvertedRange {
                start: raw.start_time,
                end: raw.end_time,
            });
        }
        let intensity = unit_interval("intensity", raw.intensity)?;
        let confidence = unit_interval("confidence", raw.confidence)?;
        if let Some((name, _)) = raw.metrics.iter().find(|(_, v)| !v.is_finite()) {
            return Err(InvalidEventError::NonFinite {
                field: format!("metrics.{name}"),
            });
        }

        Ok(Self {
            category: raw.category,
            start_time: raw.start_time,
            end_time: raw.end_time,
            intensity,
            confidence,
            metrics: raw.metrics,
        })
    }
}

impl From<ActivityEvent> for RawActivityEvent {
    fn from(event: ActivityEvent) -> Self {
        Self {
            category: event.category,
            start_time: event.start_time,
            end_time: event.end_time,
            intensity: event.intensity,
            confidence: event.confidence,
            metrics: event.metrics,
        }
    }
}

/// Clamp numeric noise into [0, 1]; NaN and infinities are refused.
fn unit_interval(field: &str, value: f64) -> Result<f64, InvalidEventError> {
    if !value.is_finite() {
        return Err(InvalidEventError::NonFinite {
            field: field.to_string(),
        });
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Anything the store can turn into a validated event.
pub trait IntoActivityEvent {
    fn into_activity_event(self) -> Result<ActivityEvent, InvalidEventError>;
}

impl IntoActivityEvent for ActivityEvent {
    fn into_activity_event(self) -> Result<ActivityEvent, InvalidEventError> {
        self.check()?;
        Ok(self)
    }
}

impl IntoActivityEvent for RawActivityEvent {
    fn into_activity_event(self) -> Result<ActivityEvent, InvalidEventError> {
        ActivityEvent::try_from(self)
    }
}
