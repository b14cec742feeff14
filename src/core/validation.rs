//! Reliability checks for retained events.
//!
//! An event is judged on its own duration and confidence, then against the
//! similar events around it: same category, intensity within a narrow band.

use crate::core::event::ActivityEvent;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Confidence penalty per detected anomaly.
const ANOMALY_PENALTY: f64 = 0.2;

/// Confidence bonus per similar historical event.
const HISTORY_BONUS: f64 = 0.1;

/// Outcome of validating one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Adjusted confidence in [0, 1]
    pub confidence: f64,
    pub metrics: BTreeMap<String, f64>,
    pub anomalies: Vec<String>,
}

/// Thresholds used to judge events.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternValidator {
    pub min_confidence: f64,
    /// Shortest event considered meaningful
    pub min_duration: Duration,
    /// Allowed deviation from the historical mean, in units of variance
    pub max_variance: f64,
    /// Intensity band within which two events count as similar
    pub similarity: f64,
}

impl Default for PatternValidator {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            min_duration: Duration::seconds(1),
            max_variance: 100.0,
            similarity: 0.2,
        }
    }
}

impl PatternValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `event` against the other events in `history`.
    pub fn validate(&self, event: &ActivityEvent, history: &[ActivityEvent]) -> ValidationResult {
        let duration = event.duration();
        if duration < self.min_duration {
            return ValidationResult {
                is_valid: false,
                confidence: 0.0,
                metrics: BTreeMap::from([("duration".to_string(), seconds(duration))]),
                anomalies: vec!["Pattern duration too short".to_string()],
            };
        }

        if event.confidence() < self.min_confidence {
            return ValidationResult {
                is_valid: false,
                confidence: event.confidence(),
                metrics: BTreeMap::from([("confidence".to_string(), event.confidence())]),
                anomalies: vec!["Pattern confidence too low".to_string()],
            };
        }

        let similar: Vec<&ActivityEvent> = history
            .iter()
            .filter(|p| {
                p.category() == event.category()
                    && (p.intensity() - event.intensity()).abs() < self.similarity
                    && *p != event
            })
            .collect();

        if similar.is_empty() {
            self.validate_alone(event)
        } else {
            self.validate_against(event, &similar)
        }
    }

    /// No comparable history: judge on internal metrics only.
    fn validate_alone(&self, event: &ActivityEvent) -> ValidationResult {
        let mut anomalies = Vec::new();

        if event.metric("consistency").is_some_and(|c| c < 0.3) {
            anomalies.push("Low internal consistency".to_string());
        }
        if event.metric("burst_count").is_some_and(|b| b < 2.0) {
            anomalies.push("Insufficient data points".to_string());
        }

        let penalty = anomalies.len() as f64 * ANOMALY_PENALTY;
        let confidence = (event.confidence() - penalty).max(0.0);

        ValidationResult {
            is_valid: confidence >= self.min_confidence,
            confidence,
            metrics: event.metrics().clone(),
            anomalies,
        }
    }

    fn validate_against(
        &self,
        event: &ActivityEvent,
        similar: &[&ActivityEvent],
    ) -> ValidationResult {
        let mut anomalies = Vec::new();
        let mut metrics = event.metrics().clone();

        for (name, &current) in event.metrics() {
            let values: Vec<f64> = similar.iter().filter_map(|p| p.metric(name)).collect();
            if values.is_empty() {
                continue;
            }

            let mean = values.iter().mean();
            let variance = if values.len() > 1 {
                values.iter().variance()
            } else {
                0.0
            };

            if variance > 0.0 && (current - mean).abs() / variance > self.max_variance {
                anomalies.push(format!("Unusual {name} value"));
            }

            metrics.insert(format!("avg_{name}"), mean);
            metrics.insert(format!("var_{name}"), variance);
        }

        let bonus = similar.len() as f64 * HISTORY_BONUS;
        let penalty = anomalies.len() as f64 * ANOMALY_PENALTY;
        let confidence = (event.confidence() + bonus - penalty).clamp(0.0, 1.0);

        ValidationResult {
            is_valid: confidence >= self.min_confidence && anomalies.is_empty(),
            confidence,
            metrics,
            anomalies,
        }
    }
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}
