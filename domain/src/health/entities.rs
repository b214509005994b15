//! Health entities
//!
//! A [`HealthStatus`] is recomputed on every health request. Its overall
//! [`HealthState`] is derived from the component map by
//! [`determine_overall_status`]:
//!
//! | Components | Overall |
//! |------------|---------|
//! | any `unhealthy` | `unhealthy` |
//! | any `degraded`, none `unhealthy` | `degraded` |
//! | otherwise (including none) | `healthy` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Health of one component or of the whole service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single component check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: HealthState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Time the check took, in milliseconds
    pub duration_ms: f64,
}

impl ComponentHealth {
    pub fn new(status: HealthState, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            duration_ms: 0.0,
        }
    }

    pub fn healthy(message: impl Into<String>) -> Self {
        Self::new(HealthState::Healthy, message)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(HealthState::Degraded, message)
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::new(HealthState::Unhealthy, message)
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = elapsed.as_secs_f64() * 1000.0;
        self
    }
}

/// Aggregated health response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthState,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Time spent computing this status, in milliseconds
    pub duration_ms: f64,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentHealth>,
    /// Small numeric summary (uptime, request counters)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

impl HealthStatus {
    /// Build a status whose overall state is derived from `components`.
    pub fn from_components(
        components: BTreeMap<String, ComponentHealth>,
        timestamp: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let status = determine_overall_status(components.values().map(|c| c.status));
        let message = summary_message(status, &components);
        Self {
            status,
            message,
            timestamp,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            components,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// Derive the overall state from component states.
pub fn determine_overall_status<I>(states: I) -> HealthState
where
    I: IntoIterator<Item = HealthState>,
{
    states
        .into_iter()
        .max()
        .unwrap_or(HealthState::Healthy)
}

fn summary_message(status: HealthState, components: &BTreeMap<String, ComponentHealth>) -> String {
    match status {
        HealthState::Healthy => "all components healthy".to_string(),
        _ => {
            let affected: Vec<&str> = components
                .iter()
                .filter(|(_, c)| c.status == status)
                .map(|(name, _)| name.as_str())
                .collect();
            format!("{}: {}", status, affected.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_status_rules() {
        use HealthState::*;
        assert_eq!(determine_overall_status([]), Healthy);
        assert_eq!(determine_overall_status([Healthy, Healthy]), Healthy);
        assert_eq!(determine_overall_status([Healthy, Degraded]), Degraded);
        assert_eq!(determine_overall_status([Degraded, Unhealthy, Healthy]), Unhealthy);
        assert_eq!(determine_overall_status([Unhealthy]), Unhealthy);
    }

    #[test]
    fn test_from_components_message() {
        let mut components = BTreeMap::new();
        components.insert("metrics".to_string(), ComponentHealth::degraded("disabled"));
        components.insert("provider".to_string(), ComponentHealth::healthy(""));

        let status = HealthStatus::from_components(components, Utc::now(), Duration::from_millis(3));
        assert_eq!(status.status, HealthState::Degraded);
        assert_eq!(status.message, "degraded: metrics");
        assert!((status.duration_ms - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wire_shape() {
        let mut components = BTreeMap::new();
        components.insert("metrics".to_string(), ComponentHealth::healthy("ok"));
        let status = HealthStatus::from_components(components, Utc::now(), Duration::ZERO)
            .with_metric("uptime_seconds", 12.0);

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["components"]["metrics"]["status"], "healthy");
        assert_eq!(value["metrics"]["uptime_seconds"], 12.0);
        assert!(value.get("durationMs").is_some());
        assert!(value.get("timestamp").is_some());
    }
}
