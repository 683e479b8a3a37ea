//! PagerDuty event shape produced by adapters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event classification understood by the events API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Trigger,
    Acknowledge,
    Resolve,
}

impl EventType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trigger" => Some(Self::Trigger),
            "acknowledge" | "ack" => Some(Self::Acknowledge),
            "resolve" => Some(Self::Resolve),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Acknowledge => "acknowledge",
            Self::Resolve => "resolve",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event for the generic events API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagerDutyEvent {
    pub service_key: String,
    pub event_type: EventType,
    pub description: String,
    /// Correlates a trigger with its later resolve
    pub incident_key: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_from_str() {
        assert_eq!(EventType::from_str("trigger"), Some(EventType::Trigger));
        assert_eq!(EventType::from_str(" RESOLVE\n"), Some(EventType::Resolve));
        assert_eq!(EventType::from_str("ack"), Some(EventType::Acknowledge));
        assert_eq!(EventType::from_str("problem"), None);
    }

    #[test]
    fn test_event_serializes_to_api_shape() {
        let event = PagerDutyEvent {
            service_key: "svc".to_string(),
            event_type: EventType::Trigger,
            description: "CPU high".to_string(),
            incident_key: "42-web01".to_string(),
            details: serde_json::Value::Null,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "trigger");
        assert_eq!(json["incident_key"], "42-web01");
        assert!(json.get("details").is_none());
    }
}
