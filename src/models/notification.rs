use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Informational,
    Warning,
    Failure,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Informational => "informational",
            Severity::Warning => "warning",
            Severity::Failure => "failure",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one-shot notification sent when a tracked service is first seen running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSpec {
    /// Plugin instance of the notification
    pub label: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub type_instance: String,

    pub severity: Severity,

    pub message: String,
}

impl NotificationSpec {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.label.trim().is_empty() {
            return Err(TrackerError::config("Notification is missing its label"));
        }
        if self.kind.trim().is_empty() {
            return Err(TrackerError::config("Notification is missing its type"));
        }
        if self.message.trim().is_empty() {
            return Err(TrackerError::config("Notification is missing its message"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_severity_and_type() {
        let spec: NotificationSpec = serde_json::from_str(
            r#"{"label":"deploy","type":"gauge","severity":"warning","message":"service up"}"#,
        )
        .unwrap();
        assert_eq!(spec.kind, "gauge");
        assert_eq!(spec.severity, Severity::Warning);
        assert_eq!(spec.type_instance, "");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_severity() {
        let parsed: Result<NotificationSpec, _> = serde_json::from_str(
            r#"{"label":"deploy","type":"gauge","severity":"fatal","message":"up"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_message_is_a_configuration_error() {
        let spec = NotificationSpec {
            label: "deploy".to_string(),
            kind: "gauge".to_string(),
            type_instance: String::new(),
            severity: Severity::Informational,
            message: "  ".to_string(),
        };
        assert!(matches!(
            spec.validate(),
            Err(TrackerError::Configuration { .. })
        ));
    }
}
